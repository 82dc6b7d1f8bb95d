//! Authentication handlers.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{jwt::JwtConfig, password::PasswordService},
    error::{get_db_conn, ApiError, ApiResult},
    models::{NewUser, ProfileUpsert, User},
    schema::{profiles, refresh_tokens, users},
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "securepassword123", min_length = 8)]
    pub password: String,
    /// Display name; when present a profile row is created alongside the user.
    #[schema(example = "Alice Example")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "securepassword123")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[schema(example = "eyJhbGciOiJFZERTQSIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    #[schema(example = "eyJhbGciOiJFZERTQSIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "eyJhbGciOiJFZERTQSIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    #[schema(example = "eyJhbGciOiJFZERTQSIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "eyJhbGciOiJFZERTQSIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = true)]
    pub is_active: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Session introspection payload. Field names match what the swipe client
/// consumes, hence the camelCase.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[schema(example = true)]
    pub has_user: bool,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: Option<Uuid>,
    #[schema(example = "user@example.com")]
    pub user_email: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: chrono::NaiveDateTime,
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn store_refresh_token(
    conn: &mut PgConnection,
    user_id: Uuid,
    token: &str,
    expires_in_secs: i64,
) -> Result<(), diesel::result::Error> {
    let token_hash = hash_token(token);
    let expires_at = (Utc::now() + Duration::seconds(expires_in_secs)).naive_utc();

    diesel::insert_into(refresh_tokens::table)
        .values(&NewRefreshToken {
            user_id,
            token_hash,
            expires_at,
        })
        .execute(conn)?;

    Ok(())
}

fn verify_stored_token(conn: &mut PgConnection, token: &str) -> Result<Uuid, &'static str> {
    let token_hash = hash_token(token);
    let now = Utc::now().naive_utc();

    let result: Result<(Uuid, chrono::NaiveDateTime), _> = refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(&token_hash))
        .select((refresh_tokens::user_id, refresh_tokens::expires_at))
        .first(conn);

    match result {
        Ok((user_id, expires_at)) => {
            if expires_at < now {
                let _ = diesel::delete(
                    refresh_tokens::table.filter(refresh_tokens::token_hash.eq(&token_hash)),
                )
                .execute(conn);
                Err("Refresh token has expired")
            } else {
                Ok(user_id)
            }
        }
        Err(_) => Err("Invalid refresh token"),
    }
}

fn invalidate_token(conn: &mut PgConnection, token: &str) -> Result<(), diesel::result::Error> {
    let token_hash = hash_token(token);
    diesel::delete(refresh_tokens::table.filter(refresh_tokens::token_hash.eq(&token_hash)))
        .execute(conn)?;
    Ok(())
}

fn cleanup_expired_tokens(conn: &mut PgConnection, user_id: Uuid) {
    let now = Utc::now().naive_utc();
    let result = diesel::delete(
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .filter(refresh_tokens::expires_at.lt(now)),
    )
    .execute(conn);

    if let Ok(count) = result {
        if count > 0 {
            info!(user_id = %user_id, deleted_count = count, "Cleaned up expired refresh tokens");
        }
    }
}

fn generate_tokens(
    jwt_config: &Arc<JwtConfig>,
    conn: &mut PgConnection,
    user: &User,
) -> ApiResult<(String, String)> {
    let access_token = jwt_config
        .generate_access_token(user.id, &user.email)
        .map_err(|e| {
            error!(error = %e, "Token generation failed");
            ApiError::internal("Token generation failed", "TOKEN_GENERATION_ERROR")
        })?;

    let refresh_token = jwt_config.generate_refresh_token(user.id).map_err(|e| {
        error!(error = %e, "Token generation failed");
        ApiError::internal("Token generation failed", "TOKEN_GENERATION_ERROR")
    })?;

    store_refresh_token(conn, user.id, &refresh_token, jwt_config.refresh_token_expiry).map_err(
        |e| {
            error!(error = %e, "Failed to store refresh token");
            ApiError::internal("Token storage failed", "TOKEN_STORAGE_ERROR")
        },
    )?;

    Ok((access_token, refresh_token))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Validation error", body = crate::error::ApiError),
        (status = 409, description = "User already exists", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if let Err(e) = payload.validate() {
        return Err(ApiError::bad_request(
            format!("Validation error: {}", e),
            "VALIDATION_ERROR",
        ));
    }

    if let Err(e) = state.password_policy.validate(&payload.password) {
        return Err(ApiError::bad_request(
            e.to_string(),
            "PASSWORD_POLICY_VIOLATION",
        ));
    }

    let password_hash =
        PasswordService::hash_password_with_cost(&payload.password, state.password_hash_cost)
            .map_err(|e| {
                error!(error = %e, "Password hashing failed");
                ApiError::internal("Failed to process password", "PASSWORD_HASH_ERROR")
            })?;

    let new_user = NewUser {
        email: payload.email.to_lowercase(),
        password_hash,
    };

    let mut conn = get_db_conn(&state.db_pool)?;

    let user: User = conn
        .transaction(|conn| {
            let user: User = diesel::insert_into(users::table)
                .values(&new_user)
                .get_result(conn)?;

            if let Some(name) = &payload.name {
                let name = name.trim();
                if !name.is_empty() {
                    diesel::insert_into(profiles::table)
                        .values(&ProfileUpsert {
                            id: user.id,
                            name: name.to_string(),
                            location: None,
                            about: None,
                        })
                        .execute(conn)?;
                }
            }

            Ok::<_, diesel::result::Error>(user)
        })
        .map_err(|e| {
            warn!(error = %e, email = %new_user.email, "Failed to register user");
            ApiError::conflict("User with this email already exists", "USER_EXISTS")
        })?;

    let (access_token, refresh_token) = generate_tokens(&state.jwt_config, &mut conn, &user)?;

    info!(user_id = %user.id, email = %user.email, "User registered");

    Ok(Json(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 403, description = "Account inactive", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if let Err(e) = payload.validate() {
        return Err(ApiError::bad_request(
            format!("Validation error: {}", e),
            "VALIDATION_ERROR",
        ));
    }

    let mut conn = get_db_conn(&state.db_pool)?;

    let user: User = users::table
        .filter(users::email.eq(payload.email.to_lowercase()))
        .first(&mut conn)
        .map_err(|_| {
            warn!(email = %payload.email, "Login attempt for non-existent user");
            ApiError::unauthorized("Invalid credentials", "INVALID_CREDENTIALS")
        })?;

    if !user.is_active {
        warn!(user_id = %user.id, "Login attempt for inactive user");
        return Err(ApiError::forbidden(
            "Account is inactive",
            "ACCOUNT_INACTIVE",
        ));
    }

    let is_valid = PasswordService::verify_password(&payload.password, &user.password_hash)
        .map_err(|e| {
            error!(error = %e, "Password verification error");
            ApiError::internal("Password verification error", "PASSWORD_VERIFY_ERROR")
        })?;

    if !is_valid {
        warn!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(ApiError::unauthorized(
            "Invalid credentials",
            "INVALID_CREDENTIALS",
        ));
    }

    cleanup_expired_tokens(&mut conn, user.id);

    let (access_token, refresh_token) = generate_tokens(&state.jwt_config, &mut conn, &user)?;

    info!(user_id = %user.id, email = %user.email, "User logged in");

    Ok(Json(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = crate::error::ApiError),
        (status = 403, description = "User account is inactive", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let refresh_claims = state
        .jwt_config
        .verify_refresh_token(&payload.refresh_token)
        .map_err(|_| {
            ApiError::unauthorized("Invalid or expired refresh token", "INVALID_REFRESH_TOKEN")
        })?;

    let user_id = Uuid::parse_str(&refresh_claims.sub).map_err(|e| {
        error!(error = %e, "Invalid user ID in refresh token");
        ApiError::bad_request("Invalid token format", "INVALID_TOKEN_FORMAT")
    })?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let stored_user_id = verify_stored_token(&mut conn, &payload.refresh_token).map_err(|msg| {
        warn!(user_id = %user_id, "Refresh token not found in database");
        ApiError::unauthorized(msg, "INVALID_REFRESH_TOKEN")
    })?;

    if stored_user_id != user_id {
        warn!(claimed_user_id = %user_id, stored_user_id = %stored_user_id, "Refresh token user mismatch");
        return Err(ApiError::unauthorized(
            "Invalid refresh token",
            "TOKEN_USER_MISMATCH",
        ));
    }

    let user: User = users::table
        .filter(users::id.eq(user_id))
        .first(&mut conn)
        .map_err(|_| ApiError::unauthorized("User not found", "USER_NOT_FOUND"))?;

    if !user.is_active {
        return Err(ApiError::forbidden(
            "User account is inactive",
            "ACCOUNT_INACTIVE",
        ));
    }

    if state.rotate_refresh_tokens {
        invalidate_token(&mut conn, &payload.refresh_token).map_err(|e| {
            error!(error = %e, "Failed to invalidate old refresh token");
            ApiError::internal("Token invalidation failed", "TOKEN_INVALIDATION_ERROR")
        })?;

        let (access_token, refresh_token) = generate_tokens(&state.jwt_config, &mut conn, &user)?;

        info!(user_id = %user.id, "Tokens refreshed (rotated)");

        Ok(Json(RefreshResponse {
            access_token,
            refresh_token,
        }))
    } else {
        let access_token = state
            .jwt_config
            .generate_access_token(user.id, &user.email)
            .map_err(|e| {
                error!(error = %e, "Token generation failed");
                ApiError::internal("Token generation failed", "TOKEN_GENERATION_ERROR")
            })?;

        info!(user_id = %user.id, "Access token refreshed");

        Ok(Json(RefreshResponse {
            access_token,
            refresh_token: payload.refresh_token,
        }))
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 204, description = "Logged out"),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<StatusCode> {
    let mut conn = get_db_conn(&state.db_pool)?;
    let _ = invalidate_token(&mut conn, &payload.refresh_token);
    info!("User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Session introspection for the client shell. Unlike the rest of the API this
/// never fails on a missing or invalid token; it answers "is anyone here?".
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Session state", body = SessionResponse)
    )
)]
pub async fn session_introspect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    let claims = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(|token| state.jwt_config.verify_access_token(token).ok());

    match claims {
        Some(claims) => Json(SessionResponse {
            has_user: true,
            user_id: Uuid::parse_str(&claims.sub).ok(),
            user_email: Some(claims.email),
        }),
        None => Json(SessionResponse {
            has_user: false,
            user_id: None,
            user_email: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hashing_is_stable() {
        let a = hash_token("some-refresh-token");
        let b = hash_token("some-refresh-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn session_response_uses_camel_case() {
        let body = serde_json::to_value(SessionResponse {
            has_user: false,
            user_id: None,
            user_email: None,
        })
        .unwrap();
        assert_eq!(body["hasUser"], false);
        assert!(body.get("userId").is_some());
        assert!(body.get("userEmail").is_some());
    }
}
