//! Profile onboarding and the committed profile view.

use axum::{extract::State, Extension, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::jwt::Claims,
    error::{get_db_conn, ApiError, ApiResult},
    models::{Profile, ProfileUpsert},
    schema::profiles,
    AppState,
};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_ABOUT_LENGTH: usize = 2000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BootstrapProfileRequest {
    #[schema(example = "Alice Example")]
    pub name: Option<String>,
    #[schema(example = "Berlin")]
    pub location: Option<String>,
    #[schema(example = "Building small tools for indie founders")]
    pub about: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BootstrapProfileResponse {
    #[schema(example = true)]
    pub ok: bool,
}

/// Create-or-update for the onboarding flow. The same endpoint backs first-run
/// onboarding and later profile edits; the row is keyed by the user id.
#[utoipa::path(
    post,
    path = "/auth/bootstrap-profile",
    tag = "Profiles",
    request_body = BootstrapProfileRequest,
    responses(
        (status = 200, description = "Profile created or updated", body = BootstrapProfileResponse),
        (status = 400, description = "Validation error", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn bootstrap_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BootstrapProfileRequest>,
) -> ApiResult<Json<BootstrapProfileResponse>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let name = payload.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required", "INVALID_INPUT"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request(
            format!("Name is too long (max {} characters)", MAX_NAME_LENGTH),
            "INVALID_INPUT",
        ));
    }

    let about = payload
        .about
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(about) = &about {
        if about.chars().count() > MAX_ABOUT_LENGTH {
            return Err(ApiError::bad_request(
                format!("About is too long (max {} characters)", MAX_ABOUT_LENGTH),
                "INVALID_INPUT",
            ));
        }
    }

    let location = payload
        .location
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let upsert = ProfileUpsert {
        id: user_id,
        name,
        location,
        about,
    };

    let mut conn = get_db_conn(&state.db_pool)?;

    diesel::insert_into(profiles::table)
        .values(&upsert)
        .on_conflict(profiles::id)
        .do_update()
        .set(&upsert)
        .execute(&mut conn)
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Profile upsert failed");
            ApiError::db_error()
        })?;

    info!(user_id = %user_id, "Profile upserted");

    Ok(Json(BootstrapProfileResponse { ok: true }))
}

#[utoipa::path(
    get,
    path = "/profiles/me",
    tag = "Profiles",
    responses(
        (status = 200, description = "The caller's committed profile", body = Profile),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "No profile yet", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Profile>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let profile: Option<Profile> = profiles::table
        .filter(profiles::id.eq(user_id))
        .select(Profile::as_select())
        .first(&mut conn)
        .optional()
        .map_err(|_| ApiError::db_error())?;

    match profile {
        Some(profile) => Ok(Json(profile)),
        None => Err(ApiError::not_found(
            "Profile not found",
            "PROFILE_NOT_FOUND",
        )),
    }
}
