//! Chat messages within a match.
//!
//! Every read and write starts with the participant check. A caller who is
//! not one of the match's two users gets the same 403 whether the match
//! exists or not, so probing ids reveals nothing.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    auth::jwt::Claims,
    error::{get_db_conn, ApiError, ApiResult},
    models::{Match, Message, NewMessage},
    pagination::PageParams,
    schema::{matches, messages},
    AppState,
};

pub const MAX_MESSAGE_LENGTH: usize = 1000;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagesQuery {
    /// Match to read messages from.
    #[serde(rename = "matchId")]
    pub match_id: Option<Uuid>,
    #[param(minimum = 1, maximum = 100, default = 50)]
    #[serde(default = "default_message_limit")]
    pub limit: i64,
    #[param(minimum = 0, default = 0)]
    #[serde(default)]
    pub offset: i64,
}

fn default_message_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub match_id: Option<Uuid>,
    #[schema(example = "Hey, love the idea!")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessagesListResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    pub message: Message,
}

/// The `_` arm covers both a missing match and a non-participant caller;
/// collapsing them keeps match existence unobservable to outsiders.
fn load_match_for_participant(
    conn: &mut PgConnection,
    match_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Match> {
    let m: Option<Match> = matches::table
        .filter(matches::id.eq(match_id))
        .select(Match::as_select())
        .first(conn)
        .optional()
        .map_err(|_| ApiError::db_error())?;

    match m {
        Some(m) if m.user_a_id == user_id || m.user_b_id == user_id => Ok(m),
        _ => Err(ApiError::forbidden(
            "Not a participant of this match",
            "MATCH_ACCESS_DENIED",
        )),
    }
}

#[utoipa::path(
    get,
    path = "/messages",
    tag = "Chats",
    params(MessagesQuery),
    responses(
        (status = 200, description = "Messages in the match, oldest first", body = MessagesListResponse),
        (status = 400, description = "Missing matchId", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Not a participant", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Json<MessagesListResponse>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let Some(match_id) = query.match_id else {
        return Err(ApiError::bad_request(
            "matchId is required",
            "INVALID_INPUT",
        ));
    };

    let mut conn = get_db_conn(&state.db_pool)?;

    let m = load_match_for_participant(&mut conn, match_id, user_id)?;

    let (limit, offset) = PageParams::new(query.limit, query.offset).limit_offset();

    let rows: Vec<Message> = messages::table
        .filter(messages::match_id.eq(m.id))
        .order(messages::created_at.asc())
        .limit(limit)
        .offset(offset)
        .select(Message::as_select())
        .load(&mut conn)
        .map_err(|_| ApiError::db_error())?;

    Ok(Json(MessagesListResponse { messages: rows }))
}

#[utoipa::path(
    post,
    path = "/messages",
    tag = "Chats",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = SendMessageResponse),
        (status = 400, description = "Empty or too-long content", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Not a participant", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<SendMessageResponse>)> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let Some(match_id) = payload.match_id else {
        return Err(ApiError::bad_request(
            "matchId is required",
            "INVALID_INPUT",
        ));
    };

    let content = payload.content.as_deref().unwrap_or("").trim();

    if content.is_empty() {
        return Err(ApiError::bad_request(
            "Message must not be empty",
            "INVALID_INPUT",
        ));
    }

    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ApiError::bad_request(
            format!("Message is too long (max {} characters)", MAX_MESSAGE_LENGTH),
            "INVALID_INPUT",
        ));
    }

    let mut conn = get_db_conn(&state.db_pool)?;

    let m = load_match_for_participant(&mut conn, match_id, user_id)?;

    let message: Message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            match_id: m.id,
            sender_id: user_id,
            content: content.to_string(),
        })
        .get_result(&mut conn)
        .map_err(|e| {
            error!(error = %e, match_id = %m.id, "Failed to insert message");
            ApiError::db_error()
        })?;

    info!(match_id = %m.id, sender_id = %user_id, "Message sent");

    Ok((StatusCode::CREATED, Json(SendMessageResponse { message })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_limit_counts_characters_not_bytes() {
        // 1000 umlauts are 2000 bytes but exactly at the character cap.
        let content = "ä".repeat(MAX_MESSAGE_LENGTH);
        assert!(content.chars().count() <= MAX_MESSAGE_LENGTH);
        assert!(content.len() > MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn send_request_accepts_camel_case() {
        let req: SendMessageRequest = serde_json::from_str(
            r#"{"matchId":"550e8400-e29b-41d4-a716-446655440000","content":"hi"}"#,
        )
        .unwrap();
        assert!(req.match_id.is_some());
        assert_eq!(req.content.as_deref(), Some("hi"));
    }
}
