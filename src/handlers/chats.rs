//! Match listing for the chat overview screen.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::jwt::Claims,
    error::{get_db_conn, ApiError, ApiResult},
    models::{Match, Message},
    pagination::PageParams,
    schema::{matches, messages, profiles, projects, users},
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatItem {
    /// Match id; messages are fetched and sent against it.
    pub id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "Plant-watering reminder bot")]
    pub project_title: String,
    pub other_user_id: Uuid,
    #[schema(example = "Bob Example")]
    pub other_user_name: String,
    pub created_at: chrono::NaiveDateTime,
    pub last_message: Option<LastMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LastMessage {
    pub sender_id: Uuid,
    #[schema(example = "Hey, love the idea!")]
    pub content: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatsResponse {
    pub items: Vec<ChatItem>,
}

#[utoipa::path(
    get,
    path = "/chats",
    tag = "Chats",
    params(PageParams),
    responses(
        (status = 200, description = "The caller's matches, newest first", body = ChatsResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<ChatsResponse>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let mut conn = get_db_conn(&state.db_pool)?;
    let (limit, offset) = page.limit_offset();

    let match_rows: Vec<Match> = matches::table
        .filter(
            matches::user_a_id
                .eq(user_id)
                .or(matches::user_b_id.eq(user_id)),
        )
        .order(matches::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Match::as_select())
        .load(&mut conn)
        .map_err(|_| ApiError::db_error())?;

    let other_ids: Vec<Uuid> = match_rows
        .iter()
        .map(|m| if m.user_a_id == user_id { m.user_b_id } else { m.user_a_id })
        .collect();
    let project_ids: Vec<Uuid> = match_rows.iter().map(|m| m.project_id).collect();

    let names: HashMap<Uuid, String> = profiles::table
        .filter(profiles::id.eq_any(&other_ids))
        .select((profiles::id, profiles::name))
        .load::<(Uuid, String)>(&mut conn)
        .map_err(|_| ApiError::db_error())?
        .into_iter()
        .collect();

    let emails: HashMap<Uuid, String> = users::table
        .filter(users::id.eq_any(&other_ids))
        .select((users::id, users::email))
        .load::<(Uuid, String)>(&mut conn)
        .map_err(|_| ApiError::db_error())?
        .into_iter()
        .collect();

    let titles: HashMap<Uuid, String> = projects::table
        .filter(projects::id.eq_any(&project_ids))
        .select((projects::id, projects::title))
        .load::<(Uuid, String)>(&mut conn)
        .map_err(|_| ApiError::db_error())?
        .into_iter()
        .collect();

    let mut items = Vec::with_capacity(match_rows.len());
    for m in match_rows {
        let other_user_id = if m.user_a_id == user_id {
            m.user_b_id
        } else {
            m.user_a_id
        };

        let other_user_name = names.get(&other_user_id).cloned().unwrap_or_else(|| {
            let email = emails.get(&other_user_id).map(String::as_str).unwrap_or("");
            email.split('@').next().unwrap_or(email).to_string()
        });

        let last_message: Option<Message> = messages::table
            .filter(messages::match_id.eq(m.id))
            .order(messages::created_at.desc())
            .select(Message::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|_| ApiError::db_error())?;

        items.push(ChatItem {
            id: m.id,
            project_id: m.project_id,
            project_title: titles.get(&m.project_id).cloned().unwrap_or_default(),
            other_user_id,
            other_user_name,
            created_at: m.created_at,
            last_message: last_message.map(|msg| LastMessage {
                sender_id: msg.sender_id,
                content: msg.content,
                created_at: msg.created_at,
            }),
        });
    }

    Ok(Json(ChatsResponse { items }))
}
