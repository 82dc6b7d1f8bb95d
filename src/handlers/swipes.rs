//! Swipe recording, quota stats and the likes list.
//!
//! A swipe is immutable: the unique constraint on (swiper_id, project_id) is
//! the only arbiter between concurrent attempts, and a violation surfaces as
//! a benign 409. Match creation rides in the same transaction as the swipe
//! insert, with the unique constraint on matches as the concurrency backstop.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::jwt::Claims,
    error::{get_db_conn, ApiError, ApiResult},
    handlers::feed::ProjectSummary,
    models::{NewMatch, NewSwipe, Project, SwipeDirection},
    pagination::PageParams,
    schema::{matches, profiles, projects, swipes, users},
    AppState,
};

/// Request fields are validated by hand so malformed input yields a 400 with
/// a stable code rather than a body-rejection status.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub project_id: Option<Uuid>,
    #[schema(example = "like")]
    pub direction: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SwipeResponse {
    #[schema(example = true)]
    pub ok: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwipeStatsResponse {
    #[schema(example = 3)]
    pub today_swipes: i64,
    #[schema(example = 10)]
    pub max_daily_swipes: i64,
    #[schema(example = 7)]
    pub remaining_swipes: i64,
    #[schema(example = false)]
    pub limit_reached: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikedProject {
    #[serde(flatten)]
    pub project: ProjectSummary,
    pub liked_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikesResponse {
    pub items: Vec<LikedProject>,
}

fn today_start_utc() -> chrono::NaiveDateTime {
    // Quota days roll over at midnight UTC; the server is the quota authority.
    Utc::now().date_naive().and_time(NaiveTime::MIN)
}

fn count_swipes_today(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<i64> {
    swipes::table
        .filter(swipes::swiper_id.eq(user_id))
        .filter(swipes::created_at.ge(today_start_utc()))
        .count()
        .get_result(conn)
}

#[utoipa::path(
    post,
    path = "/swipes",
    tag = "Swipes",
    request_body = SwipeRequest,
    responses(
        (status = 201, description = "Decision recorded", body = SwipeResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
        (status = 409, description = "Already swiped", body = crate::error::ApiError),
        (status = 429, description = "Daily swipe limit reached", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn record_swipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SwipeRequest>,
) -> ApiResult<(StatusCode, Json<SwipeResponse>)> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let Some(project_id) = payload.project_id else {
        return Err(ApiError::bad_request(
            "projectId is required",
            "INVALID_INPUT",
        ));
    };

    let direction = match payload.direction.as_deref() {
        Some("like") => SwipeDirection::Like,
        Some("skip") => SwipeDirection::Skip,
        _ => {
            return Err(ApiError::bad_request(
                "direction must be \"like\" or \"skip\"",
                "INVALID_INPUT",
            ));
        }
    };

    let mut conn = get_db_conn(&state.db_pool)?;

    let owner_id: Option<Uuid> = projects::table
        .filter(projects::id.eq(project_id))
        .select(projects::owner_id)
        .first(&mut conn)
        .optional()
        .map_err(|_| ApiError::db_error())?;

    let Some(owner_id) = owner_id else {
        return Err(ApiError::not_found(
            "Project not found",
            "PROJECT_NOT_FOUND",
        ));
    };

    if owner_id == user_id {
        return Err(ApiError::bad_request(
            "Cannot swipe your own project",
            "OWN_PROJECT",
        ));
    }

    let today_swipes = count_swipes_today(&mut conn, user_id).map_err(|e| {
        error!(error = %e, user_id = %user_id, "Failed to count daily swipes");
        ApiError::db_error()
    })?;

    if today_swipes >= state.max_daily_swipes {
        info!(user_id = %user_id, today_swipes, "Daily swipe limit reached");
        return Err(ApiError::rate_limited("Daily swipe limit reached", "LIMIT"));
    }

    // Swipe and (on reciprocity) match commit together or not at all.
    let matched = conn
        .transaction(|conn| {
            diesel::insert_into(swipes::table)
                .values(&NewSwipe {
                    swiper_id: user_id,
                    project_id,
                    direction,
                })
                .execute(conn)?;

            if direction != SwipeDirection::Like {
                return Ok(false);
            }

            let reciprocal: bool = diesel::select(exists(
                swipes::table
                    .inner_join(projects::table.on(projects::id.eq(swipes::project_id)))
                    .filter(swipes::swiper_id.eq(owner_id))
                    .filter(swipes::direction.eq(SwipeDirection::Like))
                    .filter(projects::owner_id.eq(user_id)),
            ))
            .get_result(conn)?;

            if !reciprocal {
                return Ok(false);
            }

            // The unique constraint on (user_a_id, user_b_id, project_id)
            // makes this a no-op when a concurrent reciprocal like won.
            let inserted = diesel::insert_into(matches::table)
                .values(&NewMatch::for_pair(user_id, owner_id, project_id))
                .on_conflict_do_nothing()
                .execute(conn)?;

            Ok::<_, DieselError>(inserted > 0)
        })
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ApiError::conflict("Already swiped on this project", "ALREADY_SWIPED")
            }
            _ => {
                error!(error = %e, user_id = %user_id, project_id = %project_id, "Swipe insert failed");
                ApiError::db_error()
            }
        })?;

    if matched {
        info!(user_id = %user_id, other_user_id = %owner_id, project_id = %project_id, "Reciprocal like created a match");
    } else {
        info!(user_id = %user_id, project_id = %project_id, direction = direction.as_str(), "Swipe recorded");
    }

    Ok((StatusCode::CREATED, Json(SwipeResponse { ok: true })))
}

#[utoipa::path(
    get,
    path = "/swipes",
    tag = "Swipes",
    responses(
        (status = 200, description = "Today's swipe usage", body = SwipeStatsResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn swipe_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<SwipeStatsResponse>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let today_swipes = count_swipes_today(&mut conn, user_id).map_err(|e| {
        error!(error = %e, user_id = %user_id, "Failed to count daily swipes");
        ApiError::db_error()
    })?;

    let max = state.max_daily_swipes;

    Ok(Json(SwipeStatsResponse {
        today_swipes,
        max_daily_swipes: max,
        remaining_swipes: (max - today_swipes).max(0),
        limit_reached: today_swipes >= max,
    }))
}

#[utoipa::path(
    get,
    path = "/likes",
    tag = "Swipes",
    params(PageParams),
    responses(
        (status = 200, description = "Projects the caller liked, newest first", body = LikesResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_likes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<LikesResponse>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let mut conn = get_db_conn(&state.db_pool)?;
    let (limit, offset) = page.limit_offset();

    let rows: Vec<(chrono::NaiveDateTime, Project, String, Option<String>)> = swipes::table
        .inner_join(projects::table.on(projects::id.eq(swipes::project_id)))
        .inner_join(users::table.on(users::id.eq(projects::owner_id)))
        .left_join(profiles::table.on(profiles::id.eq(projects::owner_id)))
        .filter(swipes::swiper_id.eq(user_id))
        .filter(swipes::direction.eq(SwipeDirection::Like))
        .order(swipes::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select((
            swipes::created_at,
            Project::as_select(),
            users::email,
            profiles::name.nullable(),
        ))
        .load(&mut conn)
        .map_err(|_| ApiError::db_error())?;

    let items = rows
        .into_iter()
        .map(|(liked_at, project, email, name)| LikedProject {
            project: ProjectSummary::new(project, email, name),
            liked_at,
        })
        .collect();

    Ok(Json(LikesResponse { items }))
}
