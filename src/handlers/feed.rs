//! Swipe feed handler.
//!
//! The feed is the paginated set of projects the caller has not decided on
//! yet. An empty page is the normal end state of a swipe session, not an
//! error.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use diesel::dsl::{exists, not};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::jwt::Claims,
    error::{get_db_conn, ApiError, ApiResult},
    models::{Project, ProjectStatus},
    pagination::PageParams,
    schema::{profiles, projects, swipes, users},
    AppState,
};

/// A project as shown on a swipe card or in a likes list. Persisted columns
/// keep their snake_case names on the wire.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Plant-watering reminder bot")]
    pub title: String,
    pub teaser: Option<String>,
    #[schema(example = json!(["DevTools", "IoT"]))]
    pub categories: Vec<String>,
    pub status: ProjectStatus,
    pub created_at: chrono::NaiveDateTime,
    #[schema(example = "Alice Example")]
    pub owner_name: String,
}

impl ProjectSummary {
    /// Owners who skipped onboarding have no profile row; fall back to the
    /// local part of their email.
    pub fn new(project: Project, owner_email: String, profile_name: Option<String>) -> Self {
        let owner_name = profile_name.unwrap_or_else(|| {
            owner_email
                .split('@')
                .next()
                .unwrap_or(owner_email.as_str())
                .to_string()
        });

        Self {
            id: project.id,
            owner_id: project.owner_id,
            title: project.title,
            teaser: project.teaser,
            categories: project.categories,
            status: project.status,
            created_at: project.created_at,
            owner_name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedResponse {
    pub items: Vec<ProjectSummary>,
}

#[utoipa::path(
    get,
    path = "/feed",
    tag = "Feed",
    params(PageParams),
    responses(
        (status = 200, description = "Swipeable projects, newest first", body = FeedResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<FeedResponse>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let mut conn = get_db_conn(&state.db_pool)?;
    let (limit, offset) = page.limit_offset();

    let rows: Vec<(Project, String, Option<String>)> = projects::table
        .inner_join(users::table.on(users::id.eq(projects::owner_id)))
        .left_join(profiles::table.on(profiles::id.eq(projects::owner_id)))
        .filter(projects::owner_id.ne(user_id))
        .filter(not(exists(
            swipes::table
                .filter(swipes::project_id.eq(projects::id))
                .filter(swipes::swiper_id.eq(user_id)),
        )))
        .order(projects::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select((
            Project::as_select(),
            users::email,
            profiles::name.nullable(),
        ))
        .load(&mut conn)
        .map_err(|_| ApiError::db_error())?;

    let items = rows
        .into_iter()
        .map(|(project, email, name)| ProjectSummary::new(project, email, name))
        .collect();

    Ok(Json(FeedResponse { items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(owner_id: Uuid) -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id,
            title: "Test".to_string(),
            teaser: None,
            categories: vec!["DevTools".to_string()],
            status: ProjectStatus::Open,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn summary_prefers_profile_name() {
        let owner = Uuid::new_v4();
        let summary = ProjectSummary::new(
            project(owner),
            "alice@example.com".to_string(),
            Some("Alice Example".to_string()),
        );
        assert_eq!(summary.owner_name, "Alice Example");
    }

    #[test]
    fn summary_falls_back_to_email_local_part() {
        let owner = Uuid::new_v4();
        let summary = ProjectSummary::new(project(owner), "bob@example.com".to_string(), None);
        assert_eq!(summary.owner_name, "bob");
    }

    #[test]
    fn summary_keeps_category_order() {
        let owner = Uuid::new_v4();
        let mut p = project(owner);
        p.categories = vec!["B".to_string(), "A".to_string(), "C".to_string()];
        let summary = ProjectSummary::new(p, "x@example.com".to_string(), None);
        assert_eq!(summary.categories, vec!["B", "A", "C"]);
    }
}
