//! Project management handlers.
//!
//! Projects are owner-scoped: anyone authenticated can create one, only the
//! owner can edit or delete it. Feed visibility lives in the feed handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::jwt::Claims,
    error::{get_db_conn, ApiError, ApiResult},
    models::{NewProject, Project, ProjectChanges, ProjectStatus},
    schema::projects,
    AppState,
};

pub const MAX_TITLE_LENGTH: usize = 120;
pub const MAX_TEASER_LENGTH: usize = 500;
pub const MAX_CATEGORIES: usize = 10;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    #[schema(example = "Plant-watering reminder bot")]
    pub title: Option<String>,
    #[schema(example = "Telegram bot that nags you before your ficus dies")]
    pub teaser: Option<String>,
    #[schema(example = json!(["DevTools", "IoT"]))]
    pub categories: Option<Vec<String>>,
    #[schema(example = "open")]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    /// An empty string clears the teaser.
    pub teaser: Option<String>,
    pub categories: Option<Vec<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateProjectResponse {
    #[schema(example = true)]
    pub ok: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectsListResponse {
    pub items: Vec<Project>,
}

fn parse_status(raw: &str) -> Option<ProjectStatus> {
    match raw {
        "open" => Some(ProjectStatus::Open),
        "seeking_help" => Some(ProjectStatus::SeekingHelp),
        "offering_help" => Some(ProjectStatus::OfferingHelp),
        _ => None,
    }
}

fn validate_title(raw: &str) -> ApiResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required", "INVALID_INPUT"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::bad_request(
            format!("Title is too long (max {} characters)", MAX_TITLE_LENGTH),
            "INVALID_INPUT",
        ));
    }
    Ok(title.to_string())
}

/// Categories keep their submitted order; blank entries are dropped.
fn validate_categories(raw: Vec<String>) -> ApiResult<Vec<String>> {
    let categories: Vec<String> = raw
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if categories.len() > MAX_CATEGORIES {
        return Err(ApiError::bad_request(
            format!("Too many categories (max {})", MAX_CATEGORIES),
            "INVALID_INPUT",
        ));
    }

    Ok(categories)
}

fn validate_teaser(raw: &str) -> ApiResult<Option<String>> {
    let teaser = raw.trim();
    if teaser.is_empty() {
        return Ok(None);
    }
    if teaser.chars().count() > MAX_TEASER_LENGTH {
        return Err(ApiError::bad_request(
            format!("Teaser is too long (max {} characters)", MAX_TEASER_LENGTH),
            "INVALID_INPUT",
        ));
    }
    Ok(Some(teaser.to_string()))
}

#[utoipa::path(
    post,
    path = "/projects/create",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Project created", body = CreateProjectResponse),
        (status = 400, description = "Validation error", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<Json<CreateProjectResponse>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let title = validate_title(payload.title.as_deref().unwrap_or(""))?;

    let Some(status) = payload.status.as_deref().and_then(parse_status) else {
        return Err(ApiError::bad_request(
            "status must be one of \"open\", \"seeking_help\", \"offering_help\"",
            "INVALID_INPUT",
        ));
    };

    let Some(raw_categories) = payload.categories else {
        return Err(ApiError::bad_request(
            "categories must be an array",
            "INVALID_INPUT",
        ));
    };
    let categories = validate_categories(raw_categories)?;

    let teaser = match payload.teaser.as_deref() {
        Some(raw) => validate_teaser(raw)?,
        None => None,
    };

    let mut conn = get_db_conn(&state.db_pool)?;

    let project: Project = diesel::insert_into(projects::table)
        .values(&NewProject {
            owner_id: user_id,
            title,
            teaser,
            categories,
            status,
        })
        .get_result(&mut conn)
        .map_err(|e| {
            error!(error = %e, owner_id = %user_id, "Project creation failed");
            ApiError::db_error()
        })?;

    info!(project_id = %project.id, owner_id = %user_id, "Created project");

    Ok(Json(CreateProjectResponse { ok: true }))
}

#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "The caller's own projects, newest first", body = ProjectsListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_own_projects(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<ProjectsListResponse>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let items: Vec<Project> = projects::table
        .filter(projects::owner_id.eq(user_id))
        .order(projects::created_at.desc())
        .select(Project::as_select())
        .load(&mut conn)
        .map_err(|_| ApiError::db_error())?;

    Ok(Json(ProjectsListResponse { items }))
}

fn load_owned_project(
    conn: &mut PgConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Project> {
    let project: Option<Project> = projects::table
        .filter(projects::id.eq(project_id))
        .select(Project::as_select())
        .first(conn)
        .optional()
        .map_err(|_| ApiError::db_error())?;

    let Some(project) = project else {
        return Err(ApiError::not_found(
            "Project not found",
            "PROJECT_NOT_FOUND",
        ));
    };

    if project.owner_id != user_id {
        return Err(ApiError::forbidden(
            "Only the owner can modify a project",
            "NOT_PROJECT_OWNER",
        ));
    }

    Ok(project)
}

#[utoipa::path(
    put,
    path = "/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project to update")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated project", body = Project),
        (status = 400, description = "Validation error", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Not the owner", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    if payload.title.is_none()
        && payload.teaser.is_none()
        && payload.categories.is_none()
        && payload.status.is_none()
    {
        return Err(ApiError::bad_request(
            "No fields to update",
            "INVALID_INPUT",
        ));
    }

    let title = match payload.title.as_deref() {
        Some(raw) => Some(validate_title(raw)?),
        None => None,
    };

    let teaser = match payload.teaser.as_deref() {
        Some(raw) => Some(validate_teaser(raw)?),
        None => None,
    };

    let categories = match payload.categories {
        Some(raw) => Some(validate_categories(raw)?),
        None => None,
    };

    let status = match payload.status.as_deref() {
        Some(raw) => match parse_status(raw) {
            Some(status) => Some(status),
            None => {
                return Err(ApiError::bad_request(
                    "status must be one of \"open\", \"seeking_help\", \"offering_help\"",
                    "INVALID_INPUT",
                ));
            }
        },
        None => None,
    };

    let mut conn = get_db_conn(&state.db_pool)?;

    let project = load_owned_project(&mut conn, project_id, user_id)?;

    let changes = ProjectChanges {
        title,
        teaser,
        categories,
        status,
    };

    let updated: Project = diesel::update(projects::table.filter(projects::id.eq(project.id)))
        .set((&changes, projects::updated_at.eq(Utc::now().naive_utc())))
        .get_result(&mut conn)
        .map_err(|e| {
            error!(error = %e, project_id = %project.id, "Project update failed");
            ApiError::db_error()
        })?;

    info!(project_id = %updated.id, owner_id = %user_id, "Updated project");

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project to delete")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Not the owner", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::bad_request("Invalid user ID in token", "INVALID_USER_ID"))?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let project = load_owned_project(&mut conn, project_id, user_id)?;

    diesel::delete(projects::table.filter(projects::id.eq(project.id)))
        .execute(&mut conn)
        .map_err(|e| {
            error!(error = %e, project_id = %project.id, "Project deletion failed");
            ApiError::db_error()
        })?;

    info!(project_id = %project.id, owner_id = %user_id, "Deleted project");

    Ok(StatusCode::NO_CONTENT)
}
