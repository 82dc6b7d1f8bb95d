//! OpenAPI documentation configuration.
//!
//! Generates the OpenAPI specification with `utoipa` and serves it via
//! Swagger UI.

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::handlers::auth::{
    AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest, SessionResponse,
    UserResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ProjectHunt API",
        version = "1.0.0",
        description = "Swipe-to-match API for side projects.\n\n\
        ## Features\n\
        - Profiles and project listings\n\
        - A swipe feed of projects you have not decided on yet\n\
        - A daily swipe quota with an upsell path past it\n\
        - Matches on reciprocal likes, with chat between the two users\n\n\
        ## Authentication\n\
        Most endpoints require a JWT bearer token.\n\
        1. Register or login to get an access token\n\
        2. Include the token in requests: `Authorization: Bearer <token>`\n\
        3. Use the refresh token to get new access tokens when expired",
        contact(
            name = "ProjectHunt API Support"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "User authentication and token management"),
        (name = "Profiles", description = "Onboarding profile upsert and the committed profile"),
        (name = "Projects", description = "Owner-scoped project management"),
        (name = "Feed", description = "The swipe feed"),
        (name = "Swipes", description = "Swipe decisions, quota stats and likes"),
        (name = "Chats", description = "Matches and chat messages"),
        (name = "Billing", description = "Payment provider configuration passthrough")
    ),
    paths(
        crate::handlers::health::health_check_simple,
        crate::handlers::health::health_check,
        crate::handlers::health::ready_check,
        crate::handlers::health::live_check,

        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh_token,
        crate::handlers::auth::logout,
        crate::handlers::auth::session_introspect,

        crate::handlers::profiles::bootstrap_profile,
        crate::handlers::profiles::get_my_profile,

        crate::handlers::feed::get_feed,

        crate::handlers::swipes::record_swipe,
        crate::handlers::swipes::swipe_stats,
        crate::handlers::swipes::list_likes,

        crate::handlers::chats::list_chats,
        crate::handlers::messages::list_messages,
        crate::handlers::messages::send_message,

        crate::handlers::projects::create_project,
        crate::handlers::projects::list_own_projects,
        crate::handlers::projects::update_project,
        crate::handlers::projects::delete_project,

        crate::handlers::billing::billing_config,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            RefreshResponse,
            AuthResponse,
            UserResponse,
            SessionResponse,
            ApiError,

            crate::models::Profile,
            crate::models::Project,
            crate::models::ProjectStatus,
            crate::models::SwipeDirection,
            crate::models::Match,
            crate::models::Message,

            crate::handlers::profiles::BootstrapProfileRequest,
            crate::handlers::profiles::BootstrapProfileResponse,

            crate::handlers::feed::ProjectSummary,
            crate::handlers::feed::FeedResponse,

            crate::handlers::swipes::SwipeRequest,
            crate::handlers::swipes::SwipeResponse,
            crate::handlers::swipes::SwipeStatsResponse,
            crate::handlers::swipes::LikedProject,
            crate::handlers::swipes::LikesResponse,

            crate::handlers::chats::ChatItem,
            crate::handlers::chats::LastMessage,
            crate::handlers::chats::ChatsResponse,

            crate::handlers::messages::SendMessageRequest,
            crate::handlers::messages::MessagesListResponse,
            crate::handlers::messages::SendMessageResponse,

            crate::handlers::projects::CreateProjectRequest,
            crate::handlers::projects::UpdateProjectRequest,
            crate::handlers::projects::CreateProjectResponse,
            crate::handlers::projects::ProjectsListResponse,

            crate::handlers::billing::BillingConfigResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "JWT access token obtained from /auth/login or /auth/register.\n\
                            Include in requests as: `Authorization: Bearer <token>`",
                        ))
                        .build(),
                ),
            );
        }

        openapi.security = Some(vec![]);
    }
}

pub fn swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "ProjectHunt API");
        assert_eq!(spec.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_has_security_scheme() {
        let spec = ApiDoc::openapi();
        assert!(spec.components.is_some());
        let components = spec.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_openapi_has_tags() {
        let spec = ApiDoc::openapi();
        assert!(spec.tags.is_some());
        let tags = spec.tags.unwrap();
        assert!(tags.iter().any(|t| t.name == "Authentication"));
        assert!(tags.iter().any(|t| t.name == "Swipes"));
        assert!(tags.iter().any(|t| t.name == "Chats"));
    }
}
