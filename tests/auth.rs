//! Authentication integration tests.
//!
//! These tests verify registration, login, token refresh, logout, and the
//! session introspection endpoint.

mod common;

use common::{create_test_user, TestApp};
use serde_json::json;
use serial_test::serial;

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn register_creates_user_and_returns_tokens() {
    // Arrange
    let app = TestApp::spawn().await;
    let email = TestApp::unique_email();

    // Act
    let response = app
        .post_public(
            "/auth/register",
            json!({
                "email": email,
                "password": "password123",
                "name": "Alice Example"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["email"].as_str().unwrap(), email);
    assert!(body["user"]["is_active"].as_bool().unwrap());
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn register_with_name_creates_profile() {
    // Arrange
    let app = TestApp::spawn().await;
    let email = TestApp::unique_email();

    // Act
    let user = app
        .register_user(&email, "password123", Some("Named User"))
        .await
        .expect("Registration should succeed");

    // Assert
    let response = app.get("/profiles/me", &user.access_token).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"].as_str().unwrap(), "Named User");
}

#[tokio::test]
#[serial]
async fn register_rejects_duplicate_email() {
    // Arrange
    let app = TestApp::spawn().await;
    let email = TestApp::unique_email();
    app.register_user(&email, "password123", None)
        .await
        .expect("First registration should succeed");

    // Act
    let response = app
        .post_public(
            "/auth/register",
            json!({
                "email": email,
                "password": "password456"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 409);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"].as_str().unwrap(), "USER_EXISTS");
}

#[tokio::test]
#[serial]
async fn register_rejects_invalid_email() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app
        .post_public(
            "/auth/register",
            json!({
                "email": "not-an-email",
                "password": "password123"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[serial]
async fn register_rejects_short_password() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app
        .post_public(
            "/auth/register",
            json!({
                "email": TestApp::unique_email(),
                "password": "short"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn login_succeeds_with_valid_credentials() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let logged_in = app
        .login_user(&user.email, &user.password)
        .await
        .expect("Login should succeed");

    // Assert
    assert_eq!(logged_in.id, user.id);
    assert!(!logged_in.access_token.is_empty());
}

#[tokio::test]
#[serial]
async fn login_fails_with_wrong_password() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post_public(
            "/auth/login",
            json!({
                "email": user.email,
                "password": "wrong-password"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 401);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"].as_str().unwrap(), "INVALID_CREDENTIALS");
}

#[tokio::test]
#[serial]
async fn login_fails_for_unknown_user() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app
        .post_public(
            "/auth/login",
            json!({
                "email": TestApp::unique_email(),
                "password": "password123"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

// ============================================================================
// Token Refresh Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn refresh_rotates_tokens() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post_public(
            "/auth/refresh",
            json!({ "refresh_token": user.refresh_token }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let new_refresh = body["refresh_token"].as_str().unwrap();
    assert!(!new_refresh.is_empty());
    assert_ne!(new_refresh, user.refresh_token);

    // The old token was rotated out and must no longer work.
    let response = app
        .post_public(
            "/auth/refresh",
            json!({ "refresh_token": user.refresh_token }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
#[serial]
async fn refresh_rejects_garbage_token() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app
        .post_public("/auth/refresh", json!({ "refresh_token": "not.a.token" }))
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

// ============================================================================
// Logout Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn logout_invalidates_refresh_token() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post_public(
            "/auth/logout",
            json!({ "refresh_token": user.refresh_token }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .post_public(
            "/auth/refresh",
            json!({ "refresh_token": user.refresh_token }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 401);
}

// ============================================================================
// Session Introspection Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn session_introspection_reports_authenticated_user() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app.get("/auth/me", &user.access_token).await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["hasUser"].as_bool().unwrap());
    assert_eq!(body["userId"].as_str().unwrap(), user.id.to_string());
    assert_eq!(body["userEmail"].as_str().unwrap(), user.email);
}

#[tokio::test]
#[serial]
async fn session_introspection_is_200_without_a_session() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/auth/me").await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(!body["hasUser"].as_bool().unwrap());
    assert!(body["userId"].is_null());
    assert!(body["userEmail"].is_null());
}

#[tokio::test]
#[serial]
async fn protected_endpoints_require_a_token() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act & Assert
    for path in ["/feed", "/swipes", "/chats", "/likes", "/projects"] {
        let response = app.get_public(path).await;
        assert_eq!(
            response.status().as_u16(),
            401,
            "Expected 401 for unauthenticated GET {}",
            path
        );
    }
}
