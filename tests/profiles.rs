//! Profile onboarding integration tests.

mod common;

use common::{create_test_user, TestApp};
use serde_json::json;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn bootstrap_creates_then_updates_profile() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = app
        .register_user(&TestApp::unique_email(), "password123", None)
        .await
        .expect("Failed to register user");

    // No profile before onboarding
    let response = app.get("/profiles/me", &user.access_token).await;
    assert_eq!(response.status().as_u16(), 404);

    // Act - first upsert creates
    let response = app
        .post(
            "/auth/bootstrap-profile",
            &user.access_token,
            json!({
                "name": "Alice Example",
                "location": "Berlin",
                "about": "Building small tools"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["ok"].as_bool().unwrap());

    // Second upsert updates in place
    let response = app
        .post(
            "/auth/bootstrap-profile",
            &user.access_token,
            json!({
                "name": "Alice Renamed",
                "location": "Hamburg"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    // Assert
    let response = app.get("/profiles/me", &user.access_token).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"].as_str().unwrap(), "Alice Renamed");
    assert_eq!(body["location"].as_str().unwrap(), "Hamburg");
    assert_eq!(body["id"].as_str().unwrap(), user.id.to_string());
}

#[tokio::test]
#[serial]
async fn bootstrap_requires_a_name() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post(
            "/auth/bootstrap-profile",
            &user.access_token,
            json!({ "name": "   ", "location": "Berlin" }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"].as_str().unwrap(), "INVALID_INPUT");
}

#[tokio::test]
#[serial]
async fn bootstrap_trims_whitespace() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = app
        .register_user(&TestApp::unique_email(), "password123", None)
        .await
        .expect("Failed to register user");

    // Act
    let response = app
        .post(
            "/auth/bootstrap-profile",
            &user.access_token,
            json!({ "name": "  Spaced Out  ", "location": "  " }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    // Assert - name trimmed, blank location stored as null
    let response = app.get("/profiles/me", &user.access_token).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"].as_str().unwrap(), "Spaced Out");
    assert!(body["location"].is_null());
}

#[tokio::test]
#[serial]
async fn bootstrap_requires_authentication() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app
        .post_public("/auth/bootstrap-profile", json!({ "name": "Nobody" }))
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}
