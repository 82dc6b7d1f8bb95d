//! Project management integration tests.
//!
//! These tests verify project creation, listing, validation, editing, and
//! owner-only access control.

mod common;

use common::{create_test_user, TestApp};
use serde_json::json;
use serial_test::serial;

// ============================================================================
// Project Creation Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn create_project_returns_ok_for_valid_data() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post(
            "/projects/create",
            &user.access_token,
            json!({
                "title": "Plant-watering reminder bot",
                "teaser": "Telegram bot that nags you before your ficus dies",
                "categories": ["DevTools", "IoT"],
                "status": "open"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["ok"].as_bool().unwrap());
}

#[tokio::test]
#[serial]
async fn created_project_round_trips_through_listing() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post(
            "/projects/create",
            &user.access_token,
            json!({
                "title": "Recipe scaler",
                "teaser": "Scales ingredient lists to any serving count",
                "categories": ["Food", "Web", "API"],
                "status": "seeking_help"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    // Assert - title, teaser, category order and status all survive
    let response = app.get("/projects", &user.access_token).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let item = &body["items"][0];
    assert_eq!(item["title"].as_str().unwrap(), "Recipe scaler");
    assert_eq!(
        item["teaser"].as_str().unwrap(),
        "Scales ingredient lists to any serving count"
    );
    assert_eq!(
        item["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c.as_str().unwrap())
            .collect::<Vec<_>>(),
        vec!["Food", "Web", "API"]
    );
    assert_eq!(item["status"].as_str().unwrap(), "seeking_help");
    assert_eq!(item["owner_id"].as_str().unwrap(), user.id.to_string());
}

#[tokio::test]
#[serial]
async fn create_project_works_without_teaser() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post(
            "/projects/create",
            &user.access_token,
            json!({
                "title": "No teaser here",
                "categories": [],
                "status": "open"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let response = app.get("/projects", &user.access_token).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"][0]["teaser"].is_null());
}

#[tokio::test]
#[serial]
async fn create_project_rejects_missing_title() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post(
            "/projects/create",
            &user.access_token,
            json!({
                "title": "   ",
                "categories": [],
                "status": "open"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"].as_str().unwrap(), "INVALID_INPUT");
}

#[tokio::test]
#[serial]
async fn create_project_rejects_unknown_status() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post(
            "/projects/create",
            &user.access_token,
            json!({
                "title": "Valid title",
                "categories": [],
                "status": "in_arbeit"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[serial]
async fn create_project_rejects_missing_categories() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .post(
            "/projects/create",
            &user.access_token,
            json!({
                "title": "Valid title",
                "status": "open"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

// ============================================================================
// Project Listing Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn listing_shows_only_own_projects_newest_first() {
    // Arrange
    let app = TestApp::spawn().await;
    let alice = create_test_user(&app).await;
    let bob = create_test_user(&app).await;

    app.create_project(&alice, "Alice first", None, &["A"], "open")
        .await;
    app.create_project(&alice, "Alice second", None, &["A"], "open")
        .await;
    app.create_project(&bob, "Bob's project", None, &["B"], "open")
        .await;

    // Act
    let response = app.get("/projects", &alice.access_token).await;

    // Assert
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alice second", "Alice first"]);
}

// ============================================================================
// Project Update Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn owner_can_update_project() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;
    let project_id = app
        .create_project(&user, "Old title", Some("Old teaser"), &["A"], "open")
        .await;

    // Act
    let response = app
        .put(
            &format!("/projects/{}", project_id),
            &user.access_token,
            json!({
                "title": "New title",
                "status": "offering_help"
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["title"].as_str().unwrap(), "New title");
    assert_eq!(body["status"].as_str().unwrap(), "offering_help");
    // Untouched fields survive
    assert_eq!(body["teaser"].as_str().unwrap(), "Old teaser");
}

#[tokio::test]
#[serial]
async fn update_with_empty_teaser_clears_it() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;
    let project_id = app
        .create_project(&user, "Title", Some("Teaser"), &["A"], "open")
        .await;

    // Act
    let response = app
        .put(
            &format!("/projects/{}", project_id),
            &user.access_token,
            json!({ "teaser": "" }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["teaser"].is_null());
}

#[tokio::test]
#[serial]
async fn non_owner_cannot_update_project() {
    // Arrange
    let app = TestApp::spawn().await;
    let owner = create_test_user(&app).await;
    let stranger = create_test_user(&app).await;
    let project_id = app
        .create_project(&owner, "Owned", None, &["A"], "open")
        .await;

    // Act
    let response = app
        .put(
            &format!("/projects/{}", project_id),
            &stranger.access_token,
            json!({ "title": "Hijacked" }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 403);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"].as_str().unwrap(), "NOT_PROJECT_OWNER");
}

#[tokio::test]
#[serial]
async fn update_unknown_project_is_404() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app
        .put(
            &format!("/projects/{}", uuid::Uuid::new_v4()),
            &user.access_token,
            json!({ "title": "Ghost" }),
        )
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

// ============================================================================
// Project Deletion Tests
// ============================================================================

#[tokio::test]
#[serial]
async fn owner_can_delete_project() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;
    let project_id = app
        .create_project(&user, "Doomed", None, &["A"], "open")
        .await;

    // Act
    let response = app
        .delete(&format!("/projects/{}", project_id), &user.access_token)
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 204);

    let response = app.get("/projects", &user.access_token).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn non_owner_cannot_delete_project() {
    // Arrange
    let app = TestApp::spawn().await;
    let owner = create_test_user(&app).await;
    let stranger = create_test_user(&app).await;
    let project_id = app
        .create_project(&owner, "Safe", None, &["A"], "open")
        .await;

    // Act
    let response = app
        .delete(&format!("/projects/{}", project_id), &stranger.access_token)
        .await;

    // Assert
    assert_eq!(response.status().as_u16(), 403);
}
