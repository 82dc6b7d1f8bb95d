//! Health check endpoint integration tests.
//!
//! These tests verify that the application starts correctly and the health
//! endpoints are reachable without a session.

mod common;

use common::TestApp;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn health_check_returns_ok() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/health").await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await.expect("Failed to read response body");
    assert_eq!(body, "OK");
}

#[tokio::test]
#[serial]
async fn health_status_names_the_service() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/health/status").await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"].as_str().unwrap(), "healthy");
    assert_eq!(body["service"].as_str().unwrap(), "projecthunt");
}

#[tokio::test]
#[serial]
async fn liveness_and_readiness_are_public() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act & Assert - no Authorization header anywhere
    let response = app.get_public("/health/live").await;
    assert_eq!(response.status().as_u16(), 200);

    let response = app.get_public("/health/ready").await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["checks"]["database"]["status"].as_str().unwrap(), "up");
}

#[tokio::test]
#[serial]
async fn nonexistent_endpoint_returns_404() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/nonexistent-endpoint").await;

    // Assert
    assert_eq!(response.status().as_u16(), 404);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"].as_str().unwrap(), "NOT_FOUND");
}
