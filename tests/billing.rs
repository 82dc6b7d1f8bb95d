//! Billing configuration passthrough tests.

mod common;

use common::{create_test_user, TestApp};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn billing_config_returns_provider_keys() {
    // Arrange
    let app = TestApp::spawn().await;
    let user = create_test_user(&app).await;

    // Act
    let response = app.get("/billing/config", &user.access_token).await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["publishableKey"].as_str().unwrap(), "pk_test_dummy");
    assert_eq!(
        body["subscriptionPriceId"].as_str().unwrap(),
        "price_test_dummy"
    );
    assert!(body["checkoutAvailable"].as_bool().unwrap());
}

#[tokio::test]
#[serial]
async fn billing_config_requires_authentication() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/billing/config").await;

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}
