//! Integration tests for per-IP request rate limiting.
//!
//! The test config disables the limiter, so these verify the mechanism is
//! wired in without asserting on 429s; the domain-level daily swipe quota
//! has its own tests in `feed_swipes.rs`.

mod common;

use common::*;
use reqwest::StatusCode;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn repeated_requests_pass_with_limiter_disabled() {
    let app = TestApp::spawn().await;

    for _ in 0..5 {
        let response = app.get_public("/health").await;
        assert!(
            response.status().is_success() || response.status() == StatusCode::TOO_MANY_REQUESTS
        );
    }
}

#[tokio::test]
#[serial]
async fn hammering_the_login_endpoint_never_panics() {
    let app = TestApp::spawn().await;

    // Credential endpoints carry a stricter budget in production; here the
    // limiter is off, so each attempt resolves to a plain 401.
    for i in 0..10 {
        let response = app
            .post_public(
                "/auth/login",
                serde_json::json!({
                    "email": format!("nonexistent{}@test.com", i),
                    "password": "wrongpassword"
                }),
            )
            .await;

        assert!(
            response.status() == StatusCode::UNAUTHORIZED
                || response.status() == StatusCode::TOO_MANY_REQUESTS
        );
    }
}

#[tokio::test]
#[serial]
async fn swipe_quota_is_independent_of_request_rate_limiting() {
    let app = TestApp::spawn().await;
    let alice = create_test_user(&app).await;

    // Polling usage stats is a read and never consumes swipe quota.
    for _ in 0..5 {
        let response = app.get("/swipes", &alice.access_token).await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = app.get("/swipes", &alice.access_token).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["todaySwipes"].as_i64().unwrap(), 0);
    assert_eq!(body["remainingSwipes"].as_i64().unwrap(), 10);
}
