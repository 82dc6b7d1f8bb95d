//! Billing configuration passthrough.
//!
//! Checkout happens entirely on the payment provider's side; the server only
//! hands the upsell screen the publishable key and price id it needs to start
//! a session there.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingConfigResponse {
    #[schema(example = "pk_live_abc123")]
    pub publishable_key: Option<String>,
    #[schema(example = "price_abc123")]
    pub subscription_price_id: Option<String>,
    /// False when the server has no provider keys configured; the client
    /// hides the upgrade button instead of starting a doomed checkout.
    #[schema(example = true)]
    pub checkout_available: bool,
}

#[utoipa::path(
    get,
    path = "/billing/config",
    tag = "Billing",
    responses(
        (status = 200, description = "Payment provider configuration", body = BillingConfigResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn billing_config(State(state): State<AppState>) -> Json<BillingConfigResponse> {
    let checkout_available =
        state.billing.publishable_key.is_some() && state.billing.subscription_price_id.is_some();

    Json(BillingConfigResponse {
        publishable_key: state.billing.publishable_key.clone(),
        subscription_price_id: state.billing.subscription_price_id.clone(),
        checkout_available,
    })
}
