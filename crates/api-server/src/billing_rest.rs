//! Payment webhook and subscription status endpoints.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use lci_billing::{PaymentEvent, SubscriptionStatus, WebhookOutcome, WebhookProcessor};
use lci_channels::{EmailKind, EmailService};
use lci_core::LciError;
use lci_management::handlers::{error_response, ApiResult};
use lci_management::ManagementStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Header carrying the shared secret configured with the payment provider.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Clone)]
pub struct BillingState {
    pub processor: Arc<WebhookProcessor>,
    pub store: Arc<ManagementStore>,
    pub emails: Arc<EmailService>,
    pub warn_days: i64,
}

/// POST /v1/webhooks/payment: payment provider notification.
pub async fn handle_payment_webhook(
    State(state): State<BillingState>,
    headers: HeaderMap,
    Json(event): Json<PaymentEvent>,
) -> ApiResult<Json<WebhookOutcome>> {
    let secret = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    let outcome = state
        .processor
        .handle(secret, &event, Utc::now())
        .map_err(error_response)?;

    // The renewal email is a courtesy; the payment is already recorded.
    if let WebhookOutcome::SubscriptionRenewed { user } = &outcome {
        if let Err(e) = state.emails.send(&EmailKind::Renewal, user).await {
            warn!(user_id = %user.id, error = %e, "Renewal email not sent");
        }
    }
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub user_id: Uuid,
    pub paid_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub status: SubscriptionStatus,
}

/// GET /api/v1/users/:id/subscription: expiry state for one user.
pub async fn subscription_status(
    State(state): State<BillingState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubscriptionView>> {
    let user = state
        .store
        .get_user(id)
        .ok_or_else(|| error_response(LciError::NotFound(format!("user {id}"))))?;
    let status = SubscriptionStatus::evaluate(
        user.subscription_expires_at,
        Utc::now().date_naive(),
        state.warn_days,
    );
    Ok(Json(SubscriptionView {
        user_id: user.id,
        paid_at: user.paid_at,
        expires_at: user.subscription_expires_at,
        status,
    }))
}
