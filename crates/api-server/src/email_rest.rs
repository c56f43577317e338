//! Admin email endpoint.

use axum::extract::State;
use axum::Json;
use lci_channels::email::DeliveryReceipt;
use lci_channels::{EmailKind, EmailService};
use lci_core::LciError;
use lci_management::handlers::{error_response, ApiResult};
use lci_management::ManagementStore;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct EmailState {
    pub store: Arc<ManagementStore>,
    pub emails: Arc<EmailService>,
}

/// `{"user_id": "...", "type": "welcome" | "renewal" | "custom", "subject"?, "body"?}`
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub kind: EmailKind,
}

/// POST /api/v1/emails: render and send one email to a user. Single attempt.
pub async fn handle_send_email(
    State(state): State<EmailState>,
    Json(req): Json<SendEmailRequest>,
) -> ApiResult<Json<DeliveryReceipt>> {
    let user = state
        .store
        .get_user(req.user_id)
        .ok_or_else(|| error_response(LciError::NotFound(format!("user {}", req.user_id))))?;
    state
        .emails
        .send(&req.kind, &user)
        .await
        .map(Json)
        .map_err(error_response)
}
