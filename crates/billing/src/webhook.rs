//! Payment provider webhook: validates the shared secret and, on a
//! successful payment, extends the paying user's subscription.

use chrono::{DateTime, Duration, Utc};
use lci_core::config::BillingConfig;
use lci_core::types::User;
use lci_core::{LciError, LciResult};
use lci_management::ManagementStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Notification sent by the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PaymentEvent {
    PaymentSucceeded {
        email: String,
        #[serde(default)]
        amount: Option<f64>,
    },
    /// Any other event type; acknowledged and ignored.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    SubscriptionRenewed { user: User },
    Ignored,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

pub struct WebhookProcessor {
    config: BillingConfig,
    store: Arc<ManagementStore>,
}

impl WebhookProcessor {
    pub fn new(config: BillingConfig, store: Arc<ManagementStore>) -> Self {
        Self { config, store }
    }

    pub fn verify_secret(&self, presented: Option<&str>) -> LciResult<()> {
        let presented = presented.unwrap_or_default();
        let ok: bool = presented
            .as_bytes()
            .ct_eq(self.config.webhook_secret.as_bytes())
            .into();
        if !ok || presented.is_empty() {
            warn!("Webhook rejected: bad shared secret");
            return Err(LciError::Unauthorized("invalid webhook secret".into()));
        }
        Ok(())
    }

    /// Verify `secret` and apply `event` as of `now`.
    pub fn handle(
        &self,
        secret: Option<&str>,
        event: &PaymentEvent,
        now: DateTime<Utc>,
    ) -> LciResult<WebhookOutcome> {
        self.verify_secret(secret)?;

        match event {
            PaymentEvent::PaymentSucceeded { email, amount } => {
                let user = self
                    .store
                    .find_user_by_email(email)
                    .ok_or_else(|| LciError::NotFound(format!("user with email {email}")))?;
                let expires_at = now + Duration::days(self.config.subscription_days);
                let user = self.store.record_payment(user.id, now, expires_at)?;
                info!(
                    user_id = %user.id,
                    amount = amount.unwrap_or_default(),
                    expires_at = %expires_at,
                    "Subscription renewed"
                );
                metrics::counter!("billing.payments_succeeded").increment(1);
                Ok(WebhookOutcome::SubscriptionRenewed { user })
            }
            PaymentEvent::Other => {
                metrics::counter!("billing.webhook_ignored").increment(1);
                Ok(WebhookOutcome::Ignored)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
