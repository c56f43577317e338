//! Subscription billing for LCI dashboard users.
//!
//! Handles the payment provider webhook (which extends a user's paid period)
//! and evaluates how close each subscription is to expiring.

pub mod subscription;
pub mod webhook;

pub use subscription::SubscriptionStatus;
pub use webhook::{PaymentEvent, WebhookOutcome, WebhookProcessor};
