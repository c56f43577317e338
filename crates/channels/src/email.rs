//! Transactional email: welcome, renewal and admin-composed messages.
//!
//! Templates render to subject + HTML. Delivery goes through the `Mailer`
//! seam; `LogMailer` records sends via tracing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lci_core::config::EmailConfig;
use lci_core::types::User;
use lci_core::{LciError, LciResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmailKind {
    Welcome,
    Renewal,
    Custom { subject: String, body: String },
}

impl EmailKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Renewal => "renewal",
            Self::Custom { .. } => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(config: &EmailConfig, heading: &str, paragraphs: &[String]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        "<!DOCTYPE html><html><body style=\"font-family:sans-serif\">\
         <h1>{heading}</h1>{body}\
         <p><a href=\"{url}\">{url}</a></p>\
         <p style=\"color:#888\">{team}</p>\
         </body></html>",
        url = escape_html(&config.app_url),
        team = escape_html(&config.from_name),
    )
}

fn format_expiry(expires_at: Option<DateTime<Utc>>) -> String {
    expires_at
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render `kind` for `user`. User-supplied values are HTML-escaped; custom
/// bodies keep their line breaks as `<br>`.
pub fn render(kind: &EmailKind, user: &User, config: &EmailConfig) -> RenderedEmail {
    let name = escape_html(&user.name);
    let (subject, html) = match kind {
        EmailKind::Welcome => (
            format!("Welcome to {}", config.from_name),
            layout(
                config,
                &format!("Welcome, {name}!"),
                &[
                    "Your account is ready. Sign in to start tracking your campaigns.".to_string(),
                    format!("Login: {}", escape_html(&user.email)),
                ],
            ),
        ),
        EmailKind::Renewal => (
            "Your subscription has been renewed".to_string(),
            layout(
                config,
                &format!("Thank you, {name}!"),
                &[
                    "We received your payment and your access has been extended.".to_string(),
                    format!("Valid until: {}", format_expiry(user.subscription_expires_at)),
                ],
            ),
        ),
        EmailKind::Custom { subject, body } => (
            subject.clone(),
            layout(
                config,
                &format!("Hello, {name}"),
                &[escape_html(body).replace('\n', "<br>")],
            ),
        ),
    };
    RenderedEmail {
        to: user.email.clone(),
        subject,
        html,
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub to: String,
    pub sent_at: DateTime<Utc>,
}

/// Delivery seam. One attempt per call.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, from: &str, email: &RenderedEmail) -> LciResult<DeliveryReceipt>;
}

/// Number of recent messages `LogMailer` keeps for inspection.
pub const LOG_MAILER_RECENT: usize = 32;

/// Mailer that logs each message and keeps only the most recent ones.
#[derive(Default)]
pub struct LogMailer {
    recent: Mutex<VecDeque<RenderedEmail>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent messages, oldest first.
    pub fn sent(&self) -> Vec<RenderedEmail> {
        self.recent.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, from: &str, email: &RenderedEmail) -> LciResult<DeliveryReceipt> {
        let receipt = DeliveryReceipt {
            message_id: format!("log-{}", Uuid::new_v4()),
            to: email.to.clone(),
            sent_at: Utc::now(),
        };
        info!(
            from,
            to = %email.to,
            subject = %email.subject,
            message_id = %receipt.message_id,
            "Email sent"
        );
        let mut recent = self.recent.lock();
        if recent.len() == LOG_MAILER_RECENT {
            recent.pop_front();
        }
        recent.push_back(email.clone());
        Ok(receipt)
    }
}

/// Renders templates and hands them to the configured mailer.
pub struct EmailService {
    config: EmailConfig,
    mailer: std::sync::Arc<dyn Mailer>,
}

impl EmailService {
    pub fn new(config: EmailConfig, mailer: std::sync::Arc<dyn Mailer>) -> Self {
        info!(from = %config.from_email, enabled = config.enabled, "Email service initialized");
        Self { config, mailer }
    }

    pub async fn send(&self, kind: &EmailKind, user: &User) -> LciResult<DeliveryReceipt> {
        if !self.config.enabled {
            return Err(LciError::Email("email delivery is disabled".into()));
        }
        if let EmailKind::Custom { subject, .. } = kind {
            if subject.trim().is_empty() {
                return Err(LciError::Validation("custom email needs a subject".into()));
            }
        }
        let rendered = render(kind, user, &self.config);
        debug!(kind = kind.name(), to = %rendered.to, "Rendering email");
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let receipt = self.mailer.send(&from, &rendered).await?;
        metrics::counter!("email.sent", "kind" => kind.name()).increment(1);
        Ok(receipt)
    }
}
