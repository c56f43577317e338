//! Management request/response types and the audit log.

use chrono::{DateTime, Utc};
use lci_core::types::{Commission, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Influencers ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateInfluencerRequest {
    pub name: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub followers: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateInfluencerRequest {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub platform: Option<String>,
    pub followers: Option<u64>,
}

// ─── Products ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
}

// ─── Partners ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreatePartnerRequest {
    pub name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub default_commission: Option<Commission>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePartnerRequest {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub default_commission: Option<Commission>,
}

// ─── Posts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub influencer_id: Uuid,
    pub product_id: Uuid,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    pub post_date: DateTime<Utc>,
    #[serde(default)]
    pub investment: f64,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub page_visits: u64,
    #[serde(default)]
    pub sales: u64,
    /// Falls back to the partner's default commission when omitted.
    #[serde(default)]
    pub commission: Option<Commission>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub influencer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    pub post_date: Option<DateTime<Utc>>,
    pub investment: Option<f64>,
    pub revenue: Option<f64>,
    pub views: Option<u64>,
    pub clicks: Option<u64>,
    pub page_visits: Option<u64>,
    pub sales: Option<u64>,
    pub commission: Option<Commission>,
}

// ─── Users ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<UserRole>,
}

// ─── Auth ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user: String,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
}
