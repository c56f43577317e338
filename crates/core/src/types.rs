//! Documents held by the backing store: posts (campaign records),
//! influencers, products, partners, and users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One influencer-marketing publication and its results.
///
/// Influencer, product and partner ids are weak references: a post may point
/// at an entity that no longer exists. Numeric fields missing from a stored
/// document deserialize as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignRecord {
    pub id: Uuid,
    pub title: String,
    pub influencer_id: Uuid,
    pub product_id: Uuid,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    /// When the content went live; distinct from `created_at`.
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
    #[serde(default)]
    pub commission: Option<Commission>,
    pub created_at: DateTime<Utc>,
}

impl CampaignRecord {
    /// Always derived, never stored.
    pub fn profit(&self) -> f64 {
        self.revenue - self.investment
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommissionKind {
    Percentage,
    Fixed,
}

/// Partner commission descriptor attached to a post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Commission {
    #[serde(rename = "type")]
    pub kind: CommissionKind,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Influencer {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub followers: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Applied to new posts that name this partner without their own descriptor.
    #[serde(default)]
    pub default_commission: Option<Commission>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_counters_default_to_zero() {
        let json = serde_json::json!({
            "id": Uuid::nil(),
            "title": "Unboxing",
            "influencer_id": Uuid::nil(),
            "product_id": Uuid::nil(),
            "post_date": "2024-01-01T10:00:00Z",
            "created_at": "2024-01-01T09:00:00Z",
            "revenue": 100.0
        });
        let record: CampaignRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.clicks, 0);
        assert_eq!(record.investment, 0.0);
        assert_eq!(record.profit(), 100.0);
        assert!(record.partner_id.is_none());
    }

    #[test]
    fn test_commission_wire_format() {
        let c: Commission =
            serde_json::from_str(r#"{"type":"percentage","value":10}"#).unwrap();
        assert_eq!(c.kind, CommissionKind::Percentage);
        assert_eq!(c.value, 10.0);
    }
}
