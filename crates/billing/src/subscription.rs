//! Subscription expiry: how many days a user has left and whether the UI
//! should warn or block.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Access state derived from `subscription_expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Never paid.
    Unpaid,
    Active { days_remaining: i64 },
    /// Within the warning window; still usable.
    Warning { days_remaining: i64 },
    /// Expired; access is blocked.
    Blocked { days_overdue: i64 },
}

impl SubscriptionStatus {
    /// `days_remaining = expiry day − today`. Negative blocks, `<= warn_days` warns.
    pub fn evaluate(expires_at: Option<DateTime<Utc>>, today: NaiveDate, warn_days: i64) -> Self {
        let Some(expires_at) = expires_at else {
            return Self::Unpaid;
        };
        let days_remaining = (expires_at.date_naive() - today).num_days();
        if days_remaining < 0 {
            Self::Blocked {
                days_overdue: -days_remaining,
            }
        } else if days_remaining <= warn_days {
            Self::Warning { days_remaining }
        } else {
            Self::Active { days_remaining }
        }
    }

    pub fn allows_access(&self) -> bool {
        matches!(self, Self::Active { .. } | Self::Warning { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
