//! Record filtering: entity equality predicates plus a date window.

use crate::period::DateWindow;
use lci_core::types::CampaignRecord;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use uuid::Uuid;

/// Sentinel the dashboard sends for "no restriction".
pub const ALL: &str = "all";

/// A single entity predicate: match everything, or one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityFilter {
    #[default]
    All,
    Only(Uuid),
}

impl EntityFilter {
    pub fn matches(&self, id: Uuid) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == id,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Only(_))
    }
}

impl FromStr for EntityFilter {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == ALL {
            return Ok(Self::All);
        }
        Uuid::parse_str(s).map(Self::Only)
    }
}

impl Serialize for EntityFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str(ALL),
            Self::Only(id) => serializer.collect_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for EntityFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Independent entity predicates; a record passes only if every active one matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFilters {
    #[serde(default)]
    pub influencer: EntityFilter,
    #[serde(default)]
    pub product: EntityFilter,
    #[serde(default)]
    pub post: EntityFilter,
}

impl EntityFilters {
    pub fn matches(&self, record: &CampaignRecord) -> bool {
        self.influencer.matches(record.influencer_id)
            && self.product.matches(record.product_id)
            && self.post.matches(record.id)
    }
}

/// Records matching every entity filter whose `post_date` falls inside `window`.
pub fn filter_records<'a>(
    records: &'a [CampaignRecord],
    filters: &EntityFilters,
    window: DateWindow,
) -> Vec<&'a CampaignRecord> {
    records
        .iter()
        .filter(|r| filters.matches(r) && window.matches(r.post_date))
        .collect()
}
