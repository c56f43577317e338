//! Partner commission splits.

use crate::breakdown::Catalog;
use lci_core::types::{CampaignRecord, CommissionKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Commission owed to the record's partner. Zero without partner or descriptor.
pub fn commission_for(record: &CampaignRecord) -> f64 {
    match (record.partner_id, record.commission) {
        (Some(_), Some(c)) => match c.kind {
            CommissionKind::Percentage => record.revenue * c.value / 100.0,
            CommissionKind::Fixed => c.value,
        },
        _ => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerSplit {
    pub partner_id: Uuid,
    pub partner_name: Option<String>,
    pub posts: u64,
    pub revenue: f64,
    pub investment: f64,
    pub commission: f64,
    /// Revenue left after investment and commission.
    pub net: f64,
}

/// Group records by partner, sorted by commission owed (highest first).
pub fn partner_splits<'a, I>(records: I, catalog: &Catalog) -> Vec<PartnerSplit>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    let mut by_partner: HashMap<Uuid, PartnerSplit> = HashMap::new();
    for record in records {
        let Some(partner_id) = record.partner_id else {
            continue;
        };
        let split = by_partner.entry(partner_id).or_insert_with(|| PartnerSplit {
            partner_id,
            partner_name: catalog.partners.get(&partner_id).cloned(),
            posts: 0,
            revenue: 0.0,
            investment: 0.0,
            commission: 0.0,
            net: 0.0,
        });
        split.posts += 1;
        split.revenue += record.revenue;
        split.investment += record.investment;
        split.commission += commission_for(record);
    }

    let mut splits: Vec<PartnerSplit> = by_partner
        .into_values()
        .map(|mut s| {
            s.net = s.revenue - s.investment - s.commission;
            s
        })
        .collect();
    splits.sort_by(|a, b| {
        b.commission
            .total_cmp(&a.commission)
            .then_with(|| a.partner_id.cmp(&b.partner_id))
    });
    splits
}
