//! Per-entity performance tables (top influencers, top products).

use crate::metrics::{aggregate, MetricsSummary};
use lci_core::types::{CampaignRecord, Influencer, Partner, Product};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Display names for the weakly referenced entities.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub influencers: HashMap<Uuid, String>,
    pub products: HashMap<Uuid, String>,
    pub partners: HashMap<Uuid, String>,
}

impl Catalog {
    pub fn from_documents(
        influencers: &[Influencer],
        products: &[Product],
        partners: &[Partner],
    ) -> Self {
        Self {
            influencers: influencers.iter().map(|i| (i.id, i.name.clone())).collect(),
            products: products.iter().map(|p| (p.id, p.name.clone())).collect(),
            partners: partners.iter().map(|p| (p.id, p.name.clone())).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPerformance {
    pub id: Uuid,
    pub name: Option<String>,
    pub posts: u64,
    pub metrics: MetricsSummary,
}

fn breakdown<'a, I, F>(records: I, names: &HashMap<Uuid, String>, key: F) -> Vec<EntityPerformance>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
    F: Fn(&CampaignRecord) -> Uuid,
{
    let mut groups: HashMap<Uuid, Vec<&CampaignRecord>> = HashMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }

    let mut rows: Vec<EntityPerformance> = groups
        .into_iter()
        .map(|(id, group)| EntityPerformance {
            id,
            name: names.get(&id).cloned(),
            posts: group.len() as u64,
            metrics: aggregate(group).summary(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.metrics
            .totals
            .profit
            .total_cmp(&a.metrics.totals.profit)
            .then_with(|| a.id.cmp(&b.id))
    });
    rows
}

pub fn breakdown_by_influencer<'a, I>(records: I, catalog: &Catalog) -> Vec<EntityPerformance>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    breakdown(records, &catalog.influencers, |r| r.influencer_id)
}

pub fn breakdown_by_product<'a, I>(records: I, catalog: &Catalog) -> Vec<EntityPerformance>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    breakdown(records, &catalog.products, |r| r.product_id)
}
