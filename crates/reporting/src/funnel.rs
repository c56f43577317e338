//! Funnel analysis: views → clicks → page visits → sales, each stage as a
//! share of top-of-funnel views.

use lci_core::types::CampaignRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Views,
    Clicks,
    PageVisits,
    Sales,
}

impl FunnelStage {
    pub const ORDER: [FunnelStage; 4] = [
        FunnelStage::Views,
        FunnelStage::Clicks,
        FunnelStage::PageVisits,
        FunnelStage::Sales,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Views => "Views",
            Self::Clicks => "Clicks",
            Self::PageVisits => "Page visits",
            Self::Sales => "Sales",
        }
    }

    fn value_of(&self, record: &CampaignRecord) -> u64 {
        match self {
            Self::Views => record.views,
            Self::Clicks => record.clicks,
            Self::PageVisits => record.page_visits,
            Self::Sales => record.sales,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStepResult {
    pub stage: FunnelStage,
    pub label: String,
    pub value: u64,
    pub percentage: f64,
}

/// Build the four-stage funnel. Later stages exceeding earlier ones are
/// reported as-is, without clamping.
pub fn build_funnel<'a, I>(records: I) -> Vec<FunnelStepResult>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    let mut totals = [0u64; 4];
    for record in records {
        for (total, stage) in totals.iter_mut().zip(FunnelStage::ORDER) {
            *total = total.saturating_add(stage.value_of(record));
        }
    }

    let baseline = totals[0];
    FunnelStage::ORDER
        .iter()
        .zip(totals)
        .map(|(stage, value)| {
            let (value, percentage) = if baseline == 0 {
                (0, 0.0)
            } else {
                (value, value as f64 / baseline as f64 * 100.0)
            };
            FunnelStepResult {
                stage: *stage,
                label: stage.label().to_string(),
                value,
                percentage,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{record, ymd};

    fn with_funnel(views: u64, clicks: u64, page_visits: u64, sales: u64) -> CampaignRecord {
        let mut r = record(ymd(2024, 1, 1), 0.0, 0.0);
        r.views = views;
        r.clicks = clicks;
        r.page_visits = page_visits;
        r.sales = sales;
        r
    }

    #[test]
    fn test_percentages_relative_to_views() {
        let records = vec![with_funnel(600, 120, 90, 10), with_funnel(400, 80, 60, 20)];
        let funnel = build_funnel(&records);
        let values: Vec<u64> = funnel.iter().map(|s| s.value).collect();
        let pct: Vec<f64> = funnel.iter().map(|s| s.percentage).collect();
        assert_eq!(values, vec![1000, 200, 150, 30]);
        assert_eq!(pct, vec![100.0, 20.0, 15.0, 3.0]);
        assert_eq!(funnel[2].label, "Page visits");
    }

    #[test]
    fn test_zero_views_reports_zero_everywhere() {
        let records = vec![with_funnel(0, 5, 3, 1)];
        let funnel = build_funnel(&records);
        assert_eq!(funnel.len(), 4);
        assert!(funnel.iter().all(|s| s.value == 0 && s.percentage == 0.0));
    }

    #[test]
    fn test_no_clamping_when_later_stage_exceeds_earlier() {
        let records = vec![with_funnel(100, 10, 10, 50)];
        let funnel = build_funnel(&records);
        assert_eq!(funnel[3].percentage, 50.0);
        assert!(funnel[3].value > funnel[1].value);
    }

    #[test]
    fn test_huge_stage_totals_saturate() {
        let big = u64::MAX / 2 + 1;
        let records = [with_funnel(big, 10, 5, 1), with_funnel(big, 10, 5, 1)];
        let funnel = build_funnel(records.iter());
        assert_eq!(funnel[0].value, u64::MAX);
        assert_eq!(funnel[0].percentage, 100.0);
        assert_eq!(funnel[1].value, 20);
    }
}
