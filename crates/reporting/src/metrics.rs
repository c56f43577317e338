//! Metrics aggregation: summed totals over a record set and the ratios
//! derived from them.

use lci_core::types::CampaignRecord;
use serde::{Deserialize, Serialize};

/// Summed totals for a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub revenue: f64,
    pub investment: f64,
    pub profit: f64,
    pub sales: u64,
    pub clicks: u64,
    pub views: u64,
    pub page_visits: u64,
}

impl Metrics {
    /// Profit as a percentage of investment.
    pub fn roi(&self) -> f64 {
        if self.investment > 0.0 {
            self.profit / self.investment * 100.0
        } else {
            0.0
        }
    }

    /// Revenue per unit of investment, displayed as `Nx`.
    pub fn roas(&self) -> f64 {
        if self.investment > 0.0 {
            self.revenue / self.investment
        } else {
            0.0
        }
    }

    pub fn conversion_rate(&self) -> f64 {
        if self.clicks > 0 {
            self.sales as f64 / self.clicks as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Cost per acquisition.
    pub fn cpa(&self) -> f64 {
        if self.sales > 0 {
            self.investment / self.sales as f64
        } else {
            0.0
        }
    }

    pub fn average_ticket(&self) -> f64 {
        if self.sales > 0 {
            self.revenue / self.sales as f64
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            totals: *self,
            roi: self.roi(),
            roas: self.roas(),
            conversion_rate: self.conversion_rate(),
            cpa: self.cpa(),
            average_ticket: self.average_ticket(),
        }
    }
}

/// Reduce `records` into totals. Profit is derived once the sums are complete.
pub fn aggregate<'a, I>(records: I) -> Metrics
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    let mut m = records.into_iter().fold(Metrics::default(), |mut acc, r| {
        acc.revenue += r.revenue;
        acc.investment += r.investment;
        acc.sales = acc.sales.saturating_add(r.sales);
        acc.clicks = acc.clicks.saturating_add(r.clicks);
        acc.views = acc.views.saturating_add(r.views);
        acc.page_visits = acc.page_visits.saturating_add(r.page_visits);
        acc
    });
    m.profit = m.revenue - m.investment;
    m
}

/// Totals plus every derived ratio, as rendered on the dashboard cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(flatten)]
    pub totals: Metrics,
    pub roi: f64,
    pub roas: f64,
    pub conversion_rate: f64,
    pub cpa: f64,
    pub average_ticket: f64,
}

/// Period-over-period change of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Change {
    Percent(f64),
    /// Previous value was zero and the current one is positive.
    New,
}

impl Change {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Percent(p) => Some(*p),
            Self::New => None,
        }
    }
}

pub fn percentage_change(current: f64, previous: f64) -> Change {
    if previous == 0.0 {
        if current > 0.0 {
            Change::New
        } else {
            Change::Percent(0.0)
        }
    } else {
        Change::Percent((current - previous) / previous * 100.0)
    }
}

/// Changes for every card on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricChanges {
    pub revenue: Change,
    pub investment: Change,
    pub profit: Change,
    pub sales: Change,
    pub clicks: Change,
    pub views: Change,
    pub page_visits: Change,
    pub roi: Change,
}

impl MetricChanges {
    pub fn between(current: &Metrics, previous: &Metrics) -> Self {
        Self {
            revenue: percentage_change(current.revenue, previous.revenue),
            investment: percentage_change(current.investment, previous.investment),
            profit: percentage_change(current.profit, previous.profit),
            sales: percentage_change(current.sales as f64, previous.sales as f64),
            clicks: percentage_change(current.clicks as f64, previous.clicks as f64),
            views: percentage_change(current.views as f64, previous.views as f64),
            page_visits: percentage_change(
                current.page_visits as f64,
                previous.page_visits as f64,
            ),
            roi: percentage_change(current.roi(), previous.roi()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{record, ymd};

    #[test]
    fn test_empty_aggregate_is_all_zero() {
        let m = aggregate(std::iter::empty());
        assert_eq!(m, Metrics::default());
        let s = m.summary();
        for ratio in [s.roi, s.roas, s.conversion_rate, s.cpa, s.average_ticket] {
            assert_eq!(ratio, 0.0);
            assert!(!ratio.is_nan());
        }
    }

    #[test]
    fn test_aggregate_two_posts() {
        let records = vec![
            record(ymd(2024, 1, 1), 100.0, 40.0),
            record(ymd(2024, 1, 2), 50.0, 10.0),
        ];
        let m = aggregate(&records);
        assert_eq!(m.revenue, 150.0);
        assert_eq!(m.investment, 50.0);
        assert_eq!(m.profit, 100.0);
        assert_eq!(m.roi(), 200.0);
        assert_eq!(m.roas(), 3.0);
    }

    #[test]
    fn test_funnel_ratios() {
        let mut r = record(ymd(2024, 1, 1), 300.0, 150.0);
        r.clicks = 200;
        r.sales = 30;
        let m = aggregate([&r]);
        assert_eq!(m.conversion_rate(), 15.0);
        assert_eq!(m.cpa(), 5.0);
        assert_eq!(m.average_ticket(), 10.0);
    }

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(0.0, 0.0), Change::Percent(0.0));
        assert_eq!(percentage_change(50.0, 0.0), Change::New);
        assert_eq!(percentage_change(75.0, 50.0), Change::Percent(50.0));
        assert_eq!(percentage_change(25.0, 50.0), Change::Percent(-50.0));
        assert_eq!(percentage_change(-10.0, 0.0), Change::Percent(0.0));
    }

    #[test]
    fn test_metric_changes() {
        let prev = aggregate(&[record(ymd(2024, 1, 1), 50.0, 25.0)]);
        let curr = aggregate(&[record(ymd(2024, 1, 2), 75.0, 25.0)]);
        let changes = MetricChanges::between(&curr, &prev);
        assert_eq!(changes.revenue.percent(), Some(50.0));
        assert_eq!(changes.investment.percent(), Some(0.0));
        assert_eq!(changes.profit.percent(), Some(100.0));
        assert!(!changes.sales.is_new());
    }

    #[test]
    fn test_summary_serializes_flat() {
        let json = serde_json::to_value(Metrics::default().summary()).unwrap();
        assert_eq!(json["revenue"], 0.0);
        assert_eq!(json["roas"], 0.0);
    }

    #[test]
    fn test_counter_totals_saturate() {
        let mut a = record(ymd(2024, 1, 1), 0.0, 0.0);
        a.views = u64::MAX / 2 + 1;
        a.clicks = u64::MAX;
        let b = a.clone();
        let m = aggregate([&a, &b]);
        assert_eq!(m.views, u64::MAX);
        assert_eq!(m.clicks, u64::MAX);
    }
}
