//! Campaign performance dashboard: composes every derived view from one
//! record snapshot and the selected period/filters.

use crate::breakdown::{breakdown_by_influencer, breakdown_by_product, Catalog, EntityPerformance};
use crate::commission::{partner_splits, PartnerSplit};
use crate::filter::{filter_records, EntityFilters};
use crate::funnel::{build_funnel, FunnelStepResult};
use crate::metrics::{aggregate, MetricChanges, MetricsSummary};
use crate::period::{resolve_period, start_of_day, DateInterval, Period, ResolvedPeriod};
use crate::trend::{bucket_profit_by_date, Granularity, TrendPoint};
use chrono::{DateTime, Utc};
use lci_core::types::CampaignRecord;
use serde::Serialize;
use tracing::debug;

/// UI state driving the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardQuery {
    pub period: Period,
    pub filters: EntityFilters,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub resolved: ResolvedPeriod,
    pub filters: EntityFilters,
    pub record_count: usize,
    pub current: MetricsSummary,
    /// Absent when the period does not support comparison.
    pub previous: Option<MetricsSummary>,
    pub changes: Option<MetricChanges>,
    pub granularity: Granularity,
    pub trend: Vec<TrendPoint>,
    pub funnel: Vec<FunnelStepResult>,
    pub partners: Vec<PartnerSplit>,
    pub top_influencers: Vec<EntityPerformance>,
    pub top_products: Vec<EntityPerformance>,
    pub generated_at: DateTime<Utc>,
}

/// Build the dashboard from scratch. Pure in `records`, `query` and `now`.
pub fn build_dashboard(
    records: &[CampaignRecord],
    catalog: &Catalog,
    query: &DashboardQuery,
    now: DateTime<Utc>,
) -> DashboardView {
    let resolved = resolve_period(query.period, now);
    let current_records = filter_records(records, &query.filters, resolved.current_window());
    let current = aggregate(current_records.iter().copied());

    let previous = resolved.previous_window().map(|window| {
        let previous_records = filter_records(records, &query.filters, window);
        aggregate(previous_records)
    });
    let changes = previous
        .as_ref()
        .map(|prev| MetricChanges::between(&current, prev));

    let trend_interval = trend_interval(&resolved, &current_records);
    let trend = bucket_profit_by_date(current_records.iter().copied(), &trend_interval);

    debug!(
        period = %query.period,
        records = current_records.len(),
        buckets = trend.len(),
        "Dashboard computed"
    );

    DashboardView {
        resolved,
        filters: query.filters,
        record_count: current_records.len(),
        current: current.summary(),
        previous: previous.map(|p| p.summary()),
        changes,
        granularity: Granularity::for_interval(&trend_interval),
        trend,
        funnel: build_funnel(current_records.iter().copied()),
        partners: partner_splits(current_records.iter().copied(), catalog),
        top_influencers: breakdown_by_influencer(current_records.iter().copied(), catalog),
        top_products: breakdown_by_product(current_records.iter().copied(), catalog),
        generated_at: now,
    }
}

/// `all_time` charts from the first matching post instead of the epoch.
fn trend_interval(resolved: &ResolvedPeriod, records: &[&CampaignRecord]) -> DateInterval {
    match resolved.period {
        Period::AllTime => {
            let first_day = records
                .iter()
                .map(|r| r.post_date)
                .min()
                .unwrap_or(resolved.current.to)
                .date_naive();
            DateInterval::new(start_of_day(first_day), resolved.current.to)
        }
        _ => resolved.current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{record, ymd};
    use crate::filter::EntityFilter;
    use crate::metrics::Change;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_custom_two_day_scenario() {
        let records = vec![
            record(ymd(2024, 1, 1), 100.0, 40.0),
            record(ymd(2024, 1, 2), 50.0, 10.0),
        ];
        let query = DashboardQuery {
            period: Period::Custom {
                from: Some(ymd(2024, 1, 1)),
                to: Some(ymd(2024, 1, 2)),
            },
            filters: EntityFilters::default(),
        };
        let view = build_dashboard(&records, &Catalog::default(), &query, now());
        assert_eq!(view.current.totals.revenue, 150.0);
        assert_eq!(view.current.totals.investment, 50.0);
        assert_eq!(view.current.totals.profit, 100.0);
        assert_eq!(view.current.roi, 200.0);
        assert_eq!(view.granularity, Granularity::Daily);
        let trend: Vec<(&str, f64)> = view.trend.iter().map(|p| (p.key.as_str(), p.profit)).collect();
        assert_eq!(trend, vec![("2024-01-01", 60.0), ("2024-01-02", 40.0)]);
        // nothing in the preceding two days
        assert_eq!(view.changes.unwrap().revenue, Change::New);
    }

    #[test]
    fn test_all_time_suppresses_comparison() {
        let records = vec![
            record(ymd(2023, 6, 1), 10.0, 5.0),
            record(ymd(2024, 3, 1), 10.0, 5.0),
        ];
        let query = DashboardQuery {
            period: Period::AllTime,
            ..Default::default()
        };
        let view = build_dashboard(&records, &Catalog::default(), &query, now());
        assert!(view.previous.is_none());
        assert!(view.changes.is_none());
        assert!(!view.resolved.supports_comparison);
        assert_eq!(view.record_count, 2);
        assert_eq!(view.granularity, Granularity::Monthly);
        assert_eq!(view.trend.first().unwrap().key, "2023-06");
        assert_eq!(view.trend.last().unwrap().key, "2024-03");
    }

    #[test]
    fn test_all_time_without_records_charts_today() {
        let query = DashboardQuery {
            period: Period::AllTime,
            ..Default::default()
        };
        let view = build_dashboard(&[], &Catalog::default(), &query, now());
        assert_eq!(view.trend.len(), 1);
        assert_eq!(view.trend[0].key, "2024-03-15");
        assert_eq!(view.current, MetricsSummary::default());
    }

    #[test]
    fn test_this_month_compares_with_previous_month() {
        let records = vec![
            record(ymd(2024, 2, 10), 50.0, 0.0),
            record(ymd(2024, 3, 10), 75.0, 0.0),
        ];
        let view = build_dashboard(&records, &Catalog::default(), &DashboardQuery::default(), now());
        assert_eq!(view.current.totals.revenue, 75.0);
        assert_eq!(view.previous.unwrap().totals.revenue, 50.0);
        assert_eq!(view.changes.unwrap().revenue, Change::Percent(50.0));
        assert_eq!(view.trend.len(), 31);
    }

    #[test]
    fn test_entity_filter_applies_to_both_windows() {
        let kept = record(ymd(2024, 3, 10), 75.0, 0.0);
        let mut kept_prev = record(ymd(2024, 2, 10), 50.0, 0.0);
        kept_prev.influencer_id = kept.influencer_id;
        let other = record(ymd(2024, 3, 11), 1000.0, 0.0);
        let records = vec![kept.clone(), kept_prev, other];

        let query = DashboardQuery {
            period: Period::ThisMonth,
            filters: EntityFilters {
                influencer: EntityFilter::Only(kept.influencer_id),
                ..Default::default()
            },
        };
        let view = build_dashboard(&records, &Catalog::default(), &query, now());
        assert_eq!(view.record_count, 1);
        assert_eq!(view.current.totals.revenue, 75.0);
        assert_eq!(view.previous.unwrap().totals.revenue, 50.0);
        assert_eq!(view.top_influencers.len(), 1);
    }
}
