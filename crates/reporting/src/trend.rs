//! Profit trend: splits an interval into day or month buckets and sums
//! profit per bucket, emitting every bucket so the series has no gaps.

use crate::period::{first_of_month, DateInterval};
use chrono::{Datelike, Duration, NaiveDate};
use lci_core::types::CampaignRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Intervals longer than this are bucketed by month instead of by day.
pub const DAILY_BUCKET_LIMIT_DAYS: i64 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn for_interval(interval: &DateInterval) -> Self {
        if interval.length() > Duration::days(DAILY_BUCKET_LIMIT_DAYS) {
            Self::Monthly
        } else {
            Self::Daily
        }
    }

    /// Bucket start for `date`; also the map key.
    fn bucket_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Monthly => first_of_month(date),
        }
    }

    fn next(&self, bucket: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => bucket + Duration::days(1),
            Self::Monthly => first_of_month(bucket + Duration::days(31)),
        }
    }

    fn key(&self, bucket: NaiveDate) -> String {
        match self {
            Self::Daily => bucket.format("%Y-%m-%d").to_string(),
            Self::Monthly => format!("{:04}-{:02}", bucket.year(), bucket.month()),
        }
    }

    fn label(&self, bucket: NaiveDate) -> String {
        match self {
            Self::Daily => bucket.format("%d/%m").to_string(),
            Self::Monthly => bucket.format("%b/%y").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// `YYYY-MM-DD` for days, `YYYY-MM` for months.
    pub key: String,
    pub label: String,
    pub profit: f64,
}

/// Profit per bucket across the whole `interval`, in chronological order.
/// Records whose `post_date` falls outside the interval are ignored.
pub fn bucket_profit_by_date<'a, I>(records: I, interval: &DateInterval) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = &'a CampaignRecord>,
{
    let granularity = Granularity::for_interval(interval);

    let mut sums: HashMap<NaiveDate, f64> = HashMap::new();
    for record in records {
        if !interval.contains(record.post_date) {
            continue;
        }
        let bucket = granularity.bucket_of(record.post_date.date_naive());
        *sums.entry(bucket).or_insert(0.0) += record.profit();
    }

    let last = granularity.bucket_of(interval.to.date_naive());
    let mut bucket = granularity.bucket_of(interval.from.date_naive());
    let mut points = Vec::new();
    while bucket <= last {
        points.push(TrendPoint {
            key: granularity.key(bucket),
            label: granularity.label(bucket),
            profit: sums.get(&bucket).copied().unwrap_or(0.0),
        });
        bucket = granularity.next(bucket);
    }
    points
}
