//! Period resolution: maps a named period (or explicit custom range) to the
//! current interval and the comparison interval that immediately precedes it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use lci_core::{LciError, LciResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Calendar years accepted in a custom range.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1970..=9999;

/// Longest accepted custom range, inclusive of both ends.
pub const MAX_CUSTOM_SPAN_DAYS: i64 = 3_660;

/// Period selected on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "snake_case")]
pub enum Period {
    Today,
    Yesterday,
    Last7Days,
    ThisMonth,
    AllTime,
    Custom {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl Period {
    /// Parse a period token as sent by the dashboard (`today`, `last_7_days`, ...).
    /// `from`/`to` are only read for `custom`.
    pub fn from_token(
        token: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LciResult<Self> {
        match token {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "last_7_days" => Ok(Self::Last7Days),
            "this_month" => Ok(Self::ThisMonth),
            "all_time" => Ok(Self::AllTime),
            "custom" => {
                let period = Self::Custom { from, to };
                period.validate()?;
                Ok(period)
            }
            other => Err(LciError::Validation(format!("unknown period '{other}'"))),
        }
    }

    /// Reject custom dates outside the supported calendar, inverted ranges
    /// and spans longer than [`MAX_CUSTOM_SPAN_DAYS`]. Missing dates are
    /// allowed and resolve to the same-day fallback.
    pub fn validate(&self) -> LciResult<()> {
        let Self::Custom { from, to } = *self else {
            return Ok(());
        };
        for date in [from, to].into_iter().flatten() {
            if !SUPPORTED_YEARS.contains(&date.year()) {
                return Err(LciError::Validation(format!(
                    "date {date} outside supported years {}..={}",
                    SUPPORTED_YEARS.start(),
                    SUPPORTED_YEARS.end()
                )));
            }
        }
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(LciError::Validation(format!("'from' {from} is after 'to' {to}")));
            }
            if (to - from).num_days() >= MAX_CUSTOM_SPAN_DAYS {
                return Err(LciError::Validation(format!(
                    "custom range longer than {MAX_CUSTOM_SPAN_DAYS} days"
                )));
            }
        }
        Ok(())
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "last_7_days",
            Self::ThisMonth => "this_month",
            Self::AllTime => "all_time",
            Self::Custom { .. } => "custom",
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::ThisMonth
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A closed interval `[from, to]`; both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateInterval {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// `[00:00:00.000 of first, 23:59:59.999 of last]`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self::new(start_of_day(first), end_of_day(last))
    }

    pub fn length(&self) -> Duration {
        self.to - self.from
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// The span of identical length ending 1ms before this one starts.
    /// Saturates at the earliest representable instant.
    pub fn preceding(&self) -> Self {
        let to = self
            .from
            .checked_sub_signed(Duration::milliseconds(1))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let from = to
            .checked_sub_signed(self.length())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::new(from, to)
    }
}

/// Date predicate applied by the record filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// No date restriction at all.
    Unbounded,
    /// Inclusive bounds; a missing bound matches nothing.
    Bounded {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
}

impl DateWindow {
    pub fn matches(&self, instant: DateTime<Utc>) -> bool {
        match *self {
            Self::Unbounded => true,
            Self::Bounded {
                from: Some(from),
                to: Some(to),
            } => from <= instant && instant <= to,
            Self::Bounded { .. } => false,
        }
    }
}

impl From<DateInterval> for DateWindow {
    fn from(interval: DateInterval) -> Self {
        Self::Bounded {
            from: Some(interval.from),
            to: Some(interval.to),
        }
    }
}

/// Result of resolving a [`Period`] against a fixed "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedPeriod {
    pub period: Period,
    pub current: DateInterval,
    pub previous: DateInterval,
    /// False when the previous interval is degenerate and period-over-period
    /// changes must not be shown.
    pub supports_comparison: bool,
}

impl ResolvedPeriod {
    /// Date predicate for the current window. `all_time` skips date filtering.
    pub fn current_window(&self) -> DateWindow {
        match self.period {
            Period::AllTime => DateWindow::Unbounded,
            _ => self.current.into(),
        }
    }

    /// Date predicate for the comparison window, `None` when comparison is off.
    pub fn previous_window(&self) -> Option<DateWindow> {
        self.supports_comparison.then(|| self.previous.into())
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last millisecond of `date`, saturating on the final representable day.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date)
        .checked_add_signed(Duration::days(1) - Duration::milliseconds(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 plus 31 days always lands inside the next month.
    first_of_month(first_of_month(date) + Duration::days(31)) - Duration::days(1)
}

/// Resolve `period` to its current and comparison intervals relative to `now`.
pub fn resolve_period(period: Period, now: DateTime<Utc>) -> ResolvedPeriod {
    let today = now.date_naive();
    let one_day = Duration::days(1);

    let (current, previous, supports_comparison) = match period {
        Period::Today => {
            let current = DateInterval::days(today, today);
            let yesterday = today - one_day;
            (current, DateInterval::days(yesterday, yesterday), true)
        }
        Period::Yesterday => {
            let yesterday = today - one_day;
            let before = yesterday - one_day;
            (
                DateInterval::days(yesterday, yesterday),
                DateInterval::days(before, before),
                true,
            )
        }
        Period::Last7Days => {
            let current = DateInterval::days(today - Duration::days(6), today);
            (current, current.preceding(), true)
        }
        Period::ThisMonth => {
            let first = first_of_month(today);
            let current = DateInterval::days(first, last_of_month(today));
            let prior = first - one_day;
            let previous = DateInterval::days(first_of_month(prior), prior);
            (current, previous, true)
        }
        Period::AllTime => {
            let epoch = DateTime::<Utc>::UNIX_EPOCH;
            let current = DateInterval::new(epoch, end_of_day(today));
            (current, DateInterval::new(epoch, epoch), false)
        }
        Period::Custom {
            from: Some(from),
            to: Some(to),
        } => {
            let current = DateInterval::new(start_of_day(from), end_of_day(to));
            (current, current.preceding(), true)
        }
        Period::Custom { .. } => {
            // Incomplete custom range: zero-width window on today.
            let start = start_of_day(today);
            let collapsed = DateInterval::new(start, start);
            (collapsed, collapsed, false)
        }
    };

    ResolvedPeriod {
        period,
        current,
        previous,
        supports_comparison,
    }
}
