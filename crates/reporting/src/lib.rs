//! Campaign analytics: period resolution, record filtering, metric
//! aggregation, profit trends, funnels, partner commissions and the
//! dashboard that ties them together.
//!
//! Everything here is a pure function of a record snapshot.

pub mod breakdown;
pub mod commission;
pub mod dashboard;
pub mod filter;
pub mod funnel;
pub mod metrics;
pub mod period;
pub mod trend;

pub use breakdown::Catalog;
pub use dashboard::{build_dashboard, DashboardQuery, DashboardView};
pub use filter::{filter_records, EntityFilter, EntityFilters};
pub use funnel::build_funnel;
pub use metrics::{aggregate, percentage_change, Change, Metrics};
pub use period::{resolve_period, DateInterval, DateWindow, Period, ResolvedPeriod};
pub use trend::bucket_profit_by_date;
