//! REST API handlers for the dashboard and operational endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use lci_core::{LciError, LciResult};
use lci_management::handlers::{error_response, ApiResult};
use lci_management::SnapshotLoader;
use lci_reporting::{build_dashboard, Catalog, DashboardQuery, DashboardView, EntityFilter, EntityFilters, Period};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<SnapshotLoader>,
    pub start_time: Instant,
}

/// Query string of `GET /v1/dashboard`. Missing values mean "this month, no filters".
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub period: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub influencer: Option<String>,
    pub product: Option<String>,
    pub post: Option<String>,
}

fn parse_filter(field: &str, raw: Option<&str>) -> LciResult<EntityFilter> {
    raw.unwrap_or_default()
        .parse()
        .map_err(|_| LciError::Validation(format!("'{field}' must be 'all' or a UUID")))
}

impl DashboardParams {
    pub fn into_query(self) -> LciResult<DashboardQuery> {
        let period = match self.period.as_deref() {
            None | Some("") => Period::default(),
            Some(token) => Period::from_token(token, self.from, self.to)?,
        };
        Ok(DashboardQuery {
            period,
            filters: EntityFilters {
                influencer: parse_filter("influencer", self.influencer.as_deref())?,
                product: parse_filter("product", self.product.as_deref())?,
                post: parse_filter("post", self.post.as_deref())?,
            },
        })
    }
}

/// GET /v1/dashboard: every derived view for the selected period and filters.
pub async fn handle_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> ApiResult<Json<DashboardView>> {
    let query = params.into_query().map_err(|e| {
        metrics::counter!("api.validation_errors").increment(1);
        error_response(e)
    })?;

    let snapshot = match state.loader.refresh().await {
        Some(snapshot) => snapshot,
        None => {
            warn!("Dashboard load superseded, serving latest snapshot");
            state.loader.current()
        }
    };
    let catalog = Catalog::from_documents(&snapshot.influencers, &snapshot.products, &snapshot.partners);

    metrics::counter!("api.dashboard_requests", "period" => query.period.token()).increment(1);
    Ok(Json(build_dashboard(&snapshot.posts, &catalog, &query, Utc::now())))
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.loader.current();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        posts_loaded: snapshot.posts.len(),
    })
}

/// GET /ready: 200 once the first snapshot has been published.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.loader.current().loaded_at.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live: Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub posts_loaded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_empty_params_default_to_this_month() {
        let query = DashboardParams::default().into_query().unwrap();
        assert_eq!(query, DashboardQuery::default());
    }

    #[test]
    fn test_custom_period_and_filters() {
        let id = Uuid::new_v4();
        let params = DashboardParams {
            period: Some("custom".into()),
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
            influencer: Some(id.to_string()),
            product: Some("all".into()),
            post: None,
        };
        let query = params.into_query().unwrap();
        assert_eq!(
            query.period,
            Period::Custom {
                from: NaiveDate::from_ymd_opt(2024, 1, 1),
                to: NaiveDate::from_ymd_opt(2024, 1, 31),
            }
        );
        assert_eq!(query.filters.influencer, EntityFilter::Only(id));
        assert_eq!(query.filters.product, EntityFilter::All);
        assert_eq!(query.filters.post, EntityFilter::All);
    }

    #[test]
    fn test_bad_values_rejected() {
        let params = DashboardParams {
            period: Some("fortnight".into()),
            ..Default::default()
        };
        assert!(matches!(params.into_query(), Err(LciError::Validation(_))));

        let params = DashboardParams {
            product: Some("not-a-uuid".into()),
            ..Default::default()
        };
        assert!(matches!(params.into_query(), Err(LciError::Validation(_))));
    }
}
