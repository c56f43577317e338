//! API server: dashboard, webhook, email and management endpoints over HTTP.

use crate::billing_rest::{self, BillingState};
use crate::email_rest::{self, EmailState};
use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::{middleware, Router};
use lci_billing::WebhookProcessor;
use lci_channels::{EmailService, Mailer};
use lci_core::config::AppConfig;
use lci_management::auth::auth_middleware;
use lci_management::{management_router, AuthService, ManagementStore, SnapshotLoader};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    store: Arc<ManagementStore>,
    loader: Arc<SnapshotLoader>,
    auth: Arc<AuthService>,
    emails: Arc<EmailService>,
}

impl ApiServer {
    pub fn new(
        config: AppConfig,
        store: Arc<ManagementStore>,
        loader: Arc<SnapshotLoader>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(config.auth.clone()));
        let emails = Arc::new(EmailService::new(config.email.clone(), mailer));
        Self {
            config,
            store,
            loader,
            auth,
            emails,
        }
    }

    /// Full application router.
    pub fn router(&self) -> Router {
        let state = AppState {
            loader: self.loader.clone(),
            start_time: Instant::now(),
        };
        let billing = BillingState {
            processor: Arc::new(WebhookProcessor::new(
                self.config.billing.clone(),
                self.store.clone(),
            )),
            store: self.store.clone(),
            emails: self.emails.clone(),
            warn_days: self.config.billing.warn_days,
        };
        let email = EmailState {
            store: self.store.clone(),
            emails: self.emails.clone(),
        };

        let admin = Router::new()
            .route(
                "/api/v1/users/:id/subscription",
                get(billing_rest::subscription_status).with_state(billing.clone()),
            )
            .route(
                "/api/v1/emails",
                post(email_rest::handle_send_email).with_state(email),
            )
            .route_layer(middleware::from_fn_with_state(self.auth.clone(), auth_middleware));

        Router::new()
            // Dashboard
            .route("/v1/dashboard", get(rest::handle_dashboard))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            .with_state(state)
            // Payment provider
            .route(
                "/v1/webhooks/payment",
                post(billing_rest::handle_payment_webhook).with_state(billing),
            )
            .merge(admin)
            .merge(management_router(self.store.clone(), self.auth.clone()))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::{Duration, Utc};
    use lci_channels::LogMailer;
    use lci_core::types::UserRole;
    use lci_management::models::CreateUserRequest;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        store: Arc<ManagementStore>,
        mailer: Arc<LogMailer>,
    }

    async fn harness() -> Harness {
        let store = Arc::new(ManagementStore::with_demo_data());
        let loader = Arc::new(SnapshotLoader::new(store.clone()));
        loader.refresh().await;
        let mailer = Arc::new(LogMailer::new());
        let mut config = AppConfig::default();
        config.billing.webhook_secret = "whsec".into();
        let server = ApiServer::new(config, store.clone(), loader, mailer.clone());
        Harness {
            app: server.router(),
            store,
            mailer,
        }
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn admin_token(app: &Router) -> String {
        let resp = app
            .clone()
            .oneshot(
                Request::post("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"admin"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        body_json(resp).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let h = harness().await;
        let resp = h
            .app
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = h
            .app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_dashboard_all_time() {
        let h = harness().await;
        let resp = h
            .app
            .oneshot(
                Request::get("/v1/dashboard?period=all_time")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let view = body_json(resp).await;
        assert_eq!(view["record_count"], h.store.list_posts().len());
        assert!(view["previous"].is_null());
        assert_eq!(view["funnel"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_dashboard_rejects_unknown_period() {
        let h = harness().await;
        let resp = h
            .app
            .oneshot(
                Request::get("/v1/dashboard?period=decade")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard_rejects_unusable_custom_ranges() {
        let h = harness().await;
        for query in [
            "period=custom&from=-200000-01-01&to=2024-01-01",
            "period=custom&from=2024-01-01&to=%2B262142-12-31",
            "period=custom&from=2024-01-01&to=2100-01-01",
            "period=custom&from=2024-02-01&to=2024-01-01",
        ] {
            let resp = h
                .app
                .clone()
                .oneshot(
                    Request::get(format!("/v1/dashboard?{query}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{query}");
        }
    }

    #[tokio::test]
    async fn test_payment_webhook_renews_and_emails() {
        let h = harness().await;
        let user = h
            .store
            .create_user(
                CreateUserRequest {
                    name: "Bia".into(),
                    email: "bia@example.com".into(),
                    role: UserRole::User,
                },
                "admin",
            )
            .unwrap();

        let resp = h
            .app
            .clone()
            .oneshot(
                Request::post("/v1/webhooks/payment")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-webhook-secret", "whsec")
                    .body(Body::from(
                        r#"{"event":"payment_succeeded","email":"bia@example.com"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["outcome"], "subscription_renewed");

        let stored = h.store.get_user(user.id).unwrap();
        let expires = stored.subscription_expires_at.unwrap();
        assert!(expires > Utc::now() + Duration::days(29));
        assert_eq!(h.mailer.sent().len(), 1);
        assert_eq!(h.mailer.sent()[0].to, "bia@example.com");

        let token = admin_token(&h.app).await;
        let resp = h
            .app
            .oneshot(
                Request::get(format!("/api/v1/users/{}/subscription", user.id))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "active");
    }

    #[tokio::test]
    async fn test_payment_webhook_wrong_secret() {
        let h = harness().await;
        let resp = h
            .app
            .oneshot(
                Request::post("/v1/webhooks/payment")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-webhook-secret", "nope")
                    .body(Body::from(r#"{"event":"payment_succeeded","email":"x@y.z"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_send_email_requires_admin() {
        let h = harness().await;
        let user_id = h.store.list_users()[0].id;
        let body = serde_json::json!({"user_id": user_id, "type": "welcome"}).to_string();

        let resp = h
            .app
            .clone()
            .oneshot(
                Request::post("/api/v1/emails")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.clone()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = admin_token(&h.app).await;
        let resp = h
            .app
            .oneshot(
                Request::post("/api/v1/emails")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(h.mailer.sent().len(), 1);
    }
}
