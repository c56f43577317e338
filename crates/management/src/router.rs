//! Management API router: mounts all CRUD endpoints under /api/v1.

use crate::auth::{auth_middleware, AuthService};
use crate::handlers::{self, ManagementState};
use crate::store::ManagementStore;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Build the management router. Everything except login requires an admin
/// bearer token. Returns a Router that should be merged into the main app.
pub fn management_router(store: Arc<ManagementStore>, auth: Arc<AuthService>) -> Router {
    let state = ManagementState {
        store,
        auth: auth.clone(),
    };

    let protected = Router::new()
        // Influencers
        .route("/api/v1/influencers", get(handlers::list_influencers).post(handlers::create_influencer))
        .route("/api/v1/influencers/:id", get(handlers::get_influencer).put(handlers::update_influencer).delete(handlers::delete_influencer))
        // Products
        .route("/api/v1/products", get(handlers::list_products).post(handlers::create_product))
        .route("/api/v1/products/:id", get(handlers::get_product).put(handlers::update_product).delete(handlers::delete_product))
        // Partners
        .route("/api/v1/partners", get(handlers::list_partners).post(handlers::create_partner))
        .route("/api/v1/partners/:id", get(handlers::get_partner).put(handlers::update_partner).delete(handlers::delete_partner))
        // Posts
        .route("/api/v1/posts", get(handlers::list_posts).post(handlers::create_post))
        .route("/api/v1/posts/:id", get(handlers::get_post).put(handlers::update_post).delete(handlers::delete_post))
        // Admin user management
        .route("/api/v1/users", get(handlers::list_users).post(handlers::create_user))
        .route("/api/v1/users/:id", get(handlers::get_user).put(handlers::update_user).delete(handlers::delete_user))
        // Audit log
        .route("/api/v1/audit-log", get(handlers::audit_log))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/api/v1/auth/login", post(handlers::handle_login))
        .merge(protected)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use lci_core::config::AuthConfig;
    use tower::ServiceExt;

    fn app() -> Router {
        management_router(
            Arc::new(ManagementStore::new()),
            Arc::new(AuthService::new(AuthConfig::default())),
        )
    }

    async fn login(app: &Router) -> String {
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
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_requires_token() {
        let resp = app()
            .oneshot(Request::get("/api/v1/posts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_fetch_product() {
        let app = app();
        let token = login(&app).await;
        let resp = app
            .clone()
            .oneshot(
                Request::post("/api/v1/products")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Serum","price":49.9}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let product: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let id = product["id"].as_str().unwrap();

        let resp = app
            .oneshot(
                Request::get(format!("/api/v1/products/{id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_post_is_bad_request() {
        let app = app();
        let token = login(&app).await;
        let body = serde_json::json!({
            "title": "Orphan",
            "influencer_id": uuid::Uuid::new_v4(),
            "product_id": uuid::Uuid::new_v4(),
            "post_date": "2024-01-01T00:00:00Z"
        });
        let resp = app
            .oneshot(
                Request::post("/api/v1/posts")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_audit_records_logged_in_admin() {
        let store = Arc::new(ManagementStore::new());
        let app = management_router(
            store.clone(),
            Arc::new(AuthService::new(AuthConfig {
                admin_username: "maria".into(),
                admin_password: "pw".into(),
                token_ttl_hours: 1,
            })),
        );
        let resp = app
            .clone()
            .oneshot(
                Request::post("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"maria","password":"pw"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let token = json["token"].as_str().unwrap().to_string();

        let resp = app
            .oneshot(
                Request::post("/api/v1/products")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Serum","price":49.9}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let created: Vec<_> = store
            .get_audit_log()
            .into_iter()
            .filter(|e| e.resource_type == "product")
            .collect();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].user, "maria");
    }
}
