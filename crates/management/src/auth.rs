//! Bearer token authentication for the admin API.
//!
//! Credentials come from `AuthConfig`; issued tokens live in memory until
//! they expire.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use lci_core::config::AuthConfig;
use lci_core::{LciError, LciResult};
use rand::Rng;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::models::{ErrorResponse, LoginRequest, LoginResponse};

const TOKEN_PREFIX: &str = "lci_";

#[derive(Debug, Clone)]
struct Session {
    user: String,
    expires_at: DateTime<Utc>,
}

/// Admin username resolved by `auth_middleware`, available to handlers as a
/// request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub String);

pub struct AuthService {
    config: AuthConfig,
    sessions: DashMap<String, Session>,
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
        }
    }

    /// Validate a login request and return a bearer token.
    pub fn authenticate(&self, req: &LoginRequest) -> LciResult<LoginResponse> {
        let user_ok = constant_time_eq(&req.username, &self.config.admin_username);
        let pass_ok = constant_time_eq(&req.password, &self.config.admin_password);
        if !(user_ok && pass_ok) {
            warn!(username = %req.username, "Rejected admin login");
            return Err(LciError::Unauthorized("Invalid credentials".into()));
        }

        let now = Utc::now();
        self.sweep_expired(now);

        let token = generate_token();
        let expires_at = now + Duration::hours(self.config.token_ttl_hours);
        self.sessions.insert(
            token.clone(),
            Session {
                user: req.username.clone(),
                expires_at,
            },
        );
        Ok(LoginResponse {
            token,
            user: req.username.clone(),
            expires_at,
        })
    }

    /// Drop every session that has expired at `now`.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!(removed, "Expired admin sessions swept");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Resolve a bearer token to the admin user it was issued to.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        let session = self.sessions.get(token)?.value().clone();
        if session.expires_at <= now {
            self.sessions.remove(token);
            debug!("Expired admin session removed");
            return None;
        }
        Some(session.user)
    }

    /// Check a bearer `Authorization` header value.
    pub fn verify_header(&self, value: Option<&str>) -> LciResult<String> {
        let token = value
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| LciError::Unauthorized("Authorization header with Bearer token required".into()))?;
        self.verify(token, Utc::now())
            .ok_or_else(|| LciError::Unauthorized("Invalid or expired bearer token".into()))
    }
}

/// Generate a random bearer token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!(
        "{}{}",
        TOKEN_PREFIX,
        bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>()
    )
}

/// Axum middleware that requires a valid admin bearer token and attaches
/// the resolved `AdminUser` to the request.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth.verify_header(header_value) {
        Ok(user) => {
            req.extensions_mut().insert(AdminUser(user));
            next.run(req).await
        }
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "unauthorized".to_string(),
                message: e.to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            admin_username: "root".into(),
            admin_password: "s3cret".into(),
            token_ttl_hours: 1,
        })
    }

    #[test]
    fn test_login_and_verify() {
        let auth = service();
        let resp = auth
            .authenticate(&LoginRequest { username: "root".into(), password: "s3cret".into() })
            .unwrap();
        assert!(resp.token.starts_with(TOKEN_PREFIX));
        assert_eq!(auth.verify(&resp.token, Utc::now()).as_deref(), Some("root"));
        let header = format!("Bearer {}", resp.token);
        assert!(auth.verify_header(Some(&header)).is_ok());
    }

    #[test]
    fn test_bad_credentials() {
        let auth = service();
        let err = auth
            .authenticate(&LoginRequest { username: "root".into(), password: "nope".into() })
            .unwrap_err();
        assert!(matches!(err, LciError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_and_unknown_tokens() {
        let auth = service();
        let resp = auth
            .authenticate(&LoginRequest { username: "root".into(), password: "s3cret".into() })
            .unwrap();
        assert!(auth.verify(&resp.token, Utc::now() + Duration::hours(2)).is_none());
        // expired session was dropped
        assert!(auth.verify(&resp.token, Utc::now()).is_none());
        assert!(auth.verify_header(Some("Bearer lci_unknown")).is_err());
        assert!(auth.verify_header(None).is_err());
    }

    #[test]
    fn test_login_sweeps_expired_sessions() {
        let auth = AuthService::new(AuthConfig {
            admin_username: "root".into(),
            admin_password: "s3cret".into(),
            token_ttl_hours: 0,
        });
        let login = LoginRequest { username: "root".into(), password: "s3cret".into() };
        // zero ttl: every token is already expired, but never looked up again
        for _ in 0..5 {
            auth.authenticate(&login).unwrap();
        }
        assert_eq!(auth.session_count(), 1);
        assert_eq!(auth.sweep_expired(Utc::now()), 1);
        assert_eq!(auth.session_count(), 0);
    }

    #[test]
    fn test_sweep_keeps_live_sessions() {
        let auth = service();
        let login = LoginRequest { username: "root".into(), password: "s3cret".into() };
        let first = auth.authenticate(&login).unwrap();
        auth.authenticate(&login).unwrap();
        assert_eq!(auth.session_count(), 2);
        assert_eq!(auth.sweep_expired(Utc::now()), 0);
        assert_eq!(auth.verify(&first.token, Utc::now()).as_deref(), Some("root"));
    }
}
