use crate::error::{LciError, LciResult};
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `LCI__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_webhook_secret")]
    pub webhook_secret: String,
    /// Length of one paid subscription period.
    #[serde(default = "default_subscription_days")]
    pub subscription_days: i64,
    /// Users are warned once this many days (or fewer) remain.
    #[serde(default = "default_warn_days")]
    pub warn_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_enabled")]
    pub enabled: bool,
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

// Default functions
fn default_seed_demo_data() -> bool {
    true
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_admin_password() -> String {
    "admin".to_string()
}
fn default_token_ttl_hours() -> i64 {
    24
}
fn default_webhook_secret() -> String {
    "lci-webhook-secret".to_string()
}
fn default_subscription_days() -> i64 {
    30
}
fn default_warn_days() -> i64 {
    5
}
fn default_email_enabled() -> bool {
    true
}
fn default_from_email() -> String {
    "no-reply@lci.local".to_string()
}
fn default_from_name() -> String {
    "LCI".to_string()
}
fn default_app_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            webhook_secret: default_webhook_secret(),
            subscription_days: default_subscription_days(),
            warn_days: default_warn_days(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: default_email_enabled(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            app_url: default_app_url(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed_demo_data: default_seed_demo_data(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            auth: AuthConfig::default(),
            billing: BillingConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> LciResult<Self> {
        Self::from_environment(config::Environment::with_prefix("LCI"))
    }

    /// Build from `LCI__SECTION__FIELD` style variables.
    pub fn from_environment(env: config::Environment) -> LciResult<Self> {
        config::Config::builder()
            .add_source(env.separator("__").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| LciError::Config(e.to_string()))
    }
}
