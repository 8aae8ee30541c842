use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

pub const DEFAULT_SANDBOX_ENDPOINT: &str =
    "https://bqsyp740n4.execute-api.ap-southeast-1.amazonaws.com";
pub const DEFAULT_LIVE_ENDPOINT: &str = "https://api.ypf.customers.sigma-ventures.cloud";

pub struct Config {
    pub port: u16,
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            admin_token: lookup("TFBGATE_ADMIN_TOKEN").filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Partner API environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
#[oai(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl Environment {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Environment::Sandbox => DEFAULT_SANDBOX_ENDPOINT,
            Environment::Live => DEFAULT_LIVE_ENDPOINT,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Some(Environment::Sandbox),
            "live" => Some(Environment::Live),
            _ => None,
        }
    }
}

/// How the partner key travels on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Enum)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    #[default]
    #[serde(rename = "bearer")]
    #[oai(rename = "bearer")]
    Bearer,
    /// `X-Client-Key: <key>`
    #[serde(rename = "client-key")]
    #[oai(rename = "client-key")]
    ClientKey,
}

impl AuthScheme {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bearer" => Some(AuthScheme::Bearer),
            "client-key" | "client_key" => Some(AuthScheme::ClientKey),
            _ => None,
        }
    }
}

/// Integration settings, read on every provisioning attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub enabled: bool,
    pub environment: Environment,
    pub sandbox_endpoint: String,
    pub sandbox_key: String,
    pub live_endpoint: String,
    pub live_key: String,
    pub save_log_response: bool,
    pub auth_scheme: AuthScheme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: false,
            environment: Environment::Sandbox,
            sandbox_endpoint: DEFAULT_SANDBOX_ENDPOINT.to_string(),
            sandbox_key: String::new(),
            live_endpoint: DEFAULT_LIVE_ENDPOINT.to_string(),
            live_key: String::new(),
            save_log_response: true,
            auth_scheme: AuthScheme::Bearer,
        }
    }
}

/// Endpoint and key selected for the active environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTarget {
    pub endpoint: String,
    pub key: String,
    pub auth_scheme: AuthScheme,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        Self {
            enabled: lookup("TFBGATE_ENABLED")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.enabled),
            environment: lookup("TFBGATE_ENVIRONMENT")
                .and_then(|v| Environment::parse(&v))
                .unwrap_or(defaults.environment),
            sandbox_endpoint: lookup("TFBGATE_SANDBOX_ENDPOINT")
                .unwrap_or(defaults.sandbox_endpoint),
            sandbox_key: lookup("TFBGATE_SANDBOX_KEY").unwrap_or(defaults.sandbox_key),
            live_endpoint: lookup("TFBGATE_LIVE_ENDPOINT").unwrap_or(defaults.live_endpoint),
            live_key: lookup("TFBGATE_LIVE_KEY").unwrap_or(defaults.live_key),
            save_log_response: lookup("TFBGATE_SAVE_LOG_RESPONSE")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.save_log_response),
            auth_scheme: lookup("TFBGATE_AUTH_SCHEME")
                .and_then(|v| AuthScheme::parse(&v))
                .unwrap_or(defaults.auth_scheme),
        }
    }

    /// Pick the endpoint/key pair for the configured environment.
    pub fn resolve_target(&self) -> ApiTarget {
        let (endpoint, key) = match self.environment {
            Environment::Sandbox => (&self.sandbox_endpoint, &self.sandbox_key),
            Environment::Live => (&self.live_endpoint, &self.live_key),
        };

        let endpoint = if endpoint.trim().is_empty() {
            self.environment.default_endpoint().to_string()
        } else {
            endpoint.trim().to_string()
        };

        ApiTarget {
            endpoint,
            key: key.trim().to_string(),
            auth_scheme: self.auth_scheme,
        }
    }

    fn apply(&mut self, patch: SettingsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(environment) = patch.environment {
            self.environment = environment;
        }
        if let Some(endpoint) = patch.sandbox_endpoint {
            self.sandbox_endpoint = endpoint;
        }
        if let Some(key) = patch.sandbox_key {
            self.sandbox_key = key;
        }
        if let Some(endpoint) = patch.live_endpoint {
            self.live_endpoint = endpoint;
        }
        if let Some(key) = patch.live_key {
            self.live_key = key;
        }
        if let Some(save) = patch.save_log_response {
            self.save_log_response = save;
        }
        if let Some(scheme) = patch.auth_scheme {
            self.auth_scheme = scheme;
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Object)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub environment: Option<Environment>,
    pub sandbox_endpoint: Option<String>,
    pub sandbox_key: Option<String>,
    pub live_endpoint: Option<String>,
    pub live_key: Option<String>,
    pub save_log_response: Option<bool>,
    pub auth_scheme: Option<AuthScheme>,
}

pub struct SettingsStore {
    settings: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Copy of the current settings, taken once per request.
    pub async fn snapshot(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub async fn update(&self, patch: SettingsPatch) -> Settings {
        let mut settings = self.settings.write().await;
        settings.apply(patch);
        info!(
            enabled = settings.enabled,
            environment = ?settings.environment,
            "Settings updated"
        );
        settings.clone()
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
