use poem_openapi::{payload::Json, ApiResponse, OpenApi};
use std::sync::Arc;

use crate::config::{Environment, SettingsStore};

pub struct HealthApi {
    settings: Arc<SettingsStore>,
}

impl HealthApi {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, poem_openapi::Object)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub integration_enabled: bool,
    pub environment: Environment,
}

#[derive(ApiResponse)]
pub enum HealthResponse {
    #[oai(status = 200)]
    Ok(Json<HealthStatus>),
}

#[OpenApi]
impl HealthApi {
    /// Liveness plus the active integration mode
    #[oai(path = "/health", method = "get")]
    async fn health(&self) -> HealthResponse {
        let settings = self.settings.snapshot().await;
        HealthResponse::Ok(Json(HealthStatus {
            status: "healthy".to_string(),
            service: "tfbgate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            integration_enabled: settings.enabled,
            environment: settings.environment,
        }))
    }
}
