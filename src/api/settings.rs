use poem::Request;
use poem_openapi::{payload::Json, ApiResponse, Object, OpenApi};
use std::sync::Arc;

use crate::config::{AuthScheme, Environment, Settings, SettingsPatch, SettingsStore};
use crate::error::ErrorBody;
use crate::security::{mask_key, require_admin};

pub struct SettingsApi {
    store: Arc<SettingsStore>,
    admin_token: Option<String>,
}

impl SettingsApi {
    pub fn new(store: Arc<SettingsStore>, admin_token: Option<String>) -> Self {
        Self { store, admin_token }
    }
}

/// Settings as shown to administrators; keys are masked
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Object)]
pub struct SettingsView {
    pub enabled: bool,
    pub environment: Environment,
    pub sandbox_endpoint: String,
    pub sandbox_key: String,
    pub live_endpoint: String,
    pub live_key: String,
    pub save_log_response: bool,
    pub auth_scheme: AuthScheme,
}

impl From<Settings> for SettingsView {
    fn from(settings: Settings) -> Self {
        Self {
            enabled: settings.enabled,
            environment: settings.environment,
            sandbox_endpoint: settings.sandbox_endpoint,
            sandbox_key: mask_key(&settings.sandbox_key),
            live_endpoint: settings.live_endpoint,
            live_key: mask_key(&settings.live_key),
            save_log_response: settings.save_log_response,
            auth_scheme: settings.auth_scheme,
        }
    }
}

#[derive(ApiResponse)]
pub enum SettingsResponse {
    #[oai(status = 200)]
    Ok(Json<SettingsView>),

    #[oai(status = 401)]
    Unauthorized(Json<ErrorBody>),
}

#[OpenApi]
impl SettingsApi {
    #[oai(path = "/settings", method = "get")]
    async fn get_settings(&self, req: &Request) -> SettingsResponse {
        if let Err(e) = require_admin(req, self.admin_token.as_deref()) {
            return SettingsResponse::Unauthorized(Json(e.body()));
        }
        SettingsResponse::Ok(Json(self.store.snapshot().await.into()))
    }

    /// Partially update the settings; omitted fields are kept
    #[oai(path = "/settings", method = "put")]
    async fn update_settings(&self, req: &Request, body: Json<SettingsPatch>) -> SettingsResponse {
        if let Err(e) = require_admin(req, self.admin_token.as_deref()) {
            return SettingsResponse::Unauthorized(Json(e.body()));
        }
        SettingsResponse::Ok(Json(self.store.update(body.0).await.into()))
    }
}
