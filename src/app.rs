use std::sync::Arc;

use poem::{Endpoint, EndpointExt, Route};
use poem_openapi::OpenApiService;

use crate::api::{HealthApi, OrdersApi, SettingsApi};
use crate::business::{CompletionNotifier, CustomerResolver, EventDispatcher, OrderService};
use crate::cache::TransientStore;
use crate::challenge::ChallengeApiClient;
use crate::config::{Config, Settings, SettingsStore};
use crate::domain::{AccountDirectory, InMemoryAccountDirectory, OrderStore};
use crate::observability::RequestTracingMiddleware;

/// Shared services behind the HTTP surface
pub struct AppContext {
    pub orders: Arc<OrderStore>,
    pub accounts: Arc<InMemoryAccountDirectory>,
    pub settings: Arc<SettingsStore>,
    pub transients: TransientStore,
    pub order_service: Arc<OrderService>,
    pub admin_token: Option<String>,
}

impl AppContext {
    pub fn build(config: &Config, settings: Settings) -> anyhow::Result<Self> {
        let orders = Arc::new(OrderStore::new());
        let accounts = Arc::new(InMemoryAccountDirectory::new());
        let settings = Arc::new(SettingsStore::new(settings));
        let transients = TransientStore::new();

        let client = Arc::new(
            ChallengeApiClient::new()
                .map_err(|e| anyhow::anyhow!("Failed to create challenge API client: {}", e))?,
        );
        let notifier = Arc::new(CompletionNotifier::new(
            orders.clone(),
            transients.clone(),
            client,
        ));

        let mut dispatcher = EventDispatcher::new();
        dispatcher.subscribe(notifier);

        let directory: Arc<dyn AccountDirectory> = accounts.clone();
        let resolver = CustomerResolver::new(directory, orders.clone());
        let order_service = Arc::new(OrderService::new(
            orders.clone(),
            settings.clone(),
            resolver,
            dispatcher,
        ));

        Ok(Self {
            orders,
            accounts,
            settings,
            transients,
            order_service,
            admin_token: config.admin_token.clone(),
        })
    }

    pub fn routes(&self, server_url: &str) -> impl Endpoint {
        let api_service = OpenApiService::new(
            (
                HealthApi::new(self.settings.clone()),
                OrdersApi::new(self.order_service.clone()),
                SettingsApi::new(self.settings.clone(), self.admin_token.clone()),
            ),
            "tfbgate API",
            env!("CARGO_PKG_VERSION"),
        )
        .server(server_url);

        let ui = api_service.swagger_ui();
        let spec = api_service.spec_endpoint();

        Route::new()
            .nest("/", api_service)
            .nest("/docs", ui)
            .nest("/spec", spec)
            .with(RequestTracingMiddleware)
    }
}
