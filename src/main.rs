use poem::listener::TcpListener;

use tfbgate::app::AppContext;
use tfbgate::config::{Config, Settings};
use tfbgate::logging::{self, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(LogFormat::from_env());

    let config = Config::from_env();
    let settings = Settings::from_env();

    if config.admin_token.is_none() {
        tracing::warn!("TFBGATE_ADMIN_TOKEN is not set, settings endpoints will reject all requests");
    }
    tracing::info!(
        enabled = settings.enabled,
        environment = ?settings.environment,
        "Challenge account integration configured"
    );

    let context = AppContext::build(&config, settings)?;
    let server_url = format!("http://localhost:{}", config.port);
    let app = context.routes(&server_url);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting tfbgate server on {}", addr);

    poem::Server::new(TcpListener::bind(&addr)).run(app).await?;

    Ok(())
}
