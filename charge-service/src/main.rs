use std::sync::Arc;

use charge_core::auth::{HttpAuthGateway, HttpAuthGatewayConfig};
use charge_service::{config::Config, Application};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,charge_service=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    let mut gateway_config = HttpAuthGatewayConfig {
        base_url: config.auth.base_url.clone(),
        ..HttpAuthGatewayConfig::default()
    };
    if let Some(timeout) = config.auth.connect_timeout {
        gateway_config.connect_timeout = timeout;
    }
    if let Some(timeout) = config.auth.request_timeout {
        gateway_config.request_timeout = timeout;
    }
    let auth = Arc::new(HttpAuthGateway::new(gateway_config)?);

    let application = Application::build(config, auth).await?;
    application.run_until_stopped().await?;

    Ok(())
}
