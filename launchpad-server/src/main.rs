use anyhow::Context;
use launchpad_engine::{Config, Provisioner};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod service;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launchpad_server=debug,launchpad_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Launchpad server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    let config = Arc::new(config);
    let provisioner = Provisioner::from_config(config.clone()).context("Invalid configuration")?;

    tracing::info!(
        owner = %config.github_user,
        region = %config.region,
        workspace_root = %config.workspace_root.display(),
        "Provisioner ready"
    );

    // Build router with all endpoints
    let app = api::create_router(provisioner);

    let addr = bind_addr(|name| std::env::var(name).ok());

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}

/// `BIND_ADDR` wins over `PORT`; `PORT` alone binds every interface
fn bind_addr(lookup: impl Fn(&str) -> Option<String>) -> String {
    if let Some(addr) = lookup("BIND_ADDR").filter(|v| !v.trim().is_empty()) {
        return addr;
    }
    match lookup("PORT").filter(|v| !v.trim().is_empty()) {
        Some(port) => format!("0.0.0.0:{}", port.trim()),
        None => DEFAULT_BIND_ADDR.to_string(),
    }
}
