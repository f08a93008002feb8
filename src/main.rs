mod api_doc;
mod config;
mod error;
mod gateway;
mod handlers;
mod middleware;
mod models;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agrimitra_gateway=debug,tower_http=info")),
        )
        .init();

    tracing::info!("agrimitra-gateway starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store = store::connect(&config).await?;
    let state = AppState::new(store, &config);
    middleware::rate_limit::spawn_pruner(state.rate_limiter.clone());

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.service_host, config.service_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
