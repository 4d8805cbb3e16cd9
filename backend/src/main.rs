use std::sync::Arc;

use pandascan_backend::config::Config;
use pandascan_backend::{router, AppState, Scanner};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let shell = config.static_dir.join("index.html");
    if !tokio::fs::try_exists(&shell).await.unwrap_or(false) {
        warn!(path = %shell.display(), "app shell not found, non-API routes will 404");
    }

    let scanner = Scanner::from_config(&config);
    let state = Arc::new(AppState::new(scanner));
    let app = router(state, &config.static_dir);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        strategy = %config.strategy,
        simulate_latency = config.simulate_latency,
        seeded = config.seed.is_some(),
        "PandaScanPro backend listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;

    Ok(())
}
