//! Throttl Service Binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use throttl_server::{router, LogFormat, ThrottlConfig, ThrottlService, THROTTL_VERSION};

const DEFAULT_LOG_FILTER: &str =
    "throttl_server=info,throttl_metering=info,throttl_store=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ThrottlConfig::load()?;

    init_tracing(config.log_format);

    info!("Starting Throttl Service v{}", THROTTL_VERSION);
    info!("Loaded configuration: {:?}", config);

    // Store lifecycle: connect, prepare indexes, inject
    let store = config.store.connect().await?;
    store.ensure_indexes().await?;

    let service = Arc::new(ThrottlService::new(store.clone(), config.limits.list_apis));
    let app = router(service);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Throttl listening on {}", addr);
    info!("Endpoints: /apis, /apis/:api_id, /usage, /status/:api_id, /test, /health, /version");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down Throttl service");
    if let Err(err) = store.close().await {
        warn!(error = %err, "Failed to close document store");
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => {
            warn!(error = %err, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
