use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixpress_core::{
    load_config, validate_config, CacheStore, CapabilityResolver, Executor, FormatConverter,
    ImageEditor, MemoryCache, ProcessExecutor, RasterEditor,
};
use pixpress_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("PIXPRESS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    info!("Binary root: {:?}", config.resolver.bin_root);

    let executor: Arc<dyn Executor> = Arc::new(ProcessExecutor::new(config.executor.clone()));
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let resolver = Arc::new(CapabilityResolver::new(
        &config.resolver,
        Arc::clone(&executor),
        cache,
    ));

    // Probe encoders once so the first request hits a warm cache
    let system = resolver.system_info().await;
    info!("Platform: {}", system.platform);
    for (name, record) in &system.encoders {
        if record.available {
            info!(
                encoder = %name,
                version = record.version.as_deref().unwrap_or("unknown"),
                "Encoder available"
            );
        }
    }
    for name in &system.missing_required {
        warn!(encoder = %name, "Required encoder not available");
    }

    let editor: Arc<dyn ImageEditor> = Arc::new(RasterEditor);
    let converter = Arc::new(FormatConverter::new(
        config.converter.clone(),
        Arc::clone(&resolver),
        executor,
        editor,
    ));

    let state = Arc::new(AppState::new(config.clone(), resolver, converter));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
