use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetchcycle_core::{
    create_notifier, load_config, validate_config, HttpStorer, Notifier, SqliteStatusStore,
    StatusStore, Storer,
};

use fetchcycle_server::api::create_router;
use fetchcycle_server::state::{AppState, GetterFactory, HttpGetterFactory};

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
    let config_path = std::env::var("FETCHCYCLE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!(
        "Cycle: import_type={}, concurrent_count={}",
        config.cycle.import_type, config.cycle.concurrent_count
    );

    // Create SQLite status store
    let status_store: Arc<dyn StatusStore> = Arc::new(
        SqliteStatusStore::new(&config.database.path)
            .context("Failed to create status store")?,
    );
    info!("Status store initialized");

    // Record source, one getter per tenant
    let getter_factory: Option<Arc<dyn GetterFactory>> = match &config.source {
        Some(source_config) => {
            info!("Using HTTP source at {}", source_config.url);
            Some(Arc::new(HttpGetterFactory::new(source_config.clone())))
        }
        None => {
            warn!("No source configured, imports are disabled");
            None
        }
    };

    // Record sink
    let storer: Option<Arc<dyn Storer>> = match &config.sink {
        Some(sink_config) => {
            info!("Using HTTP sink at {}", sink_config.url);
            Some(Arc::new(
                HttpStorer::new(sink_config.clone()).context("Failed to create HTTP sink")?,
            ))
        }
        None => {
            warn!("No sink configured, imports are disabled");
            None
        }
    };

    // Completion notifier
    let notifier = create_notifier(&config.notifier).context("Failed to create notifier")?;
    info!("Using notifier: {}", notifier.name());

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        status_store,
        getter_factory,
        storer,
        notifier,
    ));

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
