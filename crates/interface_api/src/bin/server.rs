//! Realty Ledger - API Server Binary
//!
//! This binary starts the HTTP API server for the sales ledger.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration (embedded realty.db, port 8001)
//! cargo run --bin realty-server
//!
//! # Run with environment variables
//! REALTY_PORT=9000 REALTY_DATABASE_PATH=/srv/realty/realty.db cargo run --bin realty-server
//! ```
//!
//! # Environment Variables
//!
//! * `REALTY_HOST` / `REALTY_PORT` - Listen address (default: 0.0.0.0:8001)
//! * `REALTY_STORE` - `embedded` or `remote` (default: embedded)
//! * `REALTY_DATABASE_PATH` - Database file of the embedded store
//! * `REALTY_REMOTE_BASE_URL` - Backend URL when the store is remote
//! * `REALTY_SNAPSHOT_DIR` - Directory receiving a database copy on shutdown
//! * `REALTY_TIMEZONE` - Time zone deciding "today" (default: Asia/Baghdad)
//! * `REALTY_LOG_LEVEL` / `REALTY_LOG_FORMAT` - Logging (default: info, pretty)
//!
//! `RUST_LOG` overrides the log level when set.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use core_kernel::{Clock, StoreSource, SystemClock};
use domain_sales::ports::SalesPort;
use domain_sales::{LocalSalesService, RemoteSalesAdapter};
use infra_db::{DatabaseConfig, SqliteRecordStore};
use interface_api::config::{ApiConfig, LogFormat};
use interface_api::{create_router, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, opens the configured store,
/// and serves until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - The store cannot be opened
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().context("loading configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store,
        timezone = ?config.timezone,
        "Starting realty ledger server"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.timezone));

    let (port, store): (Arc<dyn SalesPort>, Option<Arc<SqliteRecordStore>>) =
        match config.store_source().context("resolving store")? {
            StoreSource::Embedded(embedded) => {
                let store = SqliteRecordStore::open(DatabaseConfig::from(&embedded))
                    .await
                    .with_context(|| format!("opening {}", embedded.path.display()))?;
                let store = Arc::new(store);
                let service: Arc<dyn SalesPort> = Arc::new(LocalSalesService::new(store.clone(), clock.clone()));
                (service, Some(store))
            }
            StoreSource::Remote(remote) => {
                tracing::info!(base_url = %remote.base_url, "Forwarding to remote backend");
                let adapter: Arc<dyn SalesPort> =
                    Arc::new(RemoteSalesAdapter::new(remote).context("building remote adapter")?);
                (adapter, None)
            }
        };

    let snapshot_dir = config.snapshot_dir.clone();
    let addr: SocketAddr = config.server_addr().parse().context("parsing listen address")?;
    let mut state = AppState::new(port, clock, config);
    if let Some(store) = &store {
        state = state.with_store(store.clone());
    }
    let app = create_router(state);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(store) = store {
        if let Some(dir) = snapshot_dir {
            write_snapshot(&store, &dir).await;
        }
        store.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// # Arguments
///
/// * `log_level` - The minimum log level when `RUST_LOG` is unset
/// * `format` - Human-readable or JSON lines
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Writes `realty-<timestamp>.db` into `dir`
///
/// Failures are logged; shutdown continues either way.
async fn write_snapshot(store: &SqliteRecordStore, dir: &Path) {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::error!(dir = %dir.display(), error = %e, "Cannot create snapshot directory");
        return;
    }
    let target = dir.join(format!("realty-{}.db", Utc::now().format("%Y%m%d-%H%M%S")));
    match store.export_snapshot(&target).await {
        Ok(()) => tracing::info!(path = %target.display(), "Snapshot saved"),
        Err(e) => tracing::error!(path = %target.display(), error = %e, "Snapshot failed"),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
