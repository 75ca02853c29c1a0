use std::{future::Future, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::metrics;
use crate::routes::{self, ServerState};
use service::{runtime, FileTransactionStore, TransactionStore};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Prepare the data root and open the ledger it holds.
pub async fn build_state(config: &AppConfig) -> Result<ServerState, StartupError> {
    runtime::ensure_data_dir(&config.storage.data_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    // 账本存储（文件持久化 <data_dir>/transactions.json）
    let file_store = FileTransactionStore::new(config.storage.ledger_path()).await?;
    let store: Arc<dyn TransactionStore> = file_store;

    metrics::init();
    metrics::set_stored(store.count().await);

    Ok(ServerState { store })
}

/// Router with all layers applied.
pub fn build_app(state: ServerState) -> Router {
    routes::build_router(build_cors(), state)
}

/// Wait for Ctrl+C or SIGTERM (`docker stop`).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(service = "myday", event = "shutdown_signal", signal = "ctrl_c", "shutting down"),
        _ = terminate => info!(service = "myday", event = "shutdown_signal", signal = "sigterm", "shutting down"),
    }
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "myday listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!(%addr, "http server drained");
    Ok(())
}

/// Public entry: build state and router, bind, serve until `shutdown`.
pub async fn run_until<F>(config: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut config = config;
    config
        .normalize_and_validate()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let state = build_state(&config).await?;
    let app = build_app(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    serve(listener, app, shutdown).await
}

/// Run until Ctrl+C / SIGTERM.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    run_until(config, shutdown_signal()).await
}
