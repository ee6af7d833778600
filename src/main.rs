// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use trip_planner_server::{
    api::router,
    auth::{AuthError, JwksCache},
    config::{
        log_format_from_env, AppConfig, AuthMode, ConfigError, LogFormat, StorageBackend,
        DEFAULT_LOG_FILTER,
    },
    identity::{LocalIdentityProvider, ProfileCache, SessionManager},
    state::{AppState, AuthConfig},
    storage::{DocumentStore, JsonFileStore, MemoryDocumentStore, StorageError, StoragePaths},
};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage initialization failed: {0}")]
    Storage(#[from] StorageError),

    #[error("federated auth setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    init_logging(log_format_from_env());

    let config = AppConfig::from_env()?;

    let (documents, cache) = match config.storage_backend {
        StorageBackend::File => {
            let paths = StoragePaths::new(&config.data_dir);
            let mut store = JsonFileStore::new(paths.clone());
            store.initialize()?;
            info!(data_dir = %config.data_dir.display(), "Using JSON file document store");
            (Arc::new(store) as Arc<dyn DocumentStore>, ProfileCache::new(paths))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory document store; data is lost on restart");
            (
                Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>,
                ProfileCache::in_memory(),
            )
        }
    };

    let auth_config = match (&config.federated_jwks_url, config.auth_mode) {
        (Some(url), _) => {
            info!(jwks_url = %url, "Federated sign-in in production mode");
            AuthConfig {
                jwks: Some(Arc::new(JwksCache::new(url.as_str())?)),
                issuer: config.federated_issuer.clone(),
                audience: config.federated_audience.clone(),
                allow_unsigned: false,
            }
        }
        (None, AuthMode::Development) => {
            warn!("AUTH_MODE=development: federated ID tokens are not signature-checked");
            AuthConfig::development()
        }
        (None, AuthMode::Production) => {
            warn!("FEDERATED_JWKS_URL not set; federated sign-in is disabled");
            AuthConfig::default()
        }
    };

    let state = AppState::new(
        documents,
        Arc::new(LocalIdentityProvider::new()),
        SessionManager::new(cache),
    )
    .with_auth_config(auth_config);

    let shutdown = CancellationToken::new();
    let session_task = state.spawn_session_manager(shutdown.clone());

    let app = router(state);
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Trip planner listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = session_task.await {
        warn!(error = %e, "Session manager task ended abnormally");
    }
    info!("Server stopped");
    Ok(())
}

fn init_logging(format: LogFormat) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter_layer);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
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
