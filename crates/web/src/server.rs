//! HTTP server for the Framedash shell.

use axum::Router;
use framedash_core::constants::SHELL_PREFIX;
use framedash_core::FramedashConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::assets::{bundled_assets, nest_static_files};
use crate::error::{WebError, WebResult};
use crate::routes::{shell_api_router, shell_page, AppState};
use crate::store::{spawn_watcher, DocumentStore};

/// Build the full application router for `store`.
pub fn build_app(store: Arc<DocumentStore>, config: &FramedashConfig) -> Router {
    let mut api = shell_api_router();
    if config.http.enable_cors {
        api = api.layer(create_cors_layer(config));
    }

    let mut shell = Router::new()
        .merge(bundled_assets().with_state(()))
        .merge(api);
    if let Some(dir) = &config.document.assets_dir {
        shell = nest_static_files(shell, "/assets", dir);
    }

    let mut router = Router::new()
        .nest(SHELL_PREFIX, shell)
        .fallback(shell_page)
        .with_state(AppState::new(store));

    if config.http.request_timeout > 0 {
        router = router.layer(tower_http::timeout::TimeoutLayer::new(
            std::time::Duration::from_secs(config.http.request_timeout),
        ));
    }
    if config.http.enable_request_logging {
        router = router.layer(tower_http::trace::TraceLayer::new_for_http());
    }
    router
}

/// Create CORS layer based on configuration.
fn create_cors_layer(config: &FramedashConfig) -> CorsLayer {
    let cors = CorsLayer::new();
    let cors = if config.http.cors_allowed_origins.is_empty() {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .http
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(origins)
    };
    cors.allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
}

/// Shell server bound to one configuration.
pub struct ShellServer {
    config: FramedashConfig,
    store: Arc<DocumentStore>,
}

impl ShellServer {
    /// Load the dashboard document and prepare the server.
    pub async fn new(config: FramedashConfig) -> WebResult<Self> {
        let source = config.document_source()?;
        let store = Arc::new(DocumentStore::open(source).await?);
        for issue in store.current().await.document().validate() {
            tracing::warn!("{}", issue);
        }
        Ok(Self { config, store })
    }

    pub fn store(&self) -> Arc<DocumentStore> {
        Arc::clone(&self.store)
    }

    /// Get the server address.
    pub fn addr(&self) -> WebResult<SocketAddr> {
        Ok(self.config.bind_addr()?)
    }

    /// Run until Ctrl+C or SIGTERM.
    pub async fn run(self) -> WebResult<()> {
        let addr = self.addr()?;
        let _watcher = if self.config.document.watch {
            spawn_watcher(self.store())?
        } else {
            None
        };

        info!("Starting Framedash shell");
        info!("Document source: {}", self.store.source());
        info!("CORS enabled: {}", self.config.http.enable_cors);

        let app = build_app(self.store(), &self.config);
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            WebError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", addr, e),
            ))
        })?;
        info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| WebError::Http(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Create a shutdown signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C signal, shutting down...");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM signal, shutting down...");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

/// Utility function to start server from configuration.
pub async fn start_server(config: FramedashConfig) -> WebResult<()> {
    ShellServer::new(config).await?.run().await
}
