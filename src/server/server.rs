// file: src/server/server.rs
// description: axum server bound to the configured host and port
// reference: https://docs.rs/axum

use crate::app::QaApplication;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::server::handlers::AppState;
use crate::server::routes::create_router;
use axum::http::Method;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct QaServer {
    config: ServerConfig,
    app: Arc<QaApplication>,
}

impl QaServer {
    pub fn new(config: ServerConfig, app: Arc<QaApplication>) -> Self {
        Self { config, app }
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut app = create_router(AppState {
            app: Arc::clone(&self.app),
        });

        if self.config.cors_enabled {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(Any);
            app = app.layer(cors);
        }

        app = app.layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;

        info!("Hierarchical Q&A web UI listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::offline_app;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_server_stops_on_shutdown() {
        let temp = TempDir::new().unwrap();
        let app = Arc::new(offline_app(&temp, 10).await);
        let mut config = app.config().server.clone();
        config.host = "127.0.0.1".to_string();
        config.port = 0;

        let server = QaServer::new(config, app);
        let result = server.run(async {}).await;
        assert!(result.is_ok());
    }
}
