//! Network module with deferred startup lifecycle.
//!
//! `new()` assembles shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the shutdown future resolves.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use imgpipe_core::OperationDispatcher;
use tokio::net::TcpListener;
use tracing::info;

use super::config::NetworkConfig;
use super::handlers::{health_handler, image_handler, AppState};
use super::middleware::apply_http_layers;
use crate::service::ServerConfig;
use crate::traits::{CredentialVerifier, LogSink};

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` -- builds the dispatcher and shared state
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- begins accepting connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    state: AppState,
    listener: Option<TcpListener>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        server: ServerConfig,
        verifier: Arc<dyn CredentialVerifier>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let state = AppState {
            dispatcher: Arc::new(OperationDispatcher::new(server.dispatcher.clone())),
            verifier,
            sink,
            server: Arc::new(server),
            start_time: Instant::now(),
        };
        Self {
            config,
            state,
            listener: None,
        }
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- liveness JSON
    /// - `POST /images/{operation}` -- run one image operation
    pub fn build_router(&self) -> Router {
        let routes = Router::new()
            .route("/health", get(health_handler))
            .route("/images/{operation}", post(image_handler))
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .with_state(self.state.clone());
        apply_http_layers(routes, &self.config)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves, then lets in-flight
    /// requests finish.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, or if the server
    /// encounters a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;

        info!("Serving HTTP connections");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("HTTP server stopped");
        Ok(())
    }
}
