//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::Registry;

use super::{
    error::ServerError,
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(Registry::new(config, users, rooms));
/// Server::new(registry).run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// Registry（ルームごとのセッション管理）
    registry: Arc<Registry>,
}

impl Server {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Routes of the chat server
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            registry: self.registry.clone(),
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{chat_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Bind `host:port` and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?chat_id=<uuid>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `signal` resolves or the
    /// registry's shutdown token is cancelled.
    ///
    /// Sessions and connection pumps are cancelled as soon as the stop is
    /// requested, then given `shutdown_timeout` to wind down.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.registry.shutdown().clone();
        let timeout = self.registry.config().shutdown_timeout;
        let app = self.router();

        let trigger = shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let token = trigger.token();
                tokio::select! {
                    _ = signal => {}
                    _ = token.cancelled() => {}
                }
                trigger.shutdown();
            })
            .await?;

        if shutdown.graceful_shutdown(timeout).await {
            tracing::info!("Server shutdown complete");
        } else {
            tracing::warn!("Server shutdown timed out with tasks still running");
        }

        Ok(())
    }
}
