//! Server execution logic.

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    AuthenticateUseCase, ConnectUserUseCase, DisconnectUserUseCase, GetActiveUsersUseCase,
    GetConversationUseCase, SendMessageUseCase,
};

use super::{
    handler::{
        http::{active_connections, get_conversation, health_check},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     authenticate_usecase,
///     connect_user_usecase,
///     disconnect_user_usecase,
///     send_message_usecase,
///     get_conversation_usecase,
///     get_active_users_usecase,
///     64,
/// );
/// server.run("127.0.0.1", 8080, Duration::from_secs(5)).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `outbound_queue_capacity` - Number of frames buffered per connection
    pub fn new(
        authenticate_usecase: Arc<AuthenticateUseCase>,
        connect_user_usecase: Arc<ConnectUserUseCase>,
        disconnect_user_usecase: Arc<DisconnectUserUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        get_conversation_usecase: Arc<GetConversationUseCase>,
        get_active_users_usecase: Arc<GetActiveUsersUseCase>,
        outbound_queue_capacity: usize,
    ) -> Self {
        let state = AppState {
            authenticate_usecase,
            connect_user_usecase,
            disconnect_user_usecase,
            send_message_usecase,
            get_conversation_usecase,
            get_active_users_usecase,
            outbound_queue_capacity,
            shutdown_token: CancellationToken::new(),
            sessions: TaskTracker::new(),
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Token that stops the server (and every session) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown_token.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/api/1/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/1/conversations/{peer_id}", get(get_conversation))
            .route("/api/health", get(health_check))
            .route("/debug/connections", get(active_connections))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until a shutdown signal arrives,
    /// then wait up to `shutdown_timeout` for the sessions to drain.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_timeout: Duration,
    ) -> Result<(), std::io::Error> {
        let app = self.router();
        let shutdown_token = self.shutdown_token();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_token))
            .await?;

        let sessions = &self.state.sessions;
        sessions.close();
        tracing::info!("Waiting for {} session(s) to close", sessions.len());
        if tokio::time::timeout(shutdown_timeout, sessions.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                "{} session(s) still open after {:?}",
                sessions.len(),
                shutdown_timeout
            );
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Run the WebSocket chat server
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(
        self,
        host: &str,
        port: u16,
        shutdown_timeout: Duration,
    ) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "WebSocket chat server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/api/1/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_timeout).await?;
        Ok(())
    }
}
