//! Two-party WebSocket chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin lilychat-server -- --jwt-secret dev-secret
//! LILYCHAT_JWT_SECRET=dev-secret cargo run --bin lilychat-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use lilychat_server::{
    config::ServerConfig,
    infrastructure::{
        auth::JwtTokenVerifier, registry::InMemoryConnectionRegistry,
        repository::InMemoryMessageRepository,
    },
    ui::Server,
    usecase::{
        AuthenticateUseCase, ConnectUserUseCase, DisconnectUserUseCase, GetActiveUsersUseCase,
        GetConversationUseCase, SendMessageUseCase,
    },
};
use lilychat_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::parse();

    // Initialize dependencies in order:
    // 1. Repository, Registry, TokenVerifier
    // 2. UseCases
    // 3. Server

    // 1. Create adapters
    let repository = Arc::new(match config.message_capacity {
        Some(capacity) => InMemoryMessageRepository::with_capacity(capacity),
        None => InMemoryMessageRepository::new(),
    });
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let verifier = Arc::new(JwtTokenVerifier::new(config.jwt_secret.as_bytes()));
    let clock = Arc::new(SystemClock);

    // 2. Create UseCases
    let authenticate_usecase = Arc::new(AuthenticateUseCase::new(verifier));
    let connect_user_usecase = Arc::new(ConnectUserUseCase::new(registry.clone(), clock.clone()));
    let disconnect_user_usecase = Arc::new(DisconnectUserUseCase::new(registry.clone()));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        repository.clone(),
        registry.clone(),
        clock,
    ));
    let get_conversation_usecase = Arc::new(GetConversationUseCase::new(repository));
    let get_active_users_usecase = Arc::new(GetActiveUsersUseCase::new(registry));

    // 3. Create and run the server
    let server = Server::new(
        authenticate_usecase,
        connect_user_usecase,
        disconnect_user_usecase,
        send_message_usecase,
        get_conversation_usecase,
        get_active_users_usecase,
        config.outbound_queue_capacity,
    );
    if let Err(e) = server
        .run(&config.host, config.port, config.shutdown_timeout())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
