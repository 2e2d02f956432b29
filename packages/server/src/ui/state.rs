//! Shared application state.

use std::sync::Arc;

use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::usecase::{
    AuthenticateUseCase, ConnectUserUseCase, DisconnectUserUseCase, GetActiveUsersUseCase,
    GetConversationUseCase, SendMessageUseCase,
};

/// Shared application state
pub struct AppState {
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    pub connect_user_usecase: Arc<ConnectUserUseCase>,
    pub disconnect_user_usecase: Arc<DisconnectUserUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub get_conversation_usecase: Arc<GetConversationUseCase>,
    pub get_active_users_usecase: Arc<GetActiveUsersUseCase>,
    /// Capacity of each connection's outbound queue
    pub outbound_queue_capacity: usize,
    /// Root token; every session holds a child of it
    pub shutdown_token: CancellationToken,
    /// Running session tasks, awaited on shutdown
    pub sessions: TaskTracker,
}
