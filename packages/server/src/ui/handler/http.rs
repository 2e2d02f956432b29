//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::UserId,
    infrastructure::dto::http::{ActiveConnectionsDto, ConversationDto, MessageDto},
    ui::{handler::credential::AuthenticatedUser, state::AppState},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint listing the users that currently hold a connection
pub async fn active_connections(State(state): State<Arc<AppState>>) -> Json<ActiveConnectionsDto> {
    let user_ids = state.get_active_users_usecase.execute().await;
    Json(user_ids.into())
}

/// Messages exchanged between the authenticated user and `peer_id`, oldest first
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(peer_id): Path<i64>,
) -> Result<Json<ConversationDto>, StatusCode> {
    let peer = UserId::new(peer_id).map_err(|e| {
        tracing::warn!("Invalid peer id in conversation request: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    match state.get_conversation_usecase.execute(user_id, peer).await {
        Ok(messages) => {
            // Domain Model から DTO への変換
            let conversation = ConversationDto {
                user_id: user_id.value(),
                peer_id: peer.value(),
                messages: messages.into_iter().map(MessageDto::from).collect(),
            };
            Ok(Json(conversation))
        }
        Err(e) => {
            tracing::error!(
                "Failed to load conversation between users {} and {}: {}",
                user_id,
                peer,
                e
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
