//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// A stored message as returned by the conversation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub text: String,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDto {
    pub user_id: i64,
    pub peer_id: i64,
    pub messages: Vec<MessageDto>,
}

/// Snapshot of the connection registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConnectionsDto {
    pub count: usize,
    pub user_ids: Vec<i64>,
}
