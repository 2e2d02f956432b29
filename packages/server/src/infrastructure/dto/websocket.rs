//! WebSocket frame DTOs (one JSON object per frame).

use serde::{Deserialize, Serialize};

/// Value of the `type` field of outbound frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Connected,
    Message,
    Error,
}

/// Inbound frame: a request to send a message as the session's user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    pub text: String,
}

/// Acknowledgement sent once the connection is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedMessage {
    pub r#type: MessageType,
    pub user_id: i64,
    pub message: String,
}

/// A persisted message delivered to sender and receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub r#type: MessageType,
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub error: String,
}

/// Any outbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Connected(ConnectedMessage),
    Chat(ChatMessage),
    Error(ErrorMessage),
}
