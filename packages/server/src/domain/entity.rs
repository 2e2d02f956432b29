//! Domain entities.

use super::value_object::{MessageId, MessageText, Timestamp, UserId};

/// A chat turn that has not been persisted yet (no id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: MessageText,
    pub created_at: Timestamp,
}

impl NewMessage {
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        text: MessageText,
        created_at: Timestamp,
    ) -> Self {
        Self {
            sender_id,
            receiver_id,
            text,
            created_at,
        }
    }

    /// Attach the id assigned by the persistence gateway.
    pub fn persisted(self, id: MessageId) -> Message {
        Message {
            id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

/// A persisted, immutable chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: MessageText,
    pub created_at: Timestamp,
}

impl Message {
    /// Whether this message belongs to the conversation between `a` and `b`
    /// (in either direction).
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Event queued on a connection's outbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Acknowledgement sent once the connection is registered.
    Connected(UserId),
    /// A persisted message, delivered to sender and receiver.
    Message(Message),
    /// A failure reported back to the connection.
    Error(String),
}
