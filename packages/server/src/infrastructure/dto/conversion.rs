//! Conversion logic between DTOs and domain entities.

use lilychat_shared::time::timestamp_to_rfc3339;

use crate::domain::{Message, OutboundEvent, UserId};
use crate::infrastructure::dto::{http, websocket as dto};

/// Text of the acknowledgement frame.
pub const CONNECTED_MESSAGE: &str = "WebSocket connection established";

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl From<Message> for dto::ChatMessage {
    fn from(model: Message) -> Self {
        Self {
            r#type: dto::MessageType::Message,
            id: model.id.value(),
            sender_id: model.sender_id.value(),
            receiver_id: model.receiver_id.value(),
            text: model.text.into_string(),
            created_at: model.created_at.value(),
        }
    }
}

impl From<OutboundEvent> for dto::ServerMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::Connected(user_id) => Self::Connected(dto::ConnectedMessage {
                r#type: dto::MessageType::Connected,
                user_id: user_id.value(),
                message: CONNECTED_MESSAGE.to_string(),
            }),
            OutboundEvent::Message(message) => Self::Chat(message.into()),
            OutboundEvent::Error(error) => Self::Error(dto::ErrorMessage {
                r#type: dto::MessageType::Error,
                error,
            }),
        }
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<Message> for http::MessageDto {
    fn from(model: Message) -> Self {
        Self {
            id: model.id.value(),
            sender_id: model.sender_id.value(),
            receiver_id: model.receiver_id.value(),
            text: model.text.into_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<Vec<UserId>> for http::ActiveConnectionsDto {
    fn from(ids: Vec<UserId>) -> Self {
        Self {
            count: ids.len(),
            user_ids: ids.into_iter().map(|id| id.value()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, MessageText, NewMessage, Timestamp};

    fn message() -> Message {
        NewMessage::new(
            UserId::new(1).unwrap(),
            UserId::new(2).unwrap(),
            MessageText::new("hi".to_string()),
            Timestamp::new(1_672_531_200),
        )
        .persisted(MessageId::new(9))
    }

    #[test]
    fn test_message_event_serializes_to_wire_shape() {
        // テスト項目: メッセージイベントが "message" フレームの JSON になる
        // given (前提条件):
        let event = OutboundEvent::Message(message());

        // when (操作):
        let json = serde_json::to_value(dto::ServerMessage::from(event)).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "type": "message",
                "id": 9,
                "sender_id": 1,
                "receiver_id": 2,
                "text": "hi",
                "created_at": 1_672_531_200,
            })
        );
    }

    #[test]
    fn test_connected_event_serializes_to_wire_shape() {
        // テスト項目: 接続イベントが "connected" フレームの JSON になる
        // given (前提条件):
        let event = OutboundEvent::Connected(UserId::new(3).unwrap());

        // when (操作):
        let json = serde_json::to_value(dto::ServerMessage::from(event)).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "type": "connected",
                "user_id": 3,
                "message": CONNECTED_MESSAGE,
            })
        );
    }

    #[test]
    fn test_error_event_serializes_to_wire_shape() {
        // テスト項目: エラーイベントが "error" フレームの JSON になる
        // given (前提条件):
        let event = OutboundEvent::Error("storage down".to_string());

        // when (操作):
        let json = serde_json::to_value(dto::ServerMessage::from(event)).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({"type": "error", "error": "storage down"})
        );
    }

    #[test]
    fn test_send_message_request_parses_inbound_frame() {
        // テスト項目: 受信フレームが SendMessageRequest に変換される
        // given (前提条件):
        let raw = r#"{"receiver_id": 2, "text": "hello"}"#;

        // when (操作):
        let request: dto::SendMessageRequest = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        assert_eq!(request.receiver_id, 2);
        assert_eq!(request.text, "hello");
    }

    #[test]
    fn test_domain_message_to_http_dto() {
        // テスト項目: HTTP DTO では作成日時が RFC 3339 形式になる
        // given (前提条件):
        let model = message();

        // when (操作):
        let dto: http::MessageDto = model.into();

        // then (期待する結果):
        assert_eq!(dto.id, 9);
        assert_eq!(dto.created_at, "2023-01-01T00:00:00+00:00");
    }
}
