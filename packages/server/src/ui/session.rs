//! Per-connection session state machine.
//!
//! ```text
//! Connecting -> Authenticated -> Registered -> Reading -> Closing -> Closed
//!      \-> Closed (unauthorized)      \-> Closing (ack failed)
//! ```
//!
//! The WebSocket handler drives the transitions; this module owns the
//! transition rules and the decoding of inbound frames.

use axum::extract::ws::Message;
use thiserror::Error;

use crate::{
    domain::{AuthenticationError, MessageText, UserId},
    infrastructure::dto::websocket::SendMessageRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Raw request accepted, not upgraded yet.
    Connecting,
    /// A user identity was produced from the credential.
    Authenticated,
    /// The connection handle is installed in the registry.
    Registered,
    /// Waiting for inbound frames.
    Reading,
    /// Unregistering and closing the transport.
    Closing,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Authenticated)
                | (Connecting, Closed)
                | (Authenticated, Registered)
                | (Authenticated, Closing)
                | (Registered, Reading)
                | (Registered, Closing)
                | (Reading, Closing)
                | (Closing, Closed)
        )
    }
}

/// Errors that end a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed frame: {0}")]
    Validation(String),

    #[error("invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
}

/// A decoded send request, already validated into domain types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub receiver_id: UserId,
    pub text: MessageText,
}

/// What the read loop should do with one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Request(InboundRequest),
    /// Control frames (ping/pong) that carry nothing for the dispatcher.
    Ignore,
    /// The peer asked to close.
    Close,
}

/// Decode one WebSocket frame.
///
/// Text and binary payloads must be a JSON `{"receiver_id", "text"}` object with
/// a positive `receiver_id`; anything else is a [`SessionError::Validation`].
pub fn decode_frame(message: Message) -> Result<Inbound, SessionError> {
    let payload: &[u8] = match &message {
        Message::Text(text) => text.as_str().as_bytes(),
        Message::Binary(bytes) => &bytes[..],
        Message::Ping(_) | Message::Pong(_) => return Ok(Inbound::Ignore),
        Message::Close(_) => return Ok(Inbound::Close),
    };

    let request: SendMessageRequest =
        serde_json::from_slice(payload).map_err(|e| SessionError::Validation(e.to_string()))?;
    let receiver_id =
        UserId::new(request.receiver_id).map_err(|e| SessionError::Validation(e.to_string()))?;

    Ok(Inbound::Request(InboundRequest {
        receiver_id,
        text: MessageText::new(request.text),
    }))
}

/// Lifecycle of one connection.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    user_id: Option<UserId>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
            user_id: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Apply the verifier's result: `Authenticated` on success, `Closed` otherwise.
    pub fn authenticate(
        &mut self,
        result: Result<UserId, AuthenticationError>,
    ) -> Result<UserId, SessionError> {
        match result {
            Ok(user_id) => {
                self.transition(SessionState::Authenticated)?;
                self.user_id = Some(user_id);
                Ok(user_id)
            }
            Err(e) => {
                self.transition(SessionState::Closed)?;
                Err(SessionError::Authentication(e))
            }
        }
    }

    pub fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(
            "Session of user {:?}: {:?} -> {:?}",
            self.user_id.map(|id| id.value()),
            self.state,
            next
        );
        self.state = next;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        // テスト項目: 正常系の状態遷移を順にたどれる
        // given (前提条件):
        let mut session = Session::new();

        // when (操作):
        let user_id = session.authenticate(Ok(UserId::new(1).unwrap())).unwrap();
        session.transition(SessionState::Registered).unwrap();
        session.transition(SessionState::Reading).unwrap();
        session.transition(SessionState::Closing).unwrap();
        session.transition(SessionState::Closed).unwrap();

        // then (期待する結果):
        assert_eq!(user_id, UserId::new(1).unwrap());
        assert_eq!(session.user_id(), Some(user_id));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_failed_authentication_goes_straight_to_closed() {
        // テスト項目: 認証失敗時は登録を経ずに Closed になる
        // given (前提条件):
        let mut session = Session::new();

        // when (操作):
        let result = session.authenticate(Err(AuthenticationError::MissingCredential));

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SessionError::Authentication(
                AuthenticationError::MissingCredential
            ))
        );
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn test_cannot_read_before_registration() {
        // テスト項目: 登録前に Reading へ遷移することはできない
        // given (前提条件):
        let mut session = Session::new();
        session.authenticate(Ok(UserId::new(1).unwrap())).unwrap();

        // when (操作):
        let result = session.transition(SessionState::Reading);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SessionError::InvalidTransition {
                from: SessionState::Authenticated,
                to: SessionState::Reading,
            })
        );
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[test]
    fn test_decode_text_frame() {
        // テスト項目: テキストフレームが送信リクエストに変換される
        // given (前提条件):
        let frame = Message::Text(r#"{"receiver_id": 2, "text": "hi"}"#.into());

        // when (操作):
        let result = decode_frame(frame);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Inbound::Request(InboundRequest {
                receiver_id: UserId::new(2).unwrap(),
                text: MessageText::new("hi".to_string()),
            }))
        );
    }

    #[test]
    fn test_decode_binary_frame() {
        // テスト項目: バイナリフレームも JSON として解釈される
        // given (前提条件):
        let frame = Message::Binary(br#"{"receiver_id": 3, "text": ""}"#.to_vec().into());

        // when (操作):
        let result = decode_frame(frame);

        // then (期待する結果):
        assert!(matches!(result, Ok(Inbound::Request(r)) if r.receiver_id.value() == 3));
    }

    #[test]
    fn test_decode_malformed_frame_is_validation_error() {
        // テスト項目: JSON でない、またはフィールドが欠けたフレームは検証エラー
        // given (前提条件):
        let frames = [
            Message::Text("hello".into()),
            Message::Text(r#"{"text": "no receiver"}"#.into()),
            Message::Text(r#"{"receiver_id": "2", "text": "x"}"#.into()),
        ];

        // when (操作) / then (期待する結果):
        for frame in frames {
            assert!(matches!(
                decode_frame(frame),
                Err(SessionError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_decode_non_positive_receiver_is_validation_error() {
        // テスト項目: receiver_id が 0 以下の場合は検証エラー
        // given (前提条件):
        let frame = Message::Text(r#"{"receiver_id": 0, "text": "x"}"#.into());

        // when (操作):
        let result = decode_frame(frame);

        // then (期待する結果):
        assert!(matches!(result, Err(SessionError::Validation(_))));
    }

    #[test]
    fn test_decode_control_frames() {
        // テスト項目: ping は無視され、close は終了として扱われる
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(
            decode_frame(Message::Ping(vec![1, 2].into())),
            Ok(Inbound::Ignore)
        );
        assert_eq!(decode_frame(Message::Close(None)), Ok(Inbound::Close));
    }
}
