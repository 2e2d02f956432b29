//! WebSocket connection handlers.
//!
//! One upgraded connection is driven by two tasks:
//!
//! - the session task (`handle_socket`), which registers the user, reads inbound
//!   frames and hands them to the dispatcher
//! - the writer task (`pusher_loop`), which drains the connection's outbound queue
//!   into the socket
//!
//! Both observe the connection's close token, a child of the server's shutdown token.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ConnectionHandle, ConnectionId, OutboundEvent, OutboundReceiver, UserId},
    infrastructure::dto::websocket::ServerMessage,
    ui::{
        handler::credential::{CredentialQuery, extract_credential},
        session::{Inbound, InboundRequest, Session, SessionError, SessionState, decode_frame},
        state::AppState,
    },
    usecase::DisconnectUserUseCase,
};

/// How long teardown waits for the writer to flush before aborting it.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CredentialQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let mut session = Session::new();

    // Authenticate before upgrading; a rejected request never touches the registry
    let credential = extract_credential(&headers, query.token.as_deref());
    let result = state.authenticate_usecase.execute(credential.as_deref());
    let user_id = match session.authenticate(result) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::warn!("Rejected WebSocket connection: {}", e);
            return (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response();
        }
    };

    tracing::info!("User {} authenticated, upgrading connection", user_id);
    let sessions = state.sessions.clone();
    ws.on_failed_upgrade(move |e| {
        tracing::warn!("WebSocket upgrade for user {} failed: {}", user_id, e);
    })
    .on_upgrade(move |socket| sessions.track_future(handle_socket(socket, state, session, user_id)))
}

/// Spawns the writer task of one connection.
///
/// Events are serialized with the outbound wire format and written as text
/// frames. Once `close_token` fires, the events still queued are flushed and a
/// Close frame is sent. A write failure cancels `close_token`, which also ends
/// the session's read loop.
fn pusher_loop(
    mut rx: OutboundReceiver,
    mut sender: SplitSink<WebSocket, Message>,
    close_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                _ = close_token.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if let Err(e) = write_event(&mut sender, event).await {
                tracing::warn!("Failed to write frame: {}", e);
                close_token.cancel();
                return;
            }
        }

        // Flush what was queued before the close
        rx.close();
        while let Ok(event) = rx.try_recv() {
            if write_event(&mut sender, event).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn write_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: OutboundEvent,
) -> Result<(), SessionError> {
    let json = serde_json::to_string(&ServerMessage::from(event))
        .map_err(|e| SessionError::Transport(e.to_string()))?;
    sender
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| SessionError::Transport(e.to_string()))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    mut session: Session,
    user_id: UserId,
) {
    let (sender, receiver) = socket.split();

    let close_token = state.shutdown_token.child_token();
    let (handle, rx) = ConnectionHandle::new(state.outbound_queue_capacity, close_token.clone());
    let connection_id = handle.id();
    let mut writer = pusher_loop(rx, sender, close_token.clone());

    let guard = RegistrationGuard::new(
        state.disconnect_user_usecase.clone(),
        user_id,
        connection_id,
    );

    // Register (replacing and closing any previous connection of this user)
    // and acknowledge
    let connected = state
        .connect_user_usecase
        .execute(user_id, handle.clone())
        .await;
    advance(&mut session, SessionState::Registered);

    match connected {
        Ok(connected_at) => {
            tracing::info!(
                "User {} connected (connection {}, at {})",
                user_id,
                connection_id,
                connected_at.value()
            );
            advance(&mut session, SessionState::Reading);

            match read_loop(receiver, &state, &handle, user_id, &close_token).await {
                Ok(()) => tracing::info!("User {} session ended", user_id),
                Err(e) => tracing::warn!("User {} session ended: {}", user_id, e),
            }
        }
        Err(e) => {
            tracing::warn!("Failed to acknowledge connection of user {}: {}", user_id, e);
        }
    }

    advance(&mut session, SessionState::Closing);
    guard.release().await;
    close_token.cancel();

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer)
        .await
        .is_err()
    {
        tracing::warn!("Writer of connection {} did not finish, aborting", connection_id);
        writer.abort();
    }

    advance(&mut session, SessionState::Closed);
}

/// Read inbound frames until the peer closes, the transport fails, a frame is
/// malformed or the connection is closed from our side.
async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    state: &AppState,
    handle: &ConnectionHandle,
    user_id: UserId,
    close_token: &CancellationToken,
) -> Result<(), SessionError> {
    loop {
        let frame = tokio::select! {
            _ = close_token.cancelled() => {
                tracing::debug!("Connection {} closed while reading", handle.id());
                return Ok(());
            }
            frame = receiver.next() => frame,
        };

        let message = match frame {
            Some(Ok(message)) => message,
            Some(Err(e)) => return Err(SessionError::Transport(e.to_string())),
            None => return Ok(()),
        };

        match decode_frame(message)? {
            Inbound::Request(request) => {
                if close_token.is_cancelled() {
                    return Ok(());
                }
                dispatch(state, handle, user_id, request).await;
            }
            Inbound::Ignore => {}
            Inbound::Close => {
                tracing::info!("User {} requested close", user_id);
                return Ok(());
            }
        }
    }
}

/// Forward one request to the dispatcher and report failures back to the sender.
async fn dispatch(
    state: &AppState,
    handle: &ConnectionHandle,
    user_id: UserId,
    request: InboundRequest,
) {
    let outcome = match state
        .send_message_usecase
        .execute(user_id, request.receiver_id, request.text)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            report_error(handle, user_id, e.to_string()).await;
            return;
        }
    };

    // The dispatcher never waits on a queue. This session owns the sender's
    // queue, so the echo it could not push is sent here with waiting.
    if let Some(failure) = outcome.sender_failure() {
        tracing::debug!(
            "Echo of message {} to user {} deferred: {}",
            outcome.message.id.value(),
            user_id,
            failure.error
        );
        if let Err(e) = handle
            .send(OutboundEvent::Message(outcome.message.clone()))
            .await
        {
            tracing::debug!("Could not echo message to user {}: {}", user_id, e);
        }
    }

    if let Some(failure) = outcome
        .receiver_failure()
        .filter(|failure| failure.recipient != user_id)
    {
        let error = format!(
            "Message {} was saved but could not be delivered to user {}: {}",
            outcome.message.id.value(),
            failure.recipient,
            failure.error
        );
        report_error(handle, user_id, error).await;
    }
}

async fn report_error(handle: &ConnectionHandle, user_id: UserId, error: String) {
    if let Err(e) = handle.send(OutboundEvent::Error(error)).await {
        tracing::debug!("Could not report error to user {}: {}", user_id, e);
    }
}

fn advance(session: &mut Session, next: SessionState) {
    if let Err(e) = session.transition(next) {
        tracing::error!("{}", e);
    }
}

/// Unregisters the connection if the session task is dropped before its
/// normal teardown ran (e.g. aborted on shutdown).
struct RegistrationGuard {
    usecase: Arc<DisconnectUserUseCase>,
    user_id: UserId,
    connection_id: ConnectionId,
    released: bool,
}

impl RegistrationGuard {
    fn new(
        usecase: Arc<DisconnectUserUseCase>,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            usecase,
            user_id,
            connection_id,
            released: false,
        }
    }

    async fn release(mut self) {
        let removed = self
            .usecase
            .execute(self.user_id, self.connection_id)
            .await;
        self.released = true;
        if removed {
            tracing::info!("User {} disconnected and unregistered", self.user_id);
        } else {
            tracing::info!(
                "User {} disconnected; connection {} was already replaced",
                self.user_id,
                self.connection_id
            );
        }
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let usecase = self.usecase.clone();
        let (user_id, connection_id) = (self.user_id, self.connection_id);
        runtime.spawn(async move {
            usecase.execute(user_id, connection_id).await;
            tracing::debug!("Unregistered user {} after an aborted session", user_id);
        });
    }
}
