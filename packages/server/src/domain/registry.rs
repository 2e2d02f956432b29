//! Connection registry trait and the transport handle it stores.
//!
//! A [`ConnectionHandle`] is the write side of one client connection: a bounded
//! outbound queue drained by a dedicated writer task, plus the close token shared
//! with the session that owns the connection. The registry maps each user to at
//! most one handle; a lookup miss is the only representation of "offline".

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use super::{ConnectionId, DeliveryError, OutboundEvent, UserId};

/// Read side of a connection's outbound queue, owned by its writer task.
pub type OutboundReceiver = mpsc::Receiver<OutboundEvent>;

/// Live, addressable end of one client connection.
///
/// Cloning a handle does not create a new connection; clones share the
/// same [`ConnectionId`], queue and close token.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<OutboundEvent>,
    close_token: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle with an outbound queue of `capacity` events.
    ///
    /// Returns the receiver the writer task must drain. A capacity of zero is
    /// raised to one.
    pub fn new(capacity: usize, close_token: CancellationToken) -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::generate(),
            sender,
            close_token,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether `other` refers to the same physical connection.
    pub fn same_connection(&self, other: &ConnectionHandle) -> bool {
        self.id == other.id
    }

    /// Enqueue an event without waiting.
    ///
    /// Used on the dispatcher path so that a slow consumer never blocks a
    /// dispatch turn.
    pub fn push(&self, event: OutboundEvent) -> Result<(), DeliveryError> {
        if self.close_token.is_cancelled() {
            return Err(DeliveryError::Closed);
        }
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Enqueue an event, waiting for queue space.
    ///
    /// Only the owning session calls this, for its own frames. Gives up with
    /// [`DeliveryError::Closed`] once the connection is closed.
    pub async fn send(&self, event: OutboundEvent) -> Result<(), DeliveryError> {
        if self.close_token.is_cancelled() {
            return Err(DeliveryError::Closed);
        }
        tokio::select! {
            result = self.sender.send(event) => result.map_err(|_| DeliveryError::Closed),
            _ = self.close_token.cancelled() => Err(DeliveryError::Closed),
        }
    }

    /// Ask the owning session and writer to shut the connection down.
    pub fn close(&self) {
        self.close_token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.close_token.is_cancelled() || self.sender.is_closed()
    }

    /// Resolves once [`close`](Self::close) was called or the parent token fired.
    pub async fn closed(&self) {
        self.close_token.cancelled().await;
    }
}

/// Connection Registry trait
///
/// Concurrency-safe mapping from user to its current [`ConnectionHandle`].
/// Implementations hold their lock only for the map operation itself and
/// never while writing to a handle.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Install `handle` as the reachable endpoint for `user_id`.
    ///
    /// A previous entry is replaced and returned after being closed.
    async fn register(&self, user_id: UserId, handle: ConnectionHandle)
    -> Option<ConnectionHandle>;

    /// Remove the entry for `user_id`. No-op if absent.
    async fn unregister(&self, user_id: &UserId);

    /// Remove the entry for `user_id` only if it still belongs to `connection_id`.
    ///
    /// Returns whether an entry was removed.
    async fn unregister_connection(&self, user_id: &UserId, connection_id: ConnectionId) -> bool;

    /// Current handle for `user_id`, if the user is online.
    async fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle>;

    /// Snapshot of registered users, sorted ascending.
    async fn active_ids(&self) -> Vec<UserId>;
}
