//! インメモリの ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - ユーザー ID から現在の `ConnectionHandle` へのマップを管理
//! - 同一ユーザーの再登録時に、置き換えられた古いハンドルを閉じる
//!
//! ## 設計ノート
//!
//! ロックはマップ操作の間だけ保持します。ハンドルへの書き込みや close は
//! ロック解放後に行うため、遅い接続が他の接続の登録・解除を止めることはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ConnectionHandle, ConnectionId, ConnectionRegistry, UserId};

/// インメモリ ConnectionRegistry 実装
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    /// Key: user_id / Value: 現在のハンドル
    connections: RwLock<HashMap<UserId, ConnectionHandle>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(
        &self,
        user_id: UserId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let connection_id = handle.id();
        let previous = {
            let mut connections = self.connections.write().await;
            connections.insert(user_id, handle)
        };

        match &previous {
            Some(previous) if previous.id() != connection_id => {
                previous.close();
                tracing::info!(
                    "User {} re-registered: connection {} replaced by {}",
                    user_id,
                    previous.id(),
                    connection_id
                );
            }
            _ => {
                tracing::debug!(
                    "User {} registered with connection {}",
                    user_id,
                    connection_id
                );
            }
        }

        previous
    }

    async fn unregister(&self, user_id: &UserId) {
        let removed = self.connections.write().await.remove(user_id);
        if removed.is_some() {
            tracing::debug!("User {} unregistered", user_id);
        }
    }

    async fn unregister_connection(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(user_id) {
            Some(current) if current.id() == connection_id => {
                connections.remove(user_id);
                tracing::debug!(
                    "User {} unregistered (connection {})",
                    user_id,
                    connection_id
                );
                true
            }
            _ => false,
        }
    }

    async fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        self.connections.read().await.get(user_id).cloned()
    }

    async fn active_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.connections.read().await.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::domain::{OutboundEvent, OutboundReceiver};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - register / unregister / lookup / active_ids の基本動作
    // - 同一ユーザーの再登録で古いハンドルが置き換えられ、閉じられること
    // - unregister の冪等性
    //
    // 【なぜこのテストが必要か】
    // - レジストリは「誰がオンラインか」を表す唯一の共有状態
    // - 1 ユーザーにつき高々 1 つのハンドルという不変条件を保証する必要がある
    // ========================================

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn handle() -> (ConnectionHandle, OutboundReceiver) {
        ConnectionHandle::new(8, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        // テスト項目: 登録したハンドルが lookup で取得できる
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (alice, _rx) = handle();

        // when (操作):
        let previous = registry.register(user(1), alice.clone()).await;

        // then (期待する結果):
        assert!(previous.is_none());
        let found = registry.lookup(&user(1)).await.unwrap();
        assert!(found.same_connection(&alice));
    }

    #[tokio::test]
    async fn test_lookup_miss_means_offline() {
        // テスト項目: 未登録ユーザーの lookup は None を返す
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();

        // when (操作):
        let result = registry.lookup(&user(2)).await;

        // then (期待する結果):
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_register_replaces_and_closes_previous_handle() {
        // テスト項目: 同一ユーザーの再登録で古いハンドルが置き換えられ、閉じられる
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (first, _rx1) = handle();
        let (second, _rx2) = handle();
        registry.register(user(1), first.clone()).await;

        // when (操作):
        let previous = registry.register(user(1), second.clone()).await;

        // then (期待する結果):
        assert!(previous.unwrap().same_connection(&first));
        assert!(first.is_closed());
        assert!(!second.is_closed());
        let found = registry.lookup(&user(1)).await.unwrap();
        assert!(found.same_connection(&second));
        assert_eq!(registry.active_ids().await, vec![user(1)]);
    }

    #[tokio::test]
    async fn test_replaced_handle_receives_no_further_events() {
        // テスト項目: 置き換えられたハンドルにはそれ以降イベントが届かない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (first, mut rx1) = handle();
        let (second, mut rx2) = handle();
        registry.register(user(1), first).await;
        registry.register(user(1), second).await;

        // when (操作):
        let current = registry.lookup(&user(1)).await.unwrap();
        current
            .push(OutboundEvent::Error("after replace".to_string()))
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            rx2.recv().await,
            Some(OutboundEvent::Error("after replace".to_string()))
        );
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        // テスト項目: 未登録ユーザーの unregister はエラーにならず状態も変わらない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (alice, _rx) = handle();
        registry.register(user(1), alice).await;

        // when (操作):
        registry.unregister(&user(2)).await;
        registry.unregister(&user(1)).await;
        registry.unregister(&user(1)).await;

        // then (期待する結果):
        assert!(registry.lookup(&user(1)).await.is_none());
        assert!(registry.active_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_connection_keeps_replacement() {
        // テスト項目: 古い接続の解除処理が、新しい接続のエントリを削除しない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (first, _rx1) = handle();
        let (second, _rx2) = handle();
        registry.register(user(1), first.clone()).await;
        registry.register(user(1), second.clone()).await;

        // when (操作):
        let removed_old = registry.unregister_connection(&user(1), first.id()).await;

        // then (期待する結果):
        assert!(!removed_old);
        assert!(registry.lookup(&user(1)).await.is_some());

        let removed_current = registry.unregister_connection(&user(1), second.id()).await;
        assert!(removed_current);
        assert!(registry.lookup(&user(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_active_ids_sorted_snapshot() {
        // テスト項目: active_ids は登録中のユーザー ID を昇順で返す
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let mut receivers = Vec::new();
        for id in [3, 1, 2] {
            let (h, rx) = handle();
            receivers.push(rx);
            registry.register(user(id), h).await;
        }

        // when (操作):
        let ids = registry.active_ids().await;

        // then (期待する結果):
        assert_eq!(ids, vec![user(1), user(2), user(3)]);
    }

    #[tokio::test]
    async fn test_concurrent_register_keeps_one_entry_per_user() {
        // テスト項目: 同一ユーザーへの同時登録でもエントリは 1 つだけ
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());

        // when (操作):
        let mut tasks = Vec::new();
        for _ in 0..20 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (h, rx) = handle();
                registry.register(user(1), h.clone()).await;
                (h, rx)
            }));
        }
        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        // then (期待する結果):
        assert_eq!(registry.active_ids().await, vec![user(1)]);
        let current = registry.lookup(&user(1)).await.unwrap();
        let open: Vec<_> = handles.iter().filter(|(h, _)| !h.is_closed()).collect();
        assert_eq!(open.len(), 1);
        assert!(open[0].0.same_connection(&current));
    }
}
