//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! `Vec` をインメモリ DB として使用し、保存順に ID を採番します。
//!
//! 会話の取得は全件の線形走査です（ページネーションは扱わない）。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Message, MessageId, MessageRepository, NewMessage, RepositoryError, UserId};

/// ストレージの中身（ロック 1 つで採番と追記を直列化する）
#[derive(Debug, Default)]
struct Store {
    messages: Vec<Message>,
    last_id: i64,
}

/// インメモリ Message Repository 実装
pub struct InMemoryMessageRepository {
    store: Mutex<Store>,
    /// 保存できるメッセージの最大件数（`None` は無制限）
    capacity: Option<usize>,
}

impl InMemoryMessageRepository {
    /// 容量無制限の InMemoryMessageRepository を作成
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            capacity: None,
        }
    }

    /// 最大 `capacity` 件まで保存できる InMemoryMessageRepository を作成
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            capacity: Some(capacity),
        }
    }

    /// 保存済みメッセージ数を取得
    pub async fn count(&self) -> usize {
        self.store.lock().await.messages.len()
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn save(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut store = self.store.lock().await;

        if let Some(capacity) = self.capacity
            && store.messages.len() >= capacity
        {
            return Err(RepositoryError::CapacityExceeded(capacity));
        }

        store.last_id += 1;
        let persisted = message.persisted(MessageId::new(store.last_id));
        store.messages.push(persisted.clone());

        tracing::debug!(
            "Saved message {} from user {} to user {}",
            persisted.id.value(),
            persisted.sender_id,
            persisted.receiver_id
        );

        Ok(persisted)
    }

    async fn get_conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .messages
            .iter()
            .filter(|m| m.is_between(user_a, user_b))
            .cloned()
            .collect())
    }
}
