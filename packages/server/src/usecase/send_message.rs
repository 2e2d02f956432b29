//! UseCase: メッセージ送信処理（ディスパッチャー）
//!
//! 1 回の送信は「永続化 → 配信」の単位で処理されます。
//!
//! 1. `created_at` を付けたメッセージを作成（ID はまだない）
//! 2. MessageRepository に保存。失敗した場合は配信せずにエラーを返す
//! 3. 送信者と受信者をレジストリで検索
//! 4. オンラインの相手（受信者、送信者の順）に保存済みメッセージを配信
//!    - 送信者には自分のメッセージが必ずエコーされる
//!    - 送信者と受信者が同じ接続の場合は 1 回だけ書き込む
//! 5. 配信の失敗は致命的ではなく、`SendOutcome::failures` として報告する
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：双方オンライン、受信者オフライン、双方オフライン
//! - 異常系：永続化失敗（配信は一切行われない）
//! - エッジケース：自分宛て、受信者の接続が閉じている、キューが満杯

use std::sync::Arc;

use lilychat_shared::time::Clock;

use crate::domain::{
    ConnectionHandle, ConnectionRegistry, DeliveryError, Message, MessageRepository, MessageText,
    NewMessage, OutboundEvent, Timestamp, UserId,
};

use super::error::SendMessageError;

/// ある宛先への配信失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub recipient: UserId,
    pub error: DeliveryError,
}

/// 永続化に成功した送信の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// 保存済みメッセージ（ID 付き）
    pub message: Message,
    /// 配信キューに積めた宛先
    pub delivered_to: Vec<UserId>,
    /// 配信に失敗した宛先
    pub failures: Vec<DeliveryFailure>,
}

impl SendOutcome {
    /// 受信者（送信者以外）への配信が失敗したかどうか
    pub fn receiver_failure(&self) -> Option<&DeliveryFailure> {
        self.failures
            .iter()
            .find(|f| f.recipient == self.message.receiver_id)
    }

    /// 送信者自身へのエコーが失敗したかどうか
    pub fn sender_failure(&self) -> Option<&DeliveryFailure> {
        self.failures
            .iter()
            .find(|f| f.recipient == self.message.sender_id)
    }
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// MessageRepository（永続化ゲートウェイの抽象化）
    repository: Arc<dyn MessageRepository>,
    /// ConnectionRegistry（接続中ユーザーの管理）
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registry,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender_id` - 送信者（セッションのユーザー）
    /// * `receiver_id` - 受信者
    /// * `text` - 本文
    ///
    /// # Returns
    ///
    /// * `Ok(SendOutcome)` - 永続化成功（配信結果に関係なく成功）
    /// * `Err(SendMessageError)` - 永続化失敗（配信は行われていない）
    pub async fn execute(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        text: MessageText,
    ) -> Result<SendOutcome, SendMessageError> {
        // 1. メッセージを作成
        let created_at = Timestamp::new(self.clock.now_unix_secs());
        let new_message = NewMessage::new(sender_id, receiver_id, text, created_at);

        // 2. 永続化（失敗したら配信しない）
        let message = self.repository.save(new_message).await.map_err(|e| {
            tracing::warn!(
                "Failed to persist message from user {} to user {}: {}",
                sender_id,
                receiver_id,
                e
            );
            SendMessageError::Persistence(e)
        })?;

        // 3. 配信対象を決定
        let targets = self.delivery_targets(sender_id, receiver_id).await;

        // 4. 配信（失敗しても他の宛先への配信は続ける）
        let mut delivered_to = Vec::new();
        let mut failures = Vec::new();
        for (recipient, handle) in targets {
            match handle.push(OutboundEvent::Message(message.clone())) {
                Ok(()) => {
                    tracing::debug!(
                        "Queued message {} for user {}",
                        message.id.value(),
                        recipient
                    );
                    delivered_to.push(recipient);
                }
                Err(error) => {
                    tracing::warn!(
                        "Failed to deliver message {} to user {}: {}",
                        message.id.value(),
                        recipient,
                        error
                    );
                    failures.push(DeliveryFailure { recipient, error });
                }
            }
        }

        Ok(SendOutcome {
            message,
            delivered_to,
            failures,
        })
    }

    /// 配信先のハンドルを取得
    ///
    /// 受信者、送信者の順。同じ接続は 1 回だけ含める。オフラインのユーザーは含めない。
    async fn delivery_targets(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Vec<(UserId, ConnectionHandle)> {
        let receiver = self.registry.lookup(&receiver_id).await;
        let sender = self.registry.lookup(&sender_id).await;

        let mut targets: Vec<(UserId, ConnectionHandle)> = Vec::with_capacity(2);
        if let Some(handle) = receiver {
            targets.push((receiver_id, handle));
        }
        if let Some(handle) = sender
            && !targets.iter().any(|(_, t)| t.same_connection(&handle))
        {
            targets.push((sender_id, handle));
        }
        targets
    }
}
