//! UseCase: ユーザー接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectUserUseCase::execute() メソッド
//! - レジストリへの登録と "connected" 確認イベントの送信
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ユーザーの接続
//! - エッジケース：同一ユーザーの再接続（古い接続は閉じられる）
//! - 異常系：確認イベントを送れない（接続が既に閉じている）

use std::sync::Arc;

use lilychat_shared::time::Clock;

use crate::domain::{
    ConnectionHandle, ConnectionRegistry, DeliveryError, OutboundEvent, Timestamp, UserId,
};

/// ユーザー接続のユースケース
pub struct ConnectUserUseCase {
    /// ConnectionRegistry（接続中ユーザーの管理）
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl ConnectUserUseCase {
    /// 新しい ConnectUserUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// ユーザー接続を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 認証済みのユーザー ID
    /// * `handle` - この接続のハンドル
    ///
    /// # Returns
    ///
    /// * `Ok(Timestamp)` - 登録時刻
    /// * `Err(DeliveryError)` - 確認イベントを送れなかった（登録は済んでいる）
    pub async fn execute(
        &self,
        user_id: UserId,
        handle: ConnectionHandle,
    ) -> Result<Timestamp, DeliveryError> {
        let connected_at = Timestamp::new(self.clock.now_unix_secs());

        // 1. レジストリに登録（既存の接続は置き換えられ、閉じられる）
        if let Some(previous) = self.registry.register(user_id, handle.clone()).await {
            tracing::info!(
                "User {} connected again; previous connection {} closed",
                user_id,
                previous.id()
            );
        }

        // 2. 確認イベントを送信
        handle.send(OutboundEvent::Connected(user_id)).await?;

        Ok(connected_at)
    }
}
