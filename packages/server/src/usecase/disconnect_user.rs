//! UseCase: ユーザー切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, UserId};

/// ユーザー切断のユースケース
pub struct DisconnectUserUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectUserUseCase {
    /// 新しい DisconnectUserUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// ユーザー切断を実行
    ///
    /// レジストリのエントリがまだこの接続のものである場合だけ削除する。
    /// 再接続で置き換えられた古い接続の切断が、新しい接続を消さないようにするため。
    ///
    /// # Returns
    ///
    /// エントリを削除した場合は `true`
    pub async fn execute(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        let removed = self
            .registry
            .unregister_connection(&user_id, connection_id)
            .await;
        if !removed {
            tracing::debug!(
                "Connection {} of user {} was already superseded or removed",
                connection_id,
                user_id
            );
        }
        removed
    }
}
