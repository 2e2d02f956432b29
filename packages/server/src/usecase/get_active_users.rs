//! UseCase: 接続中ユーザーの取得（診断用）

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, UserId};

/// 接続中ユーザー取得のユースケース
pub struct GetActiveUsersUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetActiveUsersUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続中のユーザー ID を昇順で取得
    pub async fn execute(&self) -> Vec<UserId> {
        self.registry.active_ids().await
    }
}
