//! UseCase: 会話履歴の取得

use std::sync::Arc;

use crate::domain::{Message, MessageRepository, RepositoryError, UserId};

/// 会話履歴取得のユースケース
pub struct GetConversationUseCase {
    repository: Arc<dyn MessageRepository>,
}

impl GetConversationUseCase {
    /// 新しい GetConversationUseCase を作成
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    /// `user_id` と `peer_id` の間の会話を保存順で取得
    pub async fn execute(
        &self,
        user_id: UserId,
        peer_id: UserId,
    ) -> Result<Vec<Message>, RepositoryError> {
        self.repository.get_conversation(user_id, peer_id).await
    }
}
