//! Persistence gateway trait 定義
//!
//! ドメイン層が必要とするメッセージ永続化のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Message, NewMessage, RepositoryError, UserId};

/// Message Repository trait
///
/// メッセージの追記と会話の取得を行う永続化ゲートウェイ。
/// 実装は複数のディスパッチャーからの同時 `save` と、`save` 中の
/// `get_conversation` を安全に処理できなければならない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを保存し、ID が付与されたメッセージを返す
    async fn save(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    /// 2 人のユーザー間の会話を保存順で取得
    async fn get_conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Vec<Message>, RepositoryError>;
}
