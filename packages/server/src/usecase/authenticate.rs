//! UseCase: 接続時の認証処理

use std::sync::Arc;

use crate::domain::{AuthenticationError, TokenVerifier, UserId};

/// 認証のユースケース
pub struct AuthenticateUseCase {
    /// TokenVerifier（トークン検証の抽象化）
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthenticateUseCase {
    /// 新しい AuthenticateUseCase を作成
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// 認証を実行
    ///
    /// # Arguments
    ///
    /// * `credential` - リクエストから取り出したトークン（存在しない場合は `None`）
    ///
    /// # Returns
    ///
    /// * `Ok(UserId)` - 認証されたユーザー
    /// * `Err(AuthenticationError)` - 認証失敗（種類を問わず unauthorized として扱う）
    pub fn execute(&self, credential: Option<&str>) -> Result<UserId, AuthenticationError> {
        let token = credential
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthenticationError::MissingCredential)?;

        self.verifier.verify(token)
    }
}
