use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラー、アクセス制御の失敗をラップする
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(RepositoryError),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 呼び出し元にロールまたは所有権がない
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// 再試行しても競合が解消しなかった
    #[error("Conflict: {0}")]
    Conflict(String),
}

// 競合はリトライ対象なので専用のバリアントに振り分ける
impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => ApplicationError::Conflict(msg),
            other => ApplicationError::RepositoryError(other),
        }
    }
}
