use crate::application::ApplicationError;
use crate::domain::model::{Role, UserId};

/// 検証済みの呼び出し元
/// 認証ミドルウェアで一度だけ構築され、各ユースケースに明示的に渡される
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    subject: UserId,
    role: Role,
}

impl Identity {
    pub fn new(subject: UserId, role: Role) -> Self {
        Self { subject, role }
    }

    pub fn subject(&self) -> UserId {
        self.subject
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 呼び出し元のロールが許可されたロールのいずれかであることを確認
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApplicationError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
        Err(ApplicationError::Forbidden(format!(
            "この操作には次のロールが必要です: {}",
            names.join(", ")
        )))
    }
}
