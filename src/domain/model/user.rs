use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::model::{AccountStatus, CustomerSnapshot, Role, ShippingAddress, UserId};

/// ユーザー
/// 顧客・出品者・管理者のいずれか。注文からは顧客情報の参照元として使う
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    status: AccountStatus,
    store_name: Option<String>,
    address: ShippingAddress,
    created_at: DateTime<Utc>,
}

impl User {
    /// 新しいユーザーを作成
    /// 出品者は承認待ち、それ以外は有効な状態で作成される
    pub fn new(
        id: UserId,
        name: String,
        email: String,
        role: Role,
        store_name: Option<String>,
        address: ShippingAddress,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidValue("名前は空にできません".to_string()));
        }
        if !email.contains('@') {
            return Err(DomainError::InvalidValue(format!(
                "無効なメールアドレス: {}",
                email
            )));
        }
        let status = match role {
            Role::Seller => AccountStatus::Pending,
            Role::Admin | Role::Customer => AccountStatus::Active,
        };
        Ok(Self {
            id,
            name,
            email,
            role,
            status,
            store_name,
            address,
            created_at: Utc::now(),
        })
    }

    /// データベースから取得したデータでユーザーを再構築
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: UserId,
        name: String,
        email: String,
        role: Role,
        status: AccountStatus,
        store_name: Option<String>,
        address: ShippingAddress,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            status,
            store_name,
            address,
            created_at,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn store_name(&self) -> Option<&str> {
        self.store_name.as_deref()
    }

    /// プロフィール上の住所（注文時の配送先の既定値）
    pub fn address(&self) -> &ShippingAddress {
        &self.address
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 出品者を承認して有効にする
    /// 既に有効な出品者の承認は何もしない
    pub fn approve(&mut self) -> Result<(), DomainError> {
        if self.role != Role::Seller {
            return Err(DomainError::InvalidValue(format!(
                "出品者ではないユーザーは承認できません: {}",
                self.id
            )));
        }
        self.status = AccountStatus::Active;
        Ok(())
    }

    /// 注文に埋め込む顧客情報のスナップショット
    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot::new(self.name.clone(), self.email.clone())
    }
}
