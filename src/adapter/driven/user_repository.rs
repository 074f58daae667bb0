use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{AccountStatus, Role, ShippingAddress, User, UserId};
use crate::domain::port::{RepositoryError, UserRepository};
use async_trait::async_trait;

use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQLユーザーリポジトリ
#[derive(Clone)]
pub struct MySqlUserRepository {
    pool: Pool<MySql>,
}

impl MySqlUserRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &MySqlRow) -> Result<User, RepositoryError> {
        let parse_failed =
            |what: &str, e: String| RepositoryError::FetchFailed(format!("{}の解析に失敗しました: {}", what, e));

        let id = UserId::from_string(row.get("id")).map_err(|e| parse_failed("ユーザーID", e.to_string()))?;
        let role = Role::from_string(row.get("role")).map_err(|e| parse_failed("ロール", e.to_string()))?;
        let status = AccountStatus::from_string(row.get("status"))
            .map_err(|e| parse_failed("アカウント状態", e.to_string()))?;

        Ok(User::reconstruct(
            id,
            row.get("name"),
            row.get("email"),
            role,
            status,
            row.get("store_name"),
            ShippingAddress::new(row.get("address"), row.get("city"), row.get("phone")),
            row.get("created_at"),
        ))
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, status, store_name, address, city, phone, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                email = VALUES(email),
                role = VALUES(role),
                status = VALUES(status),
                store_name = VALUES(store_name),
                address = VALUES(address),
                city = VALUES(city),
                phone = VALUES(phone)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.name())
        .bind(user.email())
        .bind(user.role().as_str())
        .bind(user.status().as_str())
        .bind(user.store_name())
        .bind(user.address().address())
        .bind(user.address().city())
        .bind(user.address().phone())
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("ユーザーの保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, role, status, store_name, address, city, phone, created_at
            FROM users WHERE id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("ユーザーの取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn count(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<u64, RepositoryError> {
        // NULLの条件は絞り込みに使わない
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE (? IS NULL OR role = ?) AND (? IS NULL OR status = ?)
            "#,
        )
        .bind(role.map(|r| r.as_str()))
        .bind(role.map(|r| r.as_str()))
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("ユーザー数の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(count as u64)
    }
}
