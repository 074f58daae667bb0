use sqlx::{MySql, Pool};
use crate::adapter::database_error::DatabaseError;

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        // マイグレーションファイルのリスト（外部キーの参照先を先に作成する）
        let migrations = [
            include_str!("../../migrations/001_create_users_table.sql"),
            include_str!("../../migrations/002_create_products_table.sql"),
            include_str!("../../migrations/003_create_order_number_sequence_table.sql"),
            include_str!("../../migrations/004_create_orders_table.sql"),
            include_str!("../../migrations/005_create_order_items_table.sql"),
            include_str!("../../migrations/006_create_order_seller_statuses_table.sql"),
        ];

        for (index, migration_sql) in migrations.iter().enumerate() {
            tracing::debug!(migration = index + 1, "マイグレーションを実行します");
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", index + 1, e))
                })?;
        }

        tracing::info!(count = migrations.len(), "すべてのマイグレーションが完了しました");
        Ok(())
    }
}
