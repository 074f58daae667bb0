use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Money, Product, ProductId, UserId};
use crate::domain::port::{ProductRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQL商品リポジトリ
/// 在庫数と販売数をproductsテーブルで管理する
#[derive(Clone)]
pub struct MySqlProductRepository {
    pool: Pool<MySql>,
}

impl MySqlProductRepository {
    /// 新しいMySQL商品リポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn product_from_row(row: &MySqlRow) -> Result<Product, RepositoryError> {
        let id = ProductId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("商品IDの解析に失敗しました: {}", e))
        })?;
        let seller_id = UserId::from_string(row.get("seller_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("出品者IDの解析に失敗しました: {}", e))
        })?;

        Ok(Product::reconstruct(
            id,
            seller_id,
            row.get("title"),
            Money::new(row.get("price_amount")),
            row.get("stock"),
            row.get("sold_count"),
            row.get("created_at"),
        ))
    }
}

#[async_trait]
impl ProductRepository for MySqlProductRepository {
    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        // 商品データをproductsテーブルにUPSERT（出品者は変更しない）
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, title, price_amount, stock, sold_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                title = VALUES(title),
                price_amount = VALUES(price_amount),
                stock = VALUES(stock),
                sold_count = VALUES(sold_count)
            "#,
        )
        .bind(product.id().to_string())
        .bind(product.seller_id().to_string())
        .bind(product.title())
        .bind(product.price().amount())
        .bind(product.stock())
        .bind(product.sold_count())
        .bind(product.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("商品の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, seller_id, title, price_amount, stock, sold_count, created_at
            FROM products WHERE id = ?
            "#,
        )
        .bind(product_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("商品の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        row.as_ref().map(Self::product_from_row).transpose()
    }

    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, seller_id, title, price_amount, stock, sold_count, created_at
            FROM products WHERE seller_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(seller_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("出品者の商品の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        rows.iter().map(Self::product_from_row).collect()
    }

    async fn record_sale(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        // 読み込みを挟まない単一のUPDATEで加減算する
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?, sold_count = sold_count + ?
            WHERE id = ?
            "#,
        )
        .bind(i64::from(quantity))
        .bind(i64::from(quantity))
        .bind(product_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("販売の記録に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("商品数の取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        Ok(count as u64)
    }
}
