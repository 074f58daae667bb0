use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    CustomerSnapshot, FulfillmentStatus, LineItem, Money, Order, OrderId, OrderNumber, OrderStatus,
    PersistedOrder, ProductId, SellerStatus, ShippingAddress, UserId,
};
use crate::domain::port::{OrderRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

const ORDER_COLUMNS: &str = r#"
    o.id, o.order_number, o.customer_id, o.customer_name, o.customer_email,
    o.total_amount, o.payment_method, o.address, o.city, o.phone,
    o.status, o.revision, o.created_at, o.updated_at
"#;

/// MySQL注文リポジトリ
/// 注文本体・明細・出品者サブステータスを別テーブルに永続化する
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

fn fetch_error(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::FetchFailed(format!("{}の解析に失敗しました: {}", what, e))
}

fn query_error(what: &str, e: sqlx::Error) -> RepositoryError {
    RepositoryError::from(DatabaseError::QueryError(format!(
        "{}に失敗しました: {}",
        what, e
    )))
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// 注文の行に明細とサブステータスを読み込んで集約を再構築する
    async fn hydrate(&self, row: &MySqlRow) -> Result<Order, RepositoryError> {
        let id_str: String = row.get("id");
        let id = OrderId::from_string(&id_str).map_err(|e| fetch_error("注文ID", e))?;

        let item_rows = sqlx::query(
            r#"
            SELECT product_id, title, price_amount, quantity, seller_id
            FROM order_items
            WHERE order_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(&id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("注文明細の取得", e))?;

        let mut items = Vec::with_capacity(item_rows.len());
        for item_row in &item_rows {
            let product_id = ProductId::from_string(item_row.get("product_id"))
                .map_err(|e| fetch_error("商品ID", e))?;
            let seller_id = UserId::from_string(item_row.get("seller_id"))
                .map_err(|e| fetch_error("出品者ID", e))?;
            let item = LineItem::new(
                product_id,
                item_row.get("title"),
                Money::new(item_row.get("price_amount")),
                item_row.get::<u32, _>("quantity"),
                seller_id,
            )
            .map_err(|e| fetch_error("注文明細", e))?;
            items.push(item);
        }

        let status_rows = sqlx::query(
            r#"
            SELECT seller_id, status, updated_at
            FROM order_seller_statuses
            WHERE order_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(&id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("出品者ステータスの取得", e))?;

        let mut seller_statuses = Vec::with_capacity(status_rows.len());
        for status_row in &status_rows {
            let seller_id = UserId::from_string(status_row.get("seller_id"))
                .map_err(|e| fetch_error("出品者ID", e))?;
            let status = FulfillmentStatus::from_string(status_row.get("status"))
                .map_err(|e| fetch_error("履行ステータス", e))?;
            seller_statuses.push(SellerStatus::new(
                seller_id,
                status,
                status_row.get::<DateTime<Utc>, _>("updated_at"),
            ));
        }

        Ok(Order::reconstruct(PersistedOrder {
            id,
            order_number: OrderNumber::from_string(row.get("order_number"))
                .map_err(|e| fetch_error("注文番号", e))?,
            customer_id: UserId::from_string(row.get("customer_id"))
                .map_err(|e| fetch_error("顧客ID", e))?,
            customer: CustomerSnapshot::new(row.get("customer_name"), row.get("customer_email")),
            items,
            total_amount: Money::new(row.get("total_amount")),
            payment_method: row.get("payment_method"),
            shipping_address: ShippingAddress::new(
                row.get("address"),
                row.get("city"),
                row.get("phone"),
            ),
            status: OrderStatus::from_string(row.get("status"))
                .map_err(|e| fetch_error("注文ステータス", e))?,
            seller_statuses,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            revision: row.get::<u64, _>("revision"),
        }))
    }

    async fn hydrate_all(&self, rows: Vec<MySqlRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(self.hydrate(row).await?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        let address = order.shipping_address();
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_id, customer_name, customer_email,
                total_amount, payment_method, address, city, phone,
                status, revision, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.order_number().as_str())
        .bind(order.customer_id().to_string())
        .bind(order.customer().name())
        .bind(order.customer().email())
        .bind(order.total_amount().amount())
        .bind(order.payment_method())
        .bind(address.address())
        .bind(address.city())
        .bind(address.phone())
        .bind(order.status().as_str())
        .bind(order.revision())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| query_error("注文の保存", e))?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, title, price_amount, quantity, seller_id)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(order.id().to_string())
            .bind(position as u32)
            .bind(item.product_id().to_string())
            .bind(item.title())
            .bind(item.price().amount())
            .bind(item.quantity())
            .bind(item.seller_id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("注文明細の保存", e))?;
        }

        for (position, entry) in order.seller_statuses().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_seller_statuses (order_id, position, seller_id, status, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(order.id().to_string())
            .bind(position as u32)
            .bind(entry.seller_id().to_string())
            .bind(entry.status().as_str())
            .bind(entry.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("出品者ステータスの保存", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| query_error("トランザクションのコミット", e))?;

        Ok(())
    }

    async fn update(&self, order: &Order, expected_revision: u64) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        // リビジョンが一致する場合のみ更新する（明細は作成後に変わらない）
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?, revision = ?, updated_at = ?
            WHERE id = ? AND revision = ?
            "#,
        )
        .bind(order.status().as_str())
        .bind(order.revision())
        .bind(order.updated_at())
        .bind(order.id().to_string())
        .bind(expected_revision)
        .execute(&mut *tx)
        .await
        .map_err(|e| query_error("注文の更新", e))?;

        if result.rows_affected() == 0 {
            // トランザクションはドロップ時にロールバックされる
            return Err(RepositoryError::Conflict(format!(
                "注文 {} のリビジョン {} は既に更新されています",
                order.id(),
                expected_revision
            )));
        }

        for (position, entry) in order.seller_statuses().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_seller_statuses (order_id, position, seller_id, status, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    status = VALUES(status),
                    updated_at = VALUES(updated_at)
                "#,
            )
            .bind(order.id().to_string())
            .bind(position as u32)
            .bind(entry.seller_id().to_string())
            .bind(entry.status().as_str())
            .bind(entry.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("出品者ステータスの更新", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| query_error("トランザクションのコミット", e))?;

        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {} FROM orders o WHERE o.id = ?", ORDER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(order_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("注文の取得", e))?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_customer(&self, customer_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM orders o WHERE o.customer_id = ? ORDER BY o.created_at DESC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("顧客別注文一覧の取得", e))?;

        self.hydrate_all(rows).await
    }

    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        // 明細の出品者で絞り込む
        let sql = format!(
            r#"
            SELECT {} FROM orders o
            WHERE EXISTS (
                SELECT 1 FROM order_items i WHERE i.order_id = o.id AND i.seller_id = ?
            )
            ORDER BY o.created_at DESC
            "#,
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(seller_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("出品者別注文一覧の取得", e))?;

        self.hydrate_all(rows).await
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM orders o ORDER BY o.created_at DESC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("注文一覧の取得", e))?;

        self.hydrate_all(rows).await
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM orders o WHERE o.status = ? ORDER BY o.created_at DESC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("ステータス別注文一覧の取得", e))?;

        self.hydrate_all(rows).await
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }

    async fn next_order_number(&self) -> Result<OrderNumber, RepositoryError> {
        // AUTO_INCREMENT は1から始まるので0始まりの連番に直す
        let result = sqlx::query("INSERT INTO order_number_sequence () VALUES ()")
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("注文番号の採番", e))?;

        Ok(OrderNumber::from_sequence(result.last_insert_id().saturating_sub(1)))
    }
}
