use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::model::{Money, ProductId, UserId};

/// 商品（在庫台帳）
/// 注文ワークフローからは在庫数と販売数の更新対象として扱う
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    seller_id: UserId,
    title: String,
    price: Money,
    stock: i64,
    sold_count: i64,
    created_at: DateTime<Utc>,
}

impl Product {
    /// 新しい商品を登録
    ///
    /// # Arguments
    /// * `seller_id` - 所有する出品者（変更不可）
    /// * `stock` - 初期在庫数
    pub fn new(
        id: ProductId,
        seller_id: UserId,
        title: String,
        price: Money,
        stock: i64,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "商品名は空にできません".to_string(),
            ));
        }
        if price.is_negative() {
            return Err(DomainError::InvalidValue(
                "価格は0以上である必要があります".to_string(),
            ));
        }
        if stock < 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            id,
            seller_id,
            title,
            price,
            stock,
            sold_count: 0,
            created_at: Utc::now(),
        })
    }

    /// データベースから取得したデータで商品を再構築
    pub fn reconstruct(
        id: ProductId,
        seller_id: UserId,
        title: String,
        price: Money,
        stock: i64,
        sold_count: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            seller_id,
            title,
            price,
            stock,
            sold_count,
            created_at,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> Money {
        self.price
    }

    /// 現在の在庫数（注文により負になり得る）
    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn sold_count(&self) -> i64 {
        self.sold_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 販売を記録する
    /// 在庫数を減らし販売数を増やす。在庫の充足チェックは行わない
    pub fn record_sale(&mut self, quantity: u32) {
        self.stock -= quantity as i64;
        self.sold_count += quantity as i64;
    }
}
