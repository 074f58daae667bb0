use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::model::status::derive_overall_status;
use crate::domain::model::{
    CustomerSnapshot, FulfillmentStatus, LineItem, Money, OrderId, OrderNumber, OrderStatus,
    ShippingAddress, UserId,
};

/// 支払い方法の既定値（決済処理は行わない）
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash on Delivery";

/// 出品者ごとの履行サブステータス
#[derive(Debug, Clone, PartialEq)]
pub struct SellerStatus {
    seller_id: UserId,
    status: FulfillmentStatus,
    updated_at: DateTime<Utc>,
}

impl SellerStatus {
    pub fn new(seller_id: UserId, status: FulfillmentStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            seller_id,
            status,
            updated_at,
        }
    }

    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// 永続化層から注文集約を再構築するための値の束
pub struct PersistedOrder {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_id: UserId,
    pub customer: CustomerSnapshot,
    pub items: Vec<LineItem>,
    pub total_amount: Money,
    pub payment_method: String,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub seller_statuses: Vec<SellerStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u64,
}

/// Order集約
/// 注文明細と出品者ごとのサブステータスを一つの整合性単位として扱う
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    order_number: OrderNumber,
    customer_id: UserId,
    customer: CustomerSnapshot,
    items: Vec<LineItem>,
    total_amount: Money,
    payment_method: String,
    shipping_address: ShippingAddress,
    status: OrderStatus,
    seller_statuses: Vec<SellerStatus>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

/// 明細に現れる出品者を初出順に重複なく列挙する
pub fn distinct_sellers(items: &[LineItem]) -> Vec<UserId> {
    let mut sellers: Vec<UserId> = Vec::new();
    for item in items {
        if !sellers.contains(&item.seller_id()) {
            sellers.push(item.seller_id());
        }
    }
    sellers
}

impl Order {
    /// 新しい注文を作成（チェックアウト）
    ///
    /// 事前条件:
    /// - 注文明細が1つ以上
    /// - 合計金額が負でない
    /// - 明細の小計の合計が表現可能な範囲に収まる
    ///
    /// 出品者サブステータスは明細の出品者ごとに一つずつ Pending で作成される
    pub fn place(
        id: OrderId,
        order_number: OrderNumber,
        customer_id: UserId,
        customer: CustomerSnapshot,
        items: Vec<LineItem>,
        total_amount: Money,
        shipping_address: ShippingAddress,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::OrderValidation(
                "注文明細が空です".to_string(),
            ));
        }
        if total_amount.is_negative() {
            return Err(DomainError::InvalidValue(
                "合計金額は0以上である必要があります".to_string(),
            ));
        }
        Money::try_sum(
            items
                .iter()
                .map(LineItem::subtotal)
                .collect::<Result<Vec<_>, _>>()?,
        )?;

        let now = Utc::now();
        let seller_statuses = distinct_sellers(&items)
            .into_iter()
            .map(|seller_id| SellerStatus::new(seller_id, FulfillmentStatus::Pending, now))
            .collect();

        Ok(Self {
            id,
            order_number,
            customer_id,
            customer,
            items,
            total_amount,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            shipping_address,
            status: OrderStatus::Pending,
            seller_statuses,
            created_at: now,
            updated_at: now,
            revision: 0,
        })
    }

    /// データベースから取得したデータで注文を再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(parts: PersistedOrder) -> Self {
        Self {
            id: parts.id,
            order_number: parts.order_number,
            customer_id: parts.customer_id,
            customer: parts.customer,
            items: parts.items,
            total_amount: parts.total_amount,
            payment_method: parts.payment_method,
            shipping_address: parts.shipping_address,
            status: parts.status,
            seller_statuses: parts.seller_statuses,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            revision: parts.revision,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn customer_id(&self) -> UserId {
        self.customer_id
    }

    pub fn customer(&self) -> &CustomerSnapshot {
        &self.customer
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// 注文時に送信された合計金額（サーバー側で再計算しない）
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn seller_statuses(&self) -> &[SellerStatus] {
        &self.seller_statuses
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 楽観的排他制御用のリビジョン
    /// 変更操作のたびに1増える
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 明細の小計の合計
    pub fn line_items_subtotal(&self) -> Result<Money, DomainError> {
        let subtotals = self
            .items
            .iter()
            .map(LineItem::subtotal)
            .collect::<Result<Vec<_>, _>>()?;
        Money::try_sum(subtotals)
    }

    /// 指定された出品者の商品を含むか
    pub fn involves_seller(&self, seller_id: UserId) -> bool {
        self.items.iter().any(|item| item.seller_id() == seller_id)
    }

    /// 指定された出品者のサブステータスを取得
    pub fn seller_status_for(&self, seller_id: UserId) -> Option<&SellerStatus> {
        self.seller_statuses
            .iter()
            .find(|entry| entry.seller_id == seller_id)
    }

    /// 出品者のサブステータスを更新し、注文全体のステータスを再導出する
    ///
    /// 出品者のエントリが存在しない場合、サブステータスは変更されないが
    /// 再導出は既存のエントリで行われる。戻り値はエントリが見つかったかどうか。
    pub fn apply_seller_status(&mut self, seller_id: UserId, status: FulfillmentStatus) -> bool {
        let now = Utc::now();
        let found = match self
            .seller_statuses
            .iter_mut()
            .find(|entry| entry.seller_id == seller_id)
        {
            Some(entry) => {
                entry.status = status;
                entry.updated_at = now;
                true
            }
            None => false,
        };

        self.status = derive_overall_status(
            self.status,
            self.seller_statuses.iter().map(SellerStatus::status),
        );
        self.touch(now);
        found
    }

    /// 管理者による注文全体ステータスの直接上書き
    /// 出品者サブステータスからの導出を経由しない
    pub fn override_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.touch(Utc::now());
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.revision += 1;
    }
}
