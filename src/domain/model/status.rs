use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 注文全体のステータス
/// 通常は出品者ごとのサブステータスから導出される
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// 保留中（作成直後、全出品者の受付待ち）
    Pending,
    /// 全出品者が受付済み
    Processing,
    /// 全出品者が発送済み以降
    Shipped,
    /// 全出品者が配達完了
    Delivered,
    /// 管理者によるキャンセル
    Cancelled,
    /// いずれかの出品者が拒否
    Rejected,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        }
    }

    /// 文字列からOrderStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidValue(format!("無効な注文ステータス: {}", s)))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 出品者ごとの履行ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Pending,
    Accepted,
    Rejected,
    Shipped,
    Delivered,
}

impl FulfillmentStatus {
    pub const ALL: [FulfillmentStatus; 5] = [
        FulfillmentStatus::Pending,
        FulfillmentStatus::Accepted,
        FulfillmentStatus::Rejected,
        FulfillmentStatus::Shipped,
        FulfillmentStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Accepted => "accepted",
            FulfillmentStatus::Rejected => "rejected",
            FulfillmentStatus::Shipped => "shipped",
            FulfillmentStatus::Delivered => "delivered",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidValue(format!("無効な履行ステータス: {}", s)))
    }

    /// 発送済み以降か
    fn is_shipped_or_later(&self) -> bool {
        matches!(self, FulfillmentStatus::Shipped | FulfillmentStatus::Delivered)
    }

    /// 受付済み以降か（拒否は含まない）
    fn is_accepted_or_later(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Accepted | FulfillmentStatus::Shipped | FulfillmentStatus::Delivered
        )
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 出品者サブステータスの集合から注文全体のステータスを導出する
///
/// 上から順に最初に一致した規則を採用する:
/// 1. いずれかが Rejected → Rejected
/// 2. すべて Delivered → Delivered
/// 3. すべて Shipped/Delivered → Shipped
/// 4. すべて Accepted/Shipped/Delivered → Processing
/// 5. それ以外 → 現在の値のまま
///
/// 導出が Cancelled を生むことはない（管理者の上書きでのみ到達する）。
/// 現在の値が Cancelled でも規則1〜4に一致すれば上書きされる。
/// サブステータスが空の場合は現在の値のまま。
pub fn derive_overall_status<I>(current: OrderStatus, seller_statuses: I) -> OrderStatus
where
    I: IntoIterator<Item = FulfillmentStatus>,
{
    let statuses: Vec<FulfillmentStatus> = seller_statuses.into_iter().collect();
    if statuses.is_empty() {
        return current;
    }

    if statuses.contains(&FulfillmentStatus::Rejected) {
        OrderStatus::Rejected
    } else if statuses.iter().all(|s| *s == FulfillmentStatus::Delivered) {
        OrderStatus::Delivered
    } else if statuses.iter().all(FulfillmentStatus::is_shipped_or_later) {
        OrderStatus::Shipped
    } else if statuses.iter().all(FulfillmentStatus::is_accepted_or_later) {
        OrderStatus::Processing
    } else {
        current
    }
}
