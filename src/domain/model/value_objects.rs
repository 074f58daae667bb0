use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// 注文の一意識別子（内部の主キー）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// 新しい一意のOrderIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから OrderId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からOrderIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

/// 人が読める注文番号（例: ORD1000）
/// 採番シーケンスから一度だけ割り当てられ、再利用されない
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNumber(String);

impl OrderNumber {
    const PREFIX: &'static str = "ORD";
    const OFFSET: u64 = 1000;

    /// 採番シーケンスの値から注文番号を作成
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("{}{}", Self::PREFIX, Self::OFFSET + sequence))
    }

    /// 文字列から注文番号を作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        let digits = s.strip_prefix(Self::PREFIX).unwrap_or("");
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidValue(format!("無効な注文番号: {}", s)));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザー（顧客・出品者・管理者）の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// 新しい一意のUserIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから UserId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からUserIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 商品の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// 新しい一意のProductIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから ProductId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からProductIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

/// 金額を表す値オブジェクト
/// 通貨の最小単位（セント等）の整数で保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// 最小単位の金額から作成
    pub fn new(amount: i64) -> Self {
        Self(amount)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// 金額を加算
    /// 結果が i64 の範囲を超える場合はエラー
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(DomainError::AmountOverflow)
    }

    /// 金額を乗算
    pub fn multiply(&self, factor: u32) -> Result<Money, DomainError> {
        self.0
            .checked_mul(i64::from(factor))
            .map(Money)
            .ok_or(DomainError::AmountOverflow)
    }

    /// 金額の列を合計する
    pub fn try_sum<I>(amounts: I) -> Result<Money, DomainError>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.add(&m))
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

/// 注文明細を表す値オブジェクト
/// 商品名・単価・出品者は注文時点のスナップショット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    product_id: ProductId,
    title: String,
    price: Money,
    quantity: u32,
    seller_id: UserId,
}

impl LineItem {
    /// 新しい注文明細を作成
    /// 数量は1以上、単価は0以上で、小計が表現可能な範囲に収まる必要がある
    pub fn new(
        product_id: ProductId,
        title: String,
        price: Money,
        quantity: u32,
        seller_id: UserId,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if price.is_negative() {
            return Err(DomainError::InvalidValue(
                "単価は0以上である必要があります".to_string(),
            ));
        }
        price.multiply(quantity)?;
        Ok(Self {
            product_id,
            title,
            price,
            quantity,
            seller_id,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// 単価を取得
    pub fn price(&self) -> Money {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// この明細の商品を所有する出品者
    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    /// 小計を計算（単価 × 数量）
    pub fn subtotal(&self) -> Result<Money, DomainError> {
        self.price.multiply(self.quantity)
    }
}

/// 配送先住所を表す値オブジェクト
/// 顧客プロフィールの値を既定とし、注文時に上書きできる
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    address: String,
    city: String,
    phone: String,
}

impl ShippingAddress {
    pub fn new(address: String, city: String, phone: String) -> Self {
        Self {
            address,
            city,
            phone,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}

/// 注文時点の顧客情報のスナップショット
/// 顧客プロフィールが後で変わっても再同期しない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    name: String,
    email: String,
}

impl CustomerSnapshot {
    pub fn new(name: String, email: String) -> Self {
        Self { name, email }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// ユーザーのロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Seller,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Seller => "seller",
            Role::Customer => "customer",
        }
    }

    /// 文字列からRoleを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "admin" => Ok(Role::Admin),
            "seller" => Ok(Role::Seller),
            "customer" => Ok(Role::Customer),
            _ => Err(DomainError::InvalidValue(format!("無効なロール: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// アカウントの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    /// 承認待ち（出品者の新規登録時など）
    Pending,
    Blocked,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Pending => "pending",
            AccountStatus::Blocked => "blocked",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "pending" => Ok(AccountStatus::Pending),
            "blocked" => Ok(AccountStatus::Blocked),
            _ => Err(DomainError::InvalidValue(format!(
                "無効なアカウント状態: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
