// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{
    Order, OrderId, OrderNumber, OrderStatus, Product, ProductId, Role, AccountStatus, User, UserId,
};
use async_trait::async_trait;

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// 楽観的排他制御の競合（保存時のリビジョン不一致）
    #[error("Revision conflict: {0}")]
    Conflict(String),
}

/// 注文リポジトリトレイト
/// 注文集約の永続化を抽象化する
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 新しい注文を保存する
    ///
    /// # Arguments
    /// * `order` - 保存する注文
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError>;

    /// 既存の注文を更新する
    /// 保存済みのリビジョンが `expected_revision` と一致する場合のみ書き込む
    ///
    /// # Returns
    /// * `Ok(())` - 更新成功
    /// * `Err(RepositoryError::Conflict)` - 他の書き込みが先行した
    /// * `Err(RepositoryError)` - 更新失敗
    async fn update(&self, order: &Order, expected_revision: u64) -> Result<(), RepositoryError>;

    /// 注文IDで注文を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Order))` - 注文が見つかった
    /// * `Ok(None)` - 注文が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// 顧客の注文を作成日時の降順で取得する
    async fn find_by_customer(&self, customer_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// 指定された出品者の商品を含む注文を作成日時の降順で取得する
    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// すべての注文を作成日時の降順で取得する
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError>;

    /// 指定されたステータスの注文を作成日時の降順で取得する
    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError>;

    /// 新しい一意の注文IDを生成する
    fn next_identity(&self) -> OrderId;

    /// 次の注文番号を採番する
    /// 単調増加し、再利用されない
    async fn next_order_number(&self) -> Result<OrderNumber, RepositoryError>;
}

/// 商品リポジトリトレイト
/// 在庫台帳の永続化を抽象化する
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 商品を保存する
    async fn save(&self, product: &Product) -> Result<(), RepositoryError>;

    /// 商品IDで商品を検索する
    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// 出品者が所有する商品を登録日時の降順で取得する
    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, RepositoryError>;

    /// 販売を記録する
    /// 在庫数の減算と販売数の加算を単一のアトミックな更新として行う
    ///
    /// # Returns
    /// * `Ok(true)` - 更新成功
    /// * `Ok(false)` - 商品が存在しない
    async fn record_sale(&self, product_id: ProductId, quantity: u32)
        -> Result<bool, RepositoryError>;

    /// 商品の総数
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを保存する
    async fn save(&self, user: &User) -> Result<(), RepositoryError>;

    /// ユーザーIDでユーザーを検索する
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, RepositoryError>;

    /// 条件に一致するユーザーの数
    /// `None` の条件は絞り込みに使わない
    async fn count(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<u64, RepositoryError>;
}
