use crate::application::{ApplicationError, Identity};
use crate::domain::error::DomainError;
use crate::domain::model::{
    FulfillmentStatus, LineItem, Money, Order, OrderId, OrderStatus, Product, ProductId, Role,
    ShippingAddress, User, UserId,
};
use crate::domain::port::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use std::sync::Arc;

mod dashboard_query_service;
mod order_query_service;
mod seller_query_service;

pub use dashboard_query_service::{DashboardQueryService, DashboardStats};
pub use order_query_service::{OrderQueryService, SellerOrderView};
pub use seller_query_service::{SellerCustomer, SellerQueryService, SellerStats, LOW_STOCK_THRESHOLD};

/// 注文更新の競合時の既定の試行回数
pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 3;

/// 注文明細の入力
#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: u32,
    /// 未指定なら商品の現在価格
    pub price: Option<Money>,
    /// 未指定なら商品の現在の商品名
    pub title: Option<String>,
}

/// 注文作成コマンド
#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    /// 未指定なら呼び出し元
    pub customer_id: Option<UserId>,
    pub items: Vec<OrderItemInput>,
    pub total_amount: Money,
    /// 未指定なら顧客プロフィールの住所
    pub shipping_address: Option<ShippingAddress>,
}

/// 注文アプリケーションサービス
/// 注文の作成と、出品者・管理者によるステータス変更を担当する
pub struct OrderApplicationService {
    order_repository: Arc<dyn OrderRepository>,
    product_repository: Arc<dyn ProductRepository>,
    user_repository: Arc<dyn UserRepository>,
    max_update_attempts: u32,
}

impl OrderApplicationService {
    /// 新しいアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    /// * `product_repository` - 商品リポジトリ
    /// * `user_repository` - ユーザーリポジトリ
    /// * `max_update_attempts` - 競合時に注文更新を試行する最大回数
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        product_repository: Arc<dyn ProductRepository>,
        user_repository: Arc<dyn UserRepository>,
        max_update_attempts: u32,
    ) -> Self {
        Self {
            order_repository,
            product_repository,
            user_repository,
            max_update_attempts: max_update_attempts.max(1),
        }
    }

    /// 新しい注文を作成
    ///
    /// 1. 顧客を解決し、名前・メール・住所をスナップショットする
    /// 2. 各明細の商品を解決し、出品者を明細に記録する
    /// 3. 各商品の在庫を減らし販売数を増やす（在庫の充足チェックはしない）
    /// 4. 注文番号を採番して Pending で保存する
    ///
    /// # Returns
    /// * `Ok(Order)` - 作成された注文
    /// * `Err(ApplicationError)` - 作成失敗
    pub async fn place_order(
        &self,
        identity: &Identity,
        command: PlaceOrderCommand,
    ) -> Result<Order, ApplicationError> {
        identity.require_role(&[Role::Customer, Role::Admin])?;

        let customer_id = command.customer_id.unwrap_or_else(|| identity.subject());
        if customer_id != identity.subject() && !identity.is_admin() {
            return Err(ApplicationError::Forbidden(
                "他の顧客の注文は作成できません".to_string(),
            ));
        }

        if command.items.is_empty() {
            return Err(DomainError::OrderValidation("注文明細が空です".to_string()).into());
        }

        let customer = self
            .user_repository
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("顧客が見つかりません: {}", customer_id))
            })?;

        // 在庫を動かす前に全商品を解決して明細を検証する
        let mut items = Vec::with_capacity(command.items.len());
        for input in &command.items {
            let product = self
                .product_repository
                .find_by_id(input.product_id)
                .await?
                .ok_or_else(|| {
                    ApplicationError::NotFound(format!(
                        "商品が見つかりません: {}",
                        input.product_id
                    ))
                })?;
            items.push(LineItem::new(
                product.id(),
                input.title.clone().unwrap_or_else(|| product.title().to_string()),
                input.price.unwrap_or_else(|| product.price()),
                input.quantity,
                product.seller_id(),
            )?);
        }

        let shipping_address = command
            .shipping_address
            .unwrap_or_else(|| customer.address().clone());

        let order_number = self.order_repository.next_order_number().await?;
        let order = Order::place(
            self.order_repository.next_identity(),
            order_number,
            customer_id,
            customer.snapshot(),
            items,
            command.total_amount,
            shipping_address,
        )?;

        // 在庫を動かす前に金額を確定させる
        let subtotal = order.line_items_subtotal()?;
        if subtotal != order.total_amount() {
            tracing::warn!(
                order_number = %order.order_number(),
                submitted = order.total_amount().amount(),
                computed = subtotal.amount(),
                "送信された合計金額が明細の合計と一致しません"
            );
        }

        for item in order.items() {
            let recorded = self
                .product_repository
                .record_sale(item.product_id(), item.quantity())
                .await?;
            if !recorded {
                tracing::warn!(
                    product_id = %item.product_id(),
                    "販売記録の対象商品が見つかりませんでした"
                );
            }
        }

        if let Err(err) = self.order_repository.insert(&order).await {
            // 在庫の減算は巻き戻さない。手動での照合用に対象を残す
            let decremented: Vec<String> = order
                .items()
                .iter()
                .map(|item| format!("{}x{}", item.product_id(), item.quantity()))
                .collect();
            tracing::error!(
                order_number = %order.order_number(),
                error = %err,
                decremented = ?decremented,
                "注文の保存に失敗しました。在庫は減算済みです"
            );
            return Err(err.into());
        }

        tracing::info!(
            order_id = %order.id(),
            order_number = %order.order_number(),
            customer_id = %order.customer_id(),
            sellers = order.seller_statuses().len(),
            "注文を作成しました"
        );

        Ok(order)
    }

    /// 出品者が自分のサブステータスを更新する
    /// 注文全体のステータスはサブステータスの集合から再導出される
    ///
    /// # Arguments
    /// * `identity` - 呼び出し元（出品者）
    /// * `order_id` - 注文ID
    /// * `status` - 新しいサブステータス
    ///
    /// # Returns
    /// * `Ok(Order)` - 更新後の注文
    /// * `Err(ApplicationError::Forbidden)` - 注文にこの出品者の商品が含まれない
    /// * `Err(ApplicationError::Conflict)` - 競合が解消しなかった
    pub async fn update_seller_status(
        &self,
        identity: &Identity,
        order_id: OrderId,
        status: FulfillmentStatus,
    ) -> Result<Order, ApplicationError> {
        identity.require_role(&[Role::Seller])?;
        let seller_id = identity.subject();

        let order = self
            .mutate_with_retry(order_id, |order| {
                if order.seller_status_for(seller_id).is_none() {
                    return Err(ApplicationError::Forbidden(
                        "この注文にはあなたの商品が含まれていません".to_string(),
                    ));
                }
                order.apply_seller_status(seller_id, status);
                Ok(())
            })
            .await?;

        tracing::info!(
            order_id = %order.id(),
            seller_id = %seller_id,
            seller_status = %status,
            order_status = %order.status(),
            "出品者ステータスを更新しました"
        );

        Ok(order)
    }

    /// 管理者が注文全体のステータスを直接上書きする
    pub async fn override_status(
        &self,
        identity: &Identity,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApplicationError> {
        identity.require_role(&[Role::Admin])?;

        let order = self
            .mutate_with_retry(order_id, |order| {
                order.override_status(status);
                Ok(())
            })
            .await?;

        tracing::info!(
            order_id = %order.id(),
            admin_id = %identity.subject(),
            order_status = %status,
            "管理者が注文ステータスを上書きしました"
        );

        Ok(order)
    }

    /// 注文を読み込み、変更を適用してリビジョン付きで保存する
    /// 他の書き込みと競合した場合は読み込みからやり直す
    async fn mutate_with_retry<F>(
        &self,
        order_id: OrderId,
        mutate: F,
    ) -> Result<Order, ApplicationError>
    where
        F: Fn(&mut Order) -> Result<(), ApplicationError>,
    {
        for attempt in 1..=self.max_update_attempts {
            let mut order = self
                .order_repository
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| {
                    ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id))
                })?;

            let expected_revision = order.revision();
            mutate(&mut order)?;

            match self.order_repository.update(&order, expected_revision).await {
                Ok(()) => return Ok(order),
                Err(RepositoryError::Conflict(msg)) => {
                    tracing::warn!(
                        order_id = %order_id,
                        attempt,
                        reason = %msg,
                        "注文の更新が競合しました。再試行します"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ApplicationError::Conflict(format!(
            "注文の更新が{}回競合しました: {}",
            self.max_update_attempts, order_id
        )))
    }
}

/// カタログアプリケーションサービス
/// 注文ワークフローが参照する商品とユーザーの登録を担当する
pub struct CatalogApplicationService {
    product_repository: Arc<dyn ProductRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl CatalogApplicationService {
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            product_repository,
            user_repository,
        }
    }

    /// 出品者が自分の商品を登録する
    pub async fn register_product(
        &self,
        identity: &Identity,
        title: String,
        price: Money,
        stock: i64,
    ) -> Result<Product, ApplicationError> {
        identity.require_role(&[Role::Seller])?;
        let product = Product::new(ProductId::new(), identity.subject(), title, price, stock)?;
        self.product_repository.save(&product).await?;
        tracing::info!(
            product_id = %product.id(),
            seller_id = %product.seller_id(),
            stock = product.stock(),
            "商品を登録しました"
        );
        Ok(product)
    }

    /// 商品IDで商品を取得
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, ApplicationError> {
        self.product_repository
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("商品が見つかりません: {}", product_id)))
    }

    /// 管理者がユーザーを登録する
    pub async fn register_user(
        &self,
        identity: &Identity,
        name: String,
        email: String,
        role: Role,
        store_name: Option<String>,
        address: ShippingAddress,
    ) -> Result<User, ApplicationError> {
        identity.require_role(&[Role::Admin])?;
        let user = User::new(UserId::new(), name, email, role, store_name, address)?;
        self.user_repository.save(&user).await?;
        tracing::info!(user_id = %user.id(), role = %user.role(), "ユーザーを登録しました");
        Ok(user)
    }

    /// 管理者が承認待ちの出品者を承認する
    ///
    /// # Returns
    /// * `Ok(User)` - 承認後のユーザー
    /// * `Err(ApplicationError::NotFound)` - ユーザーが存在しない
    /// * `Err(ApplicationError::DomainError)` - 出品者ではない
    pub async fn approve_seller(
        &self,
        identity: &Identity,
        user_id: UserId,
    ) -> Result<User, ApplicationError> {
        identity.require_role(&[Role::Admin])?;
        let mut user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("ユーザーが見つかりません: {}", user_id))
            })?;

        user.approve()?;
        self.user_repository.save(&user).await?;
        tracing::info!(
            seller_id = %user.id(),
            admin_id = %identity.subject(),
            "出品者を承認しました"
        );
        Ok(user)
    }
}
