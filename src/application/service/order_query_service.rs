use crate::application::{ApplicationError, Identity};
use crate::domain::model::{FulfillmentStatus, Order, OrderId, OrderStatus, Role};
use crate::domain::port::OrderRepository;
use std::sync::Arc;

/// 出品者向けの注文ビュー
/// 注文全体に加えて呼び出し元出品者のサブステータスを持つ
#[derive(Debug, Clone)]
pub struct SellerOrderView {
    pub order: Order,
    pub my_status: Option<FulfillmentStatus>,
}

/// 注文クエリサービス
/// 読み取り専用の注文操作を、呼び出し元に応じた絞り込み付きで提供する
pub struct OrderQueryService {
    order_repository: Arc<dyn OrderRepository>,
}

impl OrderQueryService {
    /// 新しい注文クエリサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    /// 呼び出し元が顧客として作成した注文を取得
    /// 作成日時の降順で並べて返す
    pub async fn get_my_orders(&self, identity: &Identity) -> Result<Vec<Order>, ApplicationError> {
        self.order_repository
            .find_by_customer(identity.subject())
            .await
            .map_err(ApplicationError::from)
    }

    /// 呼び出し元出品者の商品を含む注文を取得
    /// 作成日時の降順で並べて返す
    pub async fn get_seller_orders(
        &self,
        identity: &Identity,
    ) -> Result<Vec<SellerOrderView>, ApplicationError> {
        identity.require_role(&[Role::Seller])?;
        let seller_id = identity.subject();

        let orders = self.order_repository.find_by_seller(seller_id).await?;
        Ok(orders
            .into_iter()
            .filter(|order| order.involves_seller(seller_id))
            .map(|order| {
                let my_status = order.seller_status_for(seller_id).map(|s| s.status());
                SellerOrderView { order, my_status }
            })
            .collect())
    }

    /// すべての注文を取得（管理者のみ）
    ///
    /// # Arguments
    /// * `status` - 指定された場合はこのステータスの注文のみ
    pub async fn get_all_orders(
        &self,
        identity: &Identity,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, ApplicationError> {
        identity.require_role(&[Role::Admin])?;
        let orders = match status {
            Some(status) => self.order_repository.find_by_status(status).await?,
            None => self.order_repository.find_all().await?,
        };
        Ok(orders)
    }

    /// 注文IDで注文を取得
    /// 注文した顧客、明細に商品を持つ出品者、管理者のみ参照できる
    pub async fn get_order_by_id(
        &self,
        identity: &Identity,
        order_id: OrderId,
    ) -> Result<Order, ApplicationError> {
        let order = self
            .order_repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id))
            })?;

        let allowed = match identity.role() {
            Role::Admin => true,
            Role::Customer => order.customer_id() == identity.subject(),
            Role::Seller => order.involves_seller(identity.subject()),
        };
        if !allowed {
            return Err(ApplicationError::Forbidden(
                "この注文を参照する権限がありません".to_string(),
            ));
        }
        Ok(order)
    }
}
