use crate::application::{ApplicationError, Identity};
use crate::domain::model::{AccountStatus, Money, Order, Role};
use crate::domain::port::{OrderRepository, ProductRepository, UserRepository};
use std::sync::Arc;

/// 管理者ダッシュボードの集計値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_sellers: u64,
    pub total_customers: u64,
    pub total_products: u64,
    pub total_orders: u64,
    /// 全注文の合計金額の総和
    pub total_revenue: Money,
    /// 承認待ちの出品者数
    pub pending_sellers: u64,
}

/// ダッシュボードクエリサービス
pub struct DashboardQueryService {
    order_repository: Arc<dyn OrderRepository>,
    product_repository: Arc<dyn ProductRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl DashboardQueryService {
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        product_repository: Arc<dyn ProductRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            order_repository,
            product_repository,
            user_repository,
        }
    }

    /// 集計値を取得（管理者のみ）
    pub async fn get_stats(&self, identity: &Identity) -> Result<DashboardStats, ApplicationError> {
        identity.require_role(&[Role::Admin])?;

        let orders = self.order_repository.find_all().await?;
        let total_revenue = Money::try_sum(orders.iter().map(Order::total_amount))?;

        Ok(DashboardStats {
            total_users: self.user_repository.count(None, None).await?,
            total_sellers: self.user_repository.count(Some(Role::Seller), None).await?,
            total_customers: self
                .user_repository
                .count(Some(Role::Customer), None)
                .await?,
            total_products: self.product_repository.count().await?,
            total_orders: orders.len() as u64,
            total_revenue,
            pending_sellers: self
                .user_repository
                .count(Some(Role::Seller), Some(AccountStatus::Pending))
                .await?,
        })
    }
}
