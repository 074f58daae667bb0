use crate::application::{ApplicationError, Identity};
use crate::domain::model::{Money, Order, OrderStatus, Product, Role, UserId};
use crate::domain::port::{OrderRepository, ProductRepository};
use std::sync::Arc;

/// 在庫僅少とみなす在庫数（この値未満）
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// 出品者ダッシュボードの集計値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerStats {
    pub total_products: u64,
    /// 自分の商品の販売数の合計
    pub total_sales: i64,
    /// 自分の商品を含む注文の合計金額の総和
    pub total_revenue: Money,
    pub low_stock_items: u64,
    pub pending_orders: u64,
    pub total_orders: u64,
}

/// 出品者から見た顧客ごとの購入実績
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerCustomer {
    pub customer_id: UserId,
    /// 最新の注文時点の名前
    pub name: String,
    pub email: String,
    pub order_count: u64,
    pub total_spent: Money,
}

/// 出品者クエリサービス
/// 呼び出し元出品者の商品と、その商品を含む注文だけを集計する
pub struct SellerQueryService {
    order_repository: Arc<dyn OrderRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl SellerQueryService {
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            order_repository,
            product_repository,
        }
    }

    /// 出品者の集計値を取得
    pub async fn get_stats(&self, identity: &Identity) -> Result<SellerStats, ApplicationError> {
        identity.require_role(&[Role::Seller])?;
        let seller_id = identity.subject();

        let products = self.product_repository.find_by_seller(seller_id).await?;
        let orders = self.order_repository.find_by_seller(seller_id).await?;

        Ok(SellerStats {
            total_products: products.len() as u64,
            total_sales: products.iter().map(Product::sold_count).sum(),
            total_revenue: Money::try_sum(orders.iter().map(Order::total_amount))?,
            low_stock_items: products
                .iter()
                .filter(|product| product.stock() < LOW_STOCK_THRESHOLD)
                .count() as u64,
            pending_orders: orders
                .iter()
                .filter(|order| order.status() == OrderStatus::Pending)
                .count() as u64,
            total_orders: orders.len() as u64,
        })
    }

    /// 出品者の商品を購入した顧客の一覧
    /// 最も新しい注文の順に並べる
    pub async fn get_customers(
        &self,
        identity: &Identity,
    ) -> Result<Vec<SellerCustomer>, ApplicationError> {
        identity.require_role(&[Role::Seller])?;

        let orders = self
            .order_repository
            .find_by_seller(identity.subject())
            .await?;

        let mut customers: Vec<SellerCustomer> = Vec::new();
        for order in &orders {
            match customers
                .iter_mut()
                .find(|customer| customer.customer_id == order.customer_id())
            {
                Some(customer) => {
                    customer.order_count += 1;
                    customer.total_spent = customer.total_spent.add(&order.total_amount())?;
                }
                None => customers.push(SellerCustomer {
                    customer_id: order.customer_id(),
                    name: order.customer().name().to_string(),
                    email: order.customer().email().to_string(),
                    order_count: 1,
                    total_spent: order.total_amount(),
                }),
            }
        }
        Ok(customers)
    }
}
