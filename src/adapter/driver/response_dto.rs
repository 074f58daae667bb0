use crate::application::service::{DashboardStats, SellerCustomer, SellerOrderView, SellerStats};
use crate::domain::model::{LineItem, Order, Product, SellerStatus, ShippingAddress, User};
use serde::{Deserialize, Serialize};

/// 注文明細用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub title: String,
    pub price: i64,
    pub quantity: u32,
    pub seller_id: String,
}

/// 配送先住所用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct ShippingAddressResponse {
    pub address: String,
    pub city: String,
    pub phone: String,
}

/// 出品者サブステータス用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStatusResponse {
    pub seller_id: String,
    pub status: String,
    pub updated_at: String,
}

/// 注文用のレスポンスDTO
/// `orderId` は人が読める注文番号、`id` は内部の注文ID
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub order_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: i64,
    pub payment_method: String,
    pub shipping_address: ShippingAddressResponse,
    pub status: String,
    pub seller_statuses: Vec<SellerStatusResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// 出品者向け注文のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub my_status: Option<String>,
}

/// 商品用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    pub price: i64,
    pub stock: i64,
    pub sold_count: i64,
    pub created_at: String,
}

/// ユーザー用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub store_name: Option<String>,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub created_at: String,
}

/// 管理者ダッシュボードのレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub total_users: u64,
    pub total_sellers: u64,
    pub total_customers: u64,
    pub total_products: u64,
    pub total_orders: u64,
    pub total_revenue: i64,
    pub pending_sellers: u64,
}

/// 出品者ダッシュボードのレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStatsResponse {
    pub total_products: u64,
    pub total_sales: i64,
    pub total_revenue: i64,
    pub low_stock_items: u64,
    pub pending_orders: u64,
    pub total_orders: u64,
}

/// 出品者の顧客一覧のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub orders: u64,
    pub total_spent: i64,
}

impl From<SellerStats> for SellerStatsResponse {
    fn from(stats: SellerStats) -> Self {
        Self {
            total_products: stats.total_products,
            total_sales: stats.total_sales,
            total_revenue: stats.total_revenue.amount(),
            low_stock_items: stats.low_stock_items,
            pending_orders: stats.pending_orders,
            total_orders: stats.total_orders,
        }
    }
}

impl SellerCustomerResponse {
    pub fn from_customer(customer: &SellerCustomer) -> Self {
        Self {
            id: customer.customer_id.to_string(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            orders: customer.order_count,
            total_spent: customer.total_spent.amount(),
        }
    }
}

impl OrderItemResponse {
    pub fn from_line_item(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id().to_string(),
            title: item.title().to_string(),
            price: item.price().amount(),
            quantity: item.quantity(),
            seller_id: item.seller_id().to_string(),
        }
    }
}

impl ShippingAddressResponse {
    pub fn from_shipping_address(address: &ShippingAddress) -> Self {
        Self {
            address: address.address().to_string(),
            city: address.city().to_string(),
            phone: address.phone().to_string(),
        }
    }
}

impl SellerStatusResponse {
    pub fn from_seller_status(entry: &SellerStatus) -> Self {
        Self {
            seller_id: entry.seller_id().to_string(),
            status: entry.status().to_string(),
            updated_at: entry.updated_at().to_rfc3339(),
        }
    }
}

impl OrderResponse {
    /// ドメインオブジェクトからOrderResponseを作成
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            order_id: order.order_number().to_string(),
            customer_id: order.customer_id().to_string(),
            customer_name: order.customer().name().to_string(),
            customer_email: order.customer().email().to_string(),
            items: order
                .items()
                .iter()
                .map(OrderItemResponse::from_line_item)
                .collect(),
            total_amount: order.total_amount().amount(),
            payment_method: order.payment_method().to_string(),
            shipping_address: ShippingAddressResponse::from_shipping_address(
                order.shipping_address(),
            ),
            status: order.status().to_string(),
            seller_statuses: order
                .seller_statuses()
                .iter()
                .map(SellerStatusResponse::from_seller_status)
                .collect(),
            created_at: order.created_at().to_rfc3339(),
            updated_at: order.updated_at().to_rfc3339(),
        }
    }
}

impl SellerOrderResponse {
    pub fn from_view(view: &SellerOrderView) -> Self {
        Self {
            order: OrderResponse::from_order(&view.order),
            my_status: view.my_status.map(|status| status.to_string()),
        }
    }
}

impl ProductResponse {
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id().to_string(),
            seller_id: product.seller_id().to_string(),
            title: product.title().to_string(),
            price: product.price().amount(),
            stock: product.stock(),
            sold_count: product.sold_count(),
            created_at: product.created_at().to_rfc3339(),
        }
    }
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            role: user.role().to_string(),
            status: user.status().to_string(),
            store_name: user.store_name().map(str::to_string),
            address: user.address().address().to_string(),
            city: user.address().city().to_string(),
            phone: user.address().phone().to_string(),
            created_at: user.created_at().to_rfc3339(),
        }
    }
}

impl From<DashboardStats> for DashboardStatsResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_users: stats.total_users,
            total_sellers: stats.total_sellers,
            total_customers: stats.total_customers,
            total_products: stats.total_products,
            total_orders: stats.total_orders,
            total_revenue: stats.total_revenue.amount(),
            pending_sellers: stats.pending_sellers,
        }
    }
}
