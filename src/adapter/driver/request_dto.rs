use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::service::{OrderItemInput, PlaceOrderCommand};
use crate::domain::model::{Money, ProductId, ShippingAddress, UserId};

/// 配送先住所のリクエストDTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingAddressRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub phone: String,
}

impl ShippingAddressRequest {
    pub fn into_domain(self) -> ShippingAddress {
        ShippingAddress::new(self.address, self.city, self.phone)
    }
}

/// 注文明細のリクエストDTO
/// 価格と商品名は省略可能（省略時は商品の現在の値）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    pub price: Option<i64>,
    pub title: Option<String>,
}

/// 注文作成用のリクエストDTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub total_amount: i64,
    pub customer_id: Option<Uuid>,
    pub shipping_address: Option<ShippingAddressRequest>,
}

impl CreateOrderRequest {
    pub fn into_command(self) -> PlaceOrderCommand {
        PlaceOrderCommand {
            customer_id: self.customer_id.map(UserId::from_uuid),
            items: self
                .items
                .into_iter()
                .map(|item| OrderItemInput {
                    product_id: ProductId::from_uuid(item.product_id),
                    quantity: item.quantity,
                    price: item.price.map(Money::new),
                    title: item.title,
                })
                .collect(),
            total_amount: Money::new(self.total_amount),
            shipping_address: self.shipping_address.map(ShippingAddressRequest::into_domain),
        }
    }
}

/// 出品者サブステータス更新用のリクエストDTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSellerStatusRequest {
    pub status: String,
}

/// 管理者による注文ステータス上書き用のリクエストDTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUpdateOrderRequest {
    pub status: String,
}

/// 商品登録用のリクエストDTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub price: i64,
    pub stock: i64,
}

/// ユーザー登録用のリクエストDTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: String,
    pub store_name: Option<String>,
    #[serde(flatten)]
    pub address: ShippingAddressRequest,
}

/// 注文一覧取得用のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct OrdersQueryParams {
    pub status: Option<String>,
}
