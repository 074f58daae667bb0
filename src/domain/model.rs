// ドメインモデル（エンティティと値オブジェクト）

mod value_objects;
mod status;
mod order;
mod product;
mod user;

pub use value_objects::{
    OrderId, OrderNumber, UserId, ProductId,
    Money,
    LineItem,
    ShippingAddress,
    CustomerSnapshot,
    Role, AccountStatus,
};

pub use status::{derive_overall_status, FulfillmentStatus, OrderStatus};
pub use order::{distinct_sellers, Order, PersistedOrder, SellerStatus, DEFAULT_PAYMENT_METHOD};
pub use product::Product;
pub use user::User;
