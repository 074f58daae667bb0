// 駆動される側アダプター（リポジトリ実装など）

mod in_memory;
mod order_repository;
mod product_repository;
mod user_repository;

pub use in_memory::{InMemoryOrderRepository, InMemoryProductRepository, InMemoryUserRepository};
pub use order_repository::MySqlOrderRepository;
pub use product_repository::MySqlProductRepository;
pub use user_repository::MySqlUserRepository;
