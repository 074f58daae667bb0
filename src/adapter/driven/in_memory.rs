// メモリ上のリポジトリ実装
// データベースなしでサービスとREST APIを動かすためのもの（テスト・ローカル確認用）

use crate::domain::model::{
    AccountStatus, Order, OrderId, OrderNumber, OrderStatus, Product, ProductId, Role, User,
    UserId,
};
use crate::domain::port::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|e| RepositoryError::OperationFailed(format!("ロックの取得に失敗しました: {}", e)))
}

/// 新しい順（作成日時の降順）に並べる
/// 作成日時が同じ場合は後から保存した注文を先にする
fn newest_first<'a>(orders: impl DoubleEndedIterator<Item = &'a Order>) -> Vec<Order> {
    let mut result: Vec<Order> = orders.rev().cloned().collect();
    result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    result
}

/// メモリ上の注文リポジトリ
/// 保存順を保持し、リビジョンによる楽観的排他制御をMySQL実装と同じ規則で行う
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
    sequence: AtomicU64,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = lock(&self.orders)?;
        if orders.iter().any(|existing| existing.id() == order.id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "注文は既に存在します: {}",
                order.id()
            )));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order, expected_revision: u64) -> Result<(), RepositoryError> {
        let mut orders = lock(&self.orders)?;
        let stored = orders
            .iter_mut()
            .find(|existing| existing.id() == order.id())
            .ok_or_else(|| {
                RepositoryError::OperationFailed(format!("注文が存在しません: {}", order.id()))
            })?;

        if stored.revision() != expected_revision {
            return Err(RepositoryError::Conflict(format!(
                "注文 {} のリビジョンが一致しません（期待値: {}, 現在: {}）",
                order.id(),
                expected_revision,
                stored.revision()
            )));
        }
        *stored = order.clone();
        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = lock(&self.orders)?;
        Ok(orders.iter().find(|order| order.id() == order_id).cloned())
    }

    async fn find_by_customer(&self, customer_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = lock(&self.orders)?;
        let matching: Vec<&Order> = orders
            .iter()
            .filter(|order| order.customer_id() == customer_id)
            .collect();
        Ok(newest_first(matching.into_iter()))
    }

    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = lock(&self.orders)?;
        let matching: Vec<&Order> = orders
            .iter()
            .filter(|order| order.involves_seller(seller_id))
            .collect();
        Ok(newest_first(matching.into_iter()))
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = lock(&self.orders)?;
        Ok(newest_first(orders.iter()))
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let orders = lock(&self.orders)?;
        let matching: Vec<&Order> = orders
            .iter()
            .filter(|order| order.status() == status)
            .collect();
        Ok(newest_first(matching.into_iter()))
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }

    async fn next_order_number(&self) -> Result<OrderNumber, RepositoryError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        Ok(OrderNumber::from_sequence(sequence))
    }
}

/// メモリ上の商品リポジトリ
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        lock(&self.products)?.insert(product.id(), product.clone());
        Ok(())
    }

    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(lock(&self.products)?.get(&product_id).cloned())
    }

    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let mut owned: Vec<Product> = lock(&self.products)?
            .values()
            .filter(|product| product.seller_id() == seller_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(owned)
    }

    async fn record_sale(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        // ロックを保持したまま加減算するので同時の販売が失われない
        let mut products = lock(&self.products)?;
        match products.get_mut(&product_id) {
            Some(product) => {
                product.record_sale(quantity);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(lock(&self.products)?.len() as u64)
    }
}

/// メモリ上のユーザーリポジトリ
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = lock(&self.users)?;
        // メールアドレスの一意制約（usersテーブルのUNIQUE制約に合わせる）
        if users
            .values()
            .any(|existing| existing.email() == user.email() && existing.id() != user.id())
        {
            return Err(RepositoryError::OperationFailed(format!(
                "メールアドレスは既に使用されています: {}",
                user.email()
            )));
        }
        users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?.get(&user_id).cloned())
    }

    async fn count(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<u64, RepositoryError> {
        let users = lock(&self.users)?;
        let count = users
            .values()
            .filter(|user| role.map_or(true, |r| user.role() == r))
            .filter(|user| status.map_or(true, |s| user.status() == s))
            .count();
        Ok(count as u64)
    }
}
