use marketplace_order_management::adapter::driven::{
    InMemoryOrderRepository, InMemoryProductRepository, InMemoryUserRepository,
};
use marketplace_order_management::adapter::driver::auth::TokenService;
use marketplace_order_management::adapter::driver::response_dto::{
    DashboardStatsResponse, OrderResponse, ProductResponse, SellerCustomerResponse,
    SellerOrderResponse, SellerStatsResponse, UserResponse,
};
use marketplace_order_management::adapter::driver::rest_api::{create_router, ApiError, AppState};
use marketplace_order_management::application::Identity;
use marketplace_order_management::domain::model::{OrderId, Role, ShippingAddress, User, UserId};
use marketplace_order_management::domain::port::UserRepository;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const SECRET: &str = "rest-api-test-secret";

struct TestApp {
    server: TestServer,
    tokens: TokenService,
    admin: Identity,
    customer: Identity,
    seller_a: Identity,
    seller_b: Identity,
}

impl TestApp {
    async fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let tokens = TokenService::new(SECRET, 3600);

        let admin = seed_user(&users, "Ada", Role::Admin).await;
        let customer = seed_user(&users, "Cal", Role::Customer).await;
        let seller_a = seed_user(&users, "Sia", Role::Seller).await;
        let seller_b = seed_user(&users, "Sol", Role::Seller).await;

        let state = AppState::new(
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(InMemoryProductRepository::new()),
            users,
            tokens.clone(),
            3,
        );
        let server = TestServer::new(create_router(state)).unwrap();

        Self {
            server,
            tokens,
            admin,
            customer,
            seller_a,
            seller_b,
        }
    }

    fn as_user(&self, request: TestRequest, identity: &Identity) -> TestRequest {
        let token = self.tokens.issue(identity).unwrap();
        request.add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    async fn create_product(&self, seller: &Identity, title: &str, price: i64, stock: i64) -> String {
        let response = self
            .as_user(self.server.post("/seller/products"), seller)
            .json(&json!({ "title": title, "price": price, "stock": stock }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<ProductResponse>().id
    }

    async fn place_order(&self, items: serde_json::Value, total: i64) -> OrderResponse {
        let response = self
            .as_user(self.server.post("/orders/create"), &self.customer)
            .json(&json!({ "items": items, "totalAmount": total }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<OrderResponse>()
    }

    async fn set_seller_status(&self, seller: &Identity, order_id: &str, status: &str) -> OrderResponse {
        let response = self
            .as_user(self.server.put(&format!("/orders/{}/status", order_id)), seller)
            .json(&json!({ "status": status }))
            .await;
        response.assert_status_ok();
        response.json::<OrderResponse>()
    }
}

async fn seed_user(users: &InMemoryUserRepository, name: &str, role: Role) -> Identity {
    let user = User::new(
        UserId::new(),
        name.to_string(),
        format!("{}@example.com", name.to_lowercase()),
        role,
        None,
        ShippingAddress::new(
            format!("{} Avenue 3", name),
            "Shelbyville".to_string(),
            "555-0123".to_string(),
        ),
    )
    .unwrap();
    users.save(&user).await.unwrap();
    Identity::new(user.id(), role)
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_requests_without_valid_token_are_unauthorized() {
    let app = TestApp::new().await;

    let response = app.server.get("/orders/my-orders").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<ApiError>().code, "UNAUTHENTICATED");

    let forged = TokenService::new("another-secret", 3600)
        .issue(&app.customer)
        .unwrap();
    let response = app
        .server
        .get("/orders/my-orders")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", forged)).unwrap(),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<ApiError>().code, "INVALID_TOKEN");

    // 旧来の user-id ヘッダーは認証に使われない
    let response = app
        .server
        .get("/orders/my-orders")
        .add_header(
            header::HeaderName::from_static("user-id"),
            HeaderValue::from_str(&app.customer.subject().to_string()).unwrap(),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_order_creation_updates_stock_and_returns_order() {
    let app = TestApp::new().await;
    let product_id = app.create_product(&app.seller_a, "Teapot", 1500, 10).await;

    let order = app
        .place_order(json!([{ "productId": product_id, "quantity": 3 }]), 4500)
        .await;

    assert_eq!(order.order_id, "ORD1000");
    assert_eq!(order.status, "pending");
    assert_eq!(order.customer_id, app.customer.subject().to_string());
    assert_eq!(order.customer_name, "Cal");
    assert_eq!(order.payment_method, "Cash on Delivery");
    assert_eq!(order.shipping_address.address, "Cal Avenue 3");
    assert_eq!(order.items[0].title, "Teapot");
    assert_eq!(order.items[0].seller_id, app.seller_a.subject().to_string());
    assert_eq!(order.seller_statuses.len(), 1);
    assert_eq!(order.seller_statuses[0].status, "pending");

    let product = app
        .server
        .get(&format!("/products/{}", product_id))
        .await
        .json::<ProductResponse>();
    assert_eq!(product.stock, 7);
    assert_eq!(product.sold_count, 3);
}

#[tokio::test]
async fn test_order_creation_errors() {
    let app = TestApp::new().await;
    let product_id = app.create_product(&app.seller_a, "Spoon", 200, 10).await;

    let empty = app
        .as_user(app.server.post("/orders/create"), &app.customer)
        .json(&json!({ "items": [], "totalAmount": 0 }))
        .await;
    empty.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(empty.json::<ApiError>().code, "ORDER_VALIDATION");

    let unknown_product = app
        .as_user(app.server.post("/orders/create"), &app.customer)
        .json(&json!({
            "items": [{ "productId": Uuid::new_v4().to_string(), "quantity": 1 }],
            "totalAmount": 200
        }))
        .await;
    unknown_product.assert_status(StatusCode::NOT_FOUND);

    let other_customer = app
        .as_user(app.server.post("/orders/create"), &app.customer)
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": 1 }],
            "totalAmount": 200,
            "customerId": app.admin.subject().to_string()
        }))
        .await;
    other_customer.assert_status(StatusCode::FORBIDDEN);

    let malformed = app
        .as_user(app.server.post("/orders/create"), &app.customer)
        .json(&json!({ "items": "nope" }))
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(malformed.json::<ApiError>().code, "INVALID_BODY");

    let overflowing = app
        .as_user(app.server.post("/orders/create"), &app.customer)
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": 2, "price": i64::MAX }],
            "totalAmount": 0
        }))
        .await;
    overflowing.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(overflowing.json::<ApiError>().code, "AMOUNT_OVERFLOW");

    let negative_price = app
        .as_user(app.server.post("/orders/create"), &app.customer)
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": 1, "price": -1 }],
            "totalAmount": 0
        }))
        .await;
    negative_price.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(negative_price.json::<ApiError>().code, "INVALID_VALUE");

    // 失敗した注文は在庫に影響しない
    let product = app
        .server
        .get(&format!("/products/{}", product_id))
        .await
        .json::<ProductResponse>();
    assert_eq!(product.stock, 10);
}

#[tokio::test]
async fn test_multi_seller_lifecycle_over_http() {
    let app = TestApp::new().await;
    let p1 = app.create_product(&app.seller_a, "Bread", 300, 20).await;
    let p2 = app.create_product(&app.seller_b, "Butter", 400, 20).await;

    let order = app
        .place_order(
            json!([
                { "productId": p1, "quantity": 1 },
                { "productId": p2, "quantity": 1 },
                { "productId": p1, "quantity": 2 }
            ]),
            1300,
        )
        .await;
    assert_eq!(order.seller_statuses.len(), 2);

    let updated = app.set_seller_status(&app.seller_a, &order.id, "accepted").await;
    assert_eq!(updated.status, "pending");

    let updated = app.set_seller_status(&app.seller_b, &order.id, "accepted").await;
    assert_eq!(updated.status, "processing");

    let updated = app.set_seller_status(&app.seller_a, &order.id, "shipped").await;
    assert_eq!(updated.status, "processing");

    let updated = app.set_seller_status(&app.seller_b, &order.id, "rejected").await;
    assert_eq!(updated.status, "rejected");

    let updated = app.set_seller_status(&app.seller_a, &order.id, "delivered").await;
    assert_eq!(updated.status, "rejected");

    let invalid = app
        .as_user(app.server.put(&format!("/orders/{}/status", order.id)), &app.seller_a)
        .json(&json!({ "status": "processing" }))
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json::<ApiError>().code, "INVALID_STATUS");
}

#[tokio::test]
async fn test_seller_update_access_control() {
    let app = TestApp::new().await;
    let product_id = app.create_product(&app.seller_a, "Candle", 900, 5).await;
    let order = app
        .place_order(json!([{ "productId": product_id, "quantity": 1 }]), 900)
        .await;

    let not_involved = app
        .as_user(app.server.put(&format!("/orders/{}/status", order.id)), &app.seller_b)
        .json(&json!({ "status": "accepted" }))
        .await;
    not_involved.assert_status(StatusCode::FORBIDDEN);

    let customer = app
        .as_user(app.server.put(&format!("/orders/{}/status", order.id)), &app.customer)
        .json(&json!({ "status": "accepted" }))
        .await;
    customer.assert_status(StatusCode::FORBIDDEN);

    let missing = app
        .as_user(
            app.server.put(&format!("/orders/{}/status", OrderId::new())),
            &app.seller_a,
        )
        .json(&json!({ "status": "accepted" }))
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);

    let bad_id = app
        .as_user(app.server.put("/orders/not-a-uuid/status"), &app.seller_a)
        .json(&json!({ "status": "accepted" }))
        .await;
    bad_id.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_read_projections() {
    let app = TestApp::new().await;
    let p1 = app.create_product(&app.seller_a, "Soap", 250, 50).await;
    let p2 = app.create_product(&app.seller_b, "Towel", 1200, 50).await;

    let first = app
        .place_order(json!([{ "productId": p1, "quantity": 1 }]), 250)
        .await;
    let second = app
        .place_order(
            json!([{ "productId": p1, "quantity": 1 }, { "productId": p2, "quantity": 1 }]),
            1450,
        )
        .await;
    app.set_seller_status(&app.seller_b, &second.id, "accepted").await;

    let mine = app
        .as_user(app.server.get("/orders/my-orders"), &app.customer)
        .await
        .json::<Vec<OrderResponse>>();
    assert_eq!(mine.len(), 2);

    let seller_b_view = app
        .as_user(app.server.get("/orders/seller/orders"), &app.seller_b)
        .await
        .json::<Vec<SellerOrderResponse>>();
    assert_eq!(seller_b_view.len(), 1);
    assert_eq!(seller_b_view[0].order.id, second.id);
    assert_eq!(seller_b_view[0].my_status.as_deref(), Some("accepted"));

    let seller_a_view = app
        .as_user(app.server.get("/orders/seller/orders"), &app.seller_a)
        .await
        .json::<Vec<SellerOrderResponse>>();
    assert_eq!(seller_a_view.len(), 2);

    let denied = app
        .as_user(app.server.get("/orders/all"), &app.customer)
        .await;
    denied.assert_status(StatusCode::FORBIDDEN);

    let all = app
        .as_user(app.server.get("/orders/all"), &app.admin)
        .await
        .json::<Vec<OrderResponse>>();
    assert_eq!(all.len(), 2);

    let pending = app
        .as_user(app.server.get("/admin/orders?status=pending"), &app.admin)
        .await
        .json::<Vec<OrderResponse>>();
    assert_eq!(pending.len(), 2);

    let invalid_filter = app
        .as_user(app.server.get("/admin/orders?status=unknown"), &app.admin)
        .await;
    invalid_filter.assert_status(StatusCode::BAD_REQUEST);

    // 単一注文の参照は関係者のみ
    app.as_user(app.server.get(&format!("/orders/{}", first.id)), &app.customer)
        .await
        .assert_status_ok();
    app.as_user(app.server.get(&format!("/orders/{}", first.id)), &app.seller_a)
        .await
        .assert_status_ok();
    app.as_user(app.server.get(&format!("/orders/{}", first.id)), &app.seller_b)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.as_user(app.server.get(&format!("/orders/{}", OrderId::new())), &app.admin)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_override_and_dashboard() {
    let app = TestApp::new().await;
    let product_id = app.create_product(&app.seller_a, "Clock", 5000, 3).await;
    let order = app
        .place_order(json!([{ "productId": product_id, "quantity": 1 }]), 5000)
        .await;

    let denied = app
        .as_user(app.server.put(&format!("/admin/orders/{}", order.id)), &app.seller_a)
        .json(&json!({ "status": "cancelled" }))
        .await;
    denied.assert_status(StatusCode::FORBIDDEN);

    let cancelled = app
        .as_user(app.server.put(&format!("/admin/orders/{}", order.id)), &app.admin)
        .json(&json!({ "status": "cancelled" }))
        .await;
    cancelled.assert_status_ok();
    assert_eq!(cancelled.json::<OrderResponse>().status, "cancelled");

    let after_seller = app.set_seller_status(&app.seller_a, &order.id, "delivered").await;
    assert_eq!(after_seller.status, "delivered");

    let stats = app
        .as_user(app.server.get("/admin/dashboard/stats"), &app.admin)
        .await
        .json::<DashboardStatsResponse>();
    assert_eq!(stats.total_users, 4);
    assert_eq!(stats.total_sellers, 2);
    assert_eq!(stats.total_customers, 1);
    assert_eq!(stats.total_products, 1);
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_revenue, 5000);
    assert_eq!(stats.pending_sellers, 2);

    app.as_user(app.server.get("/admin/dashboard/stats"), &app.customer)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_registers_users() {
    let app = TestApp::new().await;

    let created = app
        .as_user(app.server.post("/admin/users"), &app.admin)
        .json(&json!({
            "name": "Nia",
            "email": "nia@example.com",
            "role": "seller",
            "storeName": "Nia's Crafts",
            "address": "5 Pine Rd",
            "city": "North Haverbrook",
            "phone": "555-0177"
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let user = created.json::<UserResponse>();
    assert_eq!(user.role, "seller");
    assert_eq!(user.status, "pending");
    assert_eq!(user.store_name.as_deref(), Some("Nia's Crafts"));

    let invalid_role = app
        .as_user(app.server.post("/admin/users"), &app.admin)
        .json(&json!({ "name": "Oz", "email": "oz@example.com", "role": "owner" }))
        .await;
    invalid_role.assert_status(StatusCode::BAD_REQUEST);

    let denied = app
        .as_user(app.server.post("/admin/users"), &app.customer)
        .json(&json!({ "name": "Pip", "email": "pip@example.com", "role": "customer" }))
        .await;
    denied.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_seller_stats_and_customers() {
    let app = TestApp::new().await;
    let lamp = app.create_product(&app.seller_a, "Lamp", 1000, 12).await;
    let shade = app.create_product(&app.seller_a, "Shade", 500, 40).await;
    let rug = app.create_product(&app.seller_b, "Rug", 3000, 5).await;

    let first = app
        .place_order(
            json!([
                { "productId": lamp, "quantity": 3 },
                { "productId": rug, "quantity": 1 }
            ]),
            6000,
        )
        .await;
    app.place_order(json!([{ "productId": shade, "quantity": 2 }]), 1000)
        .await;
    app.place_order(json!([{ "productId": rug, "quantity": 1 }]), 3000)
        .await;
    app.set_seller_status(&app.seller_a, &first.id, "accepted").await;

    let stats = app
        .as_user(app.server.get("/seller/stats"), &app.seller_a)
        .await;
    stats.assert_status_ok();
    let stats = stats.json::<SellerStatsResponse>();
    assert_eq!(stats.total_products, 2);
    assert_eq!(stats.total_sales, 5);
    assert_eq!(stats.low_stock_items, 1); // Lamp の在庫は 9
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.total_revenue, 7000);
    assert_eq!(stats.pending_orders, 2); // 出品者Bが未対応なので全体は pending のまま

    let customers = app
        .as_user(app.server.get("/seller/customers"), &app.seller_a)
        .await;
    customers.assert_status_ok();
    let customers = customers.json::<Vec<SellerCustomerResponse>>();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].id, app.customer.subject().to_string());
    assert_eq!(customers[0].name, "Cal");
    assert_eq!(customers[0].orders, 2);
    assert_eq!(customers[0].total_spent, 7000);

    app.as_user(app.server.get("/seller/stats"), &app.customer)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .get("/seller/customers")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_approves_seller() {
    let app = TestApp::new().await;
    let path = format!("/admin/approve-seller/{}", app.seller_a.subject());

    app.as_user(app.server.put(&path), &app.seller_a)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let approved = app.as_user(app.server.put(&path), &app.admin).await;
    approved.assert_status_ok();
    let user = approved.json::<UserResponse>();
    assert_eq!(user.status, "active");
    assert_eq!(user.role, "seller");

    let stats = app
        .as_user(app.server.get("/admin/dashboard/stats"), &app.admin)
        .await
        .json::<DashboardStatsResponse>();
    assert_eq!(stats.pending_sellers, 1);

    let not_a_seller = app
        .as_user(
            app.server
                .put(&format!("/admin/approve-seller/{}", app.customer.subject())),
            &app.admin,
        )
        .await;
    not_a_seller.assert_status(StatusCode::BAD_REQUEST);

    app.as_user(
        app.server
            .put(&format!("/admin/approve-seller/{}", UserId::new())),
        &app.admin,
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);

    let malformed = app
        .as_user(app.server.put("/admin/approve-seller/not-a-uuid"), &app.admin)
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(malformed.json::<ApiError>().code, "INVALID_UUID");
}
