use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::driver::auth::{require_identity, TokenService};
use crate::adapter::driver::request_dto::{
    AdminUpdateOrderRequest, CreateOrderRequest, CreateProductRequest, CreateUserRequest,
    OrdersQueryParams, UpdateSellerStatusRequest,
};
use crate::adapter::driver::response_dto::{
    DashboardStatsResponse, OrderResponse, ProductResponse, SellerCustomerResponse,
    SellerOrderResponse, SellerStatsResponse, UserResponse,
};
use crate::application::service::{
    CatalogApplicationService, DashboardQueryService, OrderApplicationService, OrderQueryService,
    SellerQueryService,
};
use crate::application::{ApplicationError, Identity};
use crate::domain::error::DomainError;
use crate::domain::model::{FulfillmentStatus, Money, OrderId, OrderStatus, ProductId, Role, UserId};
use crate::domain::port::{OrderRepository, ProductRepository, UserRepository};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub order_service: Arc<OrderApplicationService>,
    pub order_query_service: Arc<OrderQueryService>,
    pub dashboard_query_service: Arc<DashboardQueryService>,
    pub seller_query_service: Arc<SellerQueryService>,
    pub catalog_service: Arc<CatalogApplicationService>,
    pub tokens: TokenService,
}

impl AppState {
    /// リポジトリから各サービスを組み立てる
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        product_repository: Arc<dyn ProductRepository>,
        user_repository: Arc<dyn UserRepository>,
        tokens: TokenService,
        max_update_attempts: u32,
    ) -> Self {
        Self {
            order_service: Arc::new(OrderApplicationService::new(
                order_repository.clone(),
                product_repository.clone(),
                user_repository.clone(),
                max_update_attempts,
            )),
            order_query_service: Arc::new(OrderQueryService::new(order_repository.clone())),
            dashboard_query_service: Arc::new(DashboardQueryService::new(
                order_repository.clone(),
                product_repository.clone(),
                user_repository.clone(),
            )),
            seller_query_service: Arc::new(SellerQueryService::new(
                order_repository,
                product_repository.clone(),
            )),
            catalog_service: Arc::new(CatalogApplicationService::new(
                product_repository,
                user_repository,
            )),
            tokens,
        }
    }
}

// REST APIルーターを作成
// /health と商品参照以外は認証ミドルウェアを通す
pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/orders/create", post(create_order))
        .route("/orders/my-orders", get(get_my_orders))
        .route("/orders/seller/orders", get(get_seller_orders))
        .route("/orders/all", get(get_all_orders))
        .route("/orders/:order_id", get(get_order_by_id))
        .route("/orders/:order_id/status", put(update_seller_status))
        .route("/admin/orders", get(get_all_orders))
        .route("/admin/orders/:order_id", put(admin_update_order))
        .route("/admin/dashboard/stats", get(get_dashboard_stats))
        .route("/admin/users", post(create_user))
        .route("/admin/approve-seller/:user_id", put(approve_seller))
        .route("/seller/products", post(create_product))
        .route("/seller/stats", get(get_seller_stats))
        .route("/seller/customers", get(get_seller_customers))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_identity,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/products/:product_id", get(get_product))
        .merge(authenticated)
        .with_state(state)
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "marketplace-order-management",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// 注文作成エンドポイント
async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let Json(request) = payload.map_err(invalid_body)?;

    let order = state
        .order_service
        .place_order(&identity, request.into_command())
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from_order(&order))))
}

// 顧客自身の注文一覧
async fn get_my_orders(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let orders = state
        .order_query_service
        .get_my_orders(&identity)
        .await
        .map_err(map_application_error)?;

    Ok(Json(orders.iter().map(OrderResponse::from_order).collect()))
}

// 出品者の商品を含む注文一覧
async fn get_seller_orders(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<SellerOrderResponse>>> {
    let views = state
        .order_query_service
        .get_seller_orders(&identity)
        .await
        .map_err(map_application_error)?;

    Ok(Json(views.iter().map(SellerOrderResponse::from_view).collect()))
}

// 全注文一覧（管理者）
async fn get_all_orders(
    State(state): State<AppState>,
    identity: Identity,
    query: Result<Query<OrdersQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let Query(params) = query.map_err(|_| {
        bad_request("無効なクエリパラメータです".to_string(), "INVALID_PARAMETER")
    })?;
    let status = params
        .status
        .map(|status| parse_order_status(&status))
        .transpose()?;

    let orders = state
        .order_query_service
        .get_all_orders(&identity, status)
        .await
        .map_err(map_application_error)?;

    Ok(Json(orders.iter().map(OrderResponse::from_order).collect()))
}

// 注文詳細取得エンドポイント
async fn get_order_by_id(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_id): Path<String>,
) -> ApiResult<Json<OrderResponse>> {
    let order_id = parse_order_id(&order_id)?;

    let order = state
        .order_query_service
        .get_order_by_id(&identity, order_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(OrderResponse::from_order(&order)))
}

// 出品者サブステータス更新エンドポイント
async fn update_seller_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_id): Path<String>,
    payload: Result<Json<UpdateSellerStatusRequest>, JsonRejection>,
) -> ApiResult<Json<OrderResponse>> {
    let order_id = parse_order_id(&order_id)?;
    let Json(request) = payload.map_err(invalid_body)?;
    let status = FulfillmentStatus::from_string(&request.status).map_err(|_| {
        bad_request(
            format!("無効なステータス値: {}", request.status),
            "INVALID_STATUS",
        )
    })?;

    let order = state
        .order_service
        .update_seller_status(&identity, order_id, status)
        .await
        .map_err(map_application_error)?;

    Ok(Json(OrderResponse::from_order(&order)))
}

// 管理者による注文ステータス上書きエンドポイント
async fn admin_update_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_id): Path<String>,
    payload: Result<Json<AdminUpdateOrderRequest>, JsonRejection>,
) -> ApiResult<Json<OrderResponse>> {
    let order_id = parse_order_id(&order_id)?;
    let Json(request) = payload.map_err(invalid_body)?;
    let status = parse_order_status(&request.status)?;

    let order = state
        .order_service
        .override_status(&identity, order_id, status)
        .await
        .map_err(map_application_error)?;

    Ok(Json(OrderResponse::from_order(&order)))
}

async fn get_dashboard_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<DashboardStatsResponse>> {
    let stats = state
        .dashboard_query_service
        .get_stats(&identity)
        .await
        .map_err(map_application_error)?;

    Ok(Json(stats.into()))
}

// ユーザー登録エンドポイント（管理者）
async fn create_user(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(request) = payload.map_err(invalid_body)?;
    let role = Role::from_string(&request.role)
        .map_err(|_| bad_request(format!("無効なロール: {}", request.role), "INVALID_ROLE"))?;

    let user = state
        .catalog_service
        .register_user(
            &identity,
            request.name,
            request.email,
            role,
            request.store_name,
            request.address.into_domain(),
        )
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

// 出品者承認エンドポイント（管理者）
async fn approve_seller(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user_id = UserId::from_string(&user_id)
        .map_err(|_| bad_request("無効なユーザーID形式です".to_string(), "INVALID_UUID"))?;

    let user = state
        .catalog_service
        .approve_seller(&identity, user_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(UserResponse::from_user(&user)))
}

async fn get_seller_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<SellerStatsResponse>> {
    let stats = state
        .seller_query_service
        .get_stats(&identity)
        .await
        .map_err(map_application_error)?;

    Ok(Json(stats.into()))
}

// 出品者の顧客一覧
async fn get_seller_customers(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<SellerCustomerResponse>>> {
    let customers = state
        .seller_query_service
        .get_customers(&identity)
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        customers
            .iter()
            .map(SellerCustomerResponse::from_customer)
            .collect(),
    ))
}

// 商品登録エンドポイント（出品者）
async fn create_product(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let Json(request) = payload.map_err(invalid_body)?;

    let product = state
        .catalog_service
        .register_product(
            &identity,
            request.title,
            Money::new(request.price),
            request.stock,
        )
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from_product(&product))))
}

// 商品参照エンドポイント
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<ProductResponse>> {
    let product_id = ProductId::from_string(&product_id)
        .map_err(|_| bad_request("無効な商品ID形式です".to_string(), "INVALID_UUID"))?;

    let product = state
        .catalog_service
        .get_product(product_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(ProductResponse::from_product(&product)))
}

fn bad_request(error: String, code: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

fn invalid_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    bad_request(
        format!("無効なリクエストボディです: {}", rejection.body_text()),
        "INVALID_BODY",
    )
}

fn parse_order_id(raw: &str) -> ApiResult<OrderId> {
    OrderId::from_string(raw)
        .map_err(|_| bad_request("無効な注文ID形式です".to_string(), "INVALID_UUID"))
}

fn parse_order_status(raw: &str) -> ApiResult<OrderStatus> {
    OrderStatus::from_string(raw)
        .map_err(|_| bad_request(format!("無効なステータス値: {}", raw), "INVALID_STATUS"))
}

// アプリケーションエラーをHTTPエラーにマッピング
// 永続化層の詳細はログにのみ出力し、レスポンスには含めない
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    let (status, error, code) = match err {
        ApplicationError::DomainError(domain_err) => return map_domain_error(domain_err),
        ApplicationError::RepositoryError(repo_err) => {
            tracing::error!(error = %repo_err, "リクエストの処理中にリポジトリエラーが発生しました");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "内部エラーが発生しました".to_string(),
                "INTERNAL_ERROR",
            )
        }
        ApplicationError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
        ApplicationError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN"),
        ApplicationError::Conflict(msg) => {
            tracing::warn!(reason = %msg, "注文の更新競合が解消しませんでした");
            (StatusCode::CONFLICT, msg, "CONFLICT")
        }
    };

    (
        status,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    match domain_err {
        DomainError::InvalidQuantity => {
            bad_request("無効な数量です".to_string(), "INVALID_QUANTITY")
        }
        DomainError::OrderValidation(msg) => bad_request(msg, "ORDER_VALIDATION"),
        DomainError::InvalidValue(msg) => bad_request(msg, "INVALID_VALUE"),
        DomainError::AmountOverflow => {
            bad_request("金額が大きすぎます".to_string(), "AMOUNT_OVERFLOW")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::{
        InMemoryOrderRepository, InMemoryProductRepository, InMemoryUserRepository,
    };
    use crate::domain::port::RepositoryError;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(InMemoryProductRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            TokenService::new("test-secret", 60),
            3,
        )
    }

    #[test]
    fn test_map_application_error_not_found() {
        let app_error = ApplicationError::NotFound("リソースが見つかりません".to_string());
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, "NOT_FOUND");
        assert_eq!(api_error.error, "リソースが見つかりません");
    }

    #[test]
    fn test_map_application_error_status_codes() {
        let cases = [
            (
                ApplicationError::Forbidden("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                ApplicationError::Conflict("busy".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                ApplicationError::DomainError(DomainError::InvalidQuantity),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApplicationError::DomainError(DomainError::OrderValidation("empty".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApplicationError::DomainError(DomainError::AmountOverflow),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            let (status, _) = map_application_error(err);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_repository_error_detail_is_not_leaked() {
        let err = ApplicationError::RepositoryError(RepositoryError::OperationFailed(
            "Duplicate entry 'x' for key 'PRIMARY'".to_string(),
        ));
        let (status, Json(api_error)) = map_application_error(err);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, "INTERNAL_ERROR");
        assert!(!api_error.error.contains("Duplicate"));
    }

    #[tokio::test]
    async fn test_health_check_is_public() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_order_routes_require_token() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/orders/my-orders")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
