use marketplace_order_management::adapter::config::AuthConfig;
use marketplace_order_management::adapter::driven::{
    MySqlOrderRepository, MySqlProductRepository, MySqlUserRepository,
};
use marketplace_order_management::adapter::driver::auth::TokenService;
use marketplace_order_management::adapter::driver::rest_api::{create_router, AppState};
use marketplace_order_management::adapter::{AppConfig, DatabaseMigration};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // RUST_LOG が未設定なら info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("マーケットプレイス注文管理 REST API を起動します");

    let config = AppConfig::from_env()?;
    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.database,
        "データベース設定を読み込みました"
    );
    if config.auth.jwt_secret == AuthConfig::DEFAULT_SECRET {
        tracing::warn!("JWT_SECRET が既定値のままです。本番環境では必ず設定してください");
    }

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.connection_string())
        .await?;
    tracing::info!("データベース接続プールを作成しました");

    // マイグレーションを実行
    DatabaseMigration::new(pool.clone()).run().await?;

    // MySQLリポジトリを作成
    let order_repository = Arc::new(MySqlOrderRepository::new(pool.clone()));
    let product_repository = Arc::new(MySqlProductRepository::new(pool.clone()));
    let user_repository = Arc::new(MySqlUserRepository::new(pool));

    let app_state = AppState::new(
        order_repository,
        product_repository,
        user_repository,
        TokenService::from_config(&config.auth),
        config.max_update_attempts,
    );

    // REST APIルーターを作成
    let app = create_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // サーバーを起動
    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %bind_address, "REST APIサーバーが起動しました");

    axum::serve(listener, app).await?;

    Ok(())
}
