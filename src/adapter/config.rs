use std::env;
use std::str::FromStr;

use crate::application::service::DEFAULT_MAX_UPDATE_ATTEMPTS;

/// 設定エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// 環境変数を読み取り、未設定ならデフォルト値を使う
fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// 環境変数を数値として読み取る
fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var_or(name, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", name, e)))
}

/// データベース接続設定を管理する構造体
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var_or("DATABASE_HOST", "localhost"),
            port: parse_var("DATABASE_PORT", "3306")?,
            database: var_or("DATABASE_NAME", "marketplace_db"),
            username: var_or("DATABASE_USER", "marketplace_user"),
            password: var_or("DATABASE_PASSWORD", "marketplace_password"),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "10")?,
        })
    }

    /// MySQL接続文字列を生成
    pub fn connection_string(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// HTTPサーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var_or("SERVER_HOST", "0.0.0.0"),
            port: parse_var("SERVER_PORT", "3000")?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 認証トークンの設定
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: u64,
}

impl AuthConfig {
    pub const DEFAULT_SECRET: &'static str = "change-me-in-production";

    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = var_or("JWT_SECRET", Self::DEFAULT_SECRET);
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET must not be empty".to_string(),
            ));
        }
        Ok(Self {
            jwt_secret,
            token_ttl_seconds: parse_var("JWT_TTL_SECONDS", "86400")?,
        })
    }
}

/// アプリケーション全体の設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    /// 注文更新が競合した場合の最大試行回数
    pub max_update_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_update_attempts: u32 = parse_var(
            "ORDER_UPDATE_MAX_RETRIES",
            &DEFAULT_MAX_UPDATE_ATTEMPTS.to_string(),
        )?;
        if max_update_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "ORDER_UPDATE_MAX_RETRIES must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            max_update_attempts,
        })
    }
}
