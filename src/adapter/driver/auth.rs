// 認証アダプター
// Bearerトークン（HS256のJWT）を検証し、検証済みの呼び出し元をリクエストに添付する

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::adapter::config::AuthConfig;
use crate::adapter::driver::rest_api::ApiError;
use crate::application::Identity;
use crate::domain::model::{Role, UserId};

/// 認証エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// Authorizationヘッダーがない、またはBearer形式でない
    #[error("Missing bearer token")]
    MissingToken,
    /// 署名・有効期限・クレームの検証に失敗
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    /// トークンの発行に失敗
    #[error("Token issue failed: {0}")]
    IssueFailed(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "認証トークンがありません".to_string(),
            ),
            AuthError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "認証トークンが無効です".to_string(),
            ),
            AuthError::IssueFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "内部エラーが発生しました".to_string(),
            ),
        };
        tracing::debug!(error = %self, "認証に失敗しました");
        (
            status,
            Json(ApiError {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

/// トークンのクレーム
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    exp: u64,
}

/// トークンの発行と検証
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: u64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_seconds)
    }

    /// 呼び出し元のトークンを発行する
    /// ログイン自体は別サービスの責務で、ここではテストと運用ツール向けに提供する
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        let exp = Utc::now().timestamp().max(0) as u64 + self.ttl_seconds;
        let claims = Claims {
            sub: identity.subject().to_string(),
            role: identity.role(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::IssueFailed(e.to_string()))
    }

    /// トークンを検証して呼び出し元を取り出す
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let subject = UserId::from_string(&data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(format!("subが不正です: {}", e)))?;
        Ok(Identity::new(subject, data.claims.role))
    }
}

/// Authorizationヘッダーからトークン部分を取り出す
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// 認証ミドルウェア
/// 検証済みの `Identity` をリクエストの拡張に挿入する。失敗した場合は401
pub async fn require_identity(
    State(tokens): State<TokenService>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();
    let token = bearer_token(&parts).ok_or(AuthError::MissingToken)?;
    let identity = tokens.verify(token)?;
    parts.extensions.insert(identity);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// ハンドラーで検証済みの呼び出し元を受け取るための抽出器
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}
