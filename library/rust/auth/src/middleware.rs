//! axum 用の認証ミドルウェア。

use crate::verifier::{AuthError, BearerVerifier};
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// AuthState はミドルウェアが使用する共有状態。
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<BearerVerifier>,
}

/// auth_middleware は Bearer トークン認証ミドルウェア。
/// Authorization ヘッダーから Bearer トークンを取得し、JWKS 検証を行う。
/// 検証成功時は Claims をリクエストエクステンションに格納する。
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthErrorResponse> {
    let token = extract_bearer_token(&req).map_err(AuthErrorResponse::from_auth_error)?;

    let claims = state
        .verifier
        .verify_token(&token)
        .await
        .map_err(AuthErrorResponse::from_auth_error)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Bearer トークンを Authorization ヘッダーから取得する。
pub fn extract_bearer_token(req: &Request<Body>) -> Result<String, AuthError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let parts: Vec<&str> = auth_header.splitn(2, ' ').collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts[1].trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.to_string())
}

/// AuthErrorResponse は認証エラーの HTTP レスポンス。
///
/// 失敗理由ごとに異なるコードを返し、すべて 401 とする。
#[derive(Debug)]
pub struct AuthErrorResponse {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl AuthErrorResponse {
    pub fn from_auth_error(err: AuthError) -> Self {
        let (code, message) = match err {
            AuthError::MissingToken => ("AUTH_MISSING_TOKEN", "not authenticated".to_string()),
            AuthError::InvalidAuthHeader => (
                "AUTH_INVALID_HEADER",
                "invalid authentication credentials".to_string(),
            ),
            AuthError::MalformedToken(_) => {
                ("AUTH_MALFORMED_TOKEN", "malformed authorization token".to_string())
            }
            AuthError::UnrecognizedSigner(_) | AuthError::KeyNotFound(_) => (
                "AUTH_UNRECOGNIZED_SIGNER",
                "authorization token does not belong to this application".to_string(),
            ),
            AuthError::ExpiredToken => {
                ("AUTH_TOKEN_EXPIRED", "authorization token expired".to_string())
            }
            AuthError::InvalidAudience => ("AUTH_INVALID_AUDIENCE", "invalid audience".to_string()),
            AuthError::TokenVerificationFailed(reason) => ("AUTH_VERIFICATION_FAILED", reason),
            AuthError::UpstreamUnavailable(_) | AuthError::MalformedKeySet(_) => (
                "AUTH_KEYSET_UNAVAILABLE",
                "unable to verify authorization token".to_string(),
            ),
        };

        Self {
            status: StatusCode::UNAUTHORIZED,
            code,
            message,
        }
    }
}

impl IntoResponse for AuthErrorResponse {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code,
            "message": self.message,
        });

        (self.status, Json(body)).into_response()
    }
}
