//! Bearer トークン検証器: JWKS キャッシュの鍵で署名・オーディエンス・有効期限を検証する。

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use tracing::{debug, info, warn};

use crate::claims::Claims;
use crate::jwks::JwksCache;

/// AuthError は認証処理で発生するエラーを表す。
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("authorization token does not belong to this application (kid: {0})")]
    UnrecognizedSigner(String),

    #[error("authorization token expired")]
    ExpiredToken,

    #[error("invalid audience")]
    InvalidAudience,

    #[error("token verification failed: {0}")]
    TokenVerificationFailed(String),

    #[error("key set endpoint unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed key set: {0}")]
    MalformedKeySet(String),

    #[error("signing key not found: {0}")]
    KeyNotFound(String),

    #[error("missing Authorization header")]
    MissingToken,

    #[error("invalid Authorization header format")]
    InvalidAuthHeader,
}

/// BearerVerifier はアプリケーショントークンを検証するリクエストゲート。
pub struct BearerVerifier {
    keys: Arc<JwksCache>,
    audience: String,
    issuer: Option<String>,
    leeway_secs: u64,
}

impl BearerVerifier {
    /// 期待するオーディエンス（クライアント ID）を指定して検証器を生成する。
    pub fn new(keys: Arc<JwksCache>, audience: &str) -> Self {
        Self {
            keys,
            audience: audience.to_string(),
            issuer: None,
            leeway_secs: 0,
        }
    }

    /// 発行者の検証を有効にする。
    #[must_use]
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer = Some(issuer.to_string());
        self
    }

    /// 有効期限判定の猶予秒数を設定する。
    #[must_use]
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// JWT トークン文字列を検証し、Claims を返す。
    ///
    /// 1. 未検証ヘッダーから kid / alg を取り出す
    /// 2. JWKS キャッシュから kid の鍵を引く（見つからなければ `UnrecognizedSigner`）
    /// 3. 有効期限・署名・オーディエンスを検証する
    pub async fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            warn!(error = %e, "トークンヘッダーの解析に失敗しました");
            AuthError::MalformedToken(e.to_string())
        })?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::MalformedToken("missing kid in header".into()))?;
        debug!(kid = %kid, alg = ?header.alg, "トークンヘッダーを解析しました");

        let signing_key = match self.keys.get_key(&kid).await {
            Ok(key) => key,
            Err(AuthError::KeyNotFound(_)) => {
                warn!(kid = %kid, "トークンはこのアプリケーションの鍵で署名されていません");
                return Err(AuthError::UnrecognizedSigner(kid));
            }
            Err(e) => return Err(e),
        };

        if let Some(ref declared) = signing_key.alg {
            let declared_alg = declared.parse::<Algorithm>().map_err(|_| {
                AuthError::TokenVerificationFailed(format!("unsupported key algorithm: {declared}"))
            })?;
            if declared_alg != header.alg {
                warn!(kid = %kid, declared = %declared, header_alg = ?header.alg, "アルゴリズムが鍵と一致しません");
                return Err(AuthError::TokenVerificationFailed(
                    "token algorithm does not match signing key".into(),
                ));
            }
        }

        self.reject_expired(token, header.alg)?;

        let decoding_key = signing_key.decoding_key()?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway_secs;
        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            let err = classify(&e);
            warn!(error = %e, "トークンの検証に失敗しました");
            err
        })?;

        info!(claims = %data.claims, "トークンを検証しました");
        Ok(data.claims)
    }

    /// 署名の正否に関係なく、有効期限切れのトークンを `ExpiredToken` として拒否する。
    fn reject_expired(&self, token: &str, alg: Algorithm) -> Result<(), AuthError> {
        let mut validation = Validation::new(alg);
        validation.insecure_disable_signature_validation();
        validation.validate_aud = false;
        validation.leeway = self.leeway_secs;

        match decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation) {
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                warn!("トークンの有効期限が切れています");
                Err(AuthError::ExpiredToken)
            }
            // 期限以外の不備は署名検証で判定する
            _ => Ok(()),
        }
    }
}

fn classify(err: &jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        _ => AuthError::TokenVerificationFailed(err.to_string()),
    }
}
