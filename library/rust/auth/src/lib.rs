//! msgpush-auth: サーバー用 JWKS キャッシュ + Bearer トークン検証ライブラリ
//!
//! JWKS ディスカバリーエンドポイントから公開鍵を取得してキャッシュし、
//! 受信した Bearer トークンの署名・オーディエンス・有効期限を検証する。
//! 検証はアプリケーション単位の二値判定であり、ロールによる認可は行わない。
//!
//! # 使い方
//!
//! ```ignore
//! use msgpush_auth::{BearerVerifier, HttpJwksFetcher, JwksCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let fetcher = Arc::new(HttpJwksFetcher::new(reqwest::Client::new()));
//! let cache = Arc::new(JwksCache::new(
//!     "https://login.example.com/common/discovery/v2.0/keys",
//!     "41ebb163-adc1-4068-9087-eb79c718b633",
//!     Duration::from_secs(3600),
//!     fetcher,
//! ));
//! let verifier = BearerVerifier::new(cache, "09e38b75-8747-450f-a40e-9612ead4228c");
//!
//! let claims = verifier.verify_token("eyJ...").await?;
//! ```

pub mod claims;
pub mod jwks;
pub mod middleware;
pub mod verifier;

pub use claims::Claims;
pub use jwks::{HttpJwksFetcher, JwksCache, JwksFetcher, SigningKey, DEFAULT_REFRESH_INTERVAL};
pub use middleware::{auth_middleware, AuthErrorResponse, AuthState};
pub use verifier::{AuthError, BearerVerifier};
