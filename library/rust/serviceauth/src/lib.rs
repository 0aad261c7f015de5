//! msgpush-serviceauth: 下流サービス呼び出し用のアクセストークン管理ライブラリ。
//!
//! OAuth2 Client Credentials フローでアクセストークンを取得し、プロセス内にキャッシュする。
//! `get_token` はまずネットワークを使わないサイレント取得を試み、
//! キャッシュが空または期限切れの場合のみ認可サーバーへ問い合わせる。
//!
//! # 使い方
//!
//! ```ignore
//! use msgpush_serviceauth::{AccessTokenProvider, ClientCredentialProvider, ServiceAuthConfig};
//! use secrecy::SecretString;
//!
//! let config = ServiceAuthConfig::new(
//!     "https://login.example.com/tenant-id",
//!     "my-service",
//!     SecretString::new("my-secret".to_string()),
//! )
//! .with_scopes(vec!["api://token-center/.default".to_string()]);
//!
//! let provider = ClientCredentialProvider::from_config(config)?;
//! let token = provider.get_token().await?;
//! let header = token.authorization_header();
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod token;

pub use client::{AccessTokenProvider, ClientCredentialProvider, HttpTokenAuthority, TokenAuthority};
pub use config::ServiceAuthConfig;
pub use error::ServiceAuthError;
pub use token::ClientCredentialToken;
