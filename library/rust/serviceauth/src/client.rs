//! クライアントクレデンシャルトークンの取得とキャッシュ。

use crate::config::ServiceAuthConfig;
use crate::error::ServiceAuthError;
use crate::token::ClientCredentialToken;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// TokenAuthority は認可サーバーへのネットワーク問い合わせを抽象化するトレイト。
#[async_trait]
pub trait TokenAuthority: Send + Sync {
    /// 指定スコープのトークンを Client Credentials グラントで新規取得する。
    async fn acquire_for_client(
        &self,
        scopes: &[String],
    ) -> Result<ClientCredentialToken, ServiceAuthError>;
}

/// AccessTokenProvider は下流呼び出し用トークンを返すトレイト。
///
/// `ClientCredentialProvider` がデフォルト実装。
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// 有効なトークンを返す。キャッシュが有効ならネットワークを使わない。
    async fn get_token(&self) -> Result<ClientCredentialToken, ServiceAuthError>;
}

/// トークンエンドポイントのレスポンス。
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_type: String,
    expires_in: u64,
    #[serde(default)]
    ext_expires_in: Option<u64>,
    access_token: String,
}

/// HttpTokenAuthority は reqwest を使った TokenAuthority の HTTP 実装。
pub struct HttpTokenAuthority {
    config: ServiceAuthConfig,
    http_client: reqwest::Client,
}

impl HttpTokenAuthority {
    /// `config.timeout_secs` のタイムアウトを持つ HTTP クライアントで生成する。
    pub fn new(config: ServiceAuthConfig) -> Result<Self, ServiceAuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceAuthError::Configuration(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl TokenAuthority for HttpTokenAuthority {
    async fn acquire_for_client(
        &self,
        scopes: &[String],
    ) -> Result<ClientCredentialToken, ServiceAuthError> {
        let token_endpoint = self.config.resolved_token_endpoint();
        debug!(
            client_id = %self.config.client_id,
            token_endpoint = %token_endpoint,
            "Client Credentials フローでトークンを取得します"
        );

        let scope = scopes.join(" ");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "トークンエンドポイントへの HTTP リクエストに失敗しました");
                ServiceAuthError::TokenAcquisitionFailed(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "トークン取得に失敗しました");
            return Err(ServiceAuthError::TokenAcquisitionFailed(format!(
                "HTTP {status} - {body}"
            )));
        }

        let token_resp: TokenResponse = response.json().await.map_err(|e| {
            error!(error = %e, "トークンレスポンスの解析に失敗しました");
            ServiceAuthError::TokenAcquisitionFailed(e.to_string())
        })?;

        debug!(
            client_id = %self.config.client_id,
            expires_in = token_resp.expires_in,
            "トークンを取得しました"
        );

        Ok(ClientCredentialToken::new(
            token_resp.token_type,
            token_resp.access_token,
            token_resp.expires_in,
            token_resp.ext_expires_in,
        ))
    }
}

/// ClientCredentialProvider はトークンをプロセス内にキャッシュする AccessTokenProvider 実装。
///
/// キャッシュ参照は Read ロック、取得は Write ロック内のダブルチェックで行うため、
/// 同時に期限切れを検知しても認可サーバーへの問い合わせは 1 回にまとまる。
pub struct ClientCredentialProvider {
    authority: Arc<dyn TokenAuthority>,
    scopes: Vec<String>,
    refresh_before_secs: u64,
    token_cache: Arc<RwLock<Option<ClientCredentialToken>>>,
}

impl ClientCredentialProvider {
    pub fn new(
        authority: Arc<dyn TokenAuthority>,
        scopes: Vec<String>,
        refresh_before_secs: u64,
    ) -> Self {
        Self {
            authority,
            scopes,
            refresh_before_secs,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// 設定から HttpTokenAuthority を組み立てて生成する。
    pub fn from_config(config: ServiceAuthConfig) -> Result<Self, ServiceAuthError> {
        let scopes = config.scopes.clone();
        let refresh_before_secs = config.refresh_before_secs;
        let authority = Arc::new(HttpTokenAuthority::new(config)?);
        Ok(Self::new(authority, scopes, refresh_before_secs))
    }

    /// ネットワークを使わずにキャッシュ済みトークンを返す。
    ///
    /// キャッシュが空、またはリフレッシュ閾値に達している場合は None。
    pub async fn acquire_silent(&self) -> Option<ClientCredentialToken> {
        let cache = self.token_cache.read().await;
        cache
            .as_ref()
            .filter(|token| !token.should_refresh(self.refresh_before_secs))
            .cloned()
    }

    /// 認可サーバーから新しいトークンを取得し、キャッシュを置き換える。
    pub async fn acquire_for_client(&self) -> Result<ClientCredentialToken, ServiceAuthError> {
        let mut cache = self.token_cache.write().await;
        let token = self.authority.acquire_for_client(&self.scopes).await?;
        *cache = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl AccessTokenProvider for ClientCredentialProvider {
    async fn get_token(&self) -> Result<ClientCredentialToken, ServiceAuthError> {
        if let Some(token) = self.acquire_silent().await {
            debug!("キャッシュ済みトークンを返します");
            return Ok(token);
        }

        let mut cache = self.token_cache.write().await;

        // ダブルチェック: 別タスクがすでに取得を完了しているかもしれない
        if let Some(ref token) = *cache {
            if !token.should_refresh(self.refresh_before_secs) {
                debug!("ダブルチェック: キャッシュ済みトークンを返します");
                return Ok(token.clone());
            }
        }

        info!("No suitable token exists in cache. Let's get a new one from the authority.");
        let token = self.authority.acquire_for_client(&self.scopes).await?;
        *cache = Some(token.clone());

        Ok(token)
    }
}
