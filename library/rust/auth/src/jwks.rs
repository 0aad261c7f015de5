//! JWKS キャッシュ: ディスカバリーエンドポイントから署名鍵を取得し、kid 単位で保持する。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::verifier::AuthError;

/// 鍵セットの既定の更新間隔（3600 秒）。
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// SigningKey は kid で識別される単一の公開鍵レコード。
#[derive(Debug, Clone, PartialEq)]
pub struct SigningKey {
    pub kid: String,
    /// JWK に宣言されたアルゴリズム（省略される場合がある）。
    pub alg: Option<String>,
    /// JWK の生 JSON。署名検証時に DecodingKey へ変換する。
    pub material: serde_json::Value,
}

impl SigningKey {
    /// JWK から署名検証用の DecodingKey を構築する。
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        let jwk: Jwk = serde_json::from_value(self.material.clone()).map_err(|e| {
            AuthError::TokenVerificationFailed(format!("unsupported key material: {e}"))
        })?;
        DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::TokenVerificationFailed(e.to_string()))
    }
}

/// JwksFetcher は鍵セット文書の取得を抽象化するトレイト。
///
/// 戻り値はレスポンスボディの生文字列で、解析は `JwksCache` が行う。
#[async_trait::async_trait]
pub trait JwksFetcher: Send + Sync {
    async fn fetch(&self, jwks_url: &str, appid: &str) -> Result<String, AuthError>;
}

/// HttpJwksFetcher は `GET {jwks_url}?appid={appid}` で鍵セットを取得するデフォルト実装。
pub struct HttpJwksFetcher {
    client: reqwest::Client,
}

impl HttpJwksFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl JwksFetcher for HttpJwksFetcher {
    async fn fetch(&self, jwks_url: &str, appid: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .get(jwks_url)
            .query(&[("appid", appid)])
            .send()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        info!(status_code = status.as_u16(), "JWKS エンドポイントからレスポンスを受信しました");

        if !status.is_success() {
            return Err(AuthError::UpstreamUnavailable(format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))
    }
}

/// 鍵セット文書。keys 配列の各要素は生 JSON のまま保持する。
#[derive(Debug, Deserialize)]
struct KeySetDocument {
    keys: Vec<serde_json::Value>,
}

/// 鍵セット文書を解析して SigningKey の一覧を返す。
///
/// kid を持たない鍵は参照できないため読み飛ばす。
pub(crate) fn parse_key_set(body: &str) -> Result<Vec<SigningKey>, AuthError> {
    let document: KeySetDocument =
        serde_json::from_str(body).map_err(|e| AuthError::MalformedKeySet(e.to_string()))?;

    let mut keys = Vec::with_capacity(document.keys.len());
    for raw in document.keys {
        let Some(kid) = raw.get("kid").and_then(serde_json::Value::as_str) else {
            warn!("kid を持たない鍵を読み飛ばします");
            continue;
        };
        let alg = raw
            .get("alg")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        keys.push(SigningKey {
            kid: kid.to_owned(),
            alg,
            material: raw,
        });
    }
    Ok(keys)
}

/// キャッシュの内部状態。
#[derive(Default)]
struct JwksCacheState {
    keys: HashMap<String, SigningKey>,
    last_refreshed: Option<Instant>,
}

impl JwksCacheState {
    // elapsed == 0 も新鮮とみなす。
    fn is_fresh(&self, refresh_interval: Duration) -> bool {
        self.last_refreshed
            .is_some_and(|at| at.elapsed() < refresh_interval)
    }
}

/// JwksCache は kid → SigningKey の対応をプロセス全体で共有するキャッシュ。
///
/// - 更新間隔内であればネットワークにアクセスしない
/// - 未知の kid の参照は 1 回だけ鍵セットを再取得し、それでも無ければ `KeyNotFound`
/// - 再取得は既存の kid を残したまま追加・上書きする
/// - 取得中も読み取りロックは保持されず、キャッシュ済みの kid の参照は待たされない
pub struct JwksCache {
    jwks_url: String,
    appid: String,
    refresh_interval: Duration,
    state: Arc<RwLock<JwksCacheState>>,
    // 再取得の直列化専用。state のロックとは独立している。
    refresh_lock: Mutex<()>,
    fetcher: Arc<dyn JwksFetcher>,
}

impl JwksCache {
    /// 新しい JwksCache を生成する。初回参照時に鍵セットを取得する。
    pub fn new(
        jwks_url: &str,
        appid: &str,
        refresh_interval: Duration,
        fetcher: Arc<dyn JwksFetcher>,
    ) -> Self {
        Self {
            jwks_url: jwks_url.to_string(),
            appid: appid.to_string(),
            refresh_interval,
            state: Arc::new(RwLock::new(JwksCacheState::default())),
            refresh_lock: Mutex::new(()),
            fetcher,
        }
    }

    /// kid に対応する署名鍵を返す。
    ///
    /// キャッシュが古い、または kid が見つからない場合は鍵セットを 1 回だけ再取得する。
    pub async fn get_key(&self, kid: &str) -> Result<SigningKey, AuthError> {
        let observed = {
            let state = self.state.read().await;
            if state.is_fresh(self.refresh_interval) {
                if let Some(key) = state.keys.get(kid) {
                    return Ok(key.clone());
                }
                debug!(kid = %kid, "kid がキャッシュにないため鍵セットを再取得します");
            } else {
                info!(
                    last_refreshed = ?state.last_refreshed,
                    "JWKS キャッシュが期限切れのため再取得します"
                );
            }
            state.last_refreshed
        };

        let _guard = self.refresh_lock.lock().await;

        // 待機中に別のリクエストが再取得を済ませていれば、その結果を使う
        let unchanged = self.state.read().await.last_refreshed == observed;
        if unchanged {
            self.fetch_and_merge().await?;
        }

        let state = self.state.read().await;
        state.keys.get(kid).cloned().ok_or_else(|| {
            warn!(kid = %kid, "鍵セットに kid が見つかりません");
            AuthError::KeyNotFound(kid.to_string())
        })
    }

    /// 鍵セットを取得し直してキャッシュに反映する。
    ///
    /// 鍵が 1 つも変化しなくても最終更新時刻は現在時刻に更新される。
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_merge().await
    }

    // 呼び出し側が refresh_lock を保持していること。
    async fn fetch_and_merge(&self) -> Result<(), AuthError> {
        let body = self.fetcher.fetch(&self.jwks_url, &self.appid).await?;
        let keys = parse_key_set(&body)?;

        info!(key_count = keys.len(), "JWKS を更新しました");

        let mut state = self.state.write().await;
        for key in keys {
            state.keys.insert(key.kid.clone(), key);
        }
        state.last_refreshed = Some(Instant::now());
        Ok(())
    }

    /// 最終更新から更新間隔が経過していなければ true を返す。
    pub async fn is_fresh(&self) -> bool {
        self.state.read().await.is_fresh(self.refresh_interval)
    }

    /// キャッシュ済みの kid 一覧をソートして返す。
    pub async fn key_ids(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut ids: Vec<String> = state.keys.keys().cloned().collect();
        ids.sort();
        ids
    }
}
