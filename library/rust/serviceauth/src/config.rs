//! クライアントクレデンシャルフローの設定構造体。

use secrecy::SecretString;
use serde::Deserialize;

/// refresh_before_secs のデフォルト値（120 秒）。
fn default_refresh_before_secs() -> u64 {
    120
}

/// timeout_secs のデフォルト値（10 秒）。
fn default_timeout_secs() -> u64 {
    10
}

/// ServiceAuthConfig はトークンプロバイダーの設定を表す。
///
/// YAML から serde でデシリアライズ可能。クライアントシークレットは `SecretString` で保持し、
/// Debug 出力には現れない。
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAuthConfig {
    /// 認可サーバーのオーソリティ URL（テナントを含む）。
    /// 例: `https://login.partner.microsoftonline.cn/{tenant}`
    pub authority: String,

    /// OAuth2 クライアント ID。
    pub client_id: String,

    /// OAuth2 クライアントシークレット。
    pub client_secret: SecretString,

    /// 要求するスコープ一覧。
    #[serde(default)]
    pub scopes: Vec<String>,

    /// トークンエンドポイント URL。
    /// 省略した場合は `{authority}/oauth2/v2.0/token` を使う。
    #[serde(default)]
    pub token_endpoint: Option<String>,

    /// トークン有効期限の何秒前から期限切れとみなすか（デフォルト: 120 秒）。
    #[serde(default = "default_refresh_before_secs")]
    pub refresh_before_secs: u64,

    /// HTTP タイムアウト秒数（デフォルト: 10 秒）。
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServiceAuthConfig {
    /// 最小限の設定で ServiceAuthConfig を生成する。
    pub fn new(authority: &str, client_id: &str, client_secret: SecretString) -> Self {
        Self {
            authority: authority.to_string(),
            client_id: client_id.to_string(),
            client_secret,
            scopes: Vec::new(),
            token_endpoint: None,
            refresh_before_secs: default_refresh_before_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// スコープ一覧を設定する。
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// トークンエンドポイントを明示的に設定する。
    #[must_use]
    pub fn with_token_endpoint(mut self, token_endpoint: &str) -> Self {
        self.token_endpoint = Some(token_endpoint.to_string());
        self
    }

    /// 実際に使用するトークンエンドポイント URL を返す。
    pub fn resolved_token_endpoint(&self) -> String {
        match self.token_endpoint {
            Some(ref endpoint) => endpoint.clone(),
            None => format!(
                "{}/oauth2/v2.0/token",
                self.authority.trim_end_matches('/')
            ),
        }
    }
}
