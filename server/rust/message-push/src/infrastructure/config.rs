use secrecy::SecretString;
use serde::Deserialize;

use msgpush_serviceauth::ServiceAuthConfig;

/// Application configuration for the message push server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub service_auth: ServiceAuthConfig,
    pub wechat: WechatConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub smtp: SmtpConfig,
    pub sms: SmsConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// AuthConfig は受信トークン検証の設定を表す。
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwks_url: String,
    /// JWKS 取得時に `appid` クエリとして送るアプリケーション ID。
    pub appid: String,
    /// 受け入れる aud（このアプリのクライアント ID）。
    pub audience: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub leeway_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_refresh_interval_secs() -> u64 {
    3600
}

fn default_timeout_secs() -> u64 {
    10
}

/// WechatConfig は公众号 API とトークンセンターの設定を表す。
#[derive(Debug, Clone, Deserialize)]
pub struct WechatConfig {
    pub token_center_url: String,
    #[serde(default = "default_template_send_url")]
    pub template_send_url: String,
    #[serde(default = "default_color")]
    pub default_color: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_template_send_url() -> String {
    "https://api.weixin.qq.com/cgi-bin/message/template/send".to_string()
}

fn default_color() -> String {
    "#0c74da".to_string()
}

/// RedisConfig は unionid → openid マッピングを持つ Redis の設定を表す。
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// パスワードを含み得るため SecretString で保持する。
    pub url: SecretString,
    #[serde(default = "default_redis_db")]
    pub db: i64,
    #[serde(default)]
    pub key_prefix: Option<String>,
}

fn default_redis_db() -> i64 {
    msgpush_cache::DEFAULT_DB
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    #[serde(default = "default_template_dir")]
    pub template_dir: String,
}

fn default_smtp_host() -> String {
    "smtp.office365.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_template_dir() -> String {
    "templates".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    pub account: String,
    pub auth_key: SecretString,
    pub api_server: String,
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const MINIMAL: &str = r##"
app:
  name: message-push
auth:
  jwks_url: https://login.example.com/common/discovery/v2.0/keys
  appid: 41ebb163-adc1-4068-9087-eb79c718b633
  audience: 41ebb163-adc1-4068-9087-eb79c718b633
service_auth:
  authority: https://login.example.com/tenant
  client_id: msgpush
  client_secret: s3cret
  scopes:
    - api://token-center/.default
wechat:
  token_center_url: https://token-center.example.com/api/v1/wechat/token
smtp:
  username: digital.service@example.com
  password: mail-pass
  from_address: digital.service@example.com
sms:
  account: acct
  auth_key: sms-key
  api_server: https://sms.example.com/api/sms
  api_version: "2020-01-01"
"##;

    #[test]
    fn test_minimal_config_defaults() {
        let cfg: Config = serde_yaml::from_str(MINIMAL).unwrap();

        assert_eq!(cfg.app.version, "0.1.0");
        assert_eq!(cfg.app.environment, "dev");
        assert_eq!(cfg.app.log_level, "info");
        assert_eq!(cfg.app.log_format, "json");
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.auth.refresh_interval_secs, 3600);
        assert_eq!(cfg.auth.leeway_secs, 0);
        assert!(cfg.auth.issuer.is_none());
        assert_eq!(cfg.service_auth.refresh_before_secs, 120);
        assert_eq!(
            cfg.wechat.template_send_url,
            "https://api.weixin.qq.com/cgi-bin/message/template/send"
        );
        assert_eq!(cfg.wechat.default_color, "#0c74da");
        assert!(cfg.redis.is_none());
        assert_eq!(cfg.smtp.host, "smtp.office365.com");
        assert_eq!(cfg.smtp.port, 587);
        assert_eq!(cfg.smtp.template_dir, "templates");
        assert_eq!(cfg.sms.auth_key.expose_secret(), "sms-key");
    }

    #[test]
    fn test_redis_section_defaults_db() {
        let yaml = format!("{MINIMAL}redis:\n  url: redis://:pw@cache.example.com:6379\n");
        let cfg: Config = serde_yaml::from_str(&yaml).unwrap();

        let redis = cfg.redis.unwrap();
        assert_eq!(redis.db, 1);
        assert!(redis.key_prefix.is_none());
        assert_eq!(redis.url.expose_secret(), "redis://:pw@cache.example.com:6379");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let cfg: Config = serde_yaml::from_str(MINIMAL).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("mail-pass"));
        assert!(!debug.contains("sms-key"));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(Config::load("/nonexistent/config.yaml").is_err());
    }

    #[test]
    fn test_missing_required_section_is_error() {
        let result: Result<Config, _> = serde_yaml::from_str("app:\n  name: message-push\n");
        assert!(result.is_err());
    }
}
