//! 設定からサービス一式を組み立てる。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use msgpush_auth::{AuthState, BearerVerifier, HttpJwksFetcher, JwksCache};
use msgpush_cache::{CacheClient, InMemoryCacheClient, RedisCacheClient};
use msgpush_serviceauth::ClientCredentialProvider;
use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::adapter::handler::AppState;
use crate::infrastructure::config::{Config, RedisConfig};
use crate::infrastructure::delivery::{
    SmsGatewayClient, SmtpEmailClient, WechatTemplateClient, WechatTokenCenter,
};
use crate::infrastructure::identity::CacheIdentityResolver;
use crate::infrastructure::template_store::HtmlTemplateStore;
use crate::usecase::{
    FanOutSender, SendEmailMessageUseCase, SendSmsMessageUseCase, SendWechatMessageUseCase,
};

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build http client")
}

/// 受信トークン検証器を組み立てる。
pub fn build_auth_state(cfg: &Config) -> anyhow::Result<AuthState> {
    let fetcher = Arc::new(HttpJwksFetcher::new(http_client(cfg.auth.timeout_secs)?));
    let jwks = Arc::new(JwksCache::new(
        &cfg.auth.jwks_url,
        &cfg.auth.appid,
        Duration::from_secs(cfg.auth.refresh_interval_secs),
        fetcher,
    ));

    let mut verifier =
        BearerVerifier::new(jwks, &cfg.auth.audience).with_leeway(cfg.auth.leeway_secs);
    if let Some(ref issuer) = cfg.auth.issuer {
        verifier = verifier.with_issuer(issuer);
    }

    Ok(AuthState {
        verifier: Arc::new(verifier),
    })
}

async fn build_identity_cache(redis: Option<&RedisConfig>) -> anyhow::Result<Arc<dyn CacheClient>> {
    match redis {
        Some(redis) => {
            let mut client = RedisCacheClient::new(redis.url.expose_secret(), redis.db)
                .await
                .context("failed to connect to redis")?;
            if let Some(ref prefix) = redis.key_prefix {
                client = client.with_prefix(prefix.clone());
            }
            info!(db = redis.db, "using redis identity cache");
            Ok(Arc::new(client))
        }
        None => {
            warn!("redis is not configured; wechat recipients will not resolve");
            Ok(Arc::new(InMemoryCacheClient::new()))
        }
    }
}

/// すべてのサービスを 1 度だけ生成し、ルーターの状態にまとめる。
pub async fn build_app_state(cfg: &Config) -> anyhow::Result<AppState> {
    let auth_state = build_auth_state(cfg)?;

    // WeChat
    let provider = Arc::new(
        ClientCredentialProvider::from_config(cfg.service_auth.clone())
            .context("invalid service_auth configuration")?,
    );
    let wechat_http = http_client(cfg.wechat.timeout_secs)?;
    let token_center = Arc::new(WechatTokenCenter::new(
        cfg.wechat.token_center_url.clone(),
        provider,
        wechat_http.clone(),
    ));
    let identity_cache = build_identity_cache(cfg.redis.as_ref()).await?;
    let sender = Arc::new(FanOutSender::new(
        Arc::new(CacheIdentityResolver::new(identity_cache)),
        Arc::new(WechatTemplateClient::new(
            cfg.wechat.template_send_url.clone(),
            wechat_http,
        )),
        cfg.wechat.default_color.clone(),
    ));
    let send_wechat_uc = Arc::new(SendWechatMessageUseCase::new(token_center, sender));

    // SMS
    let sms_client = SmsGatewayClient::new(
        cfg.sms.api_server.clone(),
        cfg.sms.api_version.clone(),
        cfg.sms.account.clone(),
        cfg.sms.auth_key.clone(),
        http_client(cfg.sms.timeout_secs)?,
    );
    let send_sms_uc = Arc::new(SendSmsMessageUseCase::new(Arc::new(sms_client)));

    // Email
    let email_client = SmtpEmailClient::new(
        &cfg.smtp.host,
        cfg.smtp.port,
        &cfg.smtp.username,
        &cfg.smtp.password,
        &cfg.smtp.from_address,
    )
    .context("invalid smtp configuration")?;
    let send_email_uc = Arc::new(SendEmailMessageUseCase::new(
        Arc::new(HtmlTemplateStore::new(&cfg.smtp.template_dir)),
        Arc::new(email_client),
    ));

    Ok(AppState {
        app_name: cfg.app.name.clone(),
        send_sms_uc,
        send_email_uc,
        send_wechat_uc,
        auth_state,
    })
}
