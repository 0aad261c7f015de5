use std::sync::Arc;

use async_trait::async_trait;
use msgpush_cache::CacheClient;

use crate::domain::service::{DeliveryError, IdentityResolver};

/// キャッシュに保存された unionid → openid マッピングで受信者を解決する。
pub struct CacheIdentityResolver {
    cache: Arc<dyn CacheClient>,
}

impl CacheIdentityResolver {
    pub fn new(cache: Arc<dyn CacheClient>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl IdentityResolver for CacheIdentityResolver {
    async fn resolve(&self, user_id: &str) -> Result<String, DeliveryError> {
        match self.cache.get(user_id).await {
            Ok(Some(openid)) if !openid.is_empty() => Ok(openid),
            Ok(_) => Err(DeliveryError::IdentityResolutionMiss(user_id.to_string())),
            Err(e) => Err(DeliveryError::ConnectionFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgpush_cache::InMemoryCacheClient;

    #[tokio::test]
    async fn resolves_known_user() {
        let cache = InMemoryCacheClient::new();
        cache.insert("u1", "oA1").await;
        let resolver = CacheIdentityResolver::new(Arc::new(cache));

        assert_eq!(resolver.resolve("u1").await.unwrap(), "oA1");
    }

    #[tokio::test]
    async fn unknown_user_is_resolution_miss() {
        let resolver = CacheIdentityResolver::new(Arc::new(InMemoryCacheClient::new()));

        match resolver.resolve("u2").await {
            Err(DeliveryError::IdentityResolutionMiss(user)) => assert_eq!(user, "u2"),
            other => unreachable!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_value_is_resolution_miss() {
        let cache = InMemoryCacheClient::new();
        cache.insert("u3", "").await;
        let resolver = CacheIdentityResolver::new(Arc::new(cache));

        assert!(matches!(
            resolver.resolve("u3").await,
            Err(DeliveryError::IdentityResolutionMiss(_))
        ));
    }
}
