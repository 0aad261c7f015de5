use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionInfo, IntoConnectionInfo, RedisError};
use tracing::debug;

use crate::{CacheClient, CacheError};

/// 識別子マッピングを格納している論理 DB 番号。
pub const DEFAULT_DB: i64 = 1;

/// Redis-backed read-only cache client.
///
/// Uses a connection manager so that dropped connections are re-established
/// transparently between lookups.
#[derive(Clone)]
pub struct RedisCacheClient {
    conn: ConnectionManager,
    key_prefix: Option<String>,
}

impl RedisCacheClient {
    /// Connect to Redis and select the given logical database.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL; `rediss://` connects over TLS
    ///   (e.g., "rediss://:password@cache.example.com:6380")
    /// * `db` - logical database number; overrides any database in the URL
    pub async fn new(url: &str, db: i64) -> Result<Self, CacheError> {
        let client = Client::open(connection_info(url, db)?).map_err(map_redis_error)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        debug!(db, "Redis に接続しました");
        Ok(Self {
            conn,
            key_prefix: None,
        })
    }

    /// Set a key prefix for namespace isolation.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    fn prefixed_key(&self, key: &str) -> String {
        prefixed(self.key_prefix.as_deref(), key)
    }
}

fn connection_info(url: &str, db: i64) -> Result<ConnectionInfo, CacheError> {
    let mut info = url.into_connection_info().map_err(map_redis_error)?;
    info.redis.db = db;
    Ok(info)
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{key}"),
        None => key.to_string(),
    }
}

#[async_trait]
impl CacheClient for RedisCacheClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let full_key = self.prefixed_key(key);
        let result: Option<String> = conn.get(&full_key).await.map_err(map_redis_error)?;
        Ok(result)
    }
}

fn map_redis_error(err: RedisError) -> CacheError {
    CacheError::ConnectionError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_key_without_prefix() {
        assert_eq!(prefixed(None, "oGTnct0FO7uo"), "oGTnct0FO7uo");
    }

    #[test]
    fn test_prefixed_key_with_prefix() {
        assert_eq!(prefixed(Some("wx-openid"), "u1"), "wx-openid:u1");
    }

    #[test]
    fn test_rediss_url_selects_tls() {
        let info = connection_info("rediss://:pw@127.0.0.1:6380", DEFAULT_DB).unwrap();
        assert!(matches!(
            info.addr,
            redis::ConnectionAddr::TcpTls { ref host, port: 6380, .. } if host == "127.0.0.1"
        ));
        assert_eq!(info.redis.db, DEFAULT_DB);
    }

    #[test]
    fn test_db_overrides_url_database() {
        let info = connection_info("redis://127.0.0.1:6379/5", 1).unwrap();
        assert_eq!(info.redis.db, 1);
    }

    #[tokio::test]
    async fn test_unreachable_tls_server_is_connection_error() {
        let result = RedisCacheClient::new("rediss://:pw@127.0.0.1:1", DEFAULT_DB).await;
        match result {
            Err(CacheError::ConnectionError(msg)) => {
                assert!(!msg.contains("feature is not enabled"), "{msg}");
            }
            Ok(_) => panic!("connected to a closed port"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let result = RedisCacheClient::new("redis://127.0.0.1:1", DEFAULT_DB).await;
        assert!(matches!(result, Err(CacheError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_is_connection_error() {
        let result = RedisCacheClient::new("not a redis url", DEFAULT_DB).await;
        assert!(matches!(result, Err(CacheError::ConnectionError(_))));
    }
}
