use async_trait::async_trait;

use crate::CacheError;

/// 読み取り専用のキー・バリューストア。
///
/// キーが存在しない場合は `Ok(None)`、ストアに到達できない場合は `Err` を返す。
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
}
