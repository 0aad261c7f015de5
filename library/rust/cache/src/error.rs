use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("接続エラー: {0}")]
    ConnectionError(String),
}
