pub mod client;
pub mod error;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use client::CacheClient;
pub use error::CacheError;
pub use memory::InMemoryCacheClient;
#[cfg(feature = "redis")]
pub use crate::redis::{RedisCacheClient, DEFAULT_DB};
