use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{CacheClient, CacheError};

#[derive(Clone, Default)]
pub struct InMemoryCacheClient {
    store: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCacheClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut store = self.store.write().await;
        store.insert(key.into(), value.into());
    }
}

#[async_trait]
impl CacheClient for InMemoryCacheClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let store = self.store.read().await;
        Ok(store.get(key).cloned())
    }
}
