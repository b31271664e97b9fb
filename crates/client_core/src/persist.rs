//! Durable key/value persistence for store projections.

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use storage::Storage;
use tokio::sync::Mutex;

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn save(&self, key: &str, value: &Value) -> Result<()>;
    async fn load(&self, key: &str) -> Result<Option<Value>>;
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl StateStore for Storage {
    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        self.save_record(key, value).await
    }

    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load_record(key).await?.map(|record| record.payload))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.delete_record(key).await.map(|_| ())
    }
}

/// Process-local store for tests and `--ephemeral` runs. Clones share data.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    records: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self, key: &str) -> Option<Value> {
        self.records.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        self.records
            .lock()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.records.lock().await.remove(key);
        Ok(())
    }
}
