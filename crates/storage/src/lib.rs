//! Durable keyed records for client state that must survive restarts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: String,
    pub payload: Value,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // Every connection to an in-memory database sees its own empty schema.
        let max_connections = if is_in_memory(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run storage migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts or replaces the record stored under `key`.
    pub async fn save_record(&self, key: &str, payload: &Value) -> Result<()> {
        let encoded = serde_json::to_string(payload).context("failed to encode record payload")?;
        sqlx::query(
            "INSERT INTO persisted_records (record_key, payload, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(record_key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(encoded)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save record '{key}'"))?;
        debug!("storage: saved record key={key}");
        Ok(())
    }

    pub async fn load_record(&self, key: &str) -> Result<Option<StoredRecord>> {
        let row = sqlx::query(
            "SELECT record_key, payload, updated_at FROM persisted_records WHERE record_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load record '{key}'"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("payload")?;
        let payload = serde_json::from_str(&raw)
            .with_context(|| format!("record '{key}' holds malformed json"))?;
        Ok(Some(StoredRecord {
            key: row.try_get("record_key")?,
            payload,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    /// Removes the record, returning whether one existed.
    pub async fn delete_record(&self, key: &str) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM persisted_records WHERE record_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete record '{key}'"))?
            .rows_affected();
        Ok(removed > 0)
    }

    pub async fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_value(value).context("failed to encode record payload")?;
        self.save_record(key, &payload).await
    }

    pub async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(record) = self.load_record(key).await? else {
            return Ok(None);
        };
        let value = serde_json::from_value(record.payload)
            .with_context(|| format!("record '{key}' does not match the expected shape"))?;
        Ok(Some(value))
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
