//! Text key-value persistence for the three session slots.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

use crate::config::StoreConfig;

pub mod file;
pub mod memory;
pub mod postgres;
pub mod s3;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use s3::S3Store;

pub const ONBOARDING_COMPLETE_KEY: &str = "onboardingComplete";
pub const PROFILE_KEY: &str = "userProfile";
pub const LATEST_SCAN_KEY: &str = "latestScanResult";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Reads and decodes a JSON value. Absent keys, unreadable stores and
/// malformed values all come back as `None`; the latter two are logged.
pub async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            error!(error = %e, key, "store read failed; using empty value");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, key, "malformed stored value; using empty value");
            None
        }
    }
}

pub async fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value).with_context(|| format!("encode {key}"))?;
    store.set(key, &raw).await
}

pub async fn connect(cfg: &StoreConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match cfg {
        StoreConfig::Memory => Arc::new(MemoryStore::default()),
        StoreConfig::File { path } => Arc::new(FileStore::new(path)),
        StoreConfig::Postgres { database_url } => Arc::new(PgStore::connect(database_url).await?),
        StoreConfig::S3 {
            endpoint,
            bucket,
            access_key,
            secret_key,
            region,
            prefix,
        } => Arc::new(
            S3Store::new(endpoint, bucket, access_key, secret_key, region, prefix).await?,
        ),
    };
    Ok(store)
}
