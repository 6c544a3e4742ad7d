use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub default_user_id: String,
}

impl RecognizerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory,
    File {
        path: PathBuf,
    },
    Postgres {
        database_url: String,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
        prefix: String,
    },
}

impl StoreConfig {
    /// Backend name as written in `STORE_BACKEND`; safe to log.
    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::File { .. } => "file",
            StoreConfig::Postgres { .. } => "postgres",
            StoreConfig::S3 { .. } => "s3",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_limit_bytes: usize,
    pub recognizer: RecognizerConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let or = |k: &str, default: &str| var(k).unwrap_or_else(|| default.to_string());
        let required = |k: &str| var(k).with_context(|| format!("{k} must be set"));

        let store = match or("STORE_BACKEND", "file").to_lowercase().as_str() {
            "memory" => StoreConfig::Memory,
            "file" => StoreConfig::File {
                path: or("NUTRISCAN_STORE_PATH", "nutriscan-store.json").into(),
            },
            "postgres" => StoreConfig::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            "s3" => StoreConfig::S3 {
                endpoint: required("MINIO_ENDPOINT")?,
                bucket: required("MINIO_BUCKET")?,
                access_key: required("MINIO_ACCESS_KEY")?,
                secret_key: required("MINIO_SECRET_KEY")?,
                region: or("MINIO_REGION", "us-east-1"),
                prefix: or("NUTRISCAN_S3_PREFIX", "nutriscan/"),
            },
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };

        let recognizer = RecognizerConfig {
            base_url: or("NUTRISCAN_API_URL", "http://localhost:8000")
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: var("NUTRISCAN_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
            default_user_id: or("NUTRISCAN_USER_ID", "demo-user"),
        };

        let upload_limit_mb = var("NUTRISCAN_UPLOAD_LIMIT_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(20);
        let upload_limit_bytes = upload_limit_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("NUTRISCAN_UPLOAD_LIMIT_MB={upload_limit_mb} is too large"))?;

        Ok(Self {
            host: or("APP_HOST", "0.0.0.0"),
            port: var("APP_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            upload_limit_bytes,
            recognizer,
            store,
        })
    }
}
