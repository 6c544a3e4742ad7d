use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use super::KeyValueStore;

/// One object per key under `prefix` in an S3-compatible bucket (MinIO
/// works with path-style addressing).
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
        prefix: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    fn object_key(&self, key: &str) -> String {
        object_key(&self.prefix, key)
    }
}

fn object_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{key}.json")
    } else {
        format!("{prefix}/{key}.json")
    }
}

#[async_trait]
impl KeyValueStore for S3Store {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let object_key = self.object_key(key);
        let out = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(out) => out,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None)
            }
            Err(e) => return Err(e).with_context(|| format!("s3 get_object {object_key}")),
        };
        let body = out
            .body
            .collect()
            .await
            .with_context(|| format!("s3 read body {object_key}"))?
            .into_bytes();
        let text = String::from_utf8(body.to_vec())
            .with_context(|| format!("s3 object {object_key} is not utf-8"))?;
        Ok(Some(text))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let object_key = self.object_key(key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(Bytes::from(value.to_string())))
            .content_type("application/json")
            .send()
            .await
            .with_context(|| format!("s3 put_object {object_key}"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let object_key = self.object_key(key);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
            .with_context(|| format!("s3 delete_object {object_key}"))?;
        Ok(())
    }
}
