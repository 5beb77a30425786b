//! S3-compatible [`ObjectStore`] implementation.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use crate::{ObjectStore, StorageError, StoredObject};

/// Configuration for the S3 store.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket holding all user media.
    pub bucket: String,
    /// Base URL under which objects are publicly reachable
    /// (e.g. a CDN or the bucket's public endpoint), without a trailing
    /// slash.
    pub public_base_url: String,
}

impl S3Config {
    /// Load S3 configuration from `STORAGE_BUCKET` and
    /// `STORAGE_PUBLIC_BASE_URL`.
    ///
    /// # Panics
    ///
    /// Panics when a variable is missing; misconfiguration should fail at
    /// startup.
    pub fn from_env() -> Self {
        let require = |name: &str| {
            std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set"))
        };
        let mut public_base_url = require("STORAGE_PUBLIC_BASE_URL");
        while public_base_url.ends_with('/') {
            public_base_url.pop();
        }
        Self {
            bucket: require("STORAGE_BUCKET"),
            public_base_url,
        }
    }
}

/// [`ObjectStore`] backed by an S3-compatible service.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    config: S3Config,
}

impl S3Store {
    /// Create a store from the ambient AWS environment configuration
    /// (credentials, region, endpoint override for S3-compatible vendors).
    pub async fn from_env(config: S3Config) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            config,
        }
    }

    /// Create a store with an explicit client (tests, custom endpoints).
    pub fn new(client: aws_sdk_s3::Client, config: S3Config) -> Self {
        Self { client, config }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.public_base_url, path)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(path)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(path, "Object uploaded");
        Ok(self.public_url(path))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        // S3 DeleteObject succeeds for missing keys, which matches the
        // idempotent-delete contract directly.
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(path, "Object deleted");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| StorageError::List {
                    prefix: prefix.to_string(),
                    message: e.to_string(),
                })?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                let name = key.strip_prefix(prefix).unwrap_or(key);
                let name = name.trim_start_matches('/');
                if name.is_empty() {
                    continue;
                }
                objects.push(StoredObject {
                    name: name.to_string(),
                    public_url: self.public_url(key),
                });
            }

            match response.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(objects)
    }
}
