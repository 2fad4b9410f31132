use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use crate::config::S3Config;
use crate::domain::{BackendKind, BlobInfo, BlobStore};
use crate::error::{Result, StoreError};

const NOT_FOUND: u16 = 404;

/// Blobs kept as objects under a key prefix of an S3 compatible bucket.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    prefix: String,
    public_endpoint: String,
}

impl S3BlobStore {
    /// Connects to the bucket described by `config`, placing keys under `prefix`.
    pub fn new(config: &S3Config, prefix: &str) -> Result<Self> {
        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StoreError::Config(format!("object storage credentials: {e}")))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        // http://endpoint/bucket/key instead of http://bucket.endpoint/key
        bucket.set_path_style();

        tracing::info!(
            "object storage: endpoint {} bucket {} prefix {prefix}",
            config.endpoint,
            config.bucket
        );

        Ok(Self {
            bucket,
            prefix: prefix.trim_matches('/').to_owned(),
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_owned(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_owned()
        } else {
            format!("{}/{key}", self.prefix)
        }
    }

    fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }

    fn check(key: &str, status: u16) -> Result<()> {
        match status {
            200..=299 => Ok(()),
            NOT_FOUND => Err(StoreError::NotFound(key.to_owned())),
            status => Err(StoreError::Status {
                key: key.to_owned(),
                status,
            }),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<BlobInfo> {
        let response = self
            .bucket
            .put_object_with_content_type(self.full_key(key), &data, content_type)
            .await?;
        Self::check(key, response.status_code())?;
        tracing::debug!("put '{key}' into bucket '{}'", self.bucket.name());
        Ok(BlobInfo {
            key: key.to_owned(),
            size: data.len() as u64,
            modified: Utc::now(),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.bucket.get_object(self.full_key(key)).await {
            Ok(response) if response.status_code() == NOT_FOUND => Ok(None),
            Ok(response) => {
                Self::check(key, response.status_code())?;
                Ok(Some(response.to_vec()))
            }
            Err(S3Error::HttpFailWithBody(NOT_FOUND, _)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self.bucket.head_object(self.full_key(key)).await {
            Ok((_, NOT_FOUND)) | Err(S3Error::HttpFailWithBody(NOT_FOUND, _)) => Ok(false),
            Ok((_, status)) => Self::check(key, status).map(|()| true),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<BlobInfo>> {
        let prefix = self.list_prefix();
        let pages = self.bucket.list(prefix.clone(), Some("/".to_owned())).await?;
        let blobs = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .filter_map(|object| {
                let key = object.key.strip_prefix(&prefix)?.to_owned();
                if key.is_empty() || key.contains('/') {
                    return None;
                }
                let modified = DateTime::parse_from_rfc3339(&object.last_modified)
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                Some(BlobInfo {
                    key,
                    size: object.size,
                    modified,
                })
            })
            .collect();
        Ok(blobs)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self.bucket.delete_object(self.full_key(key)).await?;
        Self::check(key, response.status_code())?;
        tracing::debug!("deleted '{key}' from bucket '{}'", self.bucket.name());
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        let status = self
            .bucket
            .copy_object_internal(self.full_key(from), self.full_key(to))
            .await?;
        Self::check(from, status)
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_endpoint,
            self.bucket.name(),
            self.full_key(key)
        )
    }

    fn public_url(&self, key: &str) -> Option<String> {
        Some(self.url(key))
    }
}
