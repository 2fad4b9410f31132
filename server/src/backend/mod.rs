//! Storage backends behind [`crate::domain::BlobStore`].

use std::sync::Arc;

use crate::config::{BackendConfig, Config};
use crate::domain::BlobStore;
use crate::error::Result;

mod local;
mod bucket;

pub use self::local::LocalBlobStore;
pub use self::bucket::S3BlobStore;

pub const UPLOADS_URL: &str = "/uploads";
const UPLOADS_DIR: &str = "uploads";
const METADATA_DIR: &str = "metadata";

/// The two stores a running service needs: uploaded files and metadata documents.
pub struct Backends {
    pub files: Arc<dyn BlobStore>,
    pub metadata: Arc<dyn BlobStore>,
}

impl Backends {
    /// Builds the stores once at startup from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.backend {
            BackendConfig::Local => {
                let files = LocalBlobStore::new(config.data_dir.join(UPLOADS_DIR), UPLOADS_URL);
                let metadata =
                    LocalBlobStore::new(config.data_dir.join(METADATA_DIR), UPLOADS_URL);
                Ok(Self {
                    files: Arc::new(files),
                    metadata: Arc::new(metadata),
                })
            }
            BackendConfig::S3(s3) => {
                let metadata_prefix = format!("{}/{METADATA_DIR}", s3.prefix.trim_end_matches('/'));
                Ok(Self {
                    files: Arc::new(S3BlobStore::new(s3, &s3.prefix)?),
                    metadata: Arc::new(S3BlobStore::new(s3, &metadata_prefix)?),
                })
            }
        }
    }
}
