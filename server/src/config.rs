use std::env;
use std::path::PathBuf;

use crate::error::{Result, StoreError};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_PREFIX: &str = "study-desk";
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024 * 1024; /* 2GB */

/// Where folder records and associations are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    /// Two JSON documents next to the files
    Json,
    /// Keyed tables in a SQLite database under the data directory
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub public_endpoint: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Local,
    S3(S3Config),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub metadata: MetadataKind,
    pub body_limit: usize,
    pub backend: BackendConfig,
}

impl Config {
    /// Reads the configuration from process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    ///
    /// The object storage backend is selected only when both
    /// `STUDYDESK_S3_BUCKET` and `STUDYDESK_S3_ENDPOINT` are set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("STUDYDESK_PORT") {
            Some(p) => p
                .trim()
                .parse()
                .map_err(|_| StoreError::Config(format!("invalid port '{p}'")))?,
            None => DEFAULT_PORT,
        };

        let body_limit = match var("STUDYDESK_BODY_LIMIT") {
            Some(l) => l
                .trim()
                .parse()
                .map_err(|_| StoreError::Config(format!("invalid body limit '{l}'")))?,
            None => DEFAULT_BODY_LIMIT,
        };

        let metadata = match var("STUDYDESK_METADATA").as_deref().map(str::trim) {
            None | Some("json") => MetadataKind::Json,
            Some("sqlite") => MetadataKind::Sqlite,
            Some(other) => {
                return Err(StoreError::Config(format!(
                    "unknown metadata store '{other}', expected 'json' or 'sqlite'"
                )))
            }
        };

        let data_dir =
            PathBuf::from(var("STUDYDESK_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));

        let backend = match (var("STUDYDESK_S3_BUCKET"), var("STUDYDESK_S3_ENDPOINT")) {
            (Some(bucket), Some(endpoint)) => BackendConfig::S3(S3Config {
                bucket,
                public_endpoint: var("STUDYDESK_S3_PUBLIC_ENDPOINT")
                    .unwrap_or_else(|| endpoint.clone()),
                endpoint,
                region: var("STUDYDESK_S3_REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
                access_key: var("STUDYDESK_S3_ACCESS_KEY"),
                secret_key: var("STUDYDESK_S3_SECRET_KEY"),
                prefix: var("STUDYDESK_S3_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.into()),
            }),
            _ => BackendConfig::Local,
        };

        Ok(Self {
            port,
            data_dir,
            metadata,
            body_limit,
            backend,
        })
    }
}
