use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BackendKind, BlobInfo, BlobStore};
use crate::error::{Result, StoreError};

/// Blobs kept as plain files inside one directory.
pub struct LocalBlobStore {
    root: PathBuf,
    url_base: String,
}

impl LocalBlobStore {
    /// `url_base` is the HTTP path the files are served under, e.g. `/uploads`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P, url_base: &str) -> Self {
        Self {
            root: root.into(),
            url_base: url_base.trim_end_matches('/').to_owned(),
        }
    }

    fn path_of(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if plain {
            Ok(self.root.join(relative))
        } else {
            Err(StoreError::InvalidKey(key.to_owned()))
        }
    }

    async fn info(&self, key: &str, path: &Path) -> Result<BlobInfo> {
        let meta = tokio::fs::metadata(path).await?;
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(BlobInfo {
            key: key.to_owned(),
            size: meta.len(),
            modified,
        })
    }
}

fn not_found_or_io(key: &str, e: std::io::Error) -> StoreError {
    if e.kind() == ErrorKind::NotFound {
        StoreError::NotFound(key.to_owned())
    } else {
        StoreError::Io(e)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<BlobInfo> {
        let path = self.path_of(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        self.info(key, &path).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_of(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_of(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<BlobInfo>> {
        tokio::fs::create_dir_all(&self.root).await?;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut result = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(key) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            result.push(self.info(&key, &entry.path()).await?);
        }
        Ok(result)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_of(key)?;
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| not_found_or_io(key, e))
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        let source = self.path_of(from)?;
        let target = self.path_of(to)?;
        tokio::fs::copy(source, target)
            .await
            .map(|_| ())
            .map_err(|e| not_found_or_io(from, e))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.path_of(from)?;
        let target = self.path_of(to)?;
        tokio::fs::rename(source, target)
            .await
            .map_err(|e| not_found_or_io(from, e))
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.url_base, urlencoding::encode(key))
    }
}
