use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kernel::FolderItem;

use crate::error::Result;

/// Which kind of storage a [`BlobStore`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    S3,
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::S3 => write!(f, "s3"),
        }
    }
}

/// Listing entry of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    /// Key relative to the store root
    pub key: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Flat key to bytes storage, either a local directory or an object store bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Writes the whole blob, replacing any previous content.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<BlobInfo>;

    /// Reads the whole blob. A missing blob is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Whether a blob is stored under `key`, without reading its content.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Lists the blobs directly under the store root.
    async fn list(&self) -> Result<Vec<BlobInfo>>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn copy(&self, from: &str, to: &str) -> Result<()>;

    /// Moves a blob to a new key. Not atomic unless the backend overrides it.
    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.copy(from, to).await?;
        self.delete(from).await
    }

    /// Location clients use to fetch the blob.
    fn url(&self, key: &str) -> String;

    /// Direct public location when the blob is not served by this process.
    fn public_url(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Result of [`MetadataStore::move_folder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderMove {
    Moved,
    /// No folder has the id
    Missing,
    /// The new parent is the folder itself or one of its descendants
    Cycle,
}

/// Folder records and file to folder associations.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All folders in insertion order.
    async fn folders(&self) -> Result<Vec<FolderItem>>;

    async fn insert_folder(&self, folder: FolderItem) -> Result<()>;

    /// Returns `false` when no folder has the id.
    async fn rename_folder(&self, id: &str, name: &str) -> Result<bool>;

    /// Re-parents the folder unless the new parent is the folder itself or sits below it.
    ///
    /// The ancestry check and the write happen in one critical section.
    async fn move_folder(&self, id: &str, parent_id: Option<&str>) -> Result<FolderMove>;

    /// Removes the folder and its direct children, returns how many records went away.
    async fn remove_folder(&self, id: &str) -> Result<usize>;

    async fn update_association(&self, file_id: &str, folder_id: Option<&str>) -> Result<()>;

    async fn association(&self, file_id: &str) -> Result<Option<String>>;

    async fn associations(&self) -> Result<HashMap<String, Option<String>>>;

    /// Drops associations of files not in `live_ids`, returns how many were dropped.
    async fn cleanup(&self, live_ids: &HashSet<String>) -> Result<usize>;
}

/// Whether `candidate` is `id` or sits below it, following parent links.
pub(crate) fn is_self_or_descendant(folders: &[FolderItem], id: &str, candidate: &str) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(candidate);
    while let Some(cid) = current {
        if cid == id {
            return true;
        }
        if !seen.insert(cid) {
            return false;
        }
        current = folders
            .iter()
            .find(|f| f.id == cid)
            .and_then(|f| f.parent_id.as_deref());
    }
    false
}
