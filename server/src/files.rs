use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use kernel::{FileItem, FolderStats};

use crate::domain::{BackendKind, BlobStore, MetadataStore};
use crate::error::Result;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_EXTENSION: &str = ".pdf";
const DEFAULT_UPLOAD_NAME: &str = "upload.pdf";

/// Which files a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    All,
    /// Files associated with exactly this folder, `None` being the root
    Folder(Option<&'a str>),
}

/// CRUD over uploaded PDF files plus their folder associations.
#[derive(Clone)]
pub struct FileStorage {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
}

impl FileStorage {
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { blobs, metadata }
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.blobs.kind()
    }

    /// Stores the bytes under a timestamped safe name and records the folder.
    ///
    /// A failed association write is logged only, the file then shows up in the root.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        original_name: &str,
        custom_name: Option<&str>,
        folder_id: Option<&str>,
    ) -> Result<FileItem> {
        let original_name = if original_name.is_empty() {
            DEFAULT_UPLOAD_NAME
        } else {
            original_name
        };
        let requested = custom_name
            .filter(|n| !n.is_empty())
            .unwrap_or(original_name);
        let now = Utc::now();
        let name = storage_name(requested, now);

        let info = match self.blobs.put(&name, data, PDF_CONTENT_TYPE).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!("file '{name}' not stored. Error: {e}");
                return Err(e);
            }
        };
        tracing::info!("file: {name} stored: {} bytes", info.size);

        if let Some(folder) = folder_id {
            if let Err(e) = self.metadata.update_association(&name, Some(folder)).await {
                tracing::error!("file '{name}' not associated with folder {folder}. Error: {e}");
            }
        }

        Ok(FileItem {
            url: self.blobs.url(&name),
            id: name.clone(),
            name,
            original_name: original_name.to_owned(),
            size: info.size,
            uploaded_at: timestamp(now),
            folder_id: folder_id.map(str::to_owned),
        })
    }

    /// PDF files newest first with their folder association overlaid.
    pub async fn list(&self, scope: Scope<'_>) -> Vec<FileItem> {
        let blobs = match self.blobs.list().await {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("files not listed. Error: {e}");
                return Vec::new();
            }
        };
        let associations = self.metadata.associations().await.unwrap_or_else(|e| {
            tracing::error!("file associations not read. Error: {e}");
            Default::default()
        });

        let mut files: Vec<FileItem> = blobs
            .into_iter()
            .filter(|b| b.key.to_lowercase().ends_with(PDF_EXTENSION))
            .map(|b| FileItem {
                url: self.blobs.url(&b.key),
                folder_id: associations.get(&b.key).cloned().flatten(),
                id: b.key.clone(),
                original_name: b.key.clone(),
                name: b.key,
                size: b.size,
                uploaded_at: timestamp(b.modified),
            })
            .filter(|f| match scope {
                Scope::All => true,
                Scope::Folder(folder) => f.folder_id.as_deref() == folder,
            })
            .collect();

        files.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        files
    }

    /// Gives the file a new timestamped name, keeping its folder association.
    pub async fn rename(&self, id: &str, new_name: &str) -> bool {
        let new_id = renamed_storage_name(new_name, Utc::now());
        if let Err(e) = self.blobs.rename(id, &new_id).await {
            tracing::error!("file '{id}' not renamed. Error: {e}");
            return false;
        }
        tracing::info!("file: {id} renamed to {new_id}");

        match self.metadata.association(id).await {
            Ok(Some(folder)) => {
                if let Err(e) = self.metadata.update_association(&new_id, Some(&folder)).await {
                    tracing::error!("file '{new_id}' lost folder {folder}. Error: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!("file '{id}' association not read. Error: {e}"),
        }
        true
    }

    /// Points the file at another folder. The blob is not touched.
    pub async fn move_to(&self, id: &str, folder_id: Option<&str>) -> bool {
        match self.metadata.update_association(id, folder_id).await {
            Ok(()) => {
                tracing::info!("file: {id} moved to {folder_id:?}");
                true
            }
            Err(e) => {
                tracing::error!("file '{id}' not moved. Error: {e}");
                false
            }
        }
    }

    /// Deletes the blob only; the association record stays until [`FileStorage::cleanup`].
    pub async fn delete(&self, id: &str) -> bool {
        match self.blobs.delete(id).await {
            Ok(()) => {
                tracing::info!("file: {id} deleted");
                true
            }
            Err(e) => {
                tracing::error!("file '{id}' not deleted. Error: {e}");
                false
            }
        }
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        self.blobs.exists(id).await
    }

    /// Raw content of a stored file, `None` when it does not exist.
    pub async fn read(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.blobs.get(id).await
    }

    /// Where the client should fetch the file from when this process does not serve it.
    #[must_use]
    pub fn public_url(&self, id: &str) -> Option<String> {
        self.blobs.public_url(id)
    }

    pub async fn stats(&self, folder_id: Option<&str>) -> FolderStats {
        let files = self.list(Scope::Folder(folder_id)).await;
        FolderStats {
            folder_id: folder_id.map(str::to_owned),
            file_count: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
        }
    }

    /// Removes associations whose file no longer exists.
    pub async fn cleanup(&self) -> Result<usize> {
        let live: HashSet<String> = self.blobs.list().await?.into_iter().map(|b| b.key).collect();
        let removed = self.metadata.cleanup(&live).await?;
        tracing::info!("metadata cleanup removed {removed} association(s)");
        Ok(removed)
    }

    /// Stores an arbitrary document under a timestamped safe name, returning the name.
    pub async fn store_document(
        &self,
        data: Vec<u8>,
        name: &str,
        content_type: &str,
    ) -> Result<String> {
        let name = format!("{}_{}", timestamp_prefix(Utc::now()), safe_base_name(name));
        self.blobs.put(&name, data, content_type).await?;
        Ok(name)
    }
}

/// `2024-05-01_10-20-30-123_<safe name>.pdf`
///
/// Directories in `name` are dropped. The fixed width prefix makes names sort by creation time.
pub fn storage_name(name: &str, now: DateTime<Utc>) -> String {
    timestamped_pdf(safe_base_name(name), now)
}

/// Name for a renamed file. Unlike [`storage_name`], separators become underscores.
pub fn renamed_storage_name(name: &str, now: DateTime<Utc>) -> String {
    timestamped_pdf(safe_chars(name), now)
}

fn timestamped_pdf(safe: String, now: DateTime<Utc>) -> String {
    let with_extension = if safe.to_lowercase().ends_with(PDF_EXTENSION) {
        safe
    } else {
        format!("{safe}{PDF_EXTENSION}")
    };
    format!("{}_{with_extension}", timestamp_prefix(now))
}

fn timestamp_prefix(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d_%H-%M-%S-%3f").to_string()
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn safe_base_name(name: &str) -> String {
    let base = match name.rfind(['\\', '/']) {
        Some(ix) => &name[ix + 1..],
        None => name,
    };
    safe_chars(base)
}

fn safe_chars(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
