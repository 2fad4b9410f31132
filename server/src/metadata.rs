//! Metadata persisted as two flat JSON documents in a [`BlobStore`].
//!
//! Every mutation reads the whole document, changes it and writes it back.
//! The cycle runs under a process wide lock, so concurrent requests inside one
//! process no longer overwrite each other. Separate processes sharing the same
//! documents still race with last write wins.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use futures::lock::Mutex;
use kernel::FolderItem;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{is_self_or_descendant, BlobStore, FolderMove, MetadataStore};
use crate::error::Result;

pub const FOLDERS_DOCUMENT: &str = "folders.json";
pub const ASSOCIATIONS_DOCUMENT: &str = "file-metadata.json";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssociationRecord {
    file_id: String,
    folder_id: Option<String>,
    updated_at: String,
}

pub struct DocumentMetadata {
    store: Arc<dyn BlobStore>,
    lock: Mutex<()>,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    async fn read<T: DeserializeOwned>(&self, document: &str) -> Result<Vec<T>> {
        match self.store.get(document).await? {
            Some(data) => Ok(serde_json::from_slice(&data)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write<T: Serialize>(&self, document: &str, records: &[T]) -> Result<()> {
        let data = serde_json::to_vec_pretty(records)?;
        self.store.put(document, data, JSON_CONTENT_TYPE).await?;
        Ok(())
    }

    async fn update_folder<F>(&self, id: &str, change: F) -> Result<bool>
    where
        F: FnOnce(&mut FolderItem) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut folders: Vec<FolderItem> = self.read(FOLDERS_DOCUMENT).await?;
        let Some(folder) = folders.iter_mut().find(|f| f.id == id) else {
            return Ok(false);
        };
        change(folder);
        self.write(FOLDERS_DOCUMENT, &folders).await?;
        Ok(true)
    }
}

#[async_trait]
impl MetadataStore for DocumentMetadata {
    async fn folders(&self) -> Result<Vec<FolderItem>> {
        self.read(FOLDERS_DOCUMENT).await
    }

    async fn insert_folder(&self, folder: FolderItem) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut folders: Vec<FolderItem> = self.read(FOLDERS_DOCUMENT).await?;
        folders.push(folder);
        self.write(FOLDERS_DOCUMENT, &folders).await
    }

    async fn rename_folder(&self, id: &str, name: &str) -> Result<bool> {
        let name = name.to_owned();
        self.update_folder(id, move |f| f.name = name).await
    }

    async fn move_folder(&self, id: &str, parent_id: Option<&str>) -> Result<FolderMove> {
        let _guard = self.lock.lock().await;
        let mut folders: Vec<FolderItem> = self.read(FOLDERS_DOCUMENT).await?;
        if parent_id.is_some_and(|parent| is_self_or_descendant(&folders, id, parent)) {
            return Ok(FolderMove::Cycle);
        }
        let Some(folder) = folders.iter_mut().find(|f| f.id == id) else {
            return Ok(FolderMove::Missing);
        };
        folder.parent_id = parent_id.map(str::to_owned);
        self.write(FOLDERS_DOCUMENT, &folders).await?;
        Ok(FolderMove::Moved)
    }

    async fn remove_folder(&self, id: &str) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut folders: Vec<FolderItem> = self.read(FOLDERS_DOCUMENT).await?;
        let before = folders.len();
        folders.retain(|f| f.id != id && f.parent_id.as_deref() != Some(id));
        self.write(FOLDERS_DOCUMENT, &folders).await?;
        Ok(before - folders.len())
    }

    async fn update_association(&self, file_id: &str, folder_id: Option<&str>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records: Vec<AssociationRecord> = self.read(ASSOCIATIONS_DOCUMENT).await?;
        records.retain(|r| r.file_id != file_id);
        records.push(AssociationRecord {
            file_id: file_id.to_owned(),
            folder_id: folder_id.map(str::to_owned),
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        self.write(ASSOCIATIONS_DOCUMENT, &records).await
    }

    async fn association(&self, file_id: &str) -> Result<Option<String>> {
        let records: Vec<AssociationRecord> = self.read(ASSOCIATIONS_DOCUMENT).await?;
        Ok(records
            .into_iter()
            .find(|r| r.file_id == file_id)
            .and_then(|r| r.folder_id))
    }

    async fn associations(&self) -> Result<HashMap<String, Option<String>>> {
        let records: Vec<AssociationRecord> = self.read(ASSOCIATIONS_DOCUMENT).await?;
        Ok(records
            .into_iter()
            .map(|r| (r.file_id, r.folder_id))
            .collect())
    }

    async fn cleanup(&self, live_ids: &HashSet<String>) -> Result<usize> {
        let _guard = self.lock.lock().await;
        if self.store.get(ASSOCIATIONS_DOCUMENT).await?.is_none() {
            return Ok(0);
        }
        let mut records: Vec<AssociationRecord> = self.read(ASSOCIATIONS_DOCUMENT).await?;
        let before = records.len();
        records.retain(|r| live_ids.contains(&r.file_id));
        self.write(ASSOCIATIONS_DOCUMENT, &records).await?;
        Ok(before - records.len())
    }
}
