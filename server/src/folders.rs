use std::collections::HashSet;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use kernel::{BreadcrumbItem, FolderItem};
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{FolderMove, MetadataStore};
use crate::error::Result;

const ROOT_NAME: &str = "Home";
const ID_SUFFIX_LEN: usize = 9;
const FOLDER_COLORS: [&str; 8] = [
    "#3B82F6", // Blue
    "#10B981", // Green
    "#F59E0B", // Yellow
    "#EF4444", // Red
    "#8B5CF6", // Purple
    "#06B6D4", // Cyan
    "#F97316", // Orange
    "#84CC16", // Lime
];

/// Result of a folder move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The new parent is the folder itself or one of its descendants
    Cycle,
    Failed,
}

/// CRUD over folder records.
///
/// Storage failures are logged and reported as `false` or an empty list.
#[derive(Clone)]
pub struct FolderService {
    metadata: Arc<dyn MetadataStore>,
}

impl FolderService {
    #[must_use]
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    pub async fn create(&self, name: &str, parent_id: Option<&str>) -> Result<FolderItem> {
        let folder = FolderItem {
            id: new_folder_id(),
            name: name.trim().to_owned(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            parent_id: parent_id.map(str::to_owned),
            color: random_color().to_owned(),
        };
        match self.metadata.insert_folder(folder.clone()).await {
            Ok(()) => {
                tracing::info!("folder '{}' created with id {}", folder.name, folder.id);
                Ok(folder)
            }
            Err(e) => {
                tracing::error!("folder '{}' not created. Error: {e}", folder.name);
                Err(e)
            }
        }
    }

    /// Folders whose parent is exactly `parent_id`; `None` selects the root.
    pub async fn list(&self, parent_id: Option<&str>) -> Vec<FolderItem> {
        self.list_all()
            .await
            .into_iter()
            .filter(|f| f.parent_id.as_deref() == parent_id)
            .collect()
    }

    pub async fn list_all(&self) -> Vec<FolderItem> {
        self.metadata.folders().await.unwrap_or_else(|e| {
            tracing::error!("folders not read. Error: {e}");
            Vec::new()
        })
    }

    pub async fn rename(&self, id: &str, new_name: &str) -> bool {
        let result = self.metadata.rename_folder(id, new_name.trim()).await;
        log_outcome(result, "renamed", id)
    }

    /// Re-parents a folder, refusing moves that would make it its own ancestor.
    pub async fn move_to(&self, id: &str, new_parent_id: Option<&str>) -> MoveOutcome {
        match self.metadata.move_folder(id, new_parent_id).await {
            Ok(FolderMove::Moved) => {
                tracing::info!("folder {id} moved");
                MoveOutcome::Moved
            }
            Ok(FolderMove::Cycle) => {
                let parent = new_parent_id.unwrap_or_default();
                tracing::warn!("folder {id} not moved: {parent} is inside it");
                MoveOutcome::Cycle
            }
            Ok(FolderMove::Missing) => {
                tracing::info!("folder {id} not moved: not exist");
                MoveOutcome::Failed
            }
            Err(e) => {
                tracing::error!("folder {id} not moved. Error: {e}");
                MoveOutcome::Failed
            }
        }
    }

    /// Deletes the folder and its direct children. Files stay associated with the removed ids.
    pub async fn delete(&self, id: &str) -> bool {
        match self.metadata.remove_folder(id).await {
            Ok(removed) => {
                tracing::info!("folder {id} deleted, {removed} record(s) removed");
                true
            }
            Err(e) => {
                tracing::error!("folder {id} not deleted. Error: {e}");
                false
            }
        }
    }

    /// Path from the root to the folder, root first.
    ///
    /// Stops at a dangling parent reference or at the first repeated id.
    pub async fn path(&self, id: Option<&str>) -> Vec<BreadcrumbItem> {
        let folders = self.list_all().await;
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = id.map(str::to_owned);
        while let Some(cid) = current {
            if !seen.insert(cid.clone()) {
                tracing::warn!("folder hierarchy has a cycle through {cid}");
                break;
            }
            let Some(folder) = folders.iter().find(|f| f.id == cid) else {
                break;
            };
            path.push(BreadcrumbItem {
                id: Some(folder.id.clone()),
                name: folder.name.clone(),
            });
            current = folder.parent_id.clone();
        }
        path.push(BreadcrumbItem {
            id: None,
            name: ROOT_NAME.to_owned(),
        });
        path.reverse();
        path
    }
}

fn log_outcome(result: Result<bool>, action: &str, id: &str) -> bool {
    match result {
        Ok(true) => {
            tracing::info!("folder {id} {action}");
            true
        }
        Ok(false) => {
            tracing::info!("folder {id} not {action}: not exist");
            false
        }
        Err(e) => {
            tracing::error!("folder {id} not {action}. Error: {e}");
            false
        }
    }
}

fn new_folder_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("folder_{}_{suffix}", Utc::now().timestamp_millis())
}

fn random_color() -> &'static str {
    FOLDER_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FOLDER_COLORS[0])
}
