use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use futures::lock::Mutex;
use kernel::FolderItem;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::domain::{FolderMove, MetadataStore};
use crate::error::Result;

const CACHE_SIZE: &str = "4096";

/// Metadata kept in keyed SQLite tables.
///
/// Each mutation touches only its own rows, so updates do not rewrite the
/// whole collection. The single connection is serialized by a mutex.
pub struct SqliteMetadata {
    conn: Mutex<Connection>,
}

impl SqliteMetadata {
    /// Opens (creating when needed) the database file and its schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        pragma_update(&conn, "encoding", "UTF-8")?;
        pragma_update(&conn, "cache_size", CACHE_SIZE)?;
        pragma_update(&conn, "synchronous", "FULL")?;
        new_database(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn new_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS folder (
              id          TEXT PRIMARY KEY,
              name        TEXT NOT NULL,
              created_at  TEXT NOT NULL,
              parent_id   TEXT,
              color       TEXT NOT NULL
              )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS folder_parent_ix ON folder(parent_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS association (
              file_id     TEXT PRIMARY KEY,
              folder_id   TEXT,
              updated_at  TEXT NOT NULL
              )",
        [],
    )?;

    Ok(())
}

fn pragma_update(conn: &Connection, name: &str, value: &str) -> rusqlite::Result<()> {
    conn.pragma_update(None, name, value)
}

#[async_trait]
impl MetadataStore for SqliteMetadata {
    async fn folders(&self) -> Result<Vec<FolderItem>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, created_at, parent_id, color FROM folder ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FolderItem {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
                parent_id: row.get(3)?,
                color: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn insert_folder(&self, folder: FolderItem) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.prepare_cached(
            "INSERT INTO folder (id, name, created_at, parent_id, color)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
        )?
        .execute(params![
            folder.id,
            folder.name,
            folder.created_at,
            folder.parent_id,
            folder.color
        ])?;
        Ok(())
    }

    async fn rename_folder(&self, id: &str, name: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = conn.execute("UPDATE folder SET name = ?2 WHERE id = ?1", params![id, name])?;
        Ok(changed > 0)
    }

    async fn move_folder(&self, id: &str, parent_id: Option<&str>) -> Result<FolderMove> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(parent) = parent_id {
            // UNION drops repeated ids, so a stored cycle still terminates
            let inside: bool = tx.query_row(
                "WITH RECURSIVE ancestor(id) AS (
                      SELECT ?1
                      UNION
                      SELECT folder.parent_id FROM folder JOIN ancestor ON folder.id = ancestor.id
                       WHERE folder.parent_id IS NOT NULL
                  )
                  SELECT EXISTS(SELECT 1 FROM ancestor WHERE id = ?2)",
                params![parent, id],
                |row| row.get(0),
            )?;
            if inside {
                return Ok(FolderMove::Cycle);
            }
        }
        let changed = tx.execute(
            "UPDATE folder SET parent_id = ?2 WHERE id = ?1",
            params![id, parent_id],
        )?;
        if changed == 0 {
            return Ok(FolderMove::Missing);
        }
        tx.commit()?;
        Ok(FolderMove::Moved)
    }

    async fn remove_folder(&self, id: &str) -> Result<usize> {
        let conn = self.conn.lock().await;
        let removed = conn.execute(
            "DELETE FROM folder WHERE id = ?1 OR parent_id = ?1",
            params![id],
        )?;
        Ok(removed)
    }

    async fn update_association(&self, file_id: &str, folder_id: Option<&str>) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let conn = self.conn.lock().await;
        conn.prepare_cached(
            "INSERT INTO association (file_id, folder_id, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(file_id) DO UPDATE SET folder_id = excluded.folder_id, updated_at = excluded.updated_at",
        )?
        .execute(params![file_id, folder_id, updated_at])?;
        Ok(())
    }

    async fn association(&self, file_id: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let folder_id: Option<Option<String>> = conn
            .query_row(
                "SELECT folder_id FROM association WHERE file_id = ?1",
                params![file_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(folder_id.flatten())
    }

    async fn associations(&self) -> Result<HashMap<String, Option<String>>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached("SELECT file_id, folder_id FROM association")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }

    async fn cleanup(&self, live_ids: &HashSet<String>) -> Result<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let stale: Vec<String> = {
            let mut stmt = tx.prepare("SELECT file_id FROM association")?;
            let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;
            ids.collect::<rusqlite::Result<Vec<_>>>()?
                .into_iter()
                .filter(|id| !live_ids.contains(id))
                .collect()
        };
        for id in &stale {
            tx.execute("DELETE FROM association WHERE file_id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(stale.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reopen_keeps_records() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("studydesk.db");
        {
            let meta = SqliteMetadata::open(&path).unwrap();
            meta.update_association("f1", Some("c")).await.unwrap();
        }

        // Act
        let meta = SqliteMetadata::open(&path).unwrap();
        let folder = meta.association("f1").await.unwrap();

        // Assert
        assert_eq!(folder.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn duplicate_folder_id_is_an_error() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let meta = SqliteMetadata::open(dir.path().join("m.db")).unwrap();
        let folder = FolderItem {
            id: "f".to_owned(),
            name: "F".to_owned(),
            created_at: String::new(),
            parent_id: None,
            color: "#10B981".to_owned(),
        };
        meta.insert_folder(folder.clone()).await.unwrap();

        // Act
        let result = meta.insert_folder(folder).await;

        // Assert
        assert!(result.is_err());
    }
}
