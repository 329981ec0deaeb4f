use anyhow::{Context, Result};
use log::{debug, info};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::constants::APP_DIR_NAME;
use crate::entities::{pending_note, task};
use crate::repositories::{PendingNoteRepository, TaskRepository};

/// Local storage manager: the durable cache of tasks and queued notes.
///
/// Every write goes through a single SQL statement, so a reader never observes a
/// partially written record and a failure on one record leaves the others intact.
#[derive(Clone)]
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open storage as described by the configuration.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        if config.in_memory {
            return Self::in_memory().await;
        }
        let path = match &config.database_path {
            Some(path) => path.clone(),
            None => Self::default_database_path()?,
        };
        Self::open(&path).await
    }

    /// Open (creating if needed) a database file.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
            }
        }

        let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
        options.max_connections(4).min_connections(1).sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        info!("💾 Opened local store at {}", path.display());

        let storage = Self { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open a private in-memory database.
    ///
    /// The pool is pinned to one connection: each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).min_connections(1).sqlx_logging(false);

        let conn = Database::connect(options).await?;
        let storage = Self { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Default database location under the platform data directory.
    pub fn default_database_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map(|dir| dir.join(APP_DIR_NAME).join("tasksync.db"))
    }

    /// Create the tables from the entity definitions.
    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let mut tasks = schema.create_table_from_entity(task::Entity);
        tasks.if_not_exists();
        self.conn.execute(backend.build(&tasks)).await?;

        let mut notes = schema.create_table_from_entity(pending_note::Entity);
        notes.if_not_exists();
        self.conn.execute(backend.build(&notes)).await?;

        debug!("Schema ready");
        Ok(())
    }

    /// Check if the database holds any task.
    pub async fn has_data(&self) -> Result<bool> {
        Ok(task::Entity::find().one(&self.conn).await?.is_some())
    }

    /// Clear all data from the database (used on logout).
    pub async fn clear_all_data(&self) -> Result<()> {
        let tasks = TaskRepository::delete_all(&self.conn).await?;
        let notes = PendingNoteRepository::delete_all(&self.conn).await?;
        info!("🧹 Cleared {tasks} tasks and {notes} queued notes");
        Ok(())
    }
}
