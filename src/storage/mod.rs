//! Local storage module for offline task data
//!
//! This module provides database operations using SeaORM for:
//! - Tasks, with their dirty/tombstone sync flags and embedded notes
//! - Notes authored offline and queued for upload
//!
//! The sync engine does not talk to [`LocalStorage`] directly; it consumes the
//! narrow [`TaskStore`] interface so any atomic record store can stand in.

pub mod db;
pub mod pending_notes;
pub mod tasks;

pub use db::LocalStorage;

use anyhow::Result;
use async_trait::async_trait;

use crate::entities::{pending_note, task};

/// Record store consumed by the sync engine.
///
/// Each operation is atomic for a single record. A failing operation affects
/// only the record it targets.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks that are not tombstoned.
    async fn list_visible(&self) -> Result<Vec<task::Model>>;
    async fn get_by_id(&self, id: &str) -> Result<Option<task::Model>>;
    /// Insert or fully replace by id.
    async fn upsert(&self, task: task::Model) -> Result<()>;
    /// Insert or replace by id unless the stored record is dirty or
    /// tombstoned, as one atomic step. Returns whether it was written.
    async fn upsert_if_clean(&self, task: task::Model) -> Result<bool>;
    /// Clear `is_dirty` if the record still carries `revision`, as one atomic
    /// step. Returns whether the flag was cleared.
    async fn mark_clean_if_unchanged(&self, id: &str, revision: i64) -> Result<bool>;
    /// All tasks with `is_dirty` set, tombstoned or not.
    async fn list_dirty(&self) -> Result<Vec<task::Model>>;
    /// All tasks with `is_deleted` set.
    async fn list_tombstoned(&self) -> Result<Vec<task::Model>>;
    /// Remove a task together with the notes queued for it.
    async fn purge(&self, id: &str) -> Result<()>;

    async fn enqueue_pending_note(&self, note: pending_note::Model) -> Result<()>;
    async fn list_pending_notes(&self) -> Result<Vec<pending_note::Model>>;
    async fn remove_pending_note(&self, id: &str) -> Result<()>;

    /// Drop every task and queued note.
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl TaskStore for LocalStorage {
    async fn list_visible(&self) -> Result<Vec<task::Model>> {
        self.get_visible_tasks().await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<task::Model>> {
        self.get_task(id).await
    }

    async fn upsert(&self, task: task::Model) -> Result<()> {
        self.store_task(task).await
    }

    async fn upsert_if_clean(&self, task: task::Model) -> Result<bool> {
        self.store_task_if_clean(task).await
    }

    async fn mark_clean_if_unchanged(&self, id: &str, revision: i64) -> Result<bool> {
        self.mark_task_clean(id, revision).await
    }

    async fn list_dirty(&self) -> Result<Vec<task::Model>> {
        self.get_dirty_tasks().await
    }

    async fn list_tombstoned(&self) -> Result<Vec<task::Model>> {
        self.get_tombstoned_tasks().await
    }

    async fn purge(&self, id: &str) -> Result<()> {
        self.purge_task(id).await.map(|_| ())
    }

    async fn enqueue_pending_note(&self, note: pending_note::Model) -> Result<()> {
        LocalStorage::enqueue_pending_note(self, note).await
    }

    async fn list_pending_notes(&self) -> Result<Vec<pending_note::Model>> {
        self.get_pending_notes().await
    }

    async fn remove_pending_note(&self, id: &str) -> Result<()> {
        LocalStorage::remove_pending_note(self, id).await.map(|_| ())
    }

    async fn clear(&self) -> Result<()> {
        self.clear_all_data().await
    }
}
