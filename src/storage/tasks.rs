use anyhow::Result;
use log::debug;
use sea_orm::TransactionTrait;

use super::db::LocalStorage;
use crate::entities::task;
use crate::repositories::{PendingNoteRepository, TaskRepository};

impl LocalStorage {
    /// Tasks for display: everything except tombstones.
    pub async fn get_visible_tasks(&self) -> Result<Vec<task::Model>> {
        TaskRepository::get_visible(&self.conn).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<task::Model>> {
        TaskRepository::get_by_id(&self.conn, id).await
    }

    /// Insert or replace a task. The caller sets the sync flags.
    pub async fn store_task(&self, task: task::Model) -> Result<()> {
        TaskRepository::upsert(&self.conn, task).await
    }

    /// Store a server copy unless the local one still has unpushed changes.
    pub async fn store_task_if_clean(&self, task: task::Model) -> Result<bool> {
        TaskRepository::upsert_if_clean(&self.conn, task).await
    }

    /// Clear the dirty flag if nothing rewrote the task since `revision`.
    pub async fn mark_task_clean(&self, id: &str, revision: i64) -> Result<bool> {
        TaskRepository::mark_clean_if_unchanged(&self.conn, id, revision).await
    }

    pub async fn get_dirty_tasks(&self) -> Result<Vec<task::Model>> {
        TaskRepository::get_dirty(&self.conn).await
    }

    pub async fn get_tombstoned_tasks(&self) -> Result<Vec<task::Model>> {
        TaskRepository::get_tombstoned(&self.conn).await
    }

    /// Physically remove a task after the server confirmed it is gone.
    ///
    /// Notes still queued for the task go with it in the same transaction;
    /// the server would reject them now.
    pub async fn purge_task(&self, id: &str) -> Result<bool> {
        let txn = self.conn.begin().await?;
        let removed = TaskRepository::purge(&txn, id).await?;
        let notes = PendingNoteRepository::remove_for_task(&txn, id).await?;
        txn.commit().await?;

        if notes > 0 {
            debug!("Dropped {notes} queued notes of purged task {id}");
        }
        Ok(removed)
    }
}
