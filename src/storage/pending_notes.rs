use anyhow::Result;

use super::db::LocalStorage;
use crate::entities::pending_note;
use crate::repositories::PendingNoteRepository;

impl LocalStorage {
    pub async fn enqueue_pending_note(&self, note: pending_note::Model) -> Result<()> {
        PendingNoteRepository::enqueue(&self.conn, note).await
    }

    /// Queued notes in authoring order.
    pub async fn get_pending_notes(&self) -> Result<Vec<pending_note::Model>> {
        PendingNoteRepository::get_all(&self.conn).await
    }

    pub async fn count_pending_notes(&self) -> Result<u64> {
        PendingNoteRepository::count(&self.conn).await
    }

    pub async fn remove_pending_note(&self, id: &str) -> Result<bool> {
        PendingNoteRepository::remove(&self.conn, id).await
    }
}
