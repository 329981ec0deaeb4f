use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat, Utc};
use log::info;
use uuid::Uuid;

use crate::backend::{Attachment, NoteEdit, TaskPatch};
use crate::constants::{DEFAULT_PRIORITY, WIRE_DATETIME_FORMAT};
use crate::entities::pending_note::{self, AttachmentRefs};
use crate::entities::task::{self, Note, NoteList};
use crate::sync::{SyncReport, SyncService};

/// Fields of a task authored on this device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub category: Option<String>,
    pub content: Option<String>,
    /// Defaults to `Normal` when unset
    pub priority: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

fn now_stamp() -> String {
    Local::now().format(WIRE_DATETIME_FORMAT).to_string()
}

impl SyncService {
    /// Tasks for display, tombstones excluded. Reads never wait on a running cycle.
    pub async fn visible_tasks(&self) -> Result<Vec<task::Model>> {
        self.store.list_visible().await
    }

    /// Get a single task by id, tombstoned or not.
    pub async fn get_task(&self, id: &str) -> Result<Option<task::Model>> {
        self.store.get_by_id(id).await
    }

    /// Notes still waiting to be uploaded.
    pub async fn pending_notes(&self) -> Result<Vec<pending_note::Model>> {
        self.store.list_pending_notes().await
    }

    /// Load a task that edits may target: present and not tombstoned.
    async fn editable_task(&self, id: &str) -> Result<task::Model> {
        match self.store.get_by_id(id).await? {
            Some(task) if !task.is_deleted => Ok(task),
            Some(_) => anyhow::bail!("Task {id} is pending deletion"),
            None => anyhow::bail!("Task {id} not found"),
        }
    }

    /// Creates a task locally with a fresh client-generated id.
    ///
    /// The task is stored dirty and reaches the server on the next cycle.
    ///
    /// # Errors
    /// Returns an error if the title is blank or local storage fails
    pub async fn create_task(&self, draft: TaskDraft) -> Result<task::Model> {
        let title = draft.title.trim();
        if title.is_empty() {
            anyhow::bail!("Task title cannot be empty");
        }

        let now = now_stamp();
        let task = task::Model {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            category: draft.category,
            content: draft.content,
            priority: Some(draft.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string())),
            start_date: draft.start_date,
            due_date: draft.due_date,
            is_archived: false,
            completed: false,
            completed_at: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            notes: NoteList::default(),
            is_dirty: true,
            is_deleted: false,
            revision: 0,
        };

        self.store.upsert(task.clone()).await?;
        info!("➕ Created task {} locally", task.id);
        Ok(task)
    }

    /// Applies a patch to the local copy and marks it dirty.
    ///
    /// # Errors
    /// Returns an error if the task is unknown or tombstoned, or if the patch blanks the title
    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<task::Model> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            anyhow::bail!("Task title cannot be empty");
        }

        let mut task = self.editable_task(id).await?;
        if patch.is_empty() {
            return Ok(task);
        }

        patch.apply_to(&mut task);
        if let Some(completed) = patch.completed {
            task.completed_at = completed.then(now_stamp);
        }
        task.updated_at = Some(now_stamp());
        task.is_dirty = true;
        // Mirrors the bump the store applies when it replaces the row.
        task.revision += 1;

        self.store.upsert(task.clone()).await?;
        Ok(task)
    }

    /// Toggle completion, stamping or clearing `completed_at`.
    pub async fn set_completed(&self, id: &str, completed: bool) -> Result<task::Model> {
        let patch = TaskPatch {
            completed: Some(completed),
            ..Default::default()
        };
        self.update_task(id, &patch).await
    }

    /// Marks a task for deletion.
    ///
    /// The task disappears from [`SyncService::visible_tasks`] immediately and is
    /// purged once the server confirms it is gone.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let mut task = self
            .store
            .get_by_id(id)
            .await?
            .with_context(|| format!("Task {id} not found"))?;
        if task.is_deleted {
            return Ok(());
        }

        task.is_deleted = true;
        task.is_dirty = true;
        self.store.upsert(task).await?;
        info!("🗑️  Task {id} marked for deletion");
        Ok(())
    }

    /// Queues a note for upload and shows its text on the task right away.
    ///
    /// `attachments` are opaque references resolved at push time. The task's own
    /// dirty flag is not touched: the note travels on its own queue.
    pub async fn add_note(&self, task_id: &str, content: &str, attachments: Vec<String>) -> Result<pending_note::Model> {
        let mut task = self.editable_task(task_id).await?;

        let note = pending_note::Model {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            content: content.to_string(),
            attachments: AttachmentRefs(attachments),
            // UTC with a fixed width, so the queue sorts by authoring time as text.
            queued_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };
        self.store.enqueue_pending_note(note.clone()).await?;

        task.notes.0.push(Note {
            id: note.id.clone(),
            content: note.content.clone(),
            images_info: Vec::new(),
        });
        self.store.upsert(task).await?;

        info!("📝 Queued note {} for task {task_id}", note.id);
        Ok(note)
    }

    /// Edit a note on the server, then refresh its task.
    ///
    /// Note edits are not queued: this fails when the server is unreachable.
    pub async fn edit_note(
        &self,
        task_id: &str,
        note_id: &str,
        content: Option<String>,
        new_attachments: Vec<Attachment>,
        deleted_attachments: Vec<String>,
    ) -> Result<()> {
        let edit = NoteEdit {
            content,
            new_attachments,
            deleted_attachments,
        };
        self.backend
            .update_note(note_id, &edit)
            .await
            .map_err(|e| anyhow::anyhow!("Backend error: {}", e))?;

        self.refresh_task(task_id).await?;
        Ok(())
    }

    /// Delete a note on the server, then refresh its task.
    pub async fn remove_note(&self, task_id: &str, note_id: &str) -> Result<()> {
        self.backend
            .delete_note(note_id)
            .await
            .map_err(|e| anyhow::anyhow!("Backend error: {}", e))?;

        self.refresh_task(task_id).await?;
        Ok(())
    }

    /// Re-fetch one task from the server.
    ///
    /// A local copy that is still dirty or tombstoned is kept. Returns true if
    /// the local record was replaced.
    pub async fn refresh_task(&self, id: &str) -> Result<bool> {
        let remote = self
            .backend
            .fetch_task(id)
            .await
            .map_err(|e| anyhow::anyhow!("Backend error: {}", e))?;

        let mut report = SyncReport::default();
        let merged = self.merge_remote(remote, &mut report).await;
        if let Some(notice) = report.notices.into_iter().next() {
            anyhow::bail!(notice);
        }
        Ok(merged)
    }

    /// Drop every local task and queued note (logout).
    pub async fn clear_local_data(&self) -> Result<()> {
        self.store.clear().await.context("Failed to clear local data")
    }
}
