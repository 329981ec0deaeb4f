//! Remote client abstraction.
//!
//! This module defines the interface the sync engine uses to reach the task server,
//! along with the wire types and error classification shared by all implementations.
//! Implementations never retry; retry policy belongs to the sync engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::task::{self, NoteList};

pub mod factory;
pub mod http;

/// Classified failure of a remote operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// No connectivity, timeout, or a connection dropped mid-response.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server answered 2xx with a body we could not decode.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl BackendError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }
}

/// Task as exchanged with the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub is_archived: Option<bool>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub notes: Option<Vec<task::Note>>,
}

impl From<&task::Model> for RemoteTask {
    fn from(local: &task::Model) -> Self {
        Self {
            id: local.id.clone(),
            title: local.title.clone(),
            category: local.category.clone(),
            content: local.content.clone(),
            priority: local.priority.clone(),
            start_date: local.start_date.clone(),
            due_date: local.due_date.clone(),
            is_archived: Some(local.is_archived),
            completed: local.completed,
            completed_at: local.completed_at.clone(),
            created_at: local.created_at.clone(),
            updated_at: local.updated_at.clone(),
            notes: Some(local.notes.0.clone()),
        }
    }
}

impl RemoteTask {
    /// Local record for an authoritative server copy: clean, not tombstoned.
    pub fn into_local(self) -> task::Model {
        task::Model {
            id: self.id,
            title: self.title,
            category: self.category,
            content: self.content,
            priority: self.priority,
            start_date: self.start_date,
            due_date: self.due_date,
            is_archived: self.is_archived.unwrap_or(false),
            completed: self.completed,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            notes: NoteList(self.notes.unwrap_or_default()),
            is_dirty: false,
            is_deleted: false,
            revision: 0,
        }
    }
}

/// Typed partial update of a task.
///
/// `None` leaves a field untouched. For nullable fields `Some(None)` clears the
/// value and is sent as an explicit `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
}

impl TaskPatch {
    /// Patch carrying every mutable field of `task`.
    pub fn full(task: &task::Model) -> Self {
        Self {
            title: Some(task.title.clone()),
            category: Some(task.category.clone()),
            content: Some(task.content.clone()),
            priority: Some(task.priority.clone()),
            start_date: Some(task.start_date.clone()),
            due_date: Some(task.due_date.clone()),
            completed: Some(task.completed),
            is_archived: Some(task.is_archived),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to a local record. Sync flags are left to the caller.
    pub fn apply_to(&self, task: &mut task::Model) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
        if let Some(content) = &self.content {
            task.content = content.clone();
        }
        if let Some(priority) = &self.priority {
            task.priority = priority.clone();
        }
        if let Some(start_date) = &self.start_date {
            task.start_date = start_date.clone();
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(is_archived) = self.is_archived {
            task.is_archived = is_archived;
        }
    }
}

/// Server-side ordering of the task list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Default,
    CreatedDesc,
    CreatedAsc,
    CompletedDesc,
    DueDate,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Default => "default",
            SortMode::CreatedDesc => "created_desc",
            SortMode::CreatedAsc => "created_asc",
            SortMode::CompletedDesc => "completed_desc",
            SortMode::DueDate => "due_date",
        }
    }
}

/// Display query forwarded to the server on pull. Opaque to the sync engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub sort_by: SortMode,
    pub show_archived: bool,
    pub search: Option<String>,
}

impl TaskQuery {
    /// Query-string pairs; unset filters are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("sort_by", self.sort_by.as_str().to_string())];
        if self.show_archived {
            pairs.push(("show_archived", "true".to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("q", search.to_string()));
        }
        pairs
    }
}

/// Binary attachment ready for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A note to create on the server. The id is client-generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNote {
    pub id: String,
    pub task_id: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

/// Edit of an existing note.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteEdit {
    pub content: Option<String>,
    pub new_attachments: Vec<Attachment>,
    /// Server-side file names of images to detach.
    pub deleted_attachments: Vec<String>,
}

/// Remote client contract consumed by the sync engine.
///
/// Every call is a single request. Failures are classified, never retried.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the backend type identifier (e.g., "http").
    fn backend_type(&self) -> &str;

    async fn fetch_tasks(&self, query: &TaskQuery) -> Result<Vec<RemoteTask>, BackendError>;
    async fn fetch_task(&self, id: &str) -> Result<RemoteTask, BackendError>;

    async fn create_task(&self, task: &RemoteTask) -> Result<(), BackendError>;
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), BackendError>;
    async fn delete_task(&self, id: &str) -> Result<(), BackendError>;

    async fn create_note(&self, note: &NewNote) -> Result<(), BackendError>;
    async fn update_note(&self, id: &str, edit: &NoteEdit) -> Result<(), BackendError>;
    async fn delete_note(&self, id: &str) -> Result<(), BackendError>;
}
