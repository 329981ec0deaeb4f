//! Shared fixtures: an in-process task server and a store/service factory.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

use tasksync::backend::{Attachment, Backend, BackendError, NewNote, NoteEdit, RemoteTask, TaskPatch, TaskQuery};
use tasksync::entities::task::{self, ImageInfo, Note};
use tasksync::storage::LocalStorage;
use tasksync::sync::attachments::{AttachmentError, AttachmentResolver};
use tasksync::sync::SyncService;

#[derive(Default)]
struct ServerState {
    tasks: BTreeMap<String, task::Model>,
    uploaded_notes: Vec<NewNote>,
    calls: Vec<String>,
    offline: bool,
    failures: HashMap<String, BackendError>,
    gates: HashMap<String, oneshot::Receiver<()>>,
}

/// Scripted task server living in memory.
///
/// Behaves like the real API: duplicate ids on create answer 409, unknown ids
/// answer 404. Failures can be forced per call with [`FakeBackend::fail`] or
/// globally with [`FakeBackend::set_offline`].
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<ServerState>,
    /// Signalled when a call reaches a gate set with [`FakeBackend::block_next`].
    pub entered: Notify,
}

pub fn http_error(status: u16) -> BackendError {
    BackendError::Http {
        status,
        message: format!("status {status}"),
    }
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a task that already exists on the server.
    pub fn seed(&self, task: task::Model) {
        let clean = task::Model {
            is_dirty: false,
            is_deleted: false,
            revision: 0,
            ..task
        };
        self.state.lock().unwrap().tasks.insert(clean.id.clone(), clean);
    }

    pub fn remote_task(&self, id: &str) -> Option<task::Model> {
        self.state.lock().unwrap().tasks.get(id).cloned()
    }

    pub fn remote_count(&self) -> usize {
        self.state.lock().unwrap().tasks.len()
    }

    pub fn uploaded_notes(&self) -> Vec<NewNote> {
        self.state.lock().unwrap().uploaded_notes.clone()
    }

    /// Calls received so far, as `"<operation> <id>"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Make every call fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Make `operation` on `id` fail with `err` until cleared.
    pub fn fail(&self, operation: &str, id: &str, err: BackendError) {
        self.state.lock().unwrap().failures.insert(format!("{operation} {id}"), err);
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    /// Hold the next call to `operation` until the returned sender fires.
    pub fn block_next(&self, operation: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().gates.insert(operation.to_string(), rx);
        tx
    }

    async fn pass_gate(&self, operation: &str) {
        let gate = self.state.lock().unwrap().gates.remove(operation);
        if let Some(gate) = gate {
            self.entered.notify_one();
            let _ = gate.await;
        }
    }

    /// Record the call and return the scripted failure, if any.
    fn enter(&self, operation: &str, id: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        let call = format!("{operation} {id}");
        state.calls.push(call.clone());
        if state.offline {
            return Err(BackendError::Network("connection refused".to_string()));
        }
        match state.failures.get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn backend_type(&self) -> &str {
        "fake"
    }

    async fn fetch_tasks(&self, query: &TaskQuery) -> Result<Vec<RemoteTask>, BackendError> {
        self.pass_gate("fetch_tasks").await;
        self.enter("fetch_tasks", "*")?;
        let state = self.state.lock().unwrap();
        let search = query.search.as_deref().map(str::to_lowercase);
        Ok(state
            .tasks
            .values()
            .filter(|t| t.is_archived == query.show_archived)
            .filter(|t| search.as_deref().map_or(true, |s| t.title.to_lowercase().contains(s)))
            .map(RemoteTask::from)
            .collect())
    }

    async fn fetch_task(&self, id: &str) -> Result<RemoteTask, BackendError> {
        self.enter("fetch_task", id)?;
        let state = self.state.lock().unwrap();
        state.tasks.get(id).map(RemoteTask::from).ok_or_else(|| http_error(404))
    }

    async fn create_task(&self, task: &RemoteTask) -> Result<(), BackendError> {
        self.pass_gate("create_task").await;
        self.enter("create_task", &task.id)?;
        let mut state = self.state.lock().unwrap();
        if state.tasks.contains_key(&task.id) {
            return Err(http_error(409));
        }
        let mut stored = task.clone().into_local();
        // Notes are only ever added through the notes endpoint.
        stored.notes.0.clear();
        state.tasks.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), BackendError> {
        self.enter("update_task", id)?;
        let mut state = self.state.lock().unwrap();
        let stored = state.tasks.get_mut(id).ok_or_else(|| http_error(404))?;
        patch.apply_to(stored);
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<(), BackendError> {
        self.enter("delete_task", id)?;
        let mut state = self.state.lock().unwrap();
        state.tasks.remove(id).map(|_| ()).ok_or_else(|| http_error(404))
    }

    async fn create_note(&self, note: &NewNote) -> Result<(), BackendError> {
        self.enter("create_note", &note.id)?;
        let mut state = self.state.lock().unwrap();
        let stored = state.tasks.get_mut(&note.task_id).ok_or_else(|| http_error(404))?;
        stored.notes.0.push(Note {
            id: note.id.clone(),
            content: note.content.clone(),
            images_info: note
                .attachments
                .iter()
                .map(|a| ImageInfo {
                    filename: Some(a.filename.clone()),
                    ..Default::default()
                })
                .collect(),
        });
        state.uploaded_notes.push(note.clone());
        Ok(())
    }

    async fn update_note(&self, id: &str, edit: &NoteEdit) -> Result<(), BackendError> {
        self.enter("update_note", id)?;
        let mut state = self.state.lock().unwrap();
        let note = state
            .tasks
            .values_mut()
            .flat_map(|t| t.notes.0.iter_mut())
            .find(|n| n.id == id)
            .ok_or_else(|| http_error(404))?;
        if let Some(content) = &edit.content {
            note.content = content.clone();
        }
        note.images_info
            .retain(|info| !edit.deleted_attachments.iter().any(|name| info.filename.as_ref() == Some(name)));
        note.images_info.extend(edit.new_attachments.iter().map(|a| ImageInfo {
            filename: Some(a.filename.clone()),
            ..Default::default()
        }));
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> Result<(), BackendError> {
        self.enter("delete_note", id)?;
        let mut state = self.state.lock().unwrap();
        for task in state.tasks.values_mut() {
            if let Some(pos) = task.notes.0.iter().position(|n| n.id == id) {
                task.notes.0.remove(pos);
                return Ok(());
            }
        }
        Err(http_error(404))
    }
}

/// Resolves references from a fixed in-memory table; anything else is unreadable.
#[derive(Default)]
pub struct MapResolver {
    pub files: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl AttachmentResolver for MapResolver {
    async fn resolve(&self, reference: &str) -> Result<Attachment, AttachmentError> {
        self.files
            .get(reference)
            .map(|bytes| Attachment {
                filename: reference.rsplit('/').next().unwrap_or(reference).to_string(),
                bytes: bytes.clone(),
            })
            .ok_or_else(|| AttachmentError {
                reference: reference.to_string(),
                reason: "No such file".to_string(),
            })
    }
}

pub struct Harness {
    pub storage: Arc<LocalStorage>,
    pub backend: Arc<FakeBackend>,
    pub service: SyncService,
}

pub async fn harness() -> Harness {
    let storage = Arc::new(LocalStorage::in_memory().await.unwrap());
    let backend = FakeBackend::new();
    let service = SyncService::new(storage.clone(), backend.clone());
    Harness {
        storage,
        backend,
        service,
    }
}

/// A task as it would come back from the server.
pub fn remote(id: &str, title: &str) -> task::Model {
    task::Model {
        id: id.to_string(),
        title: title.to_string(),
        category: None,
        content: None,
        priority: Some("Normal".to_string()),
        start_date: None,
        due_date: None,
        is_archived: false,
        completed: false,
        completed_at: None,
        created_at: Some("2025-01-01 10:00".to_string()),
        updated_at: None,
        notes: Default::default(),
        is_dirty: false,
        is_deleted: false,
        revision: 0,
    }
}

/// A task created on this device and not yet pushed.
pub fn dirty(id: &str, title: &str) -> task::Model {
    task::Model {
        is_dirty: true,
        ..remote(id, title)
    }
}

/// A task whose deletion is pending.
pub fn tombstone(id: &str, title: &str) -> task::Model {
    task::Model {
        is_deleted: true,
        ..remote(id, title)
    }
}
