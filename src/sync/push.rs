//! Push phases of a sync cycle.
//!
//! Each phase walks its pending items one at a time and settles them
//! independently. Local store faults and remote failures are logged and
//! recorded in the [`SyncReport`]; they never abort the phase.

use log::{debug, info, warn};

use super::resolver::{resolve, FailureKind, Operation, Resolution};
use super::{SyncReport, SyncService};
use crate::backend::{BackendError, NewNote, RemoteTask, TaskPatch};
use crate::entities::{pending_note, task};

impl SyncService {
    /// Delete every tombstoned task on the server and purge the confirmed ones.
    pub(crate) async fn push_deletes(&self, report: &mut SyncReport) {
        let tombstones = match self.store.list_tombstoned().await {
            Ok(tombstones) => tombstones,
            Err(e) => {
                warn!("⚠️  Could not read tombstoned tasks: {e}");
                report.notices.push(format!("Local store error: {e}"));
                return;
            }
        };

        if !tombstones.is_empty() {
            info!("🗑️  Pushing {} deletion(s)", tombstones.len());
        }

        for tombstone in tombstones {
            let outcome = self.backend.delete_task(&tombstone.id).await;
            match resolve(Operation::DeleteTask, &outcome) {
                Resolution::Succeeded => match self.store.purge(&tombstone.id).await {
                    Ok(()) => {
                        debug!("Purged task {} and its queued notes", tombstone.id);
                        report.deletes_pushed += 1;
                    }
                    Err(e) => {
                        warn!("⚠️  Server deleted task {} but purge failed: {e}", tombstone.id);
                        report.notices.push(format!("Local store error: {e}"));
                    }
                },
                Resolution::RetryAsUpdate => {}
                Resolution::LeavePending(kind) => {
                    Self::record_failure(report, "delete task", &tombstone.id, kind, &outcome);
                }
            }
        }
    }

    /// Push every dirty, non-tombstoned task: create first, update on a duplicate id.
    pub(crate) async fn push_tasks(&self, report: &mut SyncReport) {
        let dirty = match self.store.list_dirty().await {
            Ok(dirty) => dirty,
            Err(e) => {
                warn!("⚠️  Could not read dirty tasks: {e}");
                report.notices.push(format!("Local store error: {e}"));
                return;
            }
        };
        let dirty: Vec<task::Model> = dirty.into_iter().filter(|t| !t.is_deleted).collect();

        if !dirty.is_empty() {
            info!("📤 Pushing {} task change(s)", dirty.len());
        }

        for task in dirty {
            if self.push_task(&task, report).await {
                self.mark_pushed(&task, report).await;
            }
        }
    }

    /// Returns true once the server holds `task`.
    async fn push_task(&self, task: &task::Model, report: &mut SyncReport) -> bool {
        let created = self.backend.create_task(&RemoteTask::from(task)).await;
        match resolve(Operation::CreateTask, &created) {
            Resolution::Succeeded => true,
            Resolution::RetryAsUpdate => {
                debug!("Task {} already exists on the server, updating instead", task.id);
                let updated = self.backend.update_task(&task.id, &TaskPatch::full(task)).await;
                match resolve(Operation::UpdateTask, &updated) {
                    Resolution::Succeeded => true,
                    Resolution::RetryAsUpdate => false,
                    Resolution::LeavePending(kind) => {
                        Self::record_failure(report, "update task", &task.id, kind, &updated);
                        false
                    }
                }
            }
            Resolution::LeavePending(kind) => {
                Self::record_failure(report, "create task", &task.id, kind, &created);
                false
            }
        }
    }

    /// Clear the dirty flag of a pushed task, unless it was rewritten while the push was in flight.
    async fn mark_pushed(&self, pushed: &task::Model, report: &mut SyncReport) {
        match self.store.mark_clean_if_unchanged(&pushed.id, pushed.revision).await {
            Ok(true) => report.tasks_pushed += 1,
            Ok(false) => {
                // The newer local edit goes out on the next cycle.
                debug!("Task {} changed during push, keeping it dirty", pushed.id);
                report.tasks_pushed += 1;
            }
            Err(e) => {
                warn!("⚠️  Task {} pushed but could not be marked clean: {e}", pushed.id);
                report.notices.push(format!("Local store error: {e}"));
            }
        }
    }

    /// Upload every queued note, dropping attachments that can no longer be read.
    pub(crate) async fn push_notes(&self, report: &mut SyncReport) {
        let queued = match self.store.list_pending_notes().await {
            Ok(queued) => queued,
            Err(e) => {
                warn!("⚠️  Could not read queued notes: {e}");
                report.notices.push(format!("Local store error: {e}"));
                return;
            }
        };

        if !queued.is_empty() {
            info!("📝 Pushing {} queued note(s)", queued.len());
        }

        for pending in queued {
            let note = self.prepare_note(&pending, report).await;
            let outcome = self.backend.create_note(&note).await;
            match resolve(Operation::CreateNote, &outcome) {
                Resolution::Succeeded => match self.store.remove_pending_note(&pending.id).await {
                    Ok(()) => report.notes_pushed += 1,
                    Err(e) => {
                        warn!("⚠️  Note {} uploaded but could not be dequeued: {e}", pending.id);
                        report.notices.push(format!("Local store error: {e}"));
                    }
                },
                Resolution::RetryAsUpdate => {}
                Resolution::LeavePending(kind) => {
                    Self::record_failure(report, "create note", &pending.id, kind, &outcome);
                }
            }
        }
    }

    async fn prepare_note(&self, pending: &pending_note::Model, report: &mut SyncReport) -> NewNote {
        let mut attachments = Vec::with_capacity(pending.attachments.0.len());
        for reference in &pending.attachments.0 {
            match self.attachments.resolve(reference).await {
                Ok(attachment) => attachments.push(attachment),
                Err(e) => {
                    warn!("🖼️  Dropping attachment from note {}: {e}", pending.id);
                    report.attachments_dropped += 1;
                }
            }
        }

        NewNote {
            id: pending.id.clone(),
            task_id: pending.task_id.clone(),
            content: pending.content.clone(),
            attachments,
        }
    }

    fn record_failure<T>(
        report: &mut SyncReport,
        action: &str,
        id: &str,
        kind: FailureKind,
        outcome: &Result<T, BackendError>,
    ) {
        let reason = match outcome {
            Ok(_) => return,
            Err(e) => e,
        };

        if kind == FailureKind::Network {
            debug!("Could not {action} {id}, server unreachable: {reason}");
            report.network_failures += 1;
        } else {
            warn!("⚠️  Could not {action} {id}: {reason}");
            report.notices.push(format!("Could not {action} {id}: {reason}"));
        }
    }
}
