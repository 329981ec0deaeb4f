//! Offline synchronization engine.
//!
//! This module provides the [`SyncService`] struct which reconciles the local
//! store with the task server. One cycle runs in a fixed order:
//!
//! 1. push tombstones (delete on the server, then purge locally)
//! 2. push dirty tasks (optimistic create, falling back to update on conflict)
//! 3. push notes queued while offline
//! 4. pull the authoritative list for the caller's query
//!
//! Pushing before pulling means the pull observes a server state that already
//! contains this device's changes. Every item is settled independently: one
//! failing item never stops the rest of its phase, and nothing raised by a
//! single item escapes the cycle.
//!
//! The service also offers the local edit operations the UI uses while
//! offline (see `tasks`).

pub mod attachments;
pub mod pull;
pub mod push;
pub mod resolver;
pub mod tasks;

use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::backend::{Backend, TaskQuery};
use crate::storage::TaskStore;
use attachments::{AttachmentResolver, FsAttachmentResolver};

/// Service that reconciles local edits with the task server.
///
/// Holds explicit handles to the store, the remote backend, and the attachment
/// resolver; it keeps no other state than the single-flight flag and the
/// current phase. Clones share that state.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use tasksync::backend::{factory, TaskQuery};
/// use tasksync::config::Config;
/// use tasksync::storage::LocalStorage;
/// use tasksync::sync::SyncService;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// let storage = Arc::new(LocalStorage::from_config(&config.storage).await?);
/// let backend = factory::create_backend(&config.server)?;
/// let sync_service = SyncService::new(storage, backend);
///
/// // Runs on a tokio worker; the caller keeps reading the store meanwhile.
/// let status = sync_service.spawn_cycle(TaskQuery::default()).await?;
/// println!("{status:?}");
///
/// let tasks = sync_service.visible_tasks().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn TaskStore>,
    backend: Arc<dyn Backend>,
    attachments: Arc<dyn AttachmentResolver>,
    sync_in_progress: Arc<AtomicBool>,
    phase: Arc<Mutex<SyncPhase>>,
}

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Pushing,
    Pulling,
}

/// Best-effort summary of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tombstones confirmed gone on the server and purged.
    pub deletes_pushed: usize,
    /// Dirty tasks accepted by the server (created or updated).
    pub tasks_pushed: usize,
    /// Queued notes accepted by the server.
    pub notes_pushed: usize,
    /// Attachments dropped because their source could not be read.
    pub attachments_dropped: usize,
    /// Server tasks written into the local store.
    pub tasks_pulled: usize,
    /// Dirty tasks still waiting after the cycle.
    pub pending_tasks: usize,
    /// Tombstones still waiting after the cycle.
    pub pending_deletes: usize,
    /// Notes still queued after the cycle.
    pub pending_notes: usize,
    /// Items that failed on the network during the push phases.
    pub network_failures: usize,
    /// Non-fatal notices (server rejections, local store faults).
    pub notices: Vec<String>,
}

impl SyncReport {
    /// Total items still waiting on the server.
    pub fn pending_total(&self) -> usize {
        self.pending_tasks + self.pending_deletes + self.pending_notes
    }
}

/// Outcome of a cycle request, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Another cycle was already running; this request was coalesced into it.
    InProgress,
    /// Push phases ran and the pull succeeded.
    Success(SyncReport),
    /// The pull failed; the local store is the last known good state.
    Offline {
        report: SyncReport,
        /// Human-readable reason the server could not be read
        message: String,
    },
}

impl SyncStatus {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncStatus::InProgress => None,
            SyncStatus::Success(report) | SyncStatus::Offline { report, .. } => Some(report),
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, SyncStatus::Offline { .. })
    }
}

/// Releases the single-flight flag and resets the phase, even if the cycle future is dropped.
struct CycleGuard<'a> {
    service: &'a SyncService,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.service.set_phase(SyncPhase::Idle);
        self.service.sync_in_progress.store(false, Ordering::Release);
    }
}

impl SyncService {
    /// Creates a sync service over an explicit store and backend.
    ///
    /// Attachment references are resolved as local file paths; use
    /// [`SyncService::with_attachment_resolver`] to change that.
    pub fn new(store: Arc<dyn TaskStore>, backend: Arc<dyn Backend>) -> Self {
        Self {
            store,
            backend,
            attachments: Arc::new(FsAttachmentResolver),
            sync_in_progress: Arc::new(AtomicBool::new(false)),
            phase: Arc::new(Mutex::new(SyncPhase::Idle)),
        }
    }

    /// Replace the attachment resolver.
    pub fn with_attachment_resolver(mut self, attachments: Arc<dyn AttachmentResolver>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Checks if a synchronization cycle is currently in progress.
    pub fn is_syncing(&self) -> bool {
        self.sync_in_progress.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase.lock().map(|phase| *phase).unwrap_or_default()
    }

    fn set_phase(&self, phase: SyncPhase) {
        if let Ok(mut current) = self.phase.lock() {
            *current = phase;
        }
    }

    /// Run one reconciliation cycle to completion.
    ///
    /// At most one cycle runs at a time: a call made while another cycle is in
    /// flight returns [`SyncStatus::InProgress`] immediately. Per-item faults
    /// are absorbed; the only caller-visible failure is an unreachable pull,
    /// reported as [`SyncStatus::Offline`].
    pub async fn run_cycle(&self, query: TaskQuery) -> SyncStatus {
        if self
            .sync_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("🔄 Sync already running, request coalesced");
            return SyncStatus::InProgress;
        }
        let _guard = CycleGuard { service: self };

        self.perform_cycle(&query).await
    }

    /// Run a cycle on a tokio worker.
    ///
    /// Dropping the handle abandons interest in the outcome; the cycle still
    /// completes, and every per-item transition it makes is final on its own.
    pub fn spawn_cycle(&self, query: TaskQuery) -> JoinHandle<SyncStatus> {
        let service = self.clone();
        tokio::spawn(async move { service.run_cycle(query).await })
    }

    async fn perform_cycle(&self, query: &TaskQuery) -> SyncStatus {
        info!("🔄 Starting sync cycle...");
        let mut report = SyncReport::default();

        self.set_phase(SyncPhase::Pushing);
        self.push_deletes(&mut report).await;
        self.push_tasks(&mut report).await;
        self.push_notes(&mut report).await;

        self.set_phase(SyncPhase::Pulling);
        let pulled = self.pull(query, &mut report).await;

        self.count_pending(&mut report).await;

        match pulled {
            Ok(()) => {
                info!(
                    "✅ Sync complete: {} deleted, {} pushed, {} notes, {} pulled, {} pending",
                    report.deletes_pushed,
                    report.tasks_pushed,
                    report.notes_pushed,
                    report.tasks_pulled,
                    report.pending_total()
                );
                SyncStatus::Success(report)
            }
            Err(e) => {
                warn!("📴 Pull failed, operating offline: {e}");
                SyncStatus::Offline {
                    report,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Fill the pending counters from the store's committed state.
    async fn count_pending(&self, report: &mut SyncReport) {
        match self.store.list_dirty().await {
            Ok(dirty) => report.pending_tasks = dirty.iter().filter(|t| !t.is_deleted).count(),
            Err(e) => warn!("⚠️  Could not count dirty tasks: {e}"),
        }
        match self.store.list_tombstoned().await {
            Ok(tombstones) => report.pending_deletes = tombstones.len(),
            Err(e) => warn!("⚠️  Could not count tombstones: {e}"),
        }
        match self.store.list_pending_notes().await {
            Ok(notes) => report.pending_notes = notes.len(),
            Err(e) => warn!("⚠️  Could not count queued notes: {e}"),
        }
    }
}
