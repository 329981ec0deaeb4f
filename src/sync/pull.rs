//! Pull phase: merge the server's task list into the local store.

use log::{debug, warn};

use super::{SyncReport, SyncService};
use crate::backend::{BackendError, RemoteTask, TaskQuery};

impl SyncService {
    /// Fetch the tasks matching `query` and write them locally.
    ///
    /// The server copy replaces the local one wholesale, except for records that
    /// are still dirty or tombstoned after the push phases: those keep their
    /// unpushed local state. Tasks missing from the response are left alone,
    /// since the query may simply filter them out.
    ///
    /// A failed fetch leaves the store untouched and is returned to the caller.
    pub(crate) async fn pull(&self, query: &TaskQuery, report: &mut SyncReport) -> Result<(), BackendError> {
        let remote_tasks = self.backend.fetch_tasks(query).await?;
        debug!("Pulled {} task(s) from {}", remote_tasks.len(), self.backend.backend_type());

        for remote in remote_tasks {
            self.merge_remote(remote, report).await;
        }

        Ok(())
    }

    /// Write one server task locally unless a pending local change would be lost.
    ///
    /// The pending check and the write happen in one store step, so an edit
    /// landing mid-pull is never overwritten. Returns true if the local record
    /// now mirrors the server.
    pub(crate) async fn merge_remote(&self, remote: RemoteTask, report: &mut SyncReport) -> bool {
        let id = remote.id.clone();
        match self.store.upsert_if_clean(remote.into_local()).await {
            Ok(true) => {
                report.tasks_pulled += 1;
                true
            }
            Ok(false) => {
                debug!("Keeping pending local copy of task {id}");
                false
            }
            Err(e) => {
                warn!("⚠️  Could not store pulled task {id}: {e}");
                report.notices.push(format!("Local store error: {e}"));
                false
            }
        }
    }
}
