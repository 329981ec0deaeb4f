//! Conflict resolution policy.
//!
//! Pure decision functions applied to the outcome of every push operation. The
//! resolver never raises: anything it cannot turn into a success or a retry is
//! left pending for the next cycle.

use crate::backend::BackendError;

/// Push operation whose outcome is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateTask,
    UpdateTask,
    DeleteTask,
    CreateNote,
}

/// How a failed operation is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Unreachable server or timeout.
    Network,
    /// 409: the identifier already exists.
    Conflict,
    /// 404: the resource does not exist.
    NotFound,
    /// Any other status, or an unreadable response.
    Other,
}

/// What the engine does next with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Settle the item locally (clear dirty, purge, or dequeue).
    Succeeded,
    /// Re-issue the same logical change as an update.
    RetryAsUpdate,
    /// Leave the item untouched until the next cycle.
    LeavePending(FailureKind),
}

pub fn classify(err: &BackendError) -> FailureKind {
    match err {
        BackendError::Network(_) => FailureKind::Network,
        BackendError::Http { status: 409, .. } => FailureKind::Conflict,
        BackendError::Http { status: 404, .. } => FailureKind::NotFound,
        BackendError::Http { .. } | BackendError::InvalidData(_) => FailureKind::Other,
    }
}

/// Decide the next step for an operation outcome.
pub fn resolve<T>(operation: Operation, outcome: &Result<T, BackendError>) -> Resolution {
    let err = match outcome {
        Ok(_) => return Resolution::Succeeded,
        Err(err) => err,
    };

    match (operation, classify(err)) {
        // Already created by an earlier push whose response was lost.
        (Operation::CreateTask, FailureKind::Conflict) => Resolution::RetryAsUpdate,
        // Already gone is what a delete wants.
        (Operation::DeleteTask, FailureKind::NotFound) => Resolution::Succeeded,
        (_, kind) => Resolution::LeavePending(kind),
    }
}
