//! Scheduler error taxonomy.
//!
//! Every error a scheduler method can return maps to exactly one wire code;
//! the boundary crate performs that mapping. Errors are local to the call:
//! each public method is a single critical section, so a failed precondition
//! leaves no partial state behind. `DeadlockDetected` and `Internal` are
//! fatal: they put the scheduler into the disabled terminal state, and every
//! subsequent call returns `SchedulerDisabled` until detach.

use crate::operation::OperationId;
use crate::resource::ResourceId;

/// Errors returned by scheduler operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// No operation is enabled but uncompleted operations remain.
    #[error("deadlock detected: no operation is enabled but {pending} uncompleted operations remain")]
    DeadlockDetected {
        /// Number of operations that have neither completed nor been canceled.
        pending: usize,
    },

    /// An operation with this id already exists and is not in a terminal
    /// state.
    #[error("operation {0:032x} already exists")]
    DuplicateOperation(OperationId),

    /// No operation with this id is known to the scheduler.
    #[error("operation {0:032x} does not exist")]
    NotExistingOperation(OperationId),

    /// The reserved main operation cannot be created explicitly.
    #[error("operation {0:032x} is the main operation and cannot be created explicitly")]
    MainOperationExplicitlyCreated(OperationId),

    /// The reserved main operation cannot be started explicitly.
    #[error("operation {0:032x} is the main operation and cannot be started explicitly")]
    MainOperationExplicitlyStarted(OperationId),

    /// The reserved main operation cannot be targeted by an explicit
    /// lifecycle call.
    #[error("operation {0:032x} is the main operation and cannot be completed explicitly")]
    MainOperationExplicitlyCompleted(OperationId),

    /// The operation exists but has never been started.
    #[error("operation {0:032x} has not been started")]
    OperationNotStarted(OperationId),

    /// The operation was already started.
    #[error("operation {0:032x} has already been started")]
    OperationAlreadyStarted(OperationId),

    /// The operation already reached a terminal state.
    #[error("operation {0:032x} has already completed")]
    OperationAlreadyCompleted(OperationId),

    /// A resource with this id already exists.
    #[error("resource {0:032x} already exists")]
    DuplicateResource(ResourceId),

    /// No resource with this id is known to the scheduler.
    #[error("resource {0:032x} does not exist")]
    NotExistingResource(ResourceId),

    /// A program is already attached to this scheduler.
    #[error("a client is already attached to this scheduler")]
    ClientAttached,

    /// No program is attached to this scheduler.
    #[error("no client is attached to this scheduler")]
    ClientNotAttached,

    /// An internal invariant was violated.
    #[error("internal scheduler error: {0}")]
    Internal(String),

    /// The scheduler entered its disabled terminal state after a fatal error.
    #[error("scheduler is disabled after a fatal error; detach to recover")]
    SchedulerDisabled,
}

impl SchedulerError {
    /// Whether this error disables the scheduler until the next detach.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SchedulerError::DeadlockDetected { .. } | SchedulerError::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_disable() {
        assert!(SchedulerError::DeadlockDetected { pending: 1 }.is_fatal());
        assert!(SchedulerError::Internal("bad".into()).is_fatal());
        assert!(!SchedulerError::ClientAttached.is_fatal());
        assert!(!SchedulerError::DuplicateOperation(7).is_fatal());
    }

    #[test]
    fn ids_format_as_canonical_hex() {
        let err = SchedulerError::NotExistingOperation(0xdead_beef);
        assert_eq!(
            err.to_string(),
            "operation 000000000000000000000000deadbeef does not exist"
        );
    }
}
