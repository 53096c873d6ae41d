//! Controlled operations.
//!
//! An operation is the unit of scheduling: one remote activity in the
//! program under test. Operations reference each other through their
//! wait/signal sets; those sets hold stable `SequenceId` handles into the
//! scheduler's operation table rather than owning pointers, which keeps the
//! object graph acyclic and removal O(1).
//!
//! # Invariants
//!
//! - `status == Enabled` exactly when the scheduler's enabled set contains
//!   this operation
//! - For every `w` in `wait_operations`, the operation's own sequence id is
//!   in `w.signal_operations` (back-links are symmetric)
//! - A terminal operation (`Completed`, `Canceled`) transitions no further
//!   except via `reset`

use std::collections::BTreeSet;

/// Globally unique id of a remote operation, assigned by the client.
pub type OperationId = u128;

/// Monotonically increasing key assigned on first creation within a session.
///
/// This is the stable handle passed to strategies and recorded in traces.
pub type SequenceId = u64;

/// Lifecycle state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// Created but not yet started.
    None,
    /// Ready to run and eligible for selection.
    Enabled,
    /// Blocked until every operation in the wait set completes.
    BlockedOnWaitAll,
    /// Blocked until any operation in the wait set completes.
    BlockedOnWaitAny,
    /// Blocked until a resource signals it.
    BlockedOnResource,
    /// Finished normally.
    Completed,
    /// Terminated by cancellation (detach).
    Canceled,
}

impl OperationStatus {
    /// Whether this is a terminal state.
    pub fn is_completed(self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Canceled)
    }

    /// Whether the operation is blocked on other operations or a resource.
    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            OperationStatus::BlockedOnWaitAll
                | OperationStatus::BlockedOnWaitAny
                | OperationStatus::BlockedOnResource
        )
    }
}

/// One controlled operation.
#[derive(Debug, Clone)]
pub struct Operation {
    id: OperationId,
    sequence_id: SequenceId,
    status: OperationStatus,
    /// Operations this one is blocked on.
    wait_operations: BTreeSet<SequenceId>,
    /// Operations to re-evaluate when this one completes.
    signal_operations: BTreeSet<SequenceId>,
}

impl Operation {
    /// Create a fresh operation in the `None` state.
    pub fn new(id: OperationId, sequence_id: SequenceId) -> Self {
        Self {
            id,
            sequence_id,
            status: OperationStatus::None,
            wait_operations: BTreeSet::new(),
            signal_operations: BTreeSet::new(),
        }
    }

    /// The client-assigned id.
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// The session-stable sequence id.
    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Handles of the operations this one is blocked on.
    pub fn wait_operations(&self) -> &BTreeSet<SequenceId> {
        &self.wait_operations
    }

    /// Handles of the operations to re-evaluate on completion.
    pub fn signal_operations(&self) -> &BTreeSet<SequenceId> {
        &self.signal_operations
    }

    /// Whether the operation reached a terminal state.
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Make the operation eligible for selection. The scheduler mirrors this
    /// into its enabled set.
    pub(crate) fn enable(&mut self) {
        debug_assert!(!self.status.is_completed());
        self.status = OperationStatus::Enabled;
    }

    /// Block on a set of operations. `wait_all` selects the all/any variant.
    /// Back-links into the targets are the scheduler's responsibility.
    pub(crate) fn block_on_operations<I>(&mut self, targets: I, wait_all: bool)
    where
        I: IntoIterator<Item = SequenceId>,
    {
        self.wait_operations.extend(targets);
        self.status = if wait_all {
            OperationStatus::BlockedOnWaitAll
        } else {
            OperationStatus::BlockedOnWaitAny
        };
    }

    /// Block on a resource.
    pub(crate) fn block_on_resource(&mut self) {
        self.status = OperationStatus::BlockedOnResource;
    }

    /// Register a dependent to be re-evaluated when this operation completes.
    pub(crate) fn add_signal(&mut self, dependent: SequenceId) {
        self.signal_operations.insert(dependent);
    }

    /// Drop a dependent back-link (the dependent unblocked another way).
    pub(crate) fn remove_signal(&mut self, dependent: SequenceId) {
        self.signal_operations.remove(&dependent);
    }

    /// Transition to `Completed` and drain the signal set. The caller
    /// re-evaluates every returned handle.
    pub(crate) fn complete(&mut self) -> Vec<SequenceId> {
        self.status = OperationStatus::Completed;
        let dependents: Vec<SequenceId> = self.signal_operations.iter().copied().collect();
        self.signal_operations.clear();
        dependents
    }

    /// Transition to `Canceled`.
    pub(crate) fn cancel(&mut self) {
        self.status = OperationStatus::Canceled;
    }

    /// Return a terminal operation to `None` so its id can be reused in a
    /// later iteration. Clears both link sets.
    pub(crate) fn reset(&mut self) {
        debug_assert!(self.status.is_completed());
        self.status = OperationStatus::None;
        self.wait_operations.clear();
        self.signal_operations.clear();
    }

    /// Drop the whole wait set (the operation unblocked).
    pub(crate) fn take_wait_set(&mut self) -> BTreeSet<SequenceId> {
        std::mem::take(&mut self.wait_operations)
    }

    /// Drop one satisfied target from the wait set.
    pub(crate) fn remove_wait_target(&mut self, target: SequenceId) {
        self.wait_operations.remove(&target);
    }
}
