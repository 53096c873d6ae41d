//! Synchronization resources.
//!
//! A resource is a named synchronization point. Operations register as
//! waiters and are re-enabled when the resource is signaled, either one at a
//! time or all at once. Waiter sets hold `SequenceId` handles; enabling is
//! performed by the scheduler, which owns the operation table.

use std::collections::BTreeSet;

use crate::operation::SequenceId;

/// Globally unique id of a resource, assigned by the client.
pub type ResourceId = u128;

/// A named synchronization point.
#[derive(Debug, Clone)]
pub struct Resource {
    id: ResourceId,
    /// Operations registered to be signaled on release. Every member has
    /// status `BlockedOnResource`.
    waiters: BTreeSet<SequenceId>,
}

impl Resource {
    /// Create a resource with no waiters.
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            waiters: BTreeSet::new(),
        }
    }

    /// The client-assigned id.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Handles of the currently registered waiters.
    pub fn waiters(&self) -> &BTreeSet<SequenceId> {
        &self.waiters
    }

    /// Register an operation to be signaled on release.
    pub(crate) fn register(&mut self, waiter: SequenceId) {
        self.waiters.insert(waiter);
    }

    /// Remove one waiter if registered. Returns whether it was a waiter.
    pub(crate) fn signal(&mut self, waiter: SequenceId) -> bool {
        self.waiters.remove(&waiter)
    }

    /// Remove and return every waiter.
    pub(crate) fn signal_all(&mut self) -> Vec<SequenceId> {
        let waiters: Vec<SequenceId> = self.waiters.iter().copied().collect();
        self.waiters.clear();
        waiters
    }
}
