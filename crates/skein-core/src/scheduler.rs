//! The scheduler: serializes remote concurrency events into one
//! interleaving.
//!
//! A scheduler owns the operation and resource tables for one test session,
//! the set of currently enabled operations, and the schedule trace. Every
//! public method is one critical section: the boundary crate wraps each
//! scheduler in a mutex and holds it for the duration of the call, so there
//! is no internal concurrency here and no method ever blocks (the scheduler
//! decides *which* remote operation may proceed; it never waits for one).
//!
//! ## Lifecycle
//!
//! `attach` binds a program under test and creates the distinguished main
//! operation; `detach` cancels everything and advances the iteration count.
//! Between the two, the program announces operation and resource events and
//! calls `schedule_next` to learn which operation may run. A fatal error
//! (deadlock, invariant violation) moves the scheduler into a disabled
//! terminal state in which every call fails until the next detach.

use std::collections::{BTreeSet, HashMap};

use crate::config::Configuration;
use crate::error::SchedulerError;
use crate::operation::{Operation, OperationId, OperationStatus, SequenceId};
use crate::random::RandomSource;
use crate::resource::{Resource, ResourceId};
use crate::strategy::Strategy;
use crate::trace::ScheduleTrace;

/// The distinguished "no operation" identifier: returned by scheduling
/// calls when the schedule is complete or the strategy failed.
pub const NO_OPERATION: OperationId = 0;

type Result<T> = std::result::Result<T, SchedulerError>;

/// Serializes the concurrency events of one attached program under test.
pub struct Scheduler {
    id: u128,
    strategy: Box<dyn Strategy>,
    random: RandomSource,
    /// Owning table; wait/signal sets hold `SequenceId` handles into it.
    operations: HashMap<SequenceId, Operation>,
    /// Client-visible id to table handle.
    index: HashMap<OperationId, SequenceId>,
    resources: HashMap<ResourceId, Resource>,
    /// Ordered for deterministic strategy input.
    enabled: BTreeSet<SequenceId>,
    /// The only operation the program under test may currently execute.
    scheduled: Option<SequenceId>,
    sequence_counter: SequenceId,
    main_operation_id: OperationId,
    iteration: u64,
    attached: bool,
    disabled: bool,
    trace: ScheduleTrace,
}

impl Scheduler {
    /// Create a scheduler for one session.
    pub fn new(id: u128, strategy: Box<dyn Strategy>, config: &Configuration) -> Self {
        Self {
            id,
            strategy,
            random: RandomSource::new(config.random_seed),
            operations: HashMap::new(),
            index: HashMap::new(),
            resources: HashMap::new(),
            enabled: BTreeSet::new(),
            scheduled: None,
            sequence_counter: 0,
            main_operation_id: NO_OPERATION,
            iteration: 0,
            attached: false,
            disabled: false,
            trace: ScheduleTrace::new(),
        }
    }

    /// The session-unique scheduler id.
    pub fn id(&self) -> u128 {
        self.id
    }

    /// Completed iterations (incremented on every detach).
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Whether a program is currently bound to this scheduler.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether a fatal error disabled this scheduler.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Id of the distinguished driver operation created at attach.
    pub fn main_operation_id(&self) -> OperationId {
        self.main_operation_id
    }

    /// Id of the operation currently allowed to run, or [`NO_OPERATION`].
    pub fn scheduled_operation_id(&self) -> OperationId {
        self.scheduled.map(|seq| self.op(seq).id()).unwrap_or(NO_OPERATION)
    }

    /// The schedule trace recorded since the last attach.
    pub fn trace(&self) -> &ScheduleTrace {
        &self.trace
    }

    /// The trace in its comma-separated wire form. Subject to the same
    /// attachment and disabled-state checks as every other call.
    pub fn serialized_trace(&self) -> Result<String> {
        self.ensure_active()?;
        Ok(self.trace.to_string())
    }

    /// All known operations, in table order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    /// Handles of the currently enabled operations.
    pub fn enabled_set(&self) -> &BTreeSet<SequenceId> {
        &self.enabled
    }

    /// The strategy driving this scheduler, for inspection.
    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Bind a program under test. Clears the trace, creates and enables the
    /// main operation, and returns `(iteration, main_operation_id)`.
    pub fn attach(&mut self) -> Result<(u64, OperationId)> {
        self.ensure_not_disabled()?;
        if self.attached {
            return Err(SchedulerError::ClientAttached);
        }
        self.attached = true;
        self.trace.clear();
        self.strategy.initialize_iteration(self.iteration);

        let main_id = self.fresh_operation_id();
        self.main_operation_id = main_id;
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        self.operations.insert(seq, Operation::new(main_id, seq));
        self.index.insert(main_id, seq);
        self.enable(seq);
        self.scheduled = Some(seq);

        tracing::info!(
            scheduler = %format_args!("{:032x}", self.id),
            iteration = self.iteration,
            strategy = %self.strategy.description(),
            "client attached"
        );
        Ok((self.iteration, main_id))
    }

    /// Unbind the program: cancel every non-completed operation, drop all
    /// tables, and advance the iteration count. Also clears the disabled
    /// state, making detach the recovery path after a fatal error.
    pub fn detach(&mut self) -> Result<()> {
        if !self.attached {
            return Err(SchedulerError::ClientNotAttached);
        }
        let canceled = self
            .operations
            .values_mut()
            .filter(|op| !op.is_completed())
            .map(Operation::cancel)
            .count();
        self.operations.clear();
        self.index.clear();
        self.resources.clear();
        self.enabled.clear();
        self.scheduled = None;
        self.sequence_counter = 0;
        self.main_operation_id = NO_OPERATION;
        self.iteration += 1;
        self.attached = false;
        self.disabled = false;
        tracing::info!(
            scheduler = %format_args!("{:032x}", self.id),
            iteration = self.iteration,
            canceled,
            "client detached"
        );
        Ok(())
    }

    /// Register a new operation. The first operation of an iteration becomes
    /// the scheduled one immediately; a terminal operation with the same id
    /// is reset for reuse.
    pub fn create_operation(&mut self, id: OperationId) -> Result<()> {
        self.ensure_active()?;
        debug_assert_ne!(id, NO_OPERATION, "the all-zero id is reserved");
        if id == self.main_operation_id {
            return Err(SchedulerError::MainOperationExplicitlyCreated(id));
        }
        if let Some(&seq) = self.index.get(&id) {
            let op = self.op_mut(seq);
            if op.is_completed() {
                op.reset();
                return Ok(());
            }
            return Err(SchedulerError::DuplicateOperation(id));
        }
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        self.operations.insert(seq, Operation::new(id, seq));
        self.index.insert(id, seq);
        if self.operations.len() == 1 {
            self.scheduled = Some(seq);
        }
        Ok(())
    }

    /// Enable a created operation.
    pub fn start_operation(&mut self, id: OperationId) -> Result<()> {
        self.ensure_active()?;
        if id == self.main_operation_id {
            return Err(SchedulerError::MainOperationExplicitlyStarted(id));
        }
        let seq = self.lookup(id)?;
        match self.op(seq).status() {
            OperationStatus::None => {
                self.enable(seq);
                Ok(())
            }
            status if status.is_completed() => Err(SchedulerError::OperationAlreadyCompleted(id)),
            _ => Err(SchedulerError::OperationAlreadyStarted(id)),
        }
    }

    /// Block the scheduled operation until `target_id` completes, then pick
    /// the next operation to run. If the target already completed, the
    /// caller does not block and the current scheduled id is returned.
    pub fn wait_operation(&mut self, target_id: OperationId) -> Result<OperationId> {
        self.wait_operations(&[target_id], true)
    }

    /// Block the scheduled operation on a set of targets. With
    /// `wait_all = false` the wait is satisfied by any single completion,
    /// and never blocks at all when one target has already completed.
    pub fn wait_operations(&mut self, target_ids: &[OperationId], wait_all: bool) -> Result<OperationId> {
        self.ensure_active()?;
        let mut pending = Vec::with_capacity(target_ids.len());
        let mut any_completed = false;
        for &id in target_ids {
            let seq = self.lookup(id)?;
            match self.op(seq).status() {
                OperationStatus::None => return Err(SchedulerError::OperationNotStarted(id)),
                status if status.is_completed() => any_completed = true,
                _ => pending.push(seq),
            }
        }
        if pending.is_empty() || (!wait_all && any_completed) {
            return Ok(self.scheduled_operation_id());
        }
        let waiter = self.scheduled_or_fail()?;
        for &target in &pending {
            self.op_mut(target).add_signal(waiter);
        }
        self.op_mut(waiter).block_on_operations(pending, wait_all);
        self.enabled.remove(&waiter);
        self.schedule_next_inner()
    }

    /// Block the scheduled operation on a resource and pick the next
    /// operation to run.
    pub fn wait_resource(&mut self, resource_id: ResourceId) -> Result<OperationId> {
        self.ensure_active()?;
        if !self.resources.contains_key(&resource_id) {
            return Err(SchedulerError::NotExistingResource(resource_id));
        }
        let waiter = self.scheduled_or_fail()?;
        self.resources
            .get_mut(&resource_id)
            .expect("invariant: presence checked above")
            .register(waiter);
        self.op_mut(waiter).block_on_resource();
        self.enabled.remove(&waiter);
        self.schedule_next_inner()
    }

    /// Re-enable one waiter of a resource. A no-op if the operation is not
    /// registered with it.
    pub fn signal_operation(&mut self, operation_id: OperationId, resource_id: ResourceId) -> Result<()> {
        self.ensure_active()?;
        let seq = self.lookup(operation_id)?;
        let resource = self
            .resources
            .get_mut(&resource_id)
            .ok_or(SchedulerError::NotExistingResource(resource_id))?;
        if resource.signal(seq) {
            self.enable(seq);
        }
        Ok(())
    }

    /// Re-enable every waiter of a resource.
    pub fn signal_operations(&mut self, resource_id: ResourceId) -> Result<()> {
        self.ensure_active()?;
        let waiters = self
            .resources
            .get_mut(&resource_id)
            .ok_or(SchedulerError::NotExistingResource(resource_id))?
            .signal_all();
        for waiter in waiters {
            self.enable(waiter);
        }
        Ok(())
    }

    /// Complete an operation, re-evaluate its dependents through the signal
    /// back-links, and pick the next operation to run.
    pub fn complete_operation(&mut self, id: OperationId) -> Result<OperationId> {
        self.ensure_active()?;
        let seq = self.lookup(id)?;
        match self.op(seq).status() {
            OperationStatus::None => return Err(SchedulerError::OperationNotStarted(id)),
            status if status.is_completed() => {
                return Err(SchedulerError::OperationAlreadyCompleted(id))
            }
            _ => {}
        }
        // A terminal operation holds no links: drop its own waits (and their
        // back-links) before draining the dependents.
        let waits = self.op_mut(seq).take_wait_set();
        for target in waits {
            if let Some(op) = self.operations.get_mut(&target) {
                op.remove_signal(seq);
            }
        }
        let dependents = self.op_mut(seq).complete();
        self.enabled.remove(&seq);
        // A completed operation also leaves every resource waiter set.
        for resource in self.resources.values_mut() {
            resource.signal(seq);
        }
        for dependent in dependents {
            self.try_enable(dependent);
        }
        self.schedule_next_inner()
    }

    /// Create a resource. Idempotent: creating an existing id is a no-op.
    pub fn create_resource(&mut self, id: ResourceId) -> Result<()> {
        self.ensure_active()?;
        self.resources.entry(id).or_insert_with(|| Resource::new(id));
        Ok(())
    }

    /// Delete a resource unconditionally. Operations still blocked on it
    /// stay blocked; that is the program's bug to find.
    pub fn delete_resource(&mut self, id: ResourceId) -> Result<()> {
        self.ensure_active()?;
        self.resources.remove(&id);
        Ok(())
    }

    /// Ask the strategy for the next operation to run.
    ///
    /// Returns [`NO_OPERATION`] when every operation completed (schedule
    /// done) or the strategy failed/capped out; reports a deadlock when
    /// nothing is enabled but uncompleted operations remain.
    pub fn schedule_next(&mut self) -> Result<OperationId> {
        self.ensure_active()?;
        self.schedule_next_inner()
    }

    /// Resolve a nondeterministic boolean choice and record it.
    pub fn next_boolean(&mut self) -> Result<bool> {
        self.ensure_active()?;
        let value = self.strategy.next_boolean();
        self.trace.push_boolean_choice(value);
        Ok(value)
    }

    /// Resolve a nondeterministic integer choice in `[0, max_value)` and
    /// record it.
    pub fn next_integer(&mut self, max_value: u64) -> Result<u64> {
        self.ensure_active()?;
        let value = self.strategy.next_integer(max_value);
        self.trace.push_integer_choice(value);
        Ok(value)
    }

    /// Ask the strategy for a cooperative delay for the scheduled operation.
    /// Only meaningful under a delay-injection strategy; selection
    /// strategies report zero. Not part of the schedule trace.
    pub fn next_delay(&mut self, max_value: u64) -> Result<u64> {
        self.ensure_active()?;
        Ok(self.strategy.next_delay(self.scheduled, max_value).unwrap_or(0))
    }

    fn schedule_next_inner(&mut self) -> Result<OperationId> {
        if self.enabled.is_empty() {
            let pending = self.operations.values().filter(|op| !op.is_completed()).count();
            if pending > 0 {
                return Err(self.fatal(SchedulerError::DeadlockDetected { pending }));
            }
            self.scheduled = None;
            return Ok(NO_OPERATION);
        }
        if self.strategy.is_max_steps_reached() {
            tracing::debug!(
                steps = self.strategy.step_count(),
                "step cap reached, ending the iteration"
            );
            self.scheduled = None;
            return Ok(NO_OPERATION);
        }
        let enabled: Vec<SequenceId> = self.enabled.iter().copied().collect();
        match self.strategy.next_operation(&enabled, self.scheduled, false) {
            Some(choice) if self.enabled.contains(&choice) => {
                self.trace.push_scheduling_choice(choice);
                self.scheduled = Some(choice);
                tracing::trace!(operation = choice, "scheduled next operation");
                Ok(self.op(choice).id())
            }
            other => {
                tracing::debug!(?other, "strategy did not select an enabled operation");
                self.scheduled = None;
                Ok(NO_OPERATION)
            }
        }
    }

    /// Re-evaluate a blocked operation after one of its wait targets
    /// completed.
    fn try_enable(&mut self, seq: SequenceId) {
        let (wait_all, targets): (bool, Vec<SequenceId>) = match self.operations.get(&seq) {
            Some(op) if op.status() == OperationStatus::BlockedOnWaitAll => {
                (true, op.wait_operations().iter().copied().collect())
            }
            Some(op) if op.status() == OperationStatus::BlockedOnWaitAny => {
                (false, op.wait_operations().iter().copied().collect())
            }
            _ => return,
        };
        let (done, remaining): (Vec<SequenceId>, Vec<SequenceId>) =
            targets.into_iter().partition(|target| {
                self.operations
                    .get(target)
                    .map_or(true, Operation::is_completed)
            });
        let ready = if wait_all {
            remaining.is_empty()
        } else {
            !done.is_empty()
        };
        if !ready {
            // Still blocked; keep only the unsatisfied targets so the wait
            // set and the back-links stay symmetric.
            for target in done {
                self.op_mut(seq).remove_wait_target(target);
            }
            return;
        }
        self.op_mut(seq).take_wait_set();
        // Remove stale back-links from targets that have not completed yet.
        for target in remaining {
            if let Some(op) = self.operations.get_mut(&target) {
                op.remove_signal(seq);
            }
        }
        self.enable(seq);
    }

    /// Insert into the enabled set, mirroring the status. Safe to call on
    /// already-enabled or terminal operations.
    fn enable(&mut self, seq: SequenceId) {
        let op = self.op_mut(seq);
        if op.is_completed() || op.status() == OperationStatus::Enabled {
            return;
        }
        op.enable();
        self.enabled.insert(seq);
    }

    fn fresh_operation_id(&mut self) -> OperationId {
        loop {
            let id = (u128::from(self.random.next_u64()) << 64) | u128::from(self.random.next_u64());
            if id != NO_OPERATION && !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    fn lookup(&self, id: OperationId) -> Result<SequenceId> {
        self.index
            .get(&id)
            .copied()
            .ok_or(SchedulerError::NotExistingOperation(id))
    }

    fn scheduled_or_fail(&mut self) -> Result<SequenceId> {
        match self.scheduled {
            Some(seq) => Ok(seq),
            None => Err(self.fatal(SchedulerError::Internal(
                "a blocking call arrived with no scheduled operation".to_string(),
            ))),
        }
    }

    fn op(&self, seq: SequenceId) -> &Operation {
        self.operations
            .get(&seq)
            .expect("invariant: handles always point at live table entries")
    }

    fn op_mut(&mut self, seq: SequenceId) -> &mut Operation {
        self.operations
            .get_mut(&seq)
            .expect("invariant: handles always point at live table entries")
    }

    fn ensure_not_disabled(&self) -> Result<()> {
        if self.disabled {
            return Err(SchedulerError::SchedulerDisabled);
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        self.ensure_not_disabled()?;
        if !self.attached {
            return Err(SchedulerError::ClientNotAttached);
        }
        Ok(())
    }

    fn fatal(&mut self, error: SchedulerError) -> SchedulerError {
        debug_assert!(error.is_fatal());
        self.disabled = true;
        tracing::error!(
            scheduler = %format_args!("{:032x}", self.id),
            %error,
            "scheduler disabled by fatal error"
        );
        error
    }
}
