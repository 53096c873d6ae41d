//! Prefix/suffix strategy composition.

use crate::operation::SequenceId;

use super::Strategy;

/// Runs a prefix strategy for a configured number of steps, then switches to
/// a suffix strategy for the rest of the iteration.
///
/// The canonical use is an unfair, bug-hunting prefix (PCT) followed by a
/// fair suffix (random), which bounds how long any operation can be starved.
/// Fairness and the nondeterministic-choice hooks follow whichever strategy
/// is active; the reported fairness is the suffix's, since the suffix runs
/// unboundedly.
pub struct ComboStrategy {
    prefix: Box<dyn Strategy>,
    suffix: Box<dyn Strategy>,
    prefix_length: usize,
    steps: usize,
}

impl ComboStrategy {
    /// Compose `prefix` (first `prefix_length` steps) with `suffix`.
    pub fn new(prefix: Box<dyn Strategy>, suffix: Box<dyn Strategy>, prefix_length: usize) -> Self {
        Self {
            prefix,
            suffix,
            prefix_length,
            steps: 0,
        }
    }

    fn in_prefix(&self) -> bool {
        self.steps < self.prefix_length
    }

    fn active(&mut self) -> &mut dyn Strategy {
        if self.in_prefix() {
            self.prefix.as_mut()
        } else {
            self.suffix.as_mut()
        }
    }
}

impl Strategy for ComboStrategy {
    fn initialize_iteration(&mut self, iteration: u64) {
        self.steps = 0;
        self.prefix.initialize_iteration(iteration);
        self.suffix.initialize_iteration(iteration);
    }

    fn next_operation(
        &mut self,
        enabled: &[SequenceId],
        current: Option<SequenceId>,
        is_yielding: bool,
    ) -> Option<SequenceId> {
        let pick = self.active().next_operation(enabled, current, is_yielding);
        self.steps += 1;
        pick
    }

    fn next_boolean(&mut self) -> bool {
        self.active().next_boolean()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.active().next_integer(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, max_value: u64) -> Option<u64> {
        let delay = self.active().next_delay(current, max_value);
        self.steps += 1;
        delay
    }

    fn step_count(&self) -> usize {
        self.steps
    }

    fn is_max_steps_reached(&self) -> bool {
        !self.in_prefix() && self.suffix.is_max_steps_reached()
    }

    fn is_fair(&self) -> bool {
        self.suffix.is_fair()
    }

    fn description(&self) -> String {
        format!(
            "combo[{} then {}, prefix {}]",
            self.prefix.description(),
            self.suffix.description(),
            self.prefix_length
        )
    }
}
