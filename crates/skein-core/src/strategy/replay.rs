//! Trace replay.

use crate::operation::SequenceId;
use crate::trace::ScheduleTrace;

use super::Strategy;

/// Replays a prerecorded schedule trace.
///
/// Each call consumes the next recorded value in order: operation picks must
/// match an enabled operation's sequence id, boolean choices replay as
/// zero/nonzero, integer choices replay verbatim. When the recorded value
/// does not match any enabled operation (the program diverged from the
/// recorded run) the strategy fails the iteration.
pub struct ReplayStrategy {
    entries: Vec<u64>,
    cursor: usize,
    steps: usize,
}

impl ReplayStrategy {
    /// Build a replay strategy from a recorded trace.
    pub fn from_trace(trace: &ScheduleTrace) -> Self {
        Self {
            entries: trace.values().collect(),
            cursor: 0,
            steps: 0,
        }
    }

    /// Number of recorded entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor)
    }

    fn consume(&mut self) -> Option<u64> {
        let value = self.entries.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(value)
    }
}

impl Strategy for ReplayStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        self.cursor = 0;
        self.steps = 0;
    }

    fn next_operation(
        &mut self,
        enabled: &[SequenceId],
        _current: Option<SequenceId>,
        _is_yielding: bool,
    ) -> Option<SequenceId> {
        let wanted = self.consume()?;
        self.steps += 1;
        if enabled.contains(&wanted) {
            Some(wanted)
        } else {
            tracing::warn!(
                wanted,
                ?enabled,
                position = self.cursor - 1,
                "replay diverged: recorded operation is not enabled"
            );
            None
        }
    }

    fn next_boolean(&mut self) -> bool {
        self.consume().map(|value| value != 0).unwrap_or(false)
    }

    fn next_integer(&mut self, _max_value: u64) -> u64 {
        self.consume().unwrap_or(0)
    }

    fn step_count(&self) -> usize {
        self.steps
    }

    fn is_max_steps_reached(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    fn is_fair(&self) -> bool {
        false
    }

    fn description(&self) -> String {
        format!("replay[{} entries]", self.entries.len())
    }
}
