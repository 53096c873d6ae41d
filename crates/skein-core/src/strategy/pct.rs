//! Priority-based concurrency testing.

use std::collections::BTreeSet;

use crate::operation::SequenceId;
use crate::random::RandomSource;

use super::Strategy;

/// PCT: priority-based concurrency testing.
///
/// Every operation gets a random priority on first sight; the strategy
/// always selects the highest-priority enabled operation. At up to `d`
/// random change points within the iteration, the highest-priority enabled
/// operation is demoted to the lowest priority. The result is a schedule
/// with at most `d` forced context switches at adversarial places, which is
/// where the PCT bug-depth guarantee comes from.
///
/// Not fair: a low-priority operation can be starved for the whole
/// iteration.
pub struct PctStrategy {
    random: RandomSource,
    /// `d`: the number of priority change points per iteration.
    max_priority_changes: usize,
    max_steps: usize,
    steps: usize,
    /// Priority order, highest first. Operations not yet seen are absent.
    priorities: Vec<SequenceId>,
    /// Step indices at which a demotion happens.
    change_points: BTreeSet<usize>,
    demotions: usize,
}

impl PctStrategy {
    /// Create a PCT strategy with bound `d = max_priority_changes`.
    pub fn new(random: RandomSource, max_priority_changes: usize, max_steps: usize) -> Self {
        let mut strategy = Self {
            random,
            max_priority_changes,
            max_steps,
            steps: 0,
            priorities: Vec::new(),
            change_points: BTreeSet::new(),
            demotions: 0,
        };
        strategy.sample_change_points();
        strategy
    }

    /// Number of demotions performed in the current iteration. At most `d`.
    pub fn demotion_count(&self) -> usize {
        self.demotions
    }

    fn sample_change_points(&mut self) {
        self.change_points.clear();
        if self.max_steps == 0 || self.max_priority_changes == 0 {
            return;
        }
        // Uniformly sample d distinct step indices without replacement.
        let mut indices: Vec<usize> = (0..self.max_steps).collect();
        for i in (1..indices.len()).rev() {
            let j = self.random.next((i + 1) as u64) as usize;
            indices.swap(i, j);
        }
        self.change_points
            .extend(indices.into_iter().take(self.max_priority_changes));
    }

    /// Insert operations we have not prioritized yet at random positions.
    fn admit_new_operations(&mut self, enabled: &[SequenceId]) {
        for &seq in enabled {
            if !self.priorities.contains(&seq) {
                let slot = self.random.next((self.priorities.len() + 1) as u64) as usize;
                self.priorities.insert(slot, seq);
            }
        }
    }

    /// A change point landed on a step where no demotion is meaningful;
    /// slide it to the next step not already holding one.
    fn defer_change_point(&mut self) {
        self.change_points.remove(&self.steps);
        let mut next = self.steps + 1;
        while self.change_points.contains(&next) {
            next += 1;
        }
        self.change_points.insert(next);
    }

    fn demote_highest_enabled(&mut self, enabled: &[SequenceId]) {
        if let Some(position) = self.priorities.iter().position(|seq| enabled.contains(seq)) {
            let seq = self.priorities.remove(position);
            self.priorities.push(seq);
            self.demotions += 1;
            tracing::debug!(operation = seq, step = self.steps, "pct priority demotion");
        }
    }
}

impl Strategy for PctStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        // Grow the change-point space to the longest iteration seen so far.
        self.max_steps = self.max_steps.max(self.steps);
        self.steps = 0;
        self.demotions = 0;
        self.priorities.clear();
        self.sample_change_points();
    }

    fn next_operation(
        &mut self,
        enabled: &[SequenceId],
        _current: Option<SequenceId>,
        _is_yielding: bool,
    ) -> Option<SequenceId> {
        if enabled.is_empty() {
            return None;
        }
        self.admit_new_operations(enabled);
        if self.change_points.contains(&self.steps) {
            if enabled.len() == 1 {
                self.defer_change_point();
            } else {
                self.demote_highest_enabled(enabled);
            }
        }
        let pick = self
            .priorities
            .iter()
            .copied()
            .find(|seq| enabled.contains(seq));
        self.steps += 1;
        pick
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn step_count(&self) -> usize {
        self.steps
    }

    fn is_max_steps_reached(&self) -> bool {
        self.steps >= self.max_steps
    }

    fn is_fair(&self) -> bool {
        false
    }

    fn description(&self) -> String {
        format!(
            "pct[bound {}, seed '{}']",
            self.max_priority_changes,
            self.random.seed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_selects_highest_priority_enabled() {
        let mut strategy = PctStrategy::new(RandomSource::new(1), 0, 100);
        let enabled = [1u64, 2, 3];
        let first = strategy.next_operation(&enabled, None, false).unwrap();
        // With no change points the pick is stable while the set is stable.
        for _ in 0..20 {
            assert_eq!(strategy.next_operation(&enabled, None, false), Some(first));
        }
    }

    #[test]
    fn demotions_never_exceed_bound() {
        for seed in 0..20 {
            let d = 2;
            let mut strategy = PctStrategy::new(RandomSource::new(seed), d, 5);
            let enabled = [1u64, 2, 3, 4, 5];
            for _ in 0..5 {
                strategy.next_operation(&enabled, None, false).unwrap();
            }
            assert!(strategy.demotion_count() <= d, "seed {seed}");
        }
    }

    #[test]
    fn change_point_on_singleton_set_is_deferred() {
        let mut strategy = PctStrategy::new(RandomSource::new(4), 3, 3);
        // Only one operation enabled: no demotion can happen.
        for _ in 0..3 {
            assert_eq!(strategy.next_operation(&[9], None, false), Some(9));
        }
        assert_eq!(strategy.demotion_count(), 0);
    }

    #[test]
    fn new_iteration_resets_priorities() {
        let mut strategy = PctStrategy::new(RandomSource::new(2), 1, 10);
        strategy.next_operation(&[1, 2], None, false).unwrap();
        strategy.initialize_iteration(1);
        assert_eq!(strategy.step_count(), 0);
        assert_eq!(strategy.demotion_count(), 0);
        // Operations are re-admitted with fresh priorities.
        assert!(strategy.next_operation(&[1, 2], None, false).is_some());
    }

    #[test]
    fn picks_member_of_enabled_set() {
        let mut strategy = PctStrategy::new(RandomSource::new(8), 5, 50);
        let universe = [1u64, 2, 3, 4, 5, 6];
        for step in 0..50usize {
            let enabled: Vec<SequenceId> = universe
                .iter()
                .copied()
                .filter(|seq| (*seq as usize + step) % 3 != 0)
                .collect();
            let pick = strategy.next_operation(&enabled, None, false).unwrap();
            assert!(enabled.contains(&pick));
        }
    }
}
