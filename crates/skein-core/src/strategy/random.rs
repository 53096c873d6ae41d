//! Random exploration.

use crate::operation::SequenceId;
use crate::random::RandomSource;

use super::Strategy;

/// Uniform random exploration.
///
/// Picks uniformly among the enabled operations and resolves every
/// nondeterministic choice uniformly. Fair: over an unbounded run every
/// persistently enabled operation is eventually selected with probability 1.
/// Also usable as a delay-injection strategy (uniform delay in
/// `[0, max_value)`).
pub struct RandomStrategy {
    random: RandomSource,
    max_steps: usize,
    steps: usize,
}

impl RandomStrategy {
    /// Create a random strategy with the given per-iteration step cap.
    pub fn new(random: RandomSource, max_steps: usize) -> Self {
        Self {
            random,
            max_steps,
            steps: 0,
        }
    }
}

impl Strategy for RandomStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        self.steps = 0;
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
        self.steps += 1;
        let index = self.random.next(enabled.len() as u64) as usize;
        Some(enabled[index])
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn next_delay(&mut self, _current: Option<SequenceId>, max_value: u64) -> Option<u64> {
        self.steps += 1;
        Some(self.random.next(max_value))
    }

    fn step_count(&self) -> usize {
        self.steps
    }

    fn is_max_steps_reached(&self) -> bool {
        self.steps >= self.max_steps
    }

    fn is_fair(&self) -> bool {
        true
    }

    fn description(&self) -> String {
        format!("random[seed '{}']", self.random.seed())
    }
}

/// Random exploration with a biased boolean hook.
///
/// Operation selection is uniform; the nondeterministic boolean hook returns
/// `true` with an extra `1/denominator` bias on top of the uniform draw.
/// Used to force occasional boolean choices that a uniform coin would rarely
/// line up with a specific interleaving.
pub struct ProbabilisticRandomStrategy {
    inner: RandomStrategy,
    denominator: u64,
}

impl ProbabilisticRandomStrategy {
    /// Create a probabilistic strategy with bias `1/denominator`.
    pub fn new(random: RandomSource, max_steps: usize, denominator: u64) -> Self {
        debug_assert!(denominator > 0);
        Self {
            inner: RandomStrategy::new(random, max_steps),
            denominator,
        }
    }
}

impl Strategy for ProbabilisticRandomStrategy {
    fn initialize_iteration(&mut self, iteration: u64) {
        self.inner.initialize_iteration(iteration);
    }

    fn next_operation(
        &mut self,
        enabled: &[SequenceId],
        current: Option<SequenceId>,
        is_yielding: bool,
    ) -> Option<SequenceId> {
        self.inner.next_operation(enabled, current, is_yielding)
    }

    fn next_boolean(&mut self) -> bool {
        if self.inner.random.next(self.denominator) == 0 {
            return true;
        }
        self.inner.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.inner.next_integer(max_value)
    }

    fn step_count(&self) -> usize {
        self.inner.step_count()
    }

    fn is_max_steps_reached(&self) -> bool {
        self.inner.is_max_steps_reached()
    }

    fn is_fair(&self) -> bool {
        true
    }

    fn description(&self) -> String {
        format!("probabilistic[bias 1/{}]", self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_only_enabled_operations() {
        let mut strategy = RandomStrategy::new(RandomSource::new(3), 1000);
        let enabled = [2u64, 5, 9];
        for _ in 0..200 {
            let pick = strategy.next_operation(&enabled, None, false).unwrap();
            assert!(enabled.contains(&pick));
        }
        assert!(strategy.next_operation(&[], None, false).is_none());
    }

    #[test]
    fn eventually_picks_every_operation() {
        let mut strategy = RandomStrategy::new(RandomSource::new(11), usize::MAX);
        let enabled = [1u64, 2, 3, 4];
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..500 {
            seen.insert(strategy.next_operation(&enabled, None, false).unwrap());
        }
        assert_eq!(seen.len(), enabled.len());
    }

    #[test]
    fn step_cap_is_reported() {
        let mut strategy = RandomStrategy::new(RandomSource::new(0), 2);
        assert!(!strategy.is_max_steps_reached());
        strategy.next_operation(&[1], None, false);
        strategy.next_operation(&[1], None, false);
        assert!(strategy.is_max_steps_reached());
        strategy.initialize_iteration(1);
        assert!(!strategy.is_max_steps_reached());
    }

    #[test]
    fn probabilistic_biases_towards_true() {
        let mut strategy =
            ProbabilisticRandomStrategy::new(RandomSource::new(17), usize::MAX, 5);
        let trues = (0..10_000).filter(|_| strategy.next_boolean()).count();
        // 1/5 bias on top of a fair coin: expect roughly 60% true.
        assert!(trues > 5_500, "got {trues} trues out of 10000");
    }

    #[test]
    fn uniform_delay_respects_bound() {
        let mut strategy = RandomStrategy::new(RandomSource::new(5), usize::MAX);
        for _ in 0..100 {
            assert!(strategy.next_delay(Some(1), 50).unwrap() < 50);
        }
    }
}
