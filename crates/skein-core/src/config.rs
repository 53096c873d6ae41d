//! Scheduler configuration.

/// Tuning inputs for a scheduler session.
///
/// One `Configuration` is supplied when a session is created and feeds both
/// the scheduler and the strategy factory. All values have working defaults;
/// tests that need reproducibility should pin `random_seed`.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Step cap applied to fair strategies within one iteration.
    pub max_fair_scheduling_steps: usize,

    /// Step cap applied to unfair strategies (e.g. PCT) within one iteration.
    pub max_unfair_scheduling_steps: usize,

    /// Prefix length used when composing a bounded prefix strategy with a
    /// fair suffix strategy.
    pub safety_prefix_bound: usize,

    /// PCT's `d`: the maximum number of priority change points per iteration.
    pub strategy_bound: usize,

    /// Seed for every random source in the session. Two sessions with the
    /// same seed, strategy, and request sequence produce identical schedules.
    pub random_seed: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_fair_scheduling_steps: 100_000,
            max_unfair_scheduling_steps: 10_000,
            safety_prefix_bound: 0,
            strategy_bound: 3,
            random_seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_caps_are_sane() {
        let config = Configuration::default();
        assert!(config.max_fair_scheduling_steps >= config.max_unfair_scheduling_steps);
        assert!(config.strategy_bound > 0);
    }
}
