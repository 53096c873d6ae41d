//! Exploration strategies.
//!
//! A strategy is the pluggable policy behind the scheduler: it chooses which
//! enabled operation runs next, resolves nondeterministic boolean/integer
//! choices, and (for the fuzzing family) chooses cooperative delays to
//! inject before a step. The two historical contracts (operation selection
//! and delay injection) share one capability set here; each concrete
//! strategy is an independent value that overrides the hooks it supports.

mod combo;
mod fuzzing;
mod liveness;
mod pct;
mod random;
mod replay;

pub use combo::ComboStrategy;
pub use fuzzing::{
    CoinTossStrategy, FairPctDelayStrategy, LowDelayPercentageStrategy, OneStopOneGoStrategy,
    PortfolioStrategy, PpctStrategy, RapidContextSwitchStrategy, TorchRandomStrategy,
};
pub use liveness::{LivenessCheckingStrategy, TemperatureProbe};
pub use pct::PctStrategy;
pub use random::{ProbabilisticRandomStrategy, RandomStrategy};
pub use replay::ReplayStrategy;

use crate::config::Configuration;
use crate::operation::SequenceId;
use crate::random::RandomSource;
use crate::trace::ScheduleTrace;

/// Denominator of the boolean bias applied by the probabilistic strategy.
const PROBABILISTIC_BIAS_DENOMINATOR: u64 = 5;

/// A pluggable exploration policy.
///
/// Operation-selection strategies override [`Strategy::next_operation`];
/// delay-injection strategies override [`Strategy::next_delay`]. A hook the
/// strategy does not support returns `None`, which the scheduler treats as
/// strategy failure for that step.
pub trait Strategy: Send {
    /// Prepare for iteration `iteration`. Called on every attach.
    fn initialize_iteration(&mut self, iteration: u64);

    /// Choose the next operation among `enabled` (sequence ids in ascending
    /// order). `current` is the currently scheduled operation; `is_yielding`
    /// hints that it ceded its turn voluntarily (reserved, always false for
    /// now).
    fn next_operation(
        &mut self,
        enabled: &[SequenceId],
        current: Option<SequenceId>,
        is_yielding: bool,
    ) -> Option<SequenceId> {
        let _ = (enabled, current, is_yielding);
        None
    }

    /// Resolve a nondeterministic boolean choice.
    fn next_boolean(&mut self) -> bool;

    /// Resolve a nondeterministic integer choice in `[0, max_value)`.
    fn next_integer(&mut self, max_value: u64) -> u64;

    /// Choose a cooperative delay in milliseconds for the step about to run.
    /// `current` identifies the operation the delay applies to.
    fn next_delay(&mut self, current: Option<SequenceId>, max_value: u64) -> Option<u64> {
        let _ = (current, max_value);
        None
    }

    /// Number of steps taken in the current iteration.
    fn step_count(&self) -> usize;

    /// Whether the per-iteration step cap has been reached.
    fn is_max_steps_reached(&self) -> bool;

    /// Whether every persistently enabled operation is eventually chosen.
    fn is_fair(&self) -> bool;

    /// Human-readable description, for logs.
    fn description(&self) -> String;
}

/// The operation-selection strategies a session can be initialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Uniform pick among enabled operations.
    Random,
    /// Uniform pick with a biased nondeterministic-boolean hook.
    ProbabilisticRandom,
    /// Priority-based concurrency testing.
    Pct,
    /// PCT prefix followed by a fair random suffix.
    FairPct,
    /// Re-run a prerecorded trace.
    Replay,
}

impl StrategyKind {
    /// Parse a wire strategy name. Unknown names fall back to `Random`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "random" => StrategyKind::Random,
            "probabilistic" => StrategyKind::ProbabilisticRandom,
            "pct" => StrategyKind::Pct,
            "fairpct" => StrategyKind::FairPct,
            "replay" => StrategyKind::Replay,
            other => {
                tracing::warn!(strategy = other, "unknown strategy type, falling back to random");
                StrategyKind::Random
            }
        }
    }
}

/// Build the strategy for a session.
///
/// `trace` is consumed by `Replay` and ignored by every other kind.
pub fn build_strategy(
    kind: StrategyKind,
    config: &Configuration,
    trace: Option<&ScheduleTrace>,
) -> Box<dyn Strategy> {
    let seed = config.random_seed;
    match kind {
        StrategyKind::Random => Box::new(RandomStrategy::new(
            RandomSource::new(seed),
            config.max_fair_scheduling_steps,
        )),
        StrategyKind::ProbabilisticRandom => Box::new(ProbabilisticRandomStrategy::new(
            RandomSource::new(seed),
            config.max_fair_scheduling_steps,
            PROBABILISTIC_BIAS_DENOMINATOR,
        )),
        StrategyKind::Pct => Box::new(PctStrategy::new(
            RandomSource::new(seed),
            config.strategy_bound,
            config.max_unfair_scheduling_steps,
        )),
        StrategyKind::FairPct => {
            // PCT for a bounded prefix, then a fair random suffix.
            let prefix_length = if config.safety_prefix_bound > 0 {
                config.safety_prefix_bound
            } else {
                config.max_unfair_scheduling_steps
            };
            let prefix = PctStrategy::new(
                RandomSource::new(seed),
                config.strategy_bound,
                config.max_unfair_scheduling_steps,
            );
            let suffix = RandomStrategy::new(
                RandomSource::new(seed.wrapping_add(1)),
                config.max_fair_scheduling_steps,
            );
            Box::new(ComboStrategy::new(
                Box::new(prefix),
                Box::new(suffix),
                prefix_length,
            ))
        }
        StrategyKind::Replay => {
            let recorded = trace.cloned().unwrap_or_default();
            Box::new(ReplayStrategy::from_trace(&recorded))
        }
    }
}
