//! Delay-injection fuzzing strategies.
//!
//! These strategies do not choose operations; they choose a cooperative
//! delay (milliseconds) the program under test is expected to honor before
//! its next step. Weaker than systematic operation selection, but cheap and
//! surprisingly effective at shaking out ordering bugs. All of them are
//! trivially fair: a delay never prevents an operation from running.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::operation::SequenceId;
use crate::random::RandomSource;

use super::Strategy;

/// Probability that `LowDelayPercentage` injects a nonzero delay.
const LOW_DELAY_PROBABILITY: f64 = 0.01;

/// Starting per-task delay for `CoinToss`.
const COIN_TOSS_INITIAL_DELAY_MS: u64 = 1;

/// Ceiling for the doubling per-task delay in `CoinToss`.
const COIN_TOSS_MAX_DELAY_MS: u64 = 500;

/// Probability that `TorchRandom` injects a delay at a step.
const TORCH_DELAY_PROBABILITY: f64 = 0.05;

/// `TorchRandom` delays are uniform in `[0, TORCH_DELAY_RANGE_MS)`.
const TORCH_DELAY_RANGE_MS: u64 = 100;

/// Per-task cumulative delay budget for `TorchRandom`.
const TORCH_TOTAL_DELAY_CAP_MS: u64 = 5000;

/// Probability that a task lands in the low-priority bag in `Ppct`.
const PPCT_LOW_PRIORITY_PROBABILITY: f64 = 0.05;

/// Half-width of the low-priority delay ranges in `Ppct`.
const PPCT_DELAY_RANGE_MS: u64 = 50;

/// `FairPct` injects `next(10) * 50` ms at a change point.
const FAIR_PCT_DELAY_STEPS: u64 = 10;
const FAIR_PCT_DELAY_QUANTUM_MS: u64 = 50;

/// Iterations between change-point count increases in `FairPct`.
const FAIR_PCT_GROWTH_INTERVAL: u64 = 1000;

/// Delay handed to the non-designated (or designated) side of
/// `OneStopOneGo`.
const ONE_STOP_DELAY_MS: u64 = 100;

/// Ceiling on the synchronous park in `RapidContextSwitch`.
const CONTEXT_SWITCH_PARK_MS: u64 = 300;

/// Mostly-zero delays with a rare uniform burst.
pub struct LowDelayPercentageStrategy {
    random: RandomSource,
    max_steps: usize,
    steps: usize,
}

impl LowDelayPercentageStrategy {
    /// Create the strategy with a per-iteration step cap.
    pub fn new(random: RandomSource, max_steps: usize) -> Self {
        Self {
            random,
            max_steps,
            steps: 0,
        }
    }
}

impl Strategy for LowDelayPercentageStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        self.steps = 0;
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn next_delay(&mut self, _current: Option<SequenceId>, max_value: u64) -> Option<u64> {
        self.steps += 1;
        if self.random.next_f64() < LOW_DELAY_PROBABILITY {
            Some(self.random.next(max_value))
        } else {
            Some(0)
        }
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
        format!("low-delay-percentage[p {LOW_DELAY_PROBABILITY}]")
    }
}

/// Per-task doubling delay decided by a coin toss.
pub struct CoinTossStrategy {
    random: RandomSource,
    delays: HashMap<SequenceId, u64>,
    max_steps: usize,
    steps: usize,
}

impl CoinTossStrategy {
    /// Create the strategy with a per-iteration step cap.
    pub fn new(random: RandomSource, max_steps: usize) -> Self {
        Self {
            random,
            delays: HashMap::new(),
            max_steps,
            steps: 0,
        }
    }
}

impl Strategy for CoinTossStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        self.steps = 0;
        self.delays.clear();
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, _max_value: u64) -> Option<u64> {
        self.steps += 1;
        let task = current.unwrap_or_default();
        let delay = self
            .delays
            .entry(task)
            .or_insert(COIN_TOSS_INITIAL_DELAY_MS);
        if self.random.next_bool() {
            *delay = (*delay * 2).min(COIN_TOSS_MAX_DELAY_MS);
        }
        Some(*delay)
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
        format!("coin-toss[cap {COIN_TOSS_MAX_DELAY_MS}ms]")
    }
}

/// Rare short delays with a per-task total budget.
pub struct TorchRandomStrategy {
    random: RandomSource,
    totals: HashMap<SequenceId, u64>,
    max_steps: usize,
    steps: usize,
}

impl TorchRandomStrategy {
    /// Create the strategy with a per-iteration step cap.
    pub fn new(random: RandomSource, max_steps: usize) -> Self {
        Self {
            random,
            totals: HashMap::new(),
            max_steps,
            steps: 0,
        }
    }
}

impl Strategy for TorchRandomStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        self.steps = 0;
        self.totals.clear();
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, _max_value: u64) -> Option<u64> {
        self.steps += 1;
        if self.random.next_f64() >= TORCH_DELAY_PROBABILITY {
            return Some(0);
        }
        let task = current.unwrap_or_default();
        let total = self.totals.entry(task).or_insert(0);
        let delay = self.random.next(TORCH_DELAY_RANGE_MS);
        if *total + delay > TORCH_TOTAL_DELAY_CAP_MS {
            return Some(0);
        }
        *total += delay;
        Some(delay)
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
        format!("torch-random[budget {TORCH_TOTAL_DELAY_CAP_MS}ms]")
    }
}

/// Probabilistic PCT: tasks are partitioned into a high-priority bag
/// (delay 0) and a low-priority bag (delayed), reshuffled periodically.
pub struct PpctStrategy {
    random: RandomSource,
    known_tasks: Vec<SequenceId>,
    seen: HashSet<SequenceId>,
    low_bag: HashSet<SequenceId>,
    /// Drawn at each reshuffle; selects which delay band the low bag uses.
    bag_weight: f64,
    reshuffle_interval: usize,
    max_steps: usize,
    steps: usize,
}

impl PpctStrategy {
    /// Create the strategy; tasks are reshuffled every `max_steps / 5`
    /// steps.
    pub fn new(random: RandomSource, max_steps: usize) -> Self {
        Self {
            random,
            known_tasks: Vec::new(),
            seen: HashSet::new(),
            low_bag: HashSet::new(),
            bag_weight: 0.0,
            reshuffle_interval: (max_steps / 5).max(1),
            max_steps,
            steps: 0,
        }
    }

    fn reshuffle(&mut self) {
        self.low_bag.clear();
        for &task in &self.known_tasks {
            if self.random.next_f64() < PPCT_LOW_PRIORITY_PROBABILITY {
                self.low_bag.insert(task);
            }
        }
        self.bag_weight = self.random.next_f64();
    }
}

impl Strategy for PpctStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        self.steps = 0;
        self.known_tasks.clear();
        self.seen.clear();
        self.low_bag.clear();
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, _max_value: u64) -> Option<u64> {
        let task = current.unwrap_or_default();
        if self.seen.insert(task) {
            self.known_tasks.push(task);
        }
        if self.steps % self.reshuffle_interval == 0 {
            self.reshuffle();
        }
        self.steps += 1;
        if !self.low_bag.contains(&task) {
            return Some(0);
        }
        let base = if self.bag_weight < 0.5 {
            0
        } else {
            PPCT_DELAY_RANGE_MS
        };
        Some(base + self.random.next(PPCT_DELAY_RANGE_MS))
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
        format!("ppct[low-priority p {PPCT_LOW_PRIORITY_PROBABILITY}]")
    }
}

/// Fair PCT over delays: inject a sizable delay at per-task change points
/// instead of demoting priorities.
pub struct FairPctDelayStrategy {
    random: RandomSource,
    per_task_steps: HashMap<SequenceId, usize>,
    change_points: BTreeSet<usize>,
    change_point_count: usize,
    /// Longest per-task step count observed across all iterations.
    observed_max_steps: usize,
    max_steps: usize,
    steps: usize,
}

impl FairPctDelayStrategy {
    /// Create the strategy with a per-iteration step cap.
    pub fn new(random: RandomSource, max_steps: usize) -> Self {
        Self {
            random,
            per_task_steps: HashMap::new(),
            change_points: BTreeSet::new(),
            change_point_count: 1,
            observed_max_steps: 0,
            max_steps,
            steps: 0,
        }
    }

    fn sample_change_points(&mut self) {
        self.change_points.clear();
        if self.observed_max_steps == 0 {
            return;
        }
        for _ in 0..self.change_point_count {
            let point = self.random.next(self.observed_max_steps as u64) as usize;
            self.change_points.insert(point);
        }
    }
}

impl Strategy for FairPctDelayStrategy {
    fn initialize_iteration(&mut self, iteration: u64) {
        self.steps = 0;
        self.per_task_steps.clear();
        let grown = 1 + (iteration / FAIR_PCT_GROWTH_INTERVAL) as usize;
        self.change_point_count = grown.min(self.observed_max_steps.max(1));
        self.sample_change_points();
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, _max_value: u64) -> Option<u64> {
        self.steps += 1;
        let task = current.unwrap_or_default();
        let counter = self.per_task_steps.entry(task).or_insert(0);
        *counter += 1;
        let task_step = *counter;
        self.observed_max_steps = self.observed_max_steps.max(task_step);
        if self.change_points.contains(&task_step) {
            Some(self.random.next(FAIR_PCT_DELAY_STEPS) * FAIR_PCT_DELAY_QUANTUM_MS)
        } else {
            Some(0)
        }
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
        format!("fair-pct[{} change points]", self.change_point_count)
    }
}

/// Which side of the `OneStopOneGo` flip an iteration runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopGoMode {
    /// One designated task runs undelayed; everything else is held back.
    OneStop,
    /// One designated task is held back; everything else runs undelayed.
    OneGo,
}

/// Hold back (or release) exactly one task per iteration.
pub struct OneStopOneGoStrategy {
    random: RandomSource,
    mode: StopGoMode,
    designated: Option<SequenceId>,
    observed_tasks: u64,
    seen: HashSet<SequenceId>,
    max_steps: usize,
    steps: usize,
}

impl OneStopOneGoStrategy {
    /// Create the strategy with a per-iteration step cap.
    pub fn new(random: RandomSource, max_steps: usize) -> Self {
        Self {
            random,
            mode: StopGoMode::OneStop,
            designated: None,
            observed_tasks: 0,
            seen: HashSet::new(),
            max_steps,
            steps: 0,
        }
    }

    /// Reservoir-sample the designated task: the task set is not known up
    /// front, so each newly observed task takes the slot with probability
    /// `1/n`, keeping the choice uniform over all tasks seen so far.
    fn observe(&mut self, task: SequenceId) {
        if !self.seen.insert(task) {
            return;
        }
        self.observed_tasks += 1;
        if self.random.next(self.observed_tasks) == 0 {
            self.designated = Some(task);
        }
    }
}

impl Strategy for OneStopOneGoStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        self.steps = 0;
        self.designated = None;
        self.observed_tasks = 0;
        self.seen.clear();
        self.mode = if self.random.next_bool() {
            StopGoMode::OneStop
        } else {
            StopGoMode::OneGo
        };
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, _max_value: u64) -> Option<u64> {
        self.steps += 1;
        let task = current.unwrap_or_default();
        self.observe(task);
        let is_designated = self.designated == Some(task);
        let delay = match self.mode {
            StopGoMode::OneStop => {
                if is_designated {
                    0
                } else {
                    ONE_STOP_DELAY_MS
                }
            }
            StopGoMode::OneGo => {
                if is_designated {
                    ONE_STOP_DELAY_MS
                } else {
                    0
                }
            }
        };
        Some(delay)
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
        "one-stop-one-go".to_string()
    }
}

/// Auto-reset latch, one per registered task.
type Latch = Arc<(Mutex<bool>, Condvar)>;

/// Force rapid context switches by parking the calling thread and waking a
/// random other registered one.
///
/// This is the single strategy that blocks inside the scheduler: the caller
/// parks on its own latch (bounded at 300 ms) after waking a random peer.
/// The injected delay value itself is always zero.
pub struct RapidContextSwitchStrategy {
    random: RandomSource,
    latches: HashMap<SequenceId, Latch>,
    max_steps: usize,
    steps: usize,
}

impl RapidContextSwitchStrategy {
    /// Create the strategy with a per-iteration step cap.
    pub fn new(random: RandomSource, max_steps: usize) -> Self {
        Self {
            random,
            latches: HashMap::new(),
            max_steps,
            steps: 0,
        }
    }

    /// Number of tasks with a registered latch.
    pub fn registered_tasks(&self) -> usize {
        self.latches.len()
    }

    fn wake_random_peer(&mut self, task: SequenceId) {
        let peers: Vec<Latch> = self
            .latches
            .iter()
            .filter(|(&id, _)| id != task)
            .map(|(_, latch)| latch.clone())
            .collect();
        if peers.is_empty() {
            return;
        }
        let index = self.random.next(peers.len() as u64) as usize;
        let (woken, condvar) = &*peers[index];
        *woken.lock().unwrap() = true;
        condvar.notify_one();
    }
}

impl Strategy for RapidContextSwitchStrategy {
    fn initialize_iteration(&mut self, _iteration: u64) {
        self.steps = 0;
        self.latches.clear();
    }

    fn next_boolean(&mut self) -> bool {
        self.random.next_bool()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.random.next(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, _max_value: u64) -> Option<u64> {
        self.steps += 1;
        let task = current.unwrap_or_default();
        let latch = self.latches.entry(task).or_default().clone();
        self.wake_random_peer(task);

        let (woken, condvar) = &*latch;
        let mut flag = woken.lock().unwrap();
        if !*flag {
            let (guard, _timed_out) = condvar
                .wait_timeout(flag, Duration::from_millis(CONTEXT_SWITCH_PARK_MS))
                .unwrap();
            flag = guard;
        }
        *flag = false;
        Some(0)
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
        format!("rapid-context-switch[park {CONTEXT_SWITCH_PARK_MS}ms]")
    }
}

/// Rotates between a set of strategies, one per iteration.
pub struct PortfolioStrategy {
    strategies: Vec<Box<dyn Strategy>>,
    active: usize,
}

impl PortfolioStrategy {
    /// Compose an explicit rotation. Panics on an empty set.
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        assert!(!strategies.is_empty(), "portfolio needs at least one strategy");
        Self {
            strategies,
            active: 0,
        }
    }

    /// The standard rotation over the whole delay-injection family.
    pub fn standard(seed: u64, max_steps: usize) -> Self {
        let source = |offset: u64| RandomSource::new(seed.wrapping_add(offset));
        Self::new(vec![
            Box::new(super::RandomStrategy::new(source(0), max_steps)),
            Box::new(LowDelayPercentageStrategy::new(source(1), max_steps)),
            Box::new(CoinTossStrategy::new(source(2), max_steps)),
            Box::new(TorchRandomStrategy::new(source(3), max_steps)),
            Box::new(PpctStrategy::new(source(4), max_steps)),
            Box::new(FairPctDelayStrategy::new(source(5), max_steps)),
            Box::new(OneStopOneGoStrategy::new(source(6), max_steps)),
            Box::new(RapidContextSwitchStrategy::new(source(7), max_steps)),
        ])
    }

    fn active_mut(&mut self) -> &mut dyn Strategy {
        self.strategies[self.active].as_mut()
    }
}

impl Strategy for PortfolioStrategy {
    fn initialize_iteration(&mut self, iteration: u64) {
        self.active = (iteration % self.strategies.len() as u64) as usize;
        self.active_mut().initialize_iteration(iteration);
        tracing::debug!(
            iteration,
            strategy = %self.strategies[self.active].description(),
            "portfolio rotation"
        );
    }

    fn next_boolean(&mut self) -> bool {
        self.active_mut().next_boolean()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.active_mut().next_integer(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, max_value: u64) -> Option<u64> {
        self.active_mut().next_delay(current, max_value)
    }

    fn step_count(&self) -> usize {
        self.strategies[self.active].step_count()
    }

    fn is_max_steps_reached(&self) -> bool {
        self.strategies[self.active].is_max_steps_reached()
    }

    fn is_fair(&self) -> bool {
        self.strategies[self.active].is_fair()
    }

    fn description(&self) -> String {
        format!(
            "portfolio[{} strategies, active {}]",
            self.strategies.len(),
            self.strategies[self.active].description()
        )
    }
}
