//! Liveness-checking strategy decorator.

use crate::operation::SequenceId;

use super::Strategy;

/// Contract the specification engine fulfills for liveness monitoring.
///
/// A monitor's temperature grows while one of its liveness obligations is
/// unmet; crossing the configured threshold is a liveness violation. The
/// engine lives outside this crate; the scheduler only needs a way to ask
/// for a check at the right moments.
pub trait TemperatureProbe: Send {
    /// Verify that no monitor has exceeded its temperature threshold.
    fn check_liveness(&mut self);
}

impl<F: FnMut() + Send> TemperatureProbe for F {
    fn check_liveness(&mut self) {
        self()
    }
}

/// Wraps a strategy and consults the liveness probe before each injected
/// delay.
///
/// Liveness checking is only sound under a fair schedule (an unfair one can
/// hold an obligation unmet forever without that being a bug in the program),
/// so the probe fires only while the wrapped strategy reports
/// [`Strategy::is_fair`].
pub struct LivenessCheckingStrategy<P: TemperatureProbe> {
    inner: Box<dyn Strategy>,
    probe: P,
}

impl<P: TemperatureProbe> LivenessCheckingStrategy<P> {
    /// Wrap `inner`, consulting `probe` before each delay decision.
    pub fn new(inner: Box<dyn Strategy>, probe: P) -> Self {
        Self { inner, probe }
    }
}

impl<P: TemperatureProbe> Strategy for LivenessCheckingStrategy<P> {
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
        self.inner.next_boolean()
    }

    fn next_integer(&mut self, max_value: u64) -> u64 {
        self.inner.next_integer(max_value)
    }

    fn next_delay(&mut self, current: Option<SequenceId>, max_value: u64) -> Option<u64> {
        if self.inner.is_fair() {
            self.probe.check_liveness();
        }
        self.inner.next_delay(current, max_value)
    }

    fn step_count(&self) -> usize {
        self.inner.step_count()
    }

    fn is_max_steps_reached(&self) -> bool {
        self.inner.is_max_steps_reached()
    }

    fn is_fair(&self) -> bool {
        self.inner.is_fair()
    }

    fn description(&self) -> String {
        format!("liveness({})", self.inner.description())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::super::{PctStrategy, RandomStrategy};
    use super::*;
    use crate::random::RandomSource;

    fn counting_probe() -> (Arc<AtomicUsize>, impl FnMut() + Send) {
        let count = Arc::new(AtomicUsize::new(0));
        let probe_count = Arc::clone(&count);
        (count, move || {
            probe_count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn probe_fires_for_fair_inner_strategy() {
        let (count, probe) = counting_probe();
        let inner = Box::new(RandomStrategy::new(RandomSource::new(1), 100));
        let mut strategy = LivenessCheckingStrategy::new(inner, probe);
        for _ in 0..5 {
            strategy.next_delay(Some(1), 10);
        }
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn probe_is_silent_for_unfair_inner_strategy() {
        let (count, probe) = counting_probe();
        let inner = Box::new(PctStrategy::new(RandomSource::new(1), 2, 100));
        let mut strategy = LivenessCheckingStrategy::new(inner, probe);
        strategy.next_delay(Some(1), 10);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn delegates_operation_selection() {
        let (_count, probe) = counting_probe();
        let inner = Box::new(RandomStrategy::new(RandomSource::new(2), 100));
        let mut strategy = LivenessCheckingStrategy::new(inner, probe);
        assert!(strategy.next_operation(&[1, 2], None, false).is_some());
        assert!(strategy.is_fair());
    }
}
