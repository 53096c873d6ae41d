//! Session registry.
//!
//! Maps session ids to their schedulers. The registry is an explicit value
//! injected into the request handler; lookups take a read lock only, and
//! each session's scheduler sits behind its own monitor.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use skein_core::{Configuration, Scheduler, Strategy};

use crate::logger::ApiLogger;

/// One session: a scheduler plus its API invocation logger, guarded by the
/// session monitor as a unit.
pub struct SchedulerSession {
    scheduler: Scheduler,
    logger: Box<dyn ApiLogger>,
}

impl SchedulerSession {
    /// Bundle a scheduler with its per-session logger.
    pub fn new(scheduler: Scheduler, logger: Box<dyn ApiLogger>) -> Self {
        Self { scheduler, logger }
    }

    /// The session's scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Mutable access to the scheduler (callers hold the session monitor).
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Record one API invocation.
    pub fn record_invocation(&mut self, method: &str) {
        self.logger.record(method);
    }
}

/// Concurrent map from session id to monitored scheduler.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<u128, Arc<Mutex<SchedulerSession>>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `id`, creating it with `strategy` and `logger`
    /// if absent. An existing session wins: the supplied strategy and
    /// logger are dropped in that case.
    pub fn create(
        &self,
        id: u128,
        strategy: Box<dyn Strategy>,
        config: &Configuration,
        logger: Box<dyn ApiLogger>,
    ) -> Arc<Mutex<SchedulerSession>> {
        if let Some(session) = self.sessions.read().get(&id) {
            return Arc::clone(session);
        }
        let mut sessions = self.sessions.write();
        Arc::clone(sessions.entry(id).or_insert_with(|| {
            tracing::info!(
                session = %skein_proto::format_id(id),
                strategy = %strategy.description(),
                "session created"
            );
            Arc::new(Mutex::new(SchedulerSession::new(
                Scheduler::new(id, strategy, config),
                logger,
            )))
        }))
    }

    /// Look up an existing session.
    pub fn get(&self, id: u128) -> Option<Arc<Mutex<SchedulerSession>>> {
        self.sessions.read().get(&id).map(Arc::clone)
    }

    /// Drop a session. The transport calls this when it gives up on a
    /// client (e.g. after a timeout-triggered detach).
    pub fn remove(&self, id: u128) -> bool {
        self.sessions.write().remove(&id).is_some()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session exists.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use skein_core::{build_strategy, StrategyKind};

    use super::*;
    use crate::logger::RecordingApiLogger;

    fn strategy() -> Box<dyn Strategy> {
        build_strategy(StrategyKind::Random, &Configuration::default(), None)
    }

    #[test]
    fn create_is_get_or_create() {
        let registry = SessionRegistry::new();
        let config = Configuration::default();
        let first = registry.create(7, strategy(), &config, Box::new(RecordingApiLogger::new()));
        let second = registry.create(7, strategy(), &config, Box::new(RecordingApiLogger::new()));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn sessions_are_isolated() {
        let registry = SessionRegistry::new();
        let config = Configuration::default();
        registry.create(1, strategy(), &config, Box::new(RecordingApiLogger::new()));
        registry.create(2, strategy(), &config, Box::new(RecordingApiLogger::new()));
        assert_eq!(registry.len(), 2);

        let one = registry.get(1).unwrap();
        one.lock().scheduler_mut().attach().unwrap();
        let two = registry.get(2).unwrap();
        assert!(!two.lock().scheduler().is_attached());
    }

    #[test]
    fn remove_drops_the_session() {
        let registry = SessionRegistry::new();
        let config = Configuration::default();
        registry.create(1, strategy(), &config, Box::new(RecordingApiLogger::new()));
        assert!(registry.remove(1));
        assert!(!registry.remove(1));
        assert!(registry.get(1).is_none());
        assert!(registry.is_empty());
    }
}
