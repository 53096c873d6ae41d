//! Per-session API invocation logging.
//!
//! Tooling around the scheduler wants to know which framework surface a
//! test actually touched. The logger is injected per session and passed
//! through with it, never a process-wide singleton.

use std::sync::Arc;

use parking_lot::Mutex;
use skein_proto::format_id;

/// Contract for recording which wire methods a session invoked.
pub trait ApiLogger: Send {
    /// Record one invocation of `method`.
    fn record(&mut self, method: &str);
}

/// Default logger: emits one `tracing` event per invocation, tagged with
/// the session id.
pub struct TracingApiLogger {
    session: u128,
}

impl TracingApiLogger {
    /// Create a logger for one session.
    pub fn new(session: u128) -> Self {
        Self { session }
    }
}

impl ApiLogger for TracingApiLogger {
    fn record(&mut self, method: &str) {
        tracing::debug!(
            target: "skein::api",
            session = %format_id(self.session),
            method,
            "api invocation"
        );
    }
}

/// Logger that accumulates invocations in memory, for assertions in tests
/// and for tooling that post-processes the invocation list.
#[derive(Default)]
pub struct RecordingApiLogger {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingApiLogger {
    /// Create an empty recording logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A shared handle to the recorded invocations.
    pub fn handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }
}

impl ApiLogger for RecordingApiLogger {
    fn record(&mut self, method: &str) {
        self.log.lock().push(method.to_string());
    }
}
