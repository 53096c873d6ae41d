//! Skein scheduling server (transport-free).
//!
//! The boundary between the wire and the engine:
//!
//! ```text
//! skein-server
//!   ├─ SessionRegistry   (session id → monitored scheduler, get-or-create)
//!   ├─ RequestHandler    (wire method → scheduler call, code packing)
//!   └─ ApiLogger         (per-session API invocation log contract)
//! ```
//!
//! The request-handling surface is multi-threaded: the registry map is
//! shared and its lookup path takes only a read lock, while each scheduler
//! sits behind its own mutex that a handler holds for exactly one call. The
//! transport that parallelizes requests (and translates its timeouts into
//! detaches) is a collaborator, not part of this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod handler;
mod logger;
mod registry;

pub use handler::RequestHandler;
pub use logger::{ApiLogger, RecordingApiLogger, TracingApiLogger};
pub use registry::{SchedulerSession, SessionRegistry};
