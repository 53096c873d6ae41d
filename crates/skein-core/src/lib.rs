//! Skein scheduling engine.
//!
//! This crate is the in-process core of a remote controlled-concurrency
//! scheduler: a program under test announces every concurrency event
//! (operation creation, start, wait, resource signal, completion,
//! nondeterministic choice) and the scheduler serializes those events into a
//! single global interleaving chosen by a pluggable exploration strategy.
//!
//! ## Architecture
//!
//! ```text
//! skein-core
//!   ├─ RandomSource     (seeded, deterministic PRNG)
//!   ├─ ScheduleTrace    (append-only decision log, CSV round-trip)
//!   ├─ Operation        (controlled unit; wait/signal state machine)
//!   ├─ Resource         (named synchronization point)
//!   ├─ Scheduler        (the serializer; owns the tables and the trace)
//!   └─ Strategy         (operation selection and delay injection policies)
//! ```
//!
//! The crate is Sans-IO: nothing here performs network or thread operations
//! on behalf of the program under test (the one exception is the
//! `RapidContextSwitch` fuzzing strategy, which parks the calling thread by
//! design). Callers are expected to hold exactly one monitor around each
//! scheduler, which the boundary crate does by wrapping `Scheduler` in a
//! mutex per session.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod operation;
pub mod random;
pub mod resource;
pub mod scheduler;
pub mod strategy;
pub mod trace;

pub use config::Configuration;
pub use error::SchedulerError;
pub use operation::{Operation, OperationId, OperationStatus, SequenceId};
pub use random::RandomSource;
pub use resource::{Resource, ResourceId};
pub use scheduler::{Scheduler, NO_OPERATION};
pub use strategy::{build_strategy, Strategy, StrategyKind};
pub use trace::{ScheduleTrace, TraceEntry, TraceParseError};
