//! Per-method payload types.
//!
//! Grouped by concern: session lifecycle, operation lifecycle, resource
//! signaling, and nondeterministic choices. Every payload derives serde and
//! round-trips through CBOR.

pub mod choice;
pub mod operation;
pub mod resource;
pub mod session;

pub use choice::{BooleanReply, IntegerReply, NextIntegerRequest, TraceReply};
pub use operation::{NextOperationReply, OperationRequest, WaitOperationsRequest};
pub use resource::{ResourceRequest, SignalOperationRequest};
pub use session::{AttachReply, InitializeReply, InitializeRequest};
