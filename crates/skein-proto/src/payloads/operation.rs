//! Operation lifecycle payload types.

use serde::{Deserialize, Serialize};

/// Request naming a single operation (create, start, wait, complete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Target operation, canonical text form.
    pub operation_id: String,
}

/// Request blocking the caller on a set of operations.
///
/// With `wait_all` the caller resumes when every target completed; without
/// it, when any one of them has. A wait-any never blocks at all when one
/// target is already completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOperationsRequest {
    /// Targets, canonical text form.
    pub operation_ids: Vec<String>,
    /// Wait-all (true) or wait-any (false).
    pub wait_all: bool,
}

/// Reply carrying the operation allowed to run next.
///
/// The caller proceeds only when this id equals its own operation id; the
/// all-zero sentinel means the schedule is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextOperationReply {
    /// Next operation to run, canonical text form.
    pub next_operation_id: String,
}
