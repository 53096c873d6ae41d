//! Nondeterministic choice and trace payload types.

use serde::{Deserialize, Serialize};

/// Request a nondeterministic integer in `[0, max_value)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextIntegerRequest {
    /// Exclusive upper bound of the choice.
    pub max_value: u64,
}

/// Reply carrying a resolved boolean choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanReply {
    /// The chosen value, also recorded in the schedule trace.
    pub value: bool,
}

/// Reply carrying a resolved integer choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerReply {
    /// The chosen value, also recorded in the schedule trace.
    pub value: u64,
}

/// Reply carrying the serialized schedule trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceReply {
    /// Comma-separated decimal decisions; empty for an empty trace.
    pub trace: String,
}
