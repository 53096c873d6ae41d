//! Schedule trace.
//!
//! An ordered, append-only log of the decisions a scheduler made: which
//! operation ran at each step, and which value each nondeterministic choice
//! produced. A trace serializes to comma-separated decimal values and can be
//! replayed to reproduce an exploration exactly.

use std::fmt;
use std::str::FromStr;

use crate::operation::SequenceId;

/// A single recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEntry {
    /// An operation was selected to run; carries its sequence id.
    SchedulingChoice(SequenceId),
    /// A nondeterministic boolean choice was resolved.
    BooleanChoice(bool),
    /// A nondeterministic integer choice was resolved.
    IntegerChoice(u64),
}

impl TraceEntry {
    /// The decimal value this entry serializes to.
    pub fn value(&self) -> u64 {
        match *self {
            TraceEntry::SchedulingChoice(seq) => seq,
            TraceEntry::BooleanChoice(value) => u64::from(value),
            TraceEntry::IntegerChoice(value) => value,
        }
    }
}

/// Error returned when trace text contains anything but decimal values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid trace token {token:?} at position {position}")]
pub struct TraceParseError {
    /// The offending token.
    pub token: String,
    /// Zero-based index of the token within the comma-separated list.
    pub position: usize,
}

/// Ordered log of scheduling decisions, serializable and replayable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTrace {
    entries: Vec<TraceEntry>,
}

impl ScheduleTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded decisions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no decision has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all recorded decisions.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record that the operation with `sequence_id` was scheduled.
    pub fn push_scheduling_choice(&mut self, sequence_id: SequenceId) {
        self.entries.push(TraceEntry::SchedulingChoice(sequence_id));
    }

    /// Record a resolved boolean choice.
    pub fn push_boolean_choice(&mut self, value: bool) {
        self.entries.push(TraceEntry::BooleanChoice(value));
    }

    /// Record a resolved integer choice.
    pub fn push_integer_choice(&mut self, value: u64) {
        self.entries.push(TraceEntry::IntegerChoice(value));
    }

    /// The recorded decisions, oldest first.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// The decimal values of all decisions, in decision order. This is the
    /// sequence replay consumes.
    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(TraceEntry::value)
    }
}

impl fmt::Display for ScheduleTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for entry in &self.entries {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", entry.value())?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ScheduleTrace {
    type Err = TraceParseError;

    /// Parse comma-separated decimal values. The empty string is the empty
    /// trace; no other tokens are tolerated. Parsed entries are scheduling
    /// choices: the serialized form does not distinguish decision kinds, and
    /// replay consumes values positionally.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            return Ok(Self::new());
        }
        let mut entries = Vec::new();
        for (position, token) in text.split(',').enumerate() {
            let value: u64 = token.parse().map_err(|_| TraceParseError {
                token: token.to_string(),
                position,
            })?;
            entries.push(TraceEntry::SchedulingChoice(value));
        }
        Ok(Self { entries })
    }
}
