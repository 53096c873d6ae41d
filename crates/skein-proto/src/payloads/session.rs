//! Session lifecycle payload types.
//!
//! These payloads create a scheduler session and bind/unbind the program
//! under test: initialize, attach, detach.

use serde::{Deserialize, Serialize};

/// Create (or look up) the scheduler for a session.
///
/// `strategy_type` names one of the exploration strategies: `random`,
/// `probabilistic`, `pct`, `fairpct`, or `replay`. Unknown names fall back
/// to `random`. A `replay` session additionally carries the recorded trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Strategy to explore with.
    pub strategy_type: String,
    /// Recorded trace (comma-separated decimals), for `replay` sessions.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trace: Option<String>,
}

/// Server response to `Initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeReply {
    /// The session's scheduler id, echoed for request routing.
    pub scheduler_id: String,
}

/// Server response to `Attach`.
///
/// The main operation is created and scheduled by the attach itself; the
/// program's driver runs under this identity and must not create, start, or
/// complete it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachReply {
    /// Iteration number this attach begins.
    pub iteration: u64,
    /// Identifier of the distinguished driver operation.
    pub main_operation_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_serde() {
        let request = InitializeRequest {
            strategy_type: "pct".to_string(),
            trace: None,
        };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&request, &mut bytes).expect("encode");

        let decoded: InitializeRequest = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(request, decoded);
    }

    #[test]
    fn initialize_trace_is_optional() {
        let request = InitializeRequest {
            strategy_type: "replay".to_string(),
            trace: Some("1,2,1,3".to_string()),
        };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&request, &mut bytes).expect("encode");

        let decoded: InitializeRequest = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(decoded.trace.as_deref(), Some("1,2,1,3"));
    }

    #[test]
    fn attach_reply_serde() {
        let reply = AttachReply {
            iteration: 3,
            main_operation_id: "0".repeat(31) + "7",
        };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&reply, &mut bytes).expect("encode");

        let decoded: AttachReply = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(reply, decoded);
    }
}
