//! Request and reply envelopes.
//!
//! A request names the session it targets and carries one method-tagged
//! body; a reply always carries an error code and, on success, the typed
//! result body for that method.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::payloads::{
    AttachReply, BooleanReply, InitializeReply, InitializeRequest, IntegerReply,
    NextIntegerRequest, NextOperationReply, OperationRequest, ResourceRequest,
    SignalOperationRequest, TraceReply, WaitOperationsRequest,
};

/// One remote call to a scheduler session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Session the call targets, canonical text form.
    pub scheduler_id: String,
    /// The method and its payload.
    pub body: RequestBody,
}

impl Request {
    /// Build a request for the given session.
    pub fn new(scheduler_id: impl Into<String>, body: RequestBody) -> Self {
        Self {
            scheduler_id: scheduler_id.into(),
            body,
        }
    }
}

/// Method-tagged request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum RequestBody {
    /// Create or look up the session's scheduler.
    Initialize(InitializeRequest),
    /// Bind the program under test.
    Attach,
    /// Unbind the program and cancel everything outstanding.
    Detach,
    /// Register an operation.
    CreateOperation(OperationRequest),
    /// Enable a registered operation.
    StartOperation(OperationRequest),
    /// Block the scheduled operation on one target.
    WaitOperation(OperationRequest),
    /// Block the scheduled operation on a set of targets.
    WaitOperations(WaitOperationsRequest),
    /// Complete an operation and pick the next one.
    CompleteOperation(OperationRequest),
    /// Create a resource (idempotent).
    CreateResource(ResourceRequest),
    /// Delete a resource (unconditional).
    DeleteResource(ResourceRequest),
    /// Block the scheduled operation on a resource.
    WaitResource(ResourceRequest),
    /// Re-enable one waiter of a resource.
    SignalOperation(SignalOperationRequest),
    /// Re-enable every waiter of a resource.
    SignalOperations(ResourceRequest),
    /// Ask for the next operation to run.
    ScheduleNext,
    /// Resolve a nondeterministic boolean choice.
    GetNextBoolean,
    /// Resolve a nondeterministic integer choice.
    GetNextInteger(NextIntegerRequest),
    /// Fetch the serialized schedule trace.
    GetTrace,
}

impl RequestBody {
    /// The wire method name, for logging.
    pub fn method(&self) -> &'static str {
        match self {
            RequestBody::Initialize(_) => "Initialize",
            RequestBody::Attach => "Attach",
            RequestBody::Detach => "Detach",
            RequestBody::CreateOperation(_) => "CreateOperation",
            RequestBody::StartOperation(_) => "StartOperation",
            RequestBody::WaitOperation(_) => "WaitOperation",
            RequestBody::WaitOperations(_) => "WaitOperations",
            RequestBody::CompleteOperation(_) => "CompleteOperation",
            RequestBody::CreateResource(_) => "CreateResource",
            RequestBody::DeleteResource(_) => "DeleteResource",
            RequestBody::WaitResource(_) => "WaitResource",
            RequestBody::SignalOperation(_) => "SignalOperation",
            RequestBody::SignalOperations(_) => "SignalOperations",
            RequestBody::ScheduleNext => "ScheduleNext",
            RequestBody::GetNextBoolean => "GetNextBoolean",
            RequestBody::GetNextInteger(_) => "GetNextInteger",
            RequestBody::GetTrace => "GetTrace",
        }
    }
}

/// Reply to one remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Taxonomy code; `Success` iff the call succeeded.
    pub error_code: ErrorCode,
    /// Result body, present for methods that return one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<ReplyBody>,
}

impl Reply {
    /// A successful reply with no body.
    pub fn ok() -> Self {
        Self {
            error_code: ErrorCode::Success,
            body: None,
        }
    }

    /// A successful reply carrying `body`.
    pub fn with_body(body: ReplyBody) -> Self {
        Self {
            error_code: ErrorCode::Success,
            body: Some(body),
        }
    }

    /// A failed reply carrying only the code.
    pub fn error(code: ErrorCode) -> Self {
        Self {
            error_code: code,
            body: None,
        }
    }
}

/// Typed result body of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ReplyBody {
    /// Result of `Initialize`.
    Initialize(InitializeReply),
    /// Result of `Attach`.
    Attach(AttachReply),
    /// Result of the scheduling methods.
    NextOperation(NextOperationReply),
    /// Result of `GetNextBoolean`.
    Boolean(BooleanReply),
    /// Result of `GetNextInteger`.
    Integer(IntegerReply),
    /// Result of `GetTrace`.
    Trace(TraceReply),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T>(value: &T) -> T
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(value, &mut bytes).expect("encode");
        ciborium::de::from_reader(&bytes[..]).expect("decode")
    }

    #[test]
    fn request_round_trip() {
        let request = Request::new(
            format!("{:032x}", 9u128),
            RequestBody::WaitOperations(WaitOperationsRequest {
                operation_ids: vec![format!("{:032x}", 1u128)],
                wait_all: true,
            }),
        );
        assert_eq!(round_trip(&request), request);
    }

    #[test]
    fn unit_methods_round_trip() {
        for body in [
            RequestBody::Attach,
            RequestBody::Detach,
            RequestBody::ScheduleNext,
            RequestBody::GetNextBoolean,
            RequestBody::GetTrace,
        ] {
            let request = Request::new(format!("{:032x}", 1u128), body);
            assert_eq!(round_trip(&request), request);
        }
    }

    #[test]
    fn reply_without_body_round_trips() {
        let reply = Reply::error(ErrorCode::ClientNotAttached);
        let decoded = round_trip(&reply);
        assert_eq!(decoded.error_code, ErrorCode::ClientNotAttached);
        assert!(decoded.body.is_none());
    }

    #[test]
    fn reply_with_body_round_trips() {
        let reply = Reply::with_body(ReplyBody::NextOperation(NextOperationReply {
            next_operation_id: format!("{:032x}", 4u128),
        }));
        assert_eq!(round_trip(&reply), reply);
    }

    #[test]
    fn method_names_are_stable() {
        assert_eq!(RequestBody::Attach.method(), "Attach");
        assert_eq!(
            RequestBody::GetNextInteger(NextIntegerRequest { max_value: 5 }).method(),
            "GetNextInteger"
        );
    }
}
