//! Wire error codes.
//!
//! Every reply carries exactly one of these codes. The numeric values are
//! the protocol; they never change meaning between versions.

use serde::{Deserialize, Serialize};

/// Error taxonomy of the scheduling surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ErrorCode {
    /// The call succeeded.
    Success = 0,
    /// Unclassified failure (e.g. malformed identifiers, unknown session).
    Failure = 100,
    /// No operation is enabled but uncompleted operations remain.
    DeadlockDetected = 101,
    /// `CreateOperation` on a live id.
    DuplicateOperation = 200,
    /// An operation method named an unknown id.
    NotExistingOperation = 201,
    /// Explicit `CreateOperation` on the reserved main id.
    MainOperationExplicitlyCreated = 202,
    /// Explicit `StartOperation` on the reserved main id.
    MainOperationExplicitlyStarted = 203,
    /// Explicit lifecycle call completing the reserved main id.
    MainOperationExplicitlyCompleted = 204,
    /// Wait or complete before start.
    OperationNotStarted = 205,
    /// `StartOperation` called twice.
    OperationAlreadyStarted = 206,
    /// Start, wait, or complete after completion.
    OperationAlreadyCompleted = 207,
    /// `CreateResource` on a live id.
    DuplicateResource = 300,
    /// A resource method named an unknown id.
    NotExistingResource = 301,
    /// `Attach` while a client is attached.
    ClientAttached = 400,
    /// Any operation while no client is attached.
    ClientNotAttached = 401,
    /// Invariant violation inside the scheduler.
    InternalError = 500,
    /// Call received after a fatal error, before detach.
    SchedulerDisabled = 501,
}

impl ErrorCode {
    /// Whether this code means the call succeeded.
    pub fn is_success(self) -> bool {
        self == ErrorCode::Success
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            100 => ErrorCode::Failure,
            101 => ErrorCode::DeadlockDetected,
            200 => ErrorCode::DuplicateOperation,
            201 => ErrorCode::NotExistingOperation,
            202 => ErrorCode::MainOperationExplicitlyCreated,
            203 => ErrorCode::MainOperationExplicitlyStarted,
            204 => ErrorCode::MainOperationExplicitlyCompleted,
            205 => ErrorCode::OperationNotStarted,
            206 => ErrorCode::OperationAlreadyStarted,
            207 => ErrorCode::OperationAlreadyCompleted,
            300 => ErrorCode::DuplicateResource,
            301 => ErrorCode::NotExistingResource,
            400 => ErrorCode::ClientAttached,
            401 => ErrorCode::ClientNotAttached,
            500 => ErrorCode::InternalError,
            501 => ErrorCode::SchedulerDisabled,
            other => return Err(format!("unknown error code {other}")),
        };
        Ok(code)
    }
}
