//! Request handler.
//!
//! A thin boundary mapping each wire method onto a scheduler call: it
//! validates identifiers, locks the session monitor for the duration of the
//! call, and packs the result (or taxonomy code) into the reply. No state of
//! its own; everything lives in the registry it borrows.

use std::sync::Arc;

use skein_core::{
    build_strategy, Configuration, ScheduleTrace, SchedulerError, StrategyKind, NO_OPERATION,
};
use skein_proto::payloads::{
    AttachReply, BooleanReply, InitializeReply, InitializeRequest, IntegerReply,
    NextOperationReply, TraceReply,
};
use skein_proto::{format_id, parse_id, ErrorCode, Reply, ReplyBody, Request, RequestBody};

use crate::logger::TracingApiLogger;
use crate::registry::{SchedulerSession, SessionRegistry};

/// Maps wire requests onto scheduler calls.
pub struct RequestHandler {
    registry: Arc<SessionRegistry>,
    config: Configuration,
}

impl RequestHandler {
    /// Create a handler over the given registry and session configuration.
    pub fn new(registry: Arc<SessionRegistry>, config: Configuration) -> Self {
        Self { registry, config }
    }

    /// The registry this handler serves.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Handle one remote call and produce its reply. Never panics on
    /// malformed input: bad identifiers and unknown sessions come back as
    /// [`ErrorCode::Failure`].
    pub fn handle(&self, request: &Request) -> Reply {
        let scheduler_id = match parse_id(&request.scheduler_id) {
            Ok(id) => id,
            Err(error) => {
                tracing::warn!(%error, "rejecting request with malformed scheduler id");
                return Reply::error(ErrorCode::Failure);
            }
        };
        match &request.body {
            RequestBody::Initialize(init) => self.initialize(scheduler_id, init),
            body => self.dispatch(scheduler_id, body),
        }
    }

    fn initialize(&self, scheduler_id: u128, init: &InitializeRequest) -> Reply {
        let kind = StrategyKind::parse(&init.strategy_type);
        let trace: Option<ScheduleTrace> = match &init.trace {
            Some(text) => match text.parse() {
                Ok(trace) => Some(trace),
                Err(error) => {
                    tracing::warn!(%error, "rejecting initialize with malformed trace");
                    return Reply::error(ErrorCode::Failure);
                }
            },
            None => None,
        };
        let strategy = build_strategy(kind, &self.config, trace.as_ref());
        self.registry.create(
            scheduler_id,
            strategy,
            &self.config,
            Box::new(TracingApiLogger::new(scheduler_id)),
        );
        Reply::with_body(ReplyBody::Initialize(InitializeReply {
            scheduler_id: format_id(scheduler_id),
        }))
    }

    fn dispatch(&self, scheduler_id: u128, body: &RequestBody) -> Reply {
        let session = match self.registry.get(scheduler_id) {
            Some(session) => session,
            None => {
                tracing::warn!(
                    session = %format_id(scheduler_id),
                    "request for unknown session"
                );
                return Reply::error(ErrorCode::Failure);
            }
        };
        let mut session = session.lock();
        session.record_invocation(body.method());
        Self::call(&mut session, body)
    }

    fn call(session: &mut SchedulerSession, body: &RequestBody) -> Reply {
        let scheduler = session.scheduler_mut();
        let result = match body {
            RequestBody::Initialize(_) => unreachable!("initialize is handled before dispatch"),

            RequestBody::Attach => scheduler.attach().map(|(iteration, main_operation_id)| {
                Some(ReplyBody::Attach(AttachReply {
                    iteration,
                    main_operation_id: format_id(main_operation_id),
                }))
            }),
            RequestBody::Detach => scheduler.detach().map(|()| None),

            RequestBody::CreateOperation(request) => {
                match parse_operation_id(&request.operation_id) {
                    Ok(id) => scheduler.create_operation(id).map(|()| None),
                    Err(reply) => return reply,
                }
            }
            RequestBody::StartOperation(request) => {
                match parse_operation_id(&request.operation_id) {
                    Ok(id) => scheduler.start_operation(id).map(|()| None),
                    Err(reply) => return reply,
                }
            }
            RequestBody::WaitOperation(request) => {
                match parse_id(&request.operation_id) {
                    Ok(id) => scheduler.wait_operation(id).map(next_operation_body),
                    Err(_) => return Reply::error(ErrorCode::Failure),
                }
            }
            RequestBody::WaitOperations(request) => {
                let mut ids = Vec::with_capacity(request.operation_ids.len());
                for text in &request.operation_ids {
                    match parse_id(text) {
                        Ok(id) => ids.push(id),
                        Err(_) => return Reply::error(ErrorCode::Failure),
                    }
                }
                scheduler
                    .wait_operations(&ids, request.wait_all)
                    .map(next_operation_body)
            }
            RequestBody::CompleteOperation(request) => {
                match parse_id(&request.operation_id) {
                    Ok(id) => scheduler.complete_operation(id).map(next_operation_body),
                    Err(_) => return Reply::error(ErrorCode::Failure),
                }
            }

            RequestBody::CreateResource(request) => {
                match parse_id(&request.resource_id) {
                    Ok(id) => scheduler.create_resource(id).map(|()| None),
                    Err(_) => return Reply::error(ErrorCode::Failure),
                }
            }
            RequestBody::DeleteResource(request) => {
                match parse_id(&request.resource_id) {
                    Ok(id) => scheduler.delete_resource(id).map(|()| None),
                    Err(_) => return Reply::error(ErrorCode::Failure),
                }
            }
            RequestBody::WaitResource(request) => {
                match parse_id(&request.resource_id) {
                    Ok(id) => scheduler.wait_resource(id).map(next_operation_body),
                    Err(_) => return Reply::error(ErrorCode::Failure),
                }
            }
            RequestBody::SignalOperation(request) => {
                match (parse_id(&request.operation_id), parse_id(&request.resource_id)) {
                    (Ok(operation), Ok(resource)) => {
                        scheduler.signal_operation(operation, resource).map(|()| None)
                    }
                    _ => return Reply::error(ErrorCode::Failure),
                }
            }
            RequestBody::SignalOperations(request) => {
                match parse_id(&request.resource_id) {
                    Ok(id) => scheduler.signal_operations(id).map(|()| None),
                    Err(_) => return Reply::error(ErrorCode::Failure),
                }
            }

            RequestBody::ScheduleNext => scheduler.schedule_next().map(next_operation_body),
            RequestBody::GetNextBoolean => scheduler
                .next_boolean()
                .map(|value| Some(ReplyBody::Boolean(BooleanReply { value }))),
            RequestBody::GetNextInteger(request) => scheduler
                .next_integer(request.max_value)
                .map(|value| Some(ReplyBody::Integer(IntegerReply { value }))),
            RequestBody::GetTrace => scheduler
                .serialized_trace()
                .map(|trace| Some(ReplyBody::Trace(TraceReply { trace }))),
        };

        match result {
            Ok(Some(body)) => Reply::with_body(body),
            Ok(None) => Reply::ok(),
            Err(error) => {
                tracing::debug!(%error, method = body.method(), "scheduler call failed");
                Reply::error(code_for(&error))
            }
        }
    }
}

fn next_operation_body(next: u128) -> Option<ReplyBody> {
    Some(ReplyBody::NextOperation(NextOperationReply {
        next_operation_id: format_id(next),
    }))
}

/// Operation ids used in creation must be both well-formed and not the
/// reserved all-zero sentinel.
fn parse_operation_id(text: &str) -> Result<u128, Reply> {
    match parse_id(text) {
        Ok(NO_OPERATION) => Err(Reply::error(ErrorCode::Failure)),
        Ok(id) => Ok(id),
        Err(_) => Err(Reply::error(ErrorCode::Failure)),
    }
}

fn code_for(error: &SchedulerError) -> ErrorCode {
    match error {
        SchedulerError::DeadlockDetected { .. } => ErrorCode::DeadlockDetected,
        SchedulerError::DuplicateOperation(_) => ErrorCode::DuplicateOperation,
        SchedulerError::NotExistingOperation(_) => ErrorCode::NotExistingOperation,
        SchedulerError::MainOperationExplicitlyCreated(_) => {
            ErrorCode::MainOperationExplicitlyCreated
        }
        SchedulerError::MainOperationExplicitlyStarted(_) => {
            ErrorCode::MainOperationExplicitlyStarted
        }
        SchedulerError::MainOperationExplicitlyCompleted(_) => {
            ErrorCode::MainOperationExplicitlyCompleted
        }
        SchedulerError::OperationNotStarted(_) => ErrorCode::OperationNotStarted,
        SchedulerError::OperationAlreadyStarted(_) => ErrorCode::OperationAlreadyStarted,
        SchedulerError::OperationAlreadyCompleted(_) => ErrorCode::OperationAlreadyCompleted,
        SchedulerError::DuplicateResource(_) => ErrorCode::DuplicateResource,
        SchedulerError::NotExistingResource(_) => ErrorCode::NotExistingResource,
        SchedulerError::ClientAttached => ErrorCode::ClientAttached,
        SchedulerError::ClientNotAttached => ErrorCode::ClientNotAttached,
        SchedulerError::Internal(_) => ErrorCode::InternalError,
        SchedulerError::SchedulerDisabled => ErrorCode::SchedulerDisabled,
    }
}
