//! Test harness for the Skein remote scheduler.
//!
//! `TestClient` drives a `RequestHandler` exactly the way a transport
//! would: every interaction is a wire request, every answer a wire reply.
//! Scenario tests build on it with small extractor helpers so assertions
//! read at the protocol level.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use skein_core::Configuration;
use skein_proto::payloads::{
    InitializeRequest, NextIntegerRequest, OperationRequest, ResourceRequest,
    SignalOperationRequest, WaitOperationsRequest,
};
use skein_proto::{format_id, parse_id, Reply, ReplyBody, Request, RequestBody};
use skein_server::{RequestHandler, SessionRegistry};

/// A protocol-level client for one scheduler session.
pub struct TestClient {
    handler: RequestHandler,
    scheduler_id: u128,
}

impl TestClient {
    /// Create a client with a fresh registry and the given configuration.
    pub fn new(scheduler_id: u128, config: Configuration) -> Self {
        Self {
            handler: RequestHandler::new(Arc::new(SessionRegistry::new()), config),
            scheduler_id,
        }
    }

    /// Create a client that shares an existing handler (multi-session
    /// tests).
    pub fn with_handler(handler: RequestHandler, scheduler_id: u128) -> Self {
        Self {
            handler,
            scheduler_id,
        }
    }

    /// The underlying handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Send one raw request body to the session.
    pub fn call(&self, body: RequestBody) -> Reply {
        self.handler
            .handle(&Request::new(format_id(self.scheduler_id), body))
    }

    /// `Initialize` with a strategy name and optional replay trace.
    pub fn initialize(&self, strategy_type: &str, trace: Option<&str>) -> Reply {
        self.call(RequestBody::Initialize(InitializeRequest {
            strategy_type: strategy_type.to_string(),
            trace: trace.map(str::to_string),
        }))
    }

    /// `Attach`.
    pub fn attach(&self) -> Reply {
        self.call(RequestBody::Attach)
    }

    /// `Detach`.
    pub fn detach(&self) -> Reply {
        self.call(RequestBody::Detach)
    }

    /// `CreateOperation`.
    pub fn create_operation(&self, id: u128) -> Reply {
        self.call(RequestBody::CreateOperation(OperationRequest {
            operation_id: format_id(id),
        }))
    }

    /// `StartOperation`.
    pub fn start_operation(&self, id: u128) -> Reply {
        self.call(RequestBody::StartOperation(OperationRequest {
            operation_id: format_id(id),
        }))
    }

    /// `CreateOperation` followed by `StartOperation`, asserting success.
    pub fn spawn_operation(&self, id: u128) {
        expect_ok(&self.create_operation(id), "CreateOperation");
        expect_ok(&self.start_operation(id), "StartOperation");
    }

    /// `WaitOperation`.
    pub fn wait_operation(&self, id: u128) -> Reply {
        self.call(RequestBody::WaitOperation(OperationRequest {
            operation_id: format_id(id),
        }))
    }

    /// `WaitOperations`.
    pub fn wait_operations(&self, ids: &[u128], wait_all: bool) -> Reply {
        self.call(RequestBody::WaitOperations(WaitOperationsRequest {
            operation_ids: ids.iter().copied().map(format_id).collect(),
            wait_all,
        }))
    }

    /// `CompleteOperation`.
    pub fn complete_operation(&self, id: u128) -> Reply {
        self.call(RequestBody::CompleteOperation(OperationRequest {
            operation_id: format_id(id),
        }))
    }

    /// `CreateResource`.
    pub fn create_resource(&self, id: u128) -> Reply {
        self.call(RequestBody::CreateResource(ResourceRequest {
            resource_id: format_id(id),
        }))
    }

    /// `DeleteResource`.
    pub fn delete_resource(&self, id: u128) -> Reply {
        self.call(RequestBody::DeleteResource(ResourceRequest {
            resource_id: format_id(id),
        }))
    }

    /// `WaitResource`.
    pub fn wait_resource(&self, id: u128) -> Reply {
        self.call(RequestBody::WaitResource(ResourceRequest {
            resource_id: format_id(id),
        }))
    }

    /// `SignalOperation`.
    pub fn signal_operation(&self, operation_id: u128, resource_id: u128) -> Reply {
        self.call(RequestBody::SignalOperation(SignalOperationRequest {
            resource_id: format_id(resource_id),
            operation_id: format_id(operation_id),
        }))
    }

    /// `SignalOperations`.
    pub fn signal_operations(&self, resource_id: u128) -> Reply {
        self.call(RequestBody::SignalOperations(ResourceRequest {
            resource_id: format_id(resource_id),
        }))
    }

    /// `ScheduleNext`.
    pub fn schedule_next(&self) -> Reply {
        self.call(RequestBody::ScheduleNext)
    }

    /// `GetNextBoolean`.
    pub fn next_boolean(&self) -> Reply {
        self.call(RequestBody::GetNextBoolean)
    }

    /// `GetNextInteger`.
    pub fn next_integer(&self, max_value: u64) -> Reply {
        self.call(RequestBody::GetNextInteger(NextIntegerRequest { max_value }))
    }

    /// `GetTrace`.
    pub fn get_trace(&self) -> Reply {
        self.call(RequestBody::GetTrace)
    }
}

/// Assert a reply succeeded.
pub fn expect_ok(reply: &Reply, method: &str) {
    assert!(
        reply.error_code.is_success(),
        "{method} failed with {:?}",
        reply.error_code
    );
}

/// Extract the `next_operation_id` of a scheduling reply.
pub fn next_operation_id(reply: &Reply) -> u128 {
    match &reply.body {
        Some(ReplyBody::NextOperation(next)) => {
            parse_id(&next.next_operation_id).expect("well-formed next operation id")
        }
        other => panic!("expected a next-operation reply, got {other:?}"),
    }
}

/// Extract `(iteration, main_operation_id)` of an attach reply.
pub fn attach_result(reply: &Reply) -> (u64, u128) {
    match &reply.body {
        Some(ReplyBody::Attach(attach)) => (
            attach.iteration,
            parse_id(&attach.main_operation_id).expect("well-formed main operation id"),
        ),
        other => panic!("expected an attach reply, got {other:?}"),
    }
}

/// Extract the value of a boolean-choice reply.
pub fn boolean_value(reply: &Reply) -> bool {
    match &reply.body {
        Some(ReplyBody::Boolean(choice)) => choice.value,
        other => panic!("expected a boolean reply, got {other:?}"),
    }
}

/// Extract the value of an integer-choice reply.
pub fn integer_value(reply: &Reply) -> u64 {
    match &reply.body {
        Some(ReplyBody::Integer(choice)) => choice.value,
        other => panic!("expected an integer reply, got {other:?}"),
    }
}

/// Extract the CSV text of a trace reply.
pub fn trace_text(reply: &Reply) -> String {
    match &reply.body {
        Some(ReplyBody::Trace(trace)) => trace.trace.clone(),
        other => panic!("expected a trace reply, got {other:?}"),
    }
}
