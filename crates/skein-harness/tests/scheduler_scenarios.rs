//! End-to-end scheduling scenarios over the wire surface.
//!
//! Each test drives a session exactly as an instrumented program under test
//! would: requests in, replies out, with the returned next-operation id
//! steering the flow.

use skein_core::Configuration;
use skein_harness::{
    attach_result, expect_ok, next_operation_id, trace_text, TestClient,
};
use skein_proto::{ErrorCode, NO_OPERATION_ID};

const A: u128 = 10;
const B: u128 = 11;
const R: u128 = 77;

fn client() -> TestClient {
    let client = TestClient::new(1, Configuration::default());
    expect_ok(&client.initialize("random", None), "Initialize");
    client
}

#[test]
fn serial_completion_returns_to_main() {
    let client = client();
    let (iteration, main) = attach_result(&client.attach());
    assert_eq!(iteration, 0);
    assert_ne!(main, NO_OPERATION_ID);

    client.spawn_operation(A);
    let reply = client.complete_operation(A);
    expect_ok(&reply, "CompleteOperation");
    assert_eq!(next_operation_id(&reply), main);

    let reply = client.complete_operation(main);
    expect_ok(&reply, "CompleteOperation");
    assert_eq!(next_operation_id(&reply), NO_OPERATION_ID);
}

#[test]
fn wait_all_blocks_until_every_target_completes() {
    let client = client();
    let (_, main) = attach_result(&client.attach());
    client.spawn_operation(A);
    client.spawn_operation(B);

    // Main blocks on both children; some child is scheduled instead.
    let reply = client.wait_operations(&[A, B], true);
    expect_ok(&reply, "WaitOperations");
    let first = next_operation_id(&reply);
    assert!(first == A || first == B);

    // One completion is not enough to release main.
    let reply = client.complete_operation(A);
    assert_ne!(next_operation_id(&reply), main);

    // The second is.
    let reply = client.complete_operation(B);
    assert_eq!(next_operation_id(&reply), main);
    assert_eq!(next_operation_id(&client.schedule_next()), main);
}

#[test]
fn wait_any_returns_immediately_on_a_completed_target() {
    let client = client();
    attach_result(&client.attach());
    client.spawn_operation(A);
    client.spawn_operation(B);
    expect_ok(&client.complete_operation(A), "CompleteOperation");

    // A already completed: wait-any must not block the caller.
    let reply = client.wait_operations(&[A, B], false);
    expect_ok(&reply, "WaitOperations");
    assert_ne!(next_operation_id(&reply), NO_OPERATION_ID);
    // Nobody was blocked by the call: the rest of the schedule drains
    // without any further signal.
    let reply = client.complete_operation(B);
    expect_ok(&reply, "CompleteOperation");
    let main = next_operation_id(&reply);
    assert_ne!(main, NO_OPERATION_ID);
    assert_eq!(next_operation_id(&client.complete_operation(main)), NO_OPERATION_ID);
}

#[test]
fn resource_signal_reenables_the_waiter() {
    let client = client();
    let (_, main) = attach_result(&client.attach());
    client.spawn_operation(A);
    client.spawn_operation(B);
    expect_ok(&client.create_resource(R), "CreateResource");

    // Main blocks on both children so the children drive the schedule.
    let reply = client.wait_operations(&[A, B], true);
    let first = next_operation_id(&reply);
    let second = if first == A { B } else { A };

    // The scheduled child blocks on the resource; its sibling takes over.
    let reply = client.wait_resource(R);
    expect_ok(&reply, "WaitResource");
    assert_eq!(next_operation_id(&reply), second);

    // Signal re-enables the blocked child; once the sibling completes it is
    // the only enabled operation left.
    expect_ok(&client.signal_operation(first, R), "SignalOperation");
    let reply = client.complete_operation(second);
    assert_eq!(next_operation_id(&reply), first);

    let reply = client.complete_operation(first);
    assert_eq!(next_operation_id(&reply), main);
    assert_eq!(next_operation_id(&client.complete_operation(main)), NO_OPERATION_ID);
}

#[test]
fn cyclic_wait_is_a_deadlock() {
    let client = client();
    let (_, main) = attach_result(&client.attach());
    client.spawn_operation(A);

    // Main waits on the child, the child waits on main: nothing can run.
    let reply = client.wait_operation(A);
    expect_ok(&reply, "WaitOperation");
    assert_eq!(next_operation_id(&reply), A);

    let reply = client.wait_operation(main);
    assert_eq!(reply.error_code, ErrorCode::DeadlockDetected);

    // The scheduler is disabled until detach.
    assert_eq!(client.schedule_next().error_code, ErrorCode::SchedulerDisabled);
    assert_eq!(client.get_trace().error_code, ErrorCode::SchedulerDisabled);
    expect_ok(&client.detach(), "Detach");
    let (iteration, _) = attach_result(&client.attach());
    assert_eq!(iteration, 1);
}

#[test]
fn schedule_next_reports_deadlock_for_unstarted_leftovers() {
    let client = client();
    let (_, main) = attach_result(&client.attach());
    assert_eq!(next_operation_id(&client.complete_operation(main)), NO_OPERATION_ID);

    // A created-but-never-started operation keeps the schedule incomplete.
    expect_ok(&client.create_operation(A), "CreateOperation");
    let reply = client.schedule_next();
    assert_eq!(reply.error_code, ErrorCode::DeadlockDetected);
}

#[test]
fn empty_schedule_completes_with_the_sentinel() {
    let client = client();
    let (_, main) = attach_result(&client.attach());
    assert_eq!(next_operation_id(&client.complete_operation(main)), NO_OPERATION_ID);
    // Everything completed: repeated polling stays at the sentinel.
    let reply = client.schedule_next();
    expect_ok(&reply, "ScheduleNext");
    assert_eq!(next_operation_id(&reply), NO_OPERATION_ID);
}

#[test]
fn operation_lifecycle_errors_reach_the_wire() {
    let client = client();
    let (_, main) = attach_result(&client.attach());

    assert_eq!(client.wait_operation(A).error_code, ErrorCode::NotExistingOperation);
    assert_eq!(
        client.create_operation(main).error_code,
        ErrorCode::MainOperationExplicitlyCreated
    );
    assert_eq!(
        client.start_operation(main).error_code,
        ErrorCode::MainOperationExplicitlyStarted
    );

    expect_ok(&client.create_operation(A), "CreateOperation");
    assert_eq!(client.create_operation(A).error_code, ErrorCode::DuplicateOperation);
    assert_eq!(client.wait_operation(A).error_code, ErrorCode::OperationNotStarted);
    assert_eq!(client.complete_operation(A).error_code, ErrorCode::OperationNotStarted);

    expect_ok(&client.start_operation(A), "StartOperation");
    assert_eq!(client.start_operation(A).error_code, ErrorCode::OperationAlreadyStarted);

    expect_ok(&client.complete_operation(A), "CompleteOperation");
    assert_eq!(client.start_operation(A).error_code, ErrorCode::OperationAlreadyCompleted);
    assert_eq!(
        client.complete_operation(A).error_code,
        ErrorCode::OperationAlreadyCompleted
    );
}

#[test]
fn terminal_operations_can_be_recreated() {
    let client = client();
    attach_result(&client.attach());
    client.spawn_operation(A);
    expect_ok(&client.complete_operation(A), "CompleteOperation");

    // Same id, next task of the program: reset instead of duplicate.
    client.spawn_operation(A);
    expect_ok(&client.complete_operation(A), "CompleteOperation");
}

#[test]
fn resources_are_idempotent_to_create_and_unconditional_to_delete() {
    let client = client();
    attach_result(&client.attach());
    expect_ok(&client.create_resource(R), "CreateResource");
    expect_ok(&client.create_resource(R), "CreateResource");
    expect_ok(&client.delete_resource(R), "DeleteResource");
    expect_ok(&client.delete_resource(R), "DeleteResource");
    assert_eq!(client.wait_resource(R).error_code, ErrorCode::NotExistingResource);
    assert_eq!(client.signal_operations(R).error_code, ErrorCode::NotExistingResource);
}

#[test]
fn detach_resets_the_session_for_the_next_iteration() {
    let client = client();
    let (_, first_main) = attach_result(&client.attach());
    client.spawn_operation(A);
    expect_ok(&client.detach(), "Detach");

    let (iteration, second_main) = attach_result(&client.attach());
    assert_eq!(iteration, 1);
    assert_ne!(second_main, first_main);
    // The previous iteration's operations are gone.
    assert_eq!(client.wait_operation(A).error_code, ErrorCode::NotExistingOperation);
    // And the trace starts over.
    assert_eq!(trace_text(&client.get_trace()), "");
}

#[test]
fn calls_without_attachment_are_rejected() {
    let client = client();
    assert_eq!(client.schedule_next().error_code, ErrorCode::ClientNotAttached);
    assert_eq!(client.create_operation(A).error_code, ErrorCode::ClientNotAttached);
    assert_eq!(client.detach().error_code, ErrorCode::ClientNotAttached);
    expect_ok(&client.attach(), "Attach");
    assert_eq!(client.attach().error_code, ErrorCode::ClientAttached);
}
