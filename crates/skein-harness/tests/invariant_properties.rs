//! Model-style property tests.
//!
//! Proptest generates random (not necessarily sensible) call sequences and
//! applies them to a scheduler; after every call the structural invariants
//! must hold:
//!
//! 1. `status == Enabled` exactly for members of the enabled set
//! 2. wait/signal back-links are symmetric
//! 3. terminal operations are unlinked and not enabled
//! 4. the trace only ever grows, by at most one entry per call

use std::collections::HashMap;

use proptest::prelude::*;
use skein_core::{
    build_strategy, Configuration, Operation, OperationStatus, Scheduler, SequenceId, StrategyKind,
};

/// One remote call, over a deliberately small id space so sequences collide
/// with live, terminal, and unknown operations alike.
#[derive(Debug, Clone)]
enum Call {
    CreateOperation(u8),
    StartOperation(u8),
    WaitOperation(u8),
    WaitOperations(Vec<u8>, bool),
    CompleteOperation(u8),
    CreateResource(u8),
    DeleteResource(u8),
    WaitResource(u8),
    SignalOperation(u8, u8),
    SignalOperations(u8),
    ScheduleNext,
    NextBoolean,
    NextInteger(u8),
}

fn operation_id(n: u8) -> u128 {
    10 + u128::from(n % 5)
}

fn resource_id(n: u8) -> u128 {
    100 + u128::from(n % 3)
}

fn call_strategy() -> impl Strategy<Value = Call> {
    prop_oneof![
        any::<u8>().prop_map(Call::CreateOperation),
        any::<u8>().prop_map(Call::StartOperation),
        any::<u8>().prop_map(Call::WaitOperation),
        (proptest::collection::vec(any::<u8>(), 1..4), any::<bool>())
            .prop_map(|(ids, wait_all)| Call::WaitOperations(ids, wait_all)),
        any::<u8>().prop_map(Call::CompleteOperation),
        any::<u8>().prop_map(Call::CreateResource),
        any::<u8>().prop_map(Call::DeleteResource),
        any::<u8>().prop_map(Call::WaitResource),
        (any::<u8>(), any::<u8>()).prop_map(|(op, res)| Call::SignalOperation(op, res)),
        any::<u8>().prop_map(Call::SignalOperations),
        Just(Call::ScheduleNext),
        Just(Call::NextBoolean),
        any::<u8>().prop_map(Call::NextInteger),
    ]
}

fn apply(scheduler: &mut Scheduler, call: &Call) {
    match call {
        Call::CreateOperation(n) => {
            let _ = scheduler.create_operation(operation_id(*n));
        }
        Call::StartOperation(n) => {
            let _ = scheduler.start_operation(operation_id(*n));
        }
        Call::WaitOperation(n) => {
            let _ = scheduler.wait_operation(operation_id(*n));
        }
        Call::WaitOperations(ns, wait_all) => {
            let ids: Vec<u128> = ns.iter().map(|n| operation_id(*n)).collect();
            let _ = scheduler.wait_operations(&ids, *wait_all);
        }
        Call::CompleteOperation(n) => {
            let _ = scheduler.complete_operation(operation_id(*n));
        }
        Call::CreateResource(n) => {
            let _ = scheduler.create_resource(resource_id(*n));
        }
        Call::DeleteResource(n) => {
            let _ = scheduler.delete_resource(resource_id(*n));
        }
        Call::WaitResource(n) => {
            let _ = scheduler.wait_resource(resource_id(*n));
        }
        Call::SignalOperation(op, res) => {
            let _ = scheduler.signal_operation(operation_id(*op), resource_id(*res));
        }
        Call::SignalOperations(n) => {
            let _ = scheduler.signal_operations(resource_id(*n));
        }
        Call::ScheduleNext => {
            let _ = scheduler.schedule_next();
        }
        Call::NextBoolean => {
            let _ = scheduler.next_boolean();
        }
        Call::NextInteger(max) => {
            let _ = scheduler.next_integer(u64::from(*max));
        }
    }
}

fn check_invariants(scheduler: &Scheduler) -> Result<(), TestCaseError> {
    let by_seq: HashMap<SequenceId, &Operation> = scheduler
        .operations()
        .map(|op| (op.sequence_id(), op))
        .collect();

    for op in scheduler.operations() {
        // 1. Enabled status mirrors the enabled set.
        prop_assert_eq!(
            op.status() == OperationStatus::Enabled,
            scheduler.enabled_set().contains(&op.sequence_id()),
            "status/enabled mismatch for operation {:032x}",
            op.id()
        );

        // 2. Back-link symmetry.
        for target in op.wait_operations() {
            if let Some(target_op) = by_seq.get(target) {
                prop_assert!(
                    target_op.signal_operations().contains(&op.sequence_id()),
                    "missing back-link from {:032x}",
                    target_op.id()
                );
            }
        }

        // 3. Terminal operations hold no links and are not enabled.
        if op.is_completed() {
            prop_assert!(!scheduler.enabled_set().contains(&op.sequence_id()));
            prop_assert!(op.wait_operations().is_empty());
            prop_assert!(op.signal_operations().is_empty());
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_across_random_call_sequences(
        calls in proptest::collection::vec(call_strategy(), 1..60),
        seed in 0u64..1000,
    ) {
        let config = Configuration { random_seed: seed, ..Configuration::default() };
        let strategy = build_strategy(StrategyKind::Random, &config, None);
        let mut scheduler = Scheduler::new(1, strategy, &config);
        scheduler.attach().unwrap();

        let mut previous_trace_len = scheduler.trace().len();
        for call in &calls {
            apply(&mut scheduler, call);

            // 4. The trace grows monotonically, at most one entry per call.
            let trace_len = scheduler.trace().len();
            prop_assert!(trace_len >= previous_trace_len);
            prop_assert!(trace_len - previous_trace_len <= 1);
            previous_trace_len = trace_len;

            if scheduler.is_disabled() {
                // A generated deadlock: the scheduler stays disabled until
                // detach, which also clears the disabled state.
                prop_assert!(scheduler.schedule_next().is_err());
                scheduler.detach().unwrap();
                scheduler.attach().unwrap();
                previous_trace_len = scheduler.trace().len();
            }

            check_invariants(&scheduler)?;
        }
    }

    #[test]
    fn successful_choices_always_append_to_the_trace(
        bounds in proptest::collection::vec(0u64..50, 1..20),
    ) {
        let config = Configuration::default();
        let strategy = build_strategy(StrategyKind::Random, &config, None);
        let mut scheduler = Scheduler::new(1, strategy, &config);
        scheduler.attach().unwrap();

        let mut expected = scheduler.trace().len();
        for bound in bounds {
            if bound % 2 == 0 {
                let value = scheduler.next_integer(bound).unwrap();
                prop_assert!(bound == 0 || value < bound);
            } else {
                scheduler.next_boolean().unwrap();
            }
            expected += 1;
            prop_assert_eq!(scheduler.trace().len(), expected);
        }
    }
}
