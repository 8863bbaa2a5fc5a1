//! Property tests for the availability gates
//!
//! Drives the state manager through arbitrary event sequences and checks
//! that the run and save gates always agree with the underlying state, no
//! matter the order of selections, runs, failures, and clears.

use camino::Utf8PathBuf;
use proptest::prelude::*;
use qperformance::StateManager;
use qperformance::models::{Readiness, RunPhase};
use qperformance::services::RunResult;

#[derive(Clone, Debug)]
enum Op {
    SelectQuestions(Vec<String>),
    SelectLogs(Vec<String>),
    BeginRun,
    CompleteRun,
    FailRun,
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec("[a-z]{1,8}\\.rtf", 0..3).prop_map(Op::SelectQuestions),
        prop::collection::vec("[a-z]{1,8}\\.csv", 0..3).prop_map(Op::SelectLogs),
        Just(Op::BeginRun),
        Just(Op::CompleteRun),
        Just(Op::FailRun),
        Just(Op::Clear),
    ]
}

fn apply(state: &StateManager, op: Op) {
    match op {
        Op::SelectQuestions(names) => {
            state.set_question_paths(names.iter().map(Utf8PathBuf::from).collect());
        }
        Op::SelectLogs(names) => {
            state.set_log_paths(names.iter().map(Utf8PathBuf::from).collect());
        }
        Op::BeginRun => {
            state.begin_run();
        }
        Op::CompleteRun => {
            state.complete_run(RunResult {
                status_message: "Success".to_string(),
                warnings: Vec::new(),
                readiness: Readiness::ReadyToSave,
                output: "Quizzer\n".to_string(),
            });
        }
        Op::FailRun => {
            state.fail_run("Error running qperf.");
        }
        Op::Clear => {
            state.reset();
        }
    }
}

proptest! {
    #[test]
    fn run_gate_agrees_with_state_for_all_sequences(
        ops in prop::collection::vec(op_strategy(), 0..40)
    ) {
        let state = StateManager::new();
        for op in ops {
            apply(&state, op);
        }

        let snapshot = state.snapshot();
        prop_assert_eq!(
            snapshot.run_available(),
            !snapshot.question_paths.is_empty()
                && !snapshot.log_paths.is_empty()
                && snapshot.phase != RunPhase::InFlight
        );
    }

    #[test]
    fn save_gate_requires_cached_output_for_all_sequences(
        ops in prop::collection::vec(op_strategy(), 0..40)
    ) {
        let state = StateManager::new();
        for op in ops {
            apply(&state, op);
        }

        let snapshot = state.snapshot();
        prop_assert_eq!(snapshot.save_available(), snapshot.readiness == Readiness::ReadyToSave);
        if snapshot.save_available() {
            // Only a completed run can have armed the gate, and it always
            // caches its rendered table
            prop_assert!(!snapshot.output.is_empty());
        }
    }
}
