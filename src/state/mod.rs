// Shared state and change broadcasting
//
// StateManager is the single writer surface for AppState: every mutation
// goes through it, gets diffed against the previous state, and comes out
// the other side as broadcast StateChange events for the window.

use crate::models::{AppState, RunPhase};
use crate::services::engine::RunResult;
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// What changed in an [`AppState`] mutation
///
/// Emitted over the broadcast channel so the window can repaint exactly
/// the affected properties instead of polling. Each variant carries the
/// derived values the display needs, computed while the write lock was
/// still held.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// One or both file selections have been replaced
    SelectionChanged {
        question_summary: String,
        log_summary: String,
        run_available: bool,
    },

    /// The run lifecycle has moved to a new phase
    PhaseChanged {
        phase: RunPhase,
        run_available: bool,
    },

    /// The status line has changed
    StatusChanged {
        status: String,
    },

    /// The displayed warning list has changed
    WarningsChanged {
        warnings: Vec<String>,
    },

    /// Save readiness has changed
    ReadinessChanged {
        save_available: bool,
    },
}

/// Owner of the shared [`AppState`], with change broadcasting
///
/// All reads and writes go through this type. A write captures the state
/// before and after the mutation, diffs the two, and broadcasts one
/// [`StateChange`] per difference, so subscribers see every transition in
/// mutation order. The run-lifecycle methods ([`begin_run`](Self::begin_run),
/// [`complete_run`](Self::complete_run), [`fail_run`](Self::fail_run))
/// additionally guard their transitions, so racing requests and stale
/// engine results cannot corrupt the lifecycle.
///
/// # Usage
///
/// Never hand out the inner `AppState`:
/// - [`read()`](Self::read) runs a closure against the current state
/// - [`update()`](Self::update) mutates and emits events
/// - [`subscribe()`](Self::subscribe) yields a receiver of future changes
///
/// The workflow is the main writer; the GUI controller is the main
/// listener.
pub struct StateManager {
    /// Application state behind a lock shared with nobody else
    state: Arc<RwLock<AppState>>,

    /// Fan-out channel for change events; any number of subscribers
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a manager holding the default state
    ///
    /// The broadcast channel buffers 100 events; a subscriber that falls
    /// further behind sees a lag error and resumes from the newest event.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Clone the entire current state
    ///
    /// The clone is independent of the lock; prefer [`read`](Self::read)
    /// when a single field is enough.
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Run a closure against the current state under the read lock
    ///
    /// # Example
    /// ```ignore
    /// let can_run = state_manager.read(|state| state.run_available());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Mutate the state and broadcast what changed
    ///
    /// Captures the state before the closure runs, diffs it against the
    /// result, and sends one event per difference. Diffing and sending
    /// happen under the write lock, so two concurrent updates cannot
    /// interleave their events.
    ///
    /// Returns the emitted events, which the mutating call sites assert
    /// on in tests.
    ///
    /// # Example
    /// ```ignore
    /// state_manager.update(|state| {
    ///     state.status = "Success".to_string();
    /// });
    /// ```
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // Send errors just mean nobody is listening yet
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Receiver for all future change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// One event per observable difference between two states
    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        // Selection changes (either role)
        if old.question_paths != new.question_paths || old.log_paths != new.log_paths {
            changes.push(StateChange::SelectionChanged {
                question_summary: new.question_summary(),
                log_summary: new.log_summary(),
                run_available: new.run_available(),
            });
        }

        // Run lifecycle changes
        if old.phase != new.phase {
            changes.push(StateChange::PhaseChanged {
                phase: new.phase,
                run_available: new.run_available(),
            });
        }

        // Status line changes
        if old.status != new.status {
            changes.push(StateChange::StatusChanged {
                status: new.status.clone(),
            });
        }

        // Warning list changes
        if old.warnings != new.warnings {
            changes.push(StateChange::WarningsChanged {
                warnings: new.warnings.clone(),
            });
        }

        // Readiness changes
        if old.readiness != new.readiness {
            changes.push(StateChange::ReadinessChanged {
                save_available: new.save_available(),
            });
        }

        changes
    }

    // Named mutations for the update patterns callers actually need

    /// Replace the question set selection
    pub fn set_question_paths(&self, paths: Vec<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            state.question_paths = paths;
        })
    }

    /// Replace the record file selection
    pub fn set_log_paths(&self, paths: Vec<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            state.log_paths = paths;
        })
    }

    /// Set the status line
    pub fn set_status(&self, status: String) -> Vec<StateChange> {
        self.update(|state| {
            state.status = status;
        })
    }

    /// Try to move the run lifecycle into flight
    ///
    /// Atomically re-checks availability under the write lock, so a request
    /// that races a concurrent run or a reset is refused rather than
    /// double-started. On acceptance the status line switches to the
    /// in-progress message and stale warnings are cleared.
    ///
    /// # Returns
    /// `true` if the run was accepted and the state is now `InFlight`
    pub fn begin_run(&self) -> bool {
        let mut accepted = false;
        self.update(|state| {
            if state.run_available() {
                state.phase = RunPhase::InFlight;
                state.status = "Running analysis...".to_string();
                state.warnings.clear();
                accepted = true;
            }
        });
        accepted
    }

    /// Record a successful engine result
    ///
    /// Applies only while a run is in flight; a result that arrives after
    /// the state was reset is discarded so it cannot resurrect cleared
    /// output.
    pub fn complete_run(&self, result: RunResult) -> Vec<StateChange> {
        self.update(move |state| {
            if state.phase != RunPhase::InFlight {
                tracing::warn!("Discarding analysis result that arrived outside an active run");
                return;
            }
            state.phase = RunPhase::Completed;
            state.status = result.status_message;
            state.warnings = result.warnings;
            state.readiness = result.readiness;
            state.output = result.output;
        })
    }

    /// Record a failed engine invocation
    ///
    /// Sets the failure status but preserves the previous output and
    /// readiness: a failed run must not destroy the last good result.
    /// Applies only while a run is in flight.
    pub fn fail_run(&self, message: &str) -> Vec<StateChange> {
        self.update(|state| {
            if state.phase != RunPhase::InFlight {
                tracing::warn!("Discarding analysis failure that arrived outside an active run");
                return;
            }
            state.phase = RunPhase::Failed;
            state.status = message.to_string();
        })
    }

    /// Restore every field to its initial value
    pub fn reset(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.reset();
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the state and the channel, so every clone is the same manager
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IDLE_STATUS, Readiness};

    fn ready_manager() -> StateManager {
        let manager = StateManager::new();
        manager.set_question_paths(vec![Utf8PathBuf::from("/sets/district1.rtf")]);
        manager.set_log_paths(vec![Utf8PathBuf::from("/logs/quiz.csv")]);
        manager
    }

    fn sample_result() -> RunResult {
        RunResult {
            status_message: "Success".to_string(),
            warnings: vec!["Row 3 skipped".to_string()],
            readiness: Readiness::ReadyToSave,
            output: "a,b,c\n1,2,3".to_string(),
        }
    }

    #[test]
    fn test_fresh_manager_has_idle_defaults() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(!state.run_available());
        assert!(!state.save_available());
        assert_eq!(state.status, IDLE_STATUS);
    }

    #[test]
    fn test_update_detects_changes() {
        let manager = StateManager::new();

        let changes = manager.update(|state| {
            state.question_paths.push(Utf8PathBuf::from("set1.rtf"));
            state.status = "picked".to_string();
        });

        assert_eq!(changes.len(), 2);
        assert!(matches!(changes[0], StateChange::SelectionChanged { .. }));
        assert!(matches!(changes[1], StateChange::StatusChanged { .. }));
    }

    #[test]
    fn test_selection_events_carry_derivations() {
        let manager = StateManager::new();

        let changes = manager.set_question_paths(vec![Utf8PathBuf::from("/sets/district1.rtf")]);
        assert_eq!(changes.len(), 1);
        assert!(matches!(
            &changes[0],
            StateChange::SelectionChanged {
                question_summary,
                log_summary,
                run_available: false,
            } if question_summary == "district1.rtf" && log_summary == "None"
        ));

        let changes = manager.set_log_paths(vec![Utf8PathBuf::from("/logs/quiz.csv")]);
        assert!(matches!(
            &changes[0],
            StateChange::SelectionChanged {
                run_available: true,
                ..
            }
        ));
    }

    #[test]
    fn test_begin_run_requires_selections() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        assert!(!manager.begin_run());
        assert!(rx.try_recv().is_err());
        assert_eq!(manager.snapshot().phase, RunPhase::Idle);
    }

    #[test]
    fn test_begin_run_sets_in_flight() {
        let manager = ready_manager();

        let accepted = manager.begin_run();
        assert!(accepted);

        let state = manager.snapshot();
        assert_eq!(state.phase, RunPhase::InFlight);
        assert_eq!(state.status, "Running analysis...");
        assert!(state.warnings.is_empty());
        assert!(!state.run_available());
    }

    #[test]
    fn test_begin_run_rejects_second_run() {
        let manager = ready_manager();

        assert!(manager.begin_run());
        assert!(!manager.begin_run());
        assert_eq!(manager.snapshot().phase, RunPhase::InFlight);
    }

    #[test]
    fn test_complete_run_applies_result() {
        let manager = ready_manager();
        manager.begin_run();

        let changes = manager.complete_run(sample_result());

        assert!(changes.iter().any(|c| matches!(
            c,
            StateChange::PhaseChanged {
                phase: RunPhase::Completed,
                run_available: true,
            }
        )));
        assert!(changes.iter().any(|c| matches!(
            c,
            StateChange::ReadinessChanged {
                save_available: true,
            }
        )));

        let state = manager.snapshot();
        assert_eq!(state.status, "Success");
        assert_eq!(state.warnings, vec!["Row 3 skipped".to_string()]);
        assert_eq!(state.output, "a,b,c\n1,2,3");
        assert!(state.save_available());
    }

    #[test]
    fn test_complete_run_ignored_when_not_in_flight() {
        let manager = ready_manager();
        manager.begin_run();
        manager.reset();

        let changes = manager.complete_run(sample_result());

        assert!(changes.is_empty());
        let state = manager.snapshot();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(state.output.is_empty());
        assert!(!state.save_available());
    }

    #[test]
    fn test_fail_run_preserves_previous_output() {
        let manager = ready_manager();
        manager.begin_run();
        manager.complete_run(sample_result());

        manager.begin_run();
        manager.fail_run("Error running qperf.");

        let state = manager.snapshot();
        assert_eq!(state.phase, RunPhase::Failed);
        assert_eq!(state.status, "Error running qperf.");
        assert_eq!(state.output, "a,b,c\n1,2,3");
        assert!(state.save_available());
    }

    #[test]
    fn test_fail_run_ignored_when_not_in_flight() {
        let manager = ready_manager();

        let changes = manager.fail_run("Error running qperf.");

        assert!(changes.is_empty());
        assert_eq!(manager.snapshot().phase, RunPhase::Idle);
    }

    #[test]
    fn test_reset_clears_everything() {
        let manager = ready_manager();
        manager.begin_run();
        manager.complete_run(sample_result());

        let changes = manager.reset();

        assert!(
            changes
                .iter()
                .any(|c| matches!(c, StateChange::SelectionChanged { .. }))
        );
        assert!(changes.iter().any(|c| matches!(
            c,
            StateChange::ReadinessChanged {
                save_available: false,
            }
        )));

        let state = manager.snapshot();
        assert!(state.question_paths.is_empty());
        assert!(state.log_paths.is_empty());
        assert!(state.output.is_empty());
        assert_eq!(state.status, IDLE_STATUS);
        assert_eq!(state.phase, RunPhase::Idle);
    }

    #[test]
    fn test_subscriber_sees_status_event() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.set_status("picked".to_string());

        let event = rx.try_recv();
        assert!(event.is_ok());
        assert!(matches!(event.unwrap(), StateChange::StatusChanged { .. }));
    }

    #[test]
    fn test_every_subscriber_gets_the_event() {
        let manager = StateManager::new();
        let mut rx1 = manager.subscribe();
        let mut rx2 = manager.subscribe();

        manager.set_question_paths(vec![Utf8PathBuf::from("set1.rtf")]);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_read_under_the_lock() {
        let manager = ready_manager();

        let available = manager.read(|state| state.run_available());
        assert!(available);
    }

    #[test]
    fn test_clones_share_state_and_events() {
        let manager = StateManager::new();
        let clone = manager.clone();
        let mut rx = clone.subscribe();

        manager.set_status("picked".to_string());

        assert_eq!(clone.snapshot().status, "picked");
        assert!(rx.try_recv().is_ok());
    }
}
