use crate::metrics::Metrics;
use crate::models::RunOptions;
use crate::state::StateManager;
use camino::Utf8PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[cfg(test)]
use mockall::automock;

use super::engine::{ComputeEngine, RunRequest};
use super::output::ReportWriter;

/// Native file pickers used by the workflow
///
/// Abstracted behind a trait so tests can script selections without
/// opening real dialogs.
#[cfg_attr(test, automock)]
pub trait FileDialogs: Send + Sync {
    /// Let the user pick one or more question set files
    ///
    /// Returns `None` when the dialog is dismissed.
    fn pick_question_files(&self) -> Option<Vec<Utf8PathBuf>>;

    /// Let the user pick one or more QuizMachine record files
    fn pick_record_files(&self) -> Option<Vec<Utf8PathBuf>>;

    /// Let the user pick a destination for the report
    fn pick_save_path(&self) -> Option<Utf8PathBuf>;
}

/// Orchestrates the select / run / save user flow
///
/// Every GUI action lands here. The workflow checks preconditions against
/// the shared state, dispatches blocking work (dialogs, the engine, file
/// writes) onto the blocking pool, and records the outcome back into the
/// [`StateManager`], which broadcasts the changes to the window.
///
/// # Ground Rules
///
/// - **All state through the manager**: the workflow never caches state of
///   its own, so a mutation from any thread is immediately visible
/// - **Collaborators behind traits**: the engine, the dialogs, and the
///   report writer are trait objects, so every scenario is testable with
///   mocks
/// - **Never block the caller**: dialogs and file work run on the blocking
///   pool; callers only await
pub struct AnalysisWorkflow {
    state: Arc<StateManager>,
    engine: Arc<dyn ComputeEngine>,
    dialogs: Arc<dyn FileDialogs>,
    writer: Arc<dyn ReportWriter>,
    metrics: Arc<Metrics>,
}

impl AnalysisWorkflow {
    pub fn new(
        state: Arc<StateManager>,
        engine: Arc<dyn ComputeEngine>,
        dialogs: Arc<dyn FileDialogs>,
        writer: Arc<dyn ReportWriter>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            state,
            engine,
            dialogs,
            writer,
            metrics,
        }
    }

    /// Ask the user for question set files and store the selection
    ///
    /// A dismissed dialog leaves the current selection untouched.
    pub async fn select_question_sets(&self) {
        let dialogs = Arc::clone(&self.dialogs);
        let picked = tokio::task::spawn_blocking(move || dialogs.pick_question_files())
            .await
            .ok()
            .flatten();

        let Some(paths) = picked else {
            tracing::debug!("Question set dialog dismissed");
            return;
        };

        tracing::info!("Selected {} question set files", paths.len());
        self.state.set_question_paths(paths);
        self.metrics.record_state_update();
    }

    /// Ask the user for QuizMachine record files and store the selection
    pub async fn select_quiz_logs(&self) {
        let dialogs = Arc::clone(&self.dialogs);
        let picked = tokio::task::spawn_blocking(move || dialogs.pick_record_files())
            .await
            .ok()
            .flatten();

        let Some(paths) = picked else {
            tracing::debug!("Record file dialog dismissed");
            return;
        };

        tracing::info!("Selected {} record files", paths.len());
        self.state.set_log_paths(paths);
        self.metrics.record_state_update();
    }

    /// Run the analysis against the current selections
    ///
    /// Missing selections are reported per role before anything starts; the
    /// availability gate is then re-checked atomically, so a request that
    /// races another run is refused with a hint instead of double-started.
    /// The engine runs on the blocking pool; its outcome is applied through
    /// the phase-guarded completion methods, so a result that arrives after
    /// a reset is dropped.
    pub async fn run_analysis(&self, options: RunOptions) {
        let missing = self.state.read(|state| {
            if state.question_paths.is_empty() {
                Some("Select at least one question set file.")
            } else if state.log_paths.is_empty() {
                Some("Select at least one record file.")
            } else {
                None
            }
        });
        if let Some(message) = missing {
            self.metrics.record_run_rejected();
            tracing::info!("Run request rejected: {}", message);
            self.state.set_status(message.to_string());
            self.metrics.record_state_update();
            return;
        }

        if !self.state.begin_run() {
            // Selections were just checked, so this is the in-flight case
            // (or a selection cleared in the gap, caught by the gate)
            self.metrics.record_run_rejected();
            let hint = self.state.read(|state| state.run_hint().to_string());
            if !hint.is_empty() {
                tracing::info!("Run request rejected: {}", hint);
                self.state.set_status(hint);
            }
            return;
        }
        self.metrics.record_state_update();

        let request = self.state.read(|state| {
            RunRequest::assemble(state.question_paths.clone(), state.log_paths.clone(), &options)
        });
        tracing::info!(
            "Starting analysis: {} question files, {} record files",
            request.question_paths.len(),
            request.log_paths.len()
        );

        let engine = Arc::clone(&self.engine);
        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || engine.run(&request)).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(result)) => {
                tracing::info!(
                    "Analysis completed in {:.2}s with {} warnings",
                    elapsed.as_secs_f64(),
                    result.warnings.len()
                );
                self.metrics.record_engine_time(elapsed);
                self.metrics.record_run_completed();
                self.state.complete_run(result);
            }
            Ok(Err(err)) => {
                tracing::error!("Analysis failed: {}", err);
                self.metrics.record_run_failed();
                self.state.fail_run(&err.to_string());
            }
            Err(err) => {
                tracing::error!("Analysis task panicked: {}", err);
                self.metrics.record_run_failed();
                self.state.fail_run("Error running qperf.");
            }
        }
        self.metrics.record_state_update();
    }

    /// Ask for a destination and write the cached output there
    ///
    /// Requires a previous successful run; otherwise the save hint is shown
    /// and no dialog opens. A dismissed dialog changes nothing.
    pub async fn save_report(&self) {
        let payload = self.state.read(|state| {
            if state.save_available() {
                Some(state.output.clone())
            } else {
                None
            }
        });

        let Some(payload) = payload else {
            let hint = self.state.read(|state| state.save_hint().to_string());
            if !hint.is_empty() {
                tracing::info!("Save request rejected: {}", hint);
                self.state.set_status(hint);
                self.metrics.record_state_update();
            }
            return;
        };

        let dialogs = Arc::clone(&self.dialogs);
        let picked = tokio::task::spawn_blocking(move || dialogs.pick_save_path())
            .await
            .ok()
            .flatten();

        let Some(path) = picked else {
            tracing::debug!("Save dialog dismissed");
            return;
        };

        let writer = Arc::clone(&self.writer);
        let target = path.clone();
        let outcome = tokio::task::spawn_blocking(move || writer.save(&target, &payload)).await;

        match outcome {
            Ok(Ok(confirmation)) => {
                self.metrics.record_report_saved();
                self.state.set_status(confirmation);
            }
            Ok(Err(err)) => {
                tracing::error!("Save to {} failed: {}", path, err);
                self.metrics.record_save_failure();
                self.state.set_status(err.to_string());
            }
            Err(err) => {
                tracing::error!("Save task panicked: {}", err);
                self.metrics.record_save_failure();
                self.state.set_status("Error saving output.".to_string());
            }
        }
        self.metrics.record_state_update();
    }

    /// Clear selections, output, and warnings back to the initial state
    pub fn clear(&self) {
        tracing::info!("Clearing selections and output");
        self.state.reset();
        self.metrics.record_state_update();
    }
}
