use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Status line shown at startup and after a reset, before any files have
/// been selected.
pub const IDLE_STATUS: &str = "Waiting for input...";

/// Lifecycle of the analysis run.
///
/// A run moves `Idle -> InFlight` when preconditions pass, then to
/// `Completed` or `Failed` when the engine responds. Reset returns the
/// phase to `Idle`. The run action is unavailable while a run is
/// `InFlight`, so a second submission cannot race the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    InFlight,
    Completed,
    Failed,
}

/// Whether the most recent run produced output fit to be written to disk.
///
/// Only a run that finished with `ReadyToSave` enables the save action;
/// failures and resets leave or put it at `NotReady`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Readiness {
    ReadyToSave,
    #[default]
    NotReady,
}

/// Everything the window shows, in one struct.
///
/// Holds the two file selections, the cached output of the last successful
/// run, and the status/warning text currently displayed.
///
/// # Thread Safety
///
/// Instances live inside [`crate::state::StateManager`] behind an
/// `Arc<RwLock<_>>`; go through its
/// [`read()`](crate::state::StateManager::read) and
/// [`update()`](crate::state::StateManager::update) rather than holding an
/// `AppState` of your own, so that mutations produce change events.
///
/// [`crate::state::StateChange`] describes the observable differences
/// between two of these, and [`crate::models::RunOptions`] carries the form
/// values that accompany a run.
#[derive(Clone, Debug)]
pub struct AppState {
    // File selections (replaced wholesale on each successful pick)
    pub question_paths: Vec<Utf8PathBuf>,
    pub log_paths: Vec<Utf8PathBuf>,

    // Result of the last successful run
    pub output: String,
    pub warnings: Vec<String>,
    pub readiness: Readiness,

    // Run lifecycle
    pub phase: RunPhase,

    // Status line
    pub status: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            question_paths: Vec::new(),
            log_paths: Vec::new(),
            output: String::new(),
            warnings: Vec::new(),
            readiness: Readiness::NotReady,
            phase: RunPhase::Idle,
            status: IDLE_STATUS.to_string(),
        }
    }
}

impl AppState {
    /// Whether the run action is currently permitted.
    ///
    /// Requires at least one question set file, at least one record file,
    /// and no run already in flight.
    pub fn run_available(&self) -> bool {
        !self.question_paths.is_empty()
            && !self.log_paths.is_empty()
            && self.phase != RunPhase::InFlight
    }

    /// Whether the save action is currently permitted.
    pub fn save_available(&self) -> bool {
        self.readiness == Readiness::ReadyToSave
    }

    /// Guidance shown next to a disabled run button; empty when enabled.
    pub fn run_hint(&self) -> &'static str {
        if self.phase == RunPhase::InFlight {
            "Analysis in progress..."
        } else if self.question_paths.is_empty() || self.log_paths.is_empty() {
            "Select question set and record files first."
        } else {
            ""
        }
    }

    /// Guidance shown next to a disabled save button; empty when enabled.
    pub fn save_hint(&self) -> &'static str {
        if self.save_available() {
            ""
        } else {
            "Run first to generate output."
        }
    }

    /// Display summary of the selected question set files.
    pub fn question_summary(&self) -> String {
        Self::summarize(&self.question_paths)
    }

    /// Display summary of the selected record files.
    pub fn log_summary(&self) -> String {
        Self::summarize(&self.log_paths)
    }

    /// File names joined with ", ", or "None" for an empty selection.
    fn summarize(paths: &[Utf8PathBuf]) -> String {
        if paths.is_empty() {
            return "None".to_string();
        }
        paths
            .iter()
            .map(|p| p.file_name().unwrap_or(p.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Restore every field to its initial value.
    ///
    /// Leaves no residue from a prior run: selections, output, warnings,
    /// readiness, phase, and the status line all return to their defaults.
    pub fn reset(&mut self) {
        self.question_paths.clear();
        self.log_paths.clear();
        self.output.clear();
        self.warnings.clear();
        self.readiness = Readiness::NotReady;
        self.phase = RunPhase::Idle;
        self.status = IDLE_STATUS.to_string();
    }
}
