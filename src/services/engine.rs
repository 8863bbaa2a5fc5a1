use crate::models::{Readiness, RunOptions};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Payload assembled for one engine invocation
///
/// Built once per run from the current selections and form options, then
/// immutable. The blank-delimiter fallback is applied during assembly so
/// the engine always receives a usable separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub question_paths: Vec<Utf8PathBuf>,
    pub log_paths: Vec<Utf8PathBuf>,
    pub delimiter: String,
    pub tournament: String,
    pub type_flags: [bool; 9],
    pub display_individual_rounds: bool,
}

impl RunRequest {
    /// Assemble a request from the current selections and form options
    pub fn assemble(
        question_paths: Vec<Utf8PathBuf>,
        log_paths: Vec<Utf8PathBuf>,
        options: &RunOptions,
    ) -> Self {
        Self {
            question_paths,
            log_paths,
            delimiter: options.effective_delimiter(),
            tournament: options.tournament.clone(),
            type_flags: options.type_flags,
            display_individual_rounds: options.display_individual_rounds,
        }
    }

    /// The question type codes enabled for this run, canonical order
    pub fn selected_type_codes(&self) -> Vec<char> {
        RunOptions::codes_for(&self.type_flags)
    }
}

/// Outcome of a successful engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Status line to display ("Success" on a normal run)
    pub status_message: String,
    /// Non-fatal problems encountered while scoring
    pub warnings: Vec<String>,
    /// Whether `output` is fit to be written to disk
    pub readiness: Readiness,
    /// The rendered output table, opaque to the orchestration layer
    pub output: String,
}

/// Errors that can occur inside the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Question set location does not exist.")]
    QuestionPathMissing(Utf8PathBuf),

    #[error("QuizMachine records file does not exist.")]
    RecordPathMissing(Utf8PathBuf),

    #[error("No scorable records found in the selected files")]
    NoRecords,

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Boundary to the computation that turns the selected files into the
/// output table.
///
/// Synchronous by contract; callers dispatch `run` on a blocking task so
/// the UI thread never waits on file parsing.
#[cfg_attr(test, automock)]
pub trait ComputeEngine: Send + Sync {
    fn run(&self, request: &RunRequest) -> Result<RunResult, EngineError>;
}
