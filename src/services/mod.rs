//! Services module - Business logic for scoring QuizMachine data.
//!
//! This module contains the engine that turns question set files and
//! QuizMachine record logs into per-quizzer performance tables, plus the
//! workflow that drives it from the GUI. The services are
//! **framework-agnostic** and have no dependencies on the UI layer, making
//! them testable and reusable.
//!
//! # Components
//!
//! - [`QperfEngine`]: The scoring engine behind the [`ComputeEngine`] trait.
//!   Handles:
//!   - Parsing Set Maker RTF exports into per-round question type lists
//!   - Reading QuizMachine CSV logs and filtering the scorable events
//!   - Tallying toss-up and bonus attempts per quizzer and question type
//!   - Rendering the delimited output table, overall and per round
//!
//! - [`AnalysisWorkflow`]: Orchestrates the select / run / save flow:
//!   - Opens file pickers through the [`FileDialogs`] trait
//!   - Guards run and save preconditions against the shared state
//!   - Dispatches the engine and the report writer onto the blocking pool
//!
//! - [`FsReportWriter`]: Writes rendered tables to disk behind the
//!   [`ReportWriter`] trait, refusing to overwrite existing files.
//!
//! # Design Philosophy
//!
//! The services layer is designed to be:
//! - **Pure**: No side effects beyond file I/O
//! - **Testable**: Collaborators sit behind traits, all inputs are explicit
//! - **Framework-agnostic**: No Slint, no GUI code, only business logic
//!
//! # Usage Example
//!
//! ```ignore
//! use qperformance::services::{ComputeEngine, QperfEngine, RunRequest};
//!
//! let engine = QperfEngine::new();
//! let request = RunRequest::assemble(question_paths, log_paths, &options);
//! let result = engine.run(&request)?;
//! println!("{}", result.output);
//! ```

pub mod engine;
pub mod output;
pub mod qperf;
pub mod workflow;

pub use engine::{ComputeEngine, EngineError, RunRequest, RunResult};
pub use output::{FsReportWriter, OutputError, ReportWriter};
pub use qperf::QperfEngine;
pub use workflow::{AnalysisWorkflow, FileDialogs};
