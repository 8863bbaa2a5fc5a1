//! End-to-end workflow tests with the real engine and report writer
//!
//! Only the native dialogs are replaced: a scripted stand-in returns
//! prepared paths instead of opening windows. Everything else - state
//! transitions, the scoring engine, the filesystem writer - is the real
//! production wiring.

use camino::Utf8PathBuf;
use qperformance::models::{IDLE_STATUS, RunOptions, RunPhase};
use qperformance::services::{AnalysisWorkflow, FileDialogs, FsReportWriter, QperfEngine};
use qperformance::{Metrics, StateManager};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const SETS_RTF: &str = "SET #1 first Q.\\tab filler\\tab second G.\\tab filler\\tab third A.";

const QUIZ_CSV: &str = "\
1,'District',,,'1','1',,'Alice',1,,'TC'
2,'District',,,'1','2',,'Alice',1,,'TE'
";

/// Dialog stand-in returning prepared answers
struct ScriptedDialogs {
    question_files: Option<Vec<Utf8PathBuf>>,
    record_files: Option<Vec<Utf8PathBuf>>,
    save_path: Option<Utf8PathBuf>,
}

impl ScriptedDialogs {
    fn dismiss_all() -> Self {
        Self {
            question_files: None,
            record_files: None,
            save_path: None,
        }
    }
}

impl FileDialogs for ScriptedDialogs {
    fn pick_question_files(&self) -> Option<Vec<Utf8PathBuf>> {
        self.question_files.clone()
    }

    fn pick_record_files(&self) -> Option<Vec<Utf8PathBuf>> {
        self.record_files.clone()
    }

    fn pick_save_path(&self) -> Option<Utf8PathBuf> {
        self.save_path.clone()
    }
}

fn temp_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
}

fn write_file(root: &Utf8PathBuf, name: &str, content: &str) -> Utf8PathBuf {
    let path = root.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn workflow_with(dialogs: ScriptedDialogs) -> (Arc<StateManager>, AnalysisWorkflow) {
    let state = Arc::new(StateManager::new());
    let workflow = AnalysisWorkflow::new(
        state.clone(),
        Arc::new(QperfEngine::new()),
        Arc::new(dialogs),
        Arc::new(FsReportWriter),
        Arc::new(Metrics::new()),
    );
    (state, workflow)
}

#[tokio::test]
async fn test_select_run_save_round_trip() {
    let dir = TempDir::new().unwrap();
    let root = temp_root(&dir);
    let rtf = write_file(&root, "district1.rtf", SETS_RTF);
    let csv = write_file(&root, "quiz.csv", QUIZ_CSV);
    let destination = root.join("report.csv");

    let (state, workflow) = workflow_with(ScriptedDialogs {
        question_files: Some(vec![rtf]),
        record_files: Some(vec![csv]),
        save_path: Some(destination.clone()),
    });

    workflow.select_question_sets().await;
    workflow.select_quiz_logs().await;
    assert!(state.read(|s| s.run_available()));

    workflow.run_analysis(RunOptions::default()).await;

    let snapshot = state.snapshot();
    assert_eq!(snapshot.status, "Success");
    assert_eq!(snapshot.phase, RunPhase::Completed);
    assert!(snapshot.save_available());
    assert!(snapshot.output.starts_with("Quizzer,"));

    workflow.save_report().await;

    assert_eq!(state.read(|s| s.status.clone()), "Saved successfully");
    let written = fs::read_to_string(&destination).unwrap();
    assert_eq!(written, snapshot.output);
}

#[tokio::test]
async fn test_save_refuses_existing_destination() {
    let dir = TempDir::new().unwrap();
    let root = temp_root(&dir);
    let rtf = write_file(&root, "district1.rtf", SETS_RTF);
    let csv = write_file(&root, "quiz.csv", QUIZ_CSV);
    let destination = write_file(&root, "report.csv", "precious earlier report");

    let (state, workflow) = workflow_with(ScriptedDialogs {
        question_files: Some(vec![rtf]),
        record_files: Some(vec![csv]),
        save_path: Some(destination.clone()),
    });

    workflow.select_question_sets().await;
    workflow.select_quiz_logs().await;
    workflow.run_analysis(RunOptions::default()).await;
    workflow.save_report().await;

    assert_eq!(
        state.read(|s| s.status.clone()),
        "Output file already exists. Choose a different file name."
    );
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "precious earlier report",
        "The existing file must be left untouched"
    );
}

#[tokio::test]
async fn test_run_without_selection_reports_missing_role() {
    let (state, workflow) = workflow_with(ScriptedDialogs::dismiss_all());

    workflow.run_analysis(RunOptions::default()).await;

    let snapshot = state.snapshot();
    assert_eq!(snapshot.status, "Select at least one question set file.");
    assert_eq!(snapshot.phase, RunPhase::Idle);
}

#[tokio::test]
async fn test_dismissed_dialogs_leave_state_untouched() {
    let (state, workflow) = workflow_with(ScriptedDialogs::dismiss_all());

    workflow.select_question_sets().await;
    workflow.select_quiz_logs().await;

    let snapshot = state.snapshot();
    assert!(snapshot.question_paths.is_empty());
    assert!(snapshot.log_paths.is_empty());
    assert_eq!(snapshot.status, IDLE_STATUS);
}

#[tokio::test]
async fn test_engine_failure_keeps_previous_output() {
    let dir = TempDir::new().unwrap();
    let root = temp_root(&dir);
    let rtf = write_file(&root, "district1.rtf", SETS_RTF);
    let csv = write_file(&root, "quiz.csv", QUIZ_CSV);

    let (state, workflow) = workflow_with(ScriptedDialogs {
        question_files: Some(vec![rtf.clone()]),
        record_files: Some(vec![csv]),
        save_path: None,
    });

    workflow.select_question_sets().await;
    workflow.select_quiz_logs().await;
    workflow.run_analysis(RunOptions::default()).await;
    let good_output = state.read(|s| s.output.clone());
    assert!(!good_output.is_empty());

    // The question file disappears between runs
    fs::remove_file(&rtf).unwrap();
    workflow.run_analysis(RunOptions::default()).await;

    let snapshot = state.snapshot();
    assert_eq!(snapshot.phase, RunPhase::Failed);
    assert_eq!(snapshot.status, "Question set location does not exist.");
    assert_eq!(
        snapshot.output, good_output,
        "A failed run must not destroy the last good output"
    );
    assert!(snapshot.save_available());
}

#[tokio::test]
async fn test_clear_returns_everything_to_idle() {
    let dir = TempDir::new().unwrap();
    let root = temp_root(&dir);
    let rtf = write_file(&root, "district1.rtf", SETS_RTF);
    let csv = write_file(&root, "quiz.csv", QUIZ_CSV);

    let (state, workflow) = workflow_with(ScriptedDialogs {
        question_files: Some(vec![rtf]),
        record_files: Some(vec![csv]),
        save_path: None,
    });

    workflow.select_question_sets().await;
    workflow.select_quiz_logs().await;
    workflow.run_analysis(RunOptions::default()).await;
    workflow.clear();

    let snapshot = state.snapshot();
    assert!(snapshot.question_paths.is_empty());
    assert!(snapshot.log_paths.is_empty());
    assert!(snapshot.output.is_empty());
    assert!(snapshot.warnings.is_empty());
    assert_eq!(snapshot.status, IDLE_STATUS);
    assert_eq!(snapshot.phase, RunPhase::Idle);
    assert!(!snapshot.run_available());
    assert!(!snapshot.save_available());
}
