//! QPerformance - Question type performance reports for Bible quiz tournaments
//!
//! GUI entry point.
//!
//! # Overview
//!
//! This binary hosts the Slint frontend for QPerformance. Startup brings up:
//! - User settings ([`SettingsManager`] - debug flag, last-used directories)
//! - Logging (rotating file appender plus console)
//! - A tokio runtime (2 workers covering dialogs, analysis, and file I/O)
//! - Shared state ([`StateManager`])
//! - The analysis workflow (file selection, engine runs, report saving)
//! - The window itself ([`GuiController`], which ties Slint to everything above)
//!
//! Threading is split three ways:
//! - **Main thread**: the Slint event loop, blocking until the window closes
//! - **Tokio workers**: native dialogs, engine runs, and saves
//! - **State listener**: a background std::thread pushing state changes into the UI
//!
//! # Execution Flow
//!
//! 1. Load settings from QPerformance Data/QPerformance Settings.yaml
//! 2. Initialize logging → logs/qperformance.<date>
//! 3. Build the 2-worker tokio runtime
//! 4. Create the StateManager (Arc<RwLock<AppState>>)
//! 5. Wire the engine, dialogs, and report writer into the workflow
//! 6. Create the GuiController and show the window
//! 7. Block in the Slint event loop until the window closes
//! 8. Log the metrics summary, shut the runtime down with a 5s timeout
//!
//! # Platform
//!
//! Cross-platform via Slint, rfd, and tokio

use anyhow::Result;
use qperformance::services::{AnalysisWorkflow, FsReportWriter, QperfEngine};
use qperformance::ui::{GuiController, RfdFileDialogs};
use qperformance::{APP_NAME, Metrics, SettingsManager, StateManager, VERSION};
use std::sync::Arc;

/// Entry point for the QPerformance window.
///
/// # Errors
///
/// Startup aborts when:
/// - the settings file exists but is not valid YAML
/// - logging cannot be initialized (permissions, disk)
/// - the tokio runtime cannot be built
/// - Slint fails to create the window (graphics drivers, display)
///
/// A fatal error inside the event loop is also returned from here.
fn main() -> Result<()> {
    // Settings come first: the debug flag decides the log level
    let settings_manager = SettingsManager::new("QPerformance Data")?;
    let settings = settings_manager.load_settings()?;

    // File and console logging; the guard keeps the background writer alive
    let _guard = qperformance::logging::setup_logging(
        "logs",
        "qperformance",
        settings.debug_mode,
        true,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Two workers are plenty: dialogs, engine runs, and saves all run as
    // blocking tasks and never overlap much
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("qperformance-worker")
        .build()?;

    tracing::info!("Tokio runtime up with {} worker threads", 2);

    let state_manager = Arc::new(StateManager::new());
    tracing::info!("State manager ready");

    // Shared metrics, logged as a summary at shutdown
    let metrics = Arc::new(Metrics::new());

    // Wire the services into the workflow
    let engine = Arc::new(QperfEngine::new());
    let dialogs = Arc::new(RfdFileDialogs::new(settings, settings_manager));
    let writer = Arc::new(FsReportWriter);
    let workflow = Arc::new(AnalysisWorkflow::new(
        state_manager.clone(),
        engine,
        dialogs,
        writer,
        metrics.clone(),
    ));

    // The controller owns the window and subscribes to state changes
    let gui_controller = GuiController::new(
        state_manager.clone(),
        workflow,
        metrics.clone(),
        runtime.handle().clone(),
    )?;

    tracing::info!("GUI controller ready, launching window");

    // Blocks until the window closes; the runtime keeps serving async
    // tasks in the background the whole time
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    if state_manager.read(|s| s.phase == qperformance::RunPhase::InFlight) {
        tracing::warn!("Window closed while an analysis was running");
    }

    metrics.log_summary();

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
