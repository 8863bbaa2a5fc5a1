// Window controller: ties the Slint MainWindow to the rest of the app.
//
// Three jobs live here:
// - turning button callbacks into workflow tasks on the tokio runtime
// - feeding StateChange events from the StateManager into window properties
// - reading the options form into RunOptions when a run starts

use crate::metrics::Metrics;
use crate::models::{RunOptions, RunPhase};
use crate::services::AnalysisWorkflow;
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::EventLoopBridge;
use crate::ui::dialogs::{self, HELP_URL};
use anyhow::{Context, Result};
use std::sync::Arc;

// Include the generated Slint code
slint::include_modules!();

/// Owner of the main window and the plumbing around it.
///
/// The window never reads state directly: everything it shows arrives as a
/// [`StateChange`] through the bridge, so the display is a pure function of
/// the state the workflow maintains.
///
/// # Example
/// ```ignore
/// let controller = GuiController::new(
///     state_manager,
///     workflow,
///     metrics,
///     runtime.handle().clone(),
/// )?;
/// controller.run()?; // blocks until the window closes
/// ```
pub struct GuiController {
    /// The Slint window
    ui: MainWindow,

    /// Schedules window updates from the listener thread and tokio tasks
    _bridge: EventLoopBridge<MainWindow>,
}

impl GuiController {
    /// Build the window, wire its callbacks, and start the state listener.
    ///
    /// # Arguments
    /// * `state_manager` - source of truth the window mirrors
    /// * `workflow` - orchestrator invoked by the button callbacks
    /// * `metrics` - counters threaded into the event loop bridge
    /// * `tokio_handle` - runtime the callbacks spawn onto
    pub fn new(
        state_manager: Arc<StateManager>,
        workflow: Arc<AnalysisWorkflow>,
        metrics: Arc<Metrics>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create the main window")?;

        let bridge = EventLoopBridge::new(&ui, tokio_handle, metrics);

        // Paint the current state before any events arrive
        Self::sync_ui_with_state(&ui, &state_manager);

        Self::setup_callbacks(&ui, &bridge, &workflow);
        Self::setup_state_subscription(&bridge, &state_manager);

        tracing::info!("Window created and callbacks wired");

        Ok(Self {
            ui,
            _bridge: bridge,
        })
    }

    /// Enter the Slint event loop; returns when the user closes the window.
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Entering GUI event loop");
        self.ui.run()
    }

    /// One-time paint of the full state, used at startup before the
    /// subscription begins delivering diffs.
    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        let state = state_manager.snapshot();

        ui.set_question_sets_text(state.question_summary().into());
        ui.set_records_text(state.log_summary().into());
        ui.set_status_text(state.status.clone().into());
        ui.set_warnings_text(state.warnings.join("\n").into());
        ui.set_run_enabled(state.run_available());
        ui.set_save_enabled(state.save_available());
        ui.set_running(state.phase == RunPhase::InFlight);

        tracing::debug!("Initial state painted");
    }

    /// Build RunOptions from the raw form values
    fn options_from_form(
        delimiter: &str,
        tournament: &str,
        type_flags: [bool; 9],
        display_individual_rounds: bool,
    ) -> RunOptions {
        RunOptions {
            delimiter: delimiter.to_string(),
            tournament: tournament.trim().to_string(),
            type_flags,
            display_individual_rounds,
        }
    }

    /// Connect the window's buttons to the workflow.
    ///
    /// Every workflow call is spawned onto the tokio runtime so the event
    /// loop never blocks on dialogs, the engine, or file writes.
    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &EventLoopBridge<MainWindow>,
        workflow: &Arc<AnalysisWorkflow>,
    ) {
        let bridge_handle = bridge.clone_handle();
        let workflow_clone = Arc::clone(workflow);

        // Question set picker
        ui.on_select_question_sets_clicked(move || {
            tracing::debug!("Select question sets clicked");

            let workflow = Arc::clone(&workflow_clone);
            bridge_handle.spawn_async(move || async move {
                workflow.select_question_sets().await;
            });
        });

        let bridge_handle = bridge.clone_handle();
        let workflow_clone = Arc::clone(workflow);

        // Record file picker
        ui.on_select_records_clicked(move || {
            tracing::debug!("Select records clicked");

            let workflow = Arc::clone(&workflow_clone);
            bridge_handle.spawn_async(move || async move {
                workflow.select_quiz_logs().await;
            });
        });

        let bridge_handle = bridge.clone_handle();
        let workflow_clone = Arc::clone(workflow);
        let ui_weak = bridge.ui_weak().clone();

        // Run reads the options form on the event loop thread, then hands
        // the analysis to the runtime
        ui.on_run_clicked(move || {
            tracing::info!("Run button clicked");

            let Some(ui) = ui_weak.upgrade() else {
                return;
            };

            let options = Self::options_from_form(
                ui.get_delimiter_text().as_str(),
                ui.get_tournament_text().as_str(),
                [
                    ui.get_type_a_checked(),
                    ui.get_type_g_checked(),
                    ui.get_type_i_checked(),
                    ui.get_type_q_checked(),
                    ui.get_type_r_checked(),
                    ui.get_type_s_checked(),
                    ui.get_type_x_checked(),
                    ui.get_type_v_checked(),
                    ui.get_type_m_checked(),
                ],
                ui.get_rounds_checked(),
            );

            let workflow = Arc::clone(&workflow_clone);
            bridge_handle.spawn_async(move || async move {
                workflow.run_analysis(options).await;
            });
        });

        let bridge_handle = bridge.clone_handle();
        let workflow_clone = Arc::clone(workflow);

        // Save picks the destination and writes the report
        ui.on_save_clicked(move || {
            tracing::info!("Save button clicked");

            let workflow = Arc::clone(&workflow_clone);
            bridge_handle.spawn_async(move || async move {
                workflow.save_report().await;
            });
        });

        let workflow_clone = Arc::clone(workflow);
        let ui_weak = bridge.ui_weak().clone();

        // Clear is synchronous: the form goes back to its defaults and the
        // shared state is reset in the same callback
        ui.on_clear_clicked(move || {
            tracing::info!("Clear button clicked");

            if let Some(ui) = ui_weak.upgrade() {
                ui.set_delimiter_text(",".into());
                ui.set_tournament_text("".into());
                ui.set_type_a_checked(true);
                ui.set_type_g_checked(true);
                ui.set_type_i_checked(true);
                ui.set_type_q_checked(true);
                ui.set_type_r_checked(true);
                ui.set_type_s_checked(true);
                ui.set_type_x_checked(true);
                ui.set_type_v_checked(true);
                ui.set_type_m_checked(true);
                ui.set_rounds_checked(false);
            }

            workflow_clone.clear();
        });

        // Help opens the documentation page in the default browser
        ui.on_help_clicked(move || {
            tracing::debug!("Help button clicked");
            if let Err(e) = dialogs::open_in_browser(HELP_URL) {
                tracing::error!("Failed to open help page: {}", e);
            }
        });

        tracing::debug!("Callbacks connected");
    }

    /// Start the listener thread that forwards state changes into the window.
    ///
    /// The thread runs until the broadcast channel closes, which happens when
    /// the StateManager is dropped at shutdown.
    fn setup_state_subscription(
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
    ) {
        let bridge_handle = bridge.clone_handle();
        let mut rx = state_manager.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("State listener running");

            loop {
                match rx.blocking_recv() {
                    Ok(change) => {
                        tracing::trace!("State change: {:?}", change);

                        match change {
                            StateChange::SelectionChanged {
                                question_summary,
                                log_summary,
                                run_available,
                            } => {
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_question_sets_text(question_summary.into());
                                    ui.set_records_text(log_summary.into());
                                    ui.set_run_enabled(run_available);
                                });
                            }

                            StateChange::PhaseChanged {
                                phase,
                                run_available,
                            } => {
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_running(phase == RunPhase::InFlight);
                                    ui.set_run_enabled(run_available);
                                });
                            }

                            StateChange::StatusChanged { status } => {
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_status_text(status.into());
                                });
                            }

                            StateChange::WarningsChanged { warnings } => {
                                let text = warnings.join("\n");
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_warnings_text(text.into());
                                });
                            }

                            StateChange::ReadinessChanged { save_available } => {
                                bridge_handle.update_ui(move |ui| {
                                    ui.set_save_enabled(save_available);
                                });
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        tracing::info!("State channel closed, stopping listener");
                        break;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("State listener lagged, {} events dropped", skipped);
                        // Later events still arrive; only intermediate
                        // updates were lost
                    }
                }
            }

            tracing::debug!("State listener stopped");
        });
    }
}
