// QPerformance - Question type performance reports for Bible quiz tournaments
//
// Library side of the crate: state, services, and models live here so the
// test suites can drive them without a window. main.rs owns the GUI.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// The types most callers touch, re-exported at the crate root
pub use config::SettingsManager;
pub use metrics::Metrics;
pub use models::{AppState, RunOptions, RunPhase, UserSettings};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
