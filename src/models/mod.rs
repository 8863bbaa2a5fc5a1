//! Data models for application state, run options, and user settings.

pub mod app_state;
pub mod options;
pub mod settings;

pub use app_state::{AppState, IDLE_STATUS, Readiness, RunPhase};
pub use options::{QUESTION_TYPE_CODES, RunOptions};
pub use settings::UserSettings;
