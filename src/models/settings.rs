use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// User settings from QPerformance Settings.yaml
///
/// UI conveniences only: the debug flag for logging and the directories the
/// file dialogs should open in. Blank directory entries mean unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    #[serde(rename = "Question Sets Dir", default)]
    pub question_sets_dir: String,

    #[serde(rename = "Records Dir", default)]
    pub records_dir: String,

    #[serde(rename = "Output Dir", default)]
    pub output_dir: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            question_sets_dir: String::new(),
            records_dir: String::new(),
            output_dir: String::new(),
        }
    }
}

impl UserSettings {
    /// Starting directory for the question set picker, if one is recorded.
    pub fn question_sets_start_dir(&self) -> Option<Utf8PathBuf> {
        Self::dir_or_none(&self.question_sets_dir)
    }

    /// Starting directory for the record file picker, if one is recorded.
    pub fn records_start_dir(&self) -> Option<Utf8PathBuf> {
        Self::dir_or_none(&self.records_dir)
    }

    /// Starting directory for the save dialog, if one is recorded.
    pub fn output_start_dir(&self) -> Option<Utf8PathBuf> {
        Self::dir_or_none(&self.output_dir)
    }

    fn dir_or_none(raw: &str) -> Option<Utf8PathBuf> {
        if raw.is_empty() {
            None
        } else {
            Some(Utf8PathBuf::from(raw))
        }
    }
}
