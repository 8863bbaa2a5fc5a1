// Native dialogs and system integration
//
// File pickers use the rfd crate. Each picker starts in the last-used
// directory for its role, so a league scorekeeper who always works out of
// the same folders lands there directly. Successful picks update the
// stored directory and save the settings file best-effort.

use crate::config::SettingsManager;
use crate::models::UserSettings;
use crate::services::FileDialogs;
use camino::{Utf8Path, Utf8PathBuf};
use rfd::FileDialog;
use std::path::PathBuf;
use std::process::Command;
use std::sync::RwLock;

/// Project documentation page opened by the Help button
pub const HELP_URL: &str = "https://github.com/QPerformance/qperformance#readme";

/// Native file pickers backed by `rfd`
pub struct RfdFileDialogs {
    settings: RwLock<UserSettings>,
    manager: SettingsManager,
}

impl RfdFileDialogs {
    pub fn new(settings: UserSettings, manager: SettingsManager) -> Self {
        Self {
            settings: RwLock::new(settings),
            manager,
        }
    }

    /// Convert picked paths to UTF-8, dropping any that do not convert
    fn convert_paths(paths: Vec<PathBuf>) -> Vec<Utf8PathBuf> {
        paths
            .into_iter()
            .filter_map(|path| {
                Utf8PathBuf::try_from(path)
                    .map_err(|e| {
                        tracing::error!("Failed to convert path to UTF-8: {}", e);
                        e
                    })
                    .ok()
            })
            .collect()
    }

    /// Keep a recorded directory only while it still exists on disk
    fn existing_dir(recorded: Option<Utf8PathBuf>) -> Option<Utf8PathBuf> {
        recorded.filter(|dir| dir.is_dir())
    }

    /// Record the directory a pick landed in and persist it for next launch
    fn remember_dir(&self, picked: &Utf8Path, apply: fn(&mut UserSettings, String)) {
        // parent() of a bare file name is Some(""), which must stay unset
        let dir = match picked.parent() {
            Some(dir) if !dir.as_str().is_empty() => dir,
            _ => return,
        };

        let snapshot = {
            let mut settings = self.settings.write().unwrap();
            apply(&mut settings, dir.to_string());
            settings.clone()
        };

        if let Err(e) = self.manager.save_settings(&snapshot) {
            tracing::warn!("Failed to save settings: {:#}", e);
        }
    }
}

impl FileDialogs for RfdFileDialogs {
    fn pick_question_files(&self) -> Option<Vec<Utf8PathBuf>> {
        let mut dialog = FileDialog::new()
            .set_title("Select Question Set Files")
            .add_filter("Rich Text Format", &["rtf"]);
        let recorded = self.settings.read().unwrap().question_sets_start_dir();
        if let Some(dir) = Self::existing_dir(recorded) {
            dialog = dialog.set_directory(dir);
        }

        let picked = Self::convert_paths(dialog.pick_files()?);
        if picked.is_empty() {
            return None;
        }

        self.remember_dir(&picked[0], |settings, dir| {
            settings.question_sets_dir = dir;
        });
        Some(picked)
    }

    fn pick_record_files(&self) -> Option<Vec<Utf8PathBuf>> {
        let mut dialog = FileDialog::new()
            .set_title("Select QuizMachine Record Files")
            .add_filter("Comma-Separated Values", &["csv"]);
        let recorded = self.settings.read().unwrap().records_start_dir();
        if let Some(dir) = Self::existing_dir(recorded) {
            dialog = dialog.set_directory(dir);
        }

        let picked = Self::convert_paths(dialog.pick_files()?);
        if picked.is_empty() {
            return None;
        }

        self.remember_dir(&picked[0], |settings, dir| {
            settings.records_dir = dir;
        });
        Some(picked)
    }

    fn pick_save_path(&self) -> Option<Utf8PathBuf> {
        let mut dialog = FileDialog::new()
            .set_title("Save Report As")
            .set_file_name("qperformance.csv")
            .add_filter("Comma-Separated Values", &["csv"]);
        let recorded = self.settings.read().unwrap().output_start_dir();
        if let Some(dir) = Self::existing_dir(recorded) {
            dialog = dialog.set_directory(dir);
        }

        let path = dialog.save_file()?;
        let path = Utf8PathBuf::try_from(path)
            .map_err(|e| {
                tracing::error!("Failed to convert path to UTF-8: {}", e);
                e
            })
            .ok()?;

        self.remember_dir(&path, |settings, dir| {
            settings.output_dir = dir;
        });
        Some(path)
    }
}

/// Open a URL in the system browser
pub fn open_in_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "windows")]
    let result = Command::new("cmd").args(["/C", "start", url]).spawn();

    #[cfg(target_os = "macos")]
    let result = Command::new("open").arg(url).spawn();

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let result = Command::new("xdg-open").arg(url).spawn();

    result.map(|_| ())
}
