use crate::models::UserSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Settings manager for loading and saving the YAML settings file.
///
/// Manages a single file (`QPerformance Settings.yaml`) holding UI
/// conveniences: the debug logging flag and the last-used dialog
/// directories. A missing file is normal on first launch.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl SettingsManager {
    /// Create a new SettingsManager with the specified settings directory.
    ///
    /// # Arguments
    /// * `settings_dir` - Directory containing the settings file (e.g., "QPerformance Data")
    ///
    /// # Returns
    /// A new SettingsManager instance
    pub fn new<P: AsRef<Utf8Path>>(settings_dir: P) -> Result<Self> {
        let settings_dir = settings_dir.as_ref().to_path_buf();

        // Create settings directory if it doesn't exist
        if !settings_dir.exists() {
            fs::create_dir_all(&settings_dir)
                .with_context(|| format!("Failed to create settings directory: {}", settings_dir))?;
        }

        Ok(Self {
            settings_path: settings_dir.join("QPerformance Settings.yaml"),
            settings_dir,
        })
    }

    /// Load the user settings file.
    ///
    /// # Returns
    /// The stored settings, or defaults when no settings file exists yet
    pub fn load_settings(&self) -> Result<UserSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            return Ok(UserSettings::default());
        }

        let content = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings file: {}", self.settings_path))?;

        let settings: UserSettings = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save the user settings file, replacing any existing content.
    pub fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        let content =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, content)
            .with_context(|| format!("Failed to write settings file: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Get the settings directory path.
    pub fn settings_dir(&self) -> &Utf8Path {
        &self.settings_dir
    }

    /// Get the settings file path.
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}
