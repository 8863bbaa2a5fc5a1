use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

#[cfg(test)]
use mockall::automock;

/// Errors that can occur while writing a report
///
/// The display strings double as the status line shown to the user, so they
/// stay short and action-oriented.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Refused to overwrite a file that already exists
    #[error("Output file already exists. Choose a different file name.")]
    AlreadyExists(Utf8PathBuf),

    /// The file could not be written
    #[error("Error saving output.")]
    Io(#[from] std::io::Error),
}

/// Destination for rendered report tables
///
/// Abstracted behind a trait so workflow tests can capture the payload
/// without touching the filesystem.
#[cfg_attr(test, automock)]
pub trait ReportWriter: Send + Sync {
    /// Write the report payload to the given path
    ///
    /// Returns the confirmation text to show the user, which the caller
    /// reports as-is.
    fn save(&self, path: &Utf8Path, payload: &str) -> Result<String, OutputError>;
}

/// Report writer backed by the local filesystem
///
/// Never overwrites: saving onto an existing file is rejected so a user
/// cannot clobber an earlier report from the save dialog.
#[derive(Debug, Default)]
pub struct FsReportWriter;

impl FsReportWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportWriter for FsReportWriter {
    fn save(&self, path: &Utf8Path, payload: &str) -> Result<String, OutputError> {
        if path.exists() {
            tracing::warn!("Refusing to overwrite existing report: {}", path);
            return Err(OutputError::AlreadyExists(path.to_owned()));
        }

        fs::write(path, payload)?;
        tracing::info!("Report saved to {} ({} bytes)", path, payload.len());
        Ok("Saved successfully".to_string())
    }
}
