// Session counters incremented from the workflow and the UI bridge,
// summarized into the log at shutdown.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Session counters shared across the workflow and the UI bridge.
///
/// All counters are atomics with relaxed ordering: they are statistics,
/// not synchronization, and the writers never wait on each other.
#[derive(Debug)]
pub struct Metrics {
    /// Analysis runs that finished with a result
    pub runs_completed: AtomicUsize,

    /// Analysis runs that ended in an error
    pub runs_failed: AtomicUsize,

    /// Run requests the availability gate turned away
    pub runs_rejected: AtomicUsize,

    /// Engine wall time accumulated over completed runs, in milliseconds
    pub total_engine_time_ms: AtomicU64,

    /// Reports written to disk
    pub reports_saved: AtomicUsize,

    /// Saves that failed, including overwrite refusals
    pub save_failures: AtomicUsize,

    /// Mutations applied through the state manager
    pub state_updates: AtomicU64,

    /// UI updates scheduled onto the event loop
    pub ui_updates: AtomicU64,

    /// UI updates dropped because the queue was full or the loop was gone
    pub ui_update_errors: AtomicU64,

    /// When this session started
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            runs_completed: AtomicUsize::new(0),
            runs_failed: AtomicUsize::new(0),
            runs_rejected: AtomicUsize::new(0),
            total_engine_time_ms: AtomicU64::new(0),
            reports_saved: AtomicUsize::new(0),
            save_failures: AtomicUsize::new(0),
            state_updates: AtomicU64::new(0),
            ui_updates: AtomicU64::new(0),
            ui_update_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_run_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_rejected(&self) {
        self.runs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Add one run's engine wall time to the running total
    pub fn record_engine_time(&self, duration: Duration) {
        self.total_engine_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_report_saved(&self) {
        self.reports_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_update(&self) {
        self.state_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_update(&self) {
        self.ui_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_update_error(&self) {
        self.ui_update_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Time elapsed since this session started
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Mean engine wall time per completed run, in milliseconds
    pub fn avg_engine_time_ms(&self) -> f64 {
        let total = self.total_engine_time_ms.load(Ordering::Relaxed);
        let count = self.runs_completed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Write the session summary to the log, one line per counter group
    pub fn log_summary(&self) {
        tracing::info!("Session summary after {:.2}s:", self.uptime().as_secs_f64());
        tracing::info!(
            "Runs: {} completed, {} failed, {} rejected",
            self.runs_completed.load(Ordering::Relaxed),
            self.runs_failed.load(Ordering::Relaxed),
            self.runs_rejected.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Engine time: {:.2}s total, {:.2}ms per completed run",
            self.total_engine_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_engine_time_ms()
        );
        tracing::info!(
            "Reports: {} saved, {} save failures",
            self.reports_saved.load(Ordering::Relaxed),
            self.save_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "State updates: {}, UI updates: {} scheduled, {} dropped",
            self.state_updates.load(Ordering::Relaxed),
            self.ui_updates.load(Ordering::Relaxed),
            self.ui_update_errors.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
