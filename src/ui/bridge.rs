// EventLoopBridge - Coordinates between the tokio runtime and the Slint event loop
//
// Two event loops run in this application: Slint's single-threaded GUI loop
// and tokio's worker pool, where the engine and all file work happen. The
// bridge carries traffic both ways:
// - UI updates from tokio tasks, marshaled onto the Slint thread
// - Async tasks spawned from Slint callbacks onto the tokio runtime

use crate::metrics::Metrics;
use slint::{ComponentHandle, Weak};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Traffic control between the tokio runtime and the Slint event loop.
///
/// `update_ui` queues a closure to run on the Slint thread with the live
/// component; `spawn_async` runs a future on the tokio runtime from a
/// Slint callback. Updates travel over a bounded channel drained by a
/// dedicated handler thread, so a burst of state changes cannot grow
/// memory without limit when the event loop lags. Scheduled and dropped
/// updates are both counted in [`Metrics`].
///
/// # Example
/// ```ignore
/// let bridge = EventLoopBridge::new(&ui, runtime.handle().clone(), metrics);
///
/// bridge.spawn_async(|| async {
///     // Run the analysis...
///
///     // Report the outcome
///     bridge.update_ui(|ui| {
///         ui.set_status_text("Success".into());
///     });
/// });
/// ```
pub struct EventLoopBridge<T: ComponentHandle> {
    /// Weak reference to the window, for callbacks that must read it live
    ui_weak: Weak<T>,

    /// Runtime handle used by `spawn_async`
    tokio_handle: tokio::runtime::Handle,

    /// Update queue drained by the handler thread; capacity 100
    ui_update_tx: mpsc::Sender<Box<dyn FnOnce(&T) + Send>>,

    /// Shared counters for update accounting
    metrics: Arc<Metrics>,
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    /// Create the bridge and start its handler thread.
    ///
    /// The handler thread receives queued updates and hands each one to
    /// `Weak::upgrade_in_event_loop`, which runs it on the Slint thread
    /// with the upgraded component. The thread ends when every sender is
    /// dropped or when the event loop can no longer accept work.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle, metrics: Arc<Metrics>) -> Self {
        let ui_weak = ui.as_weak();
        let (ui_update_tx, mut ui_update_rx) = mpsc::channel::<Box<dyn FnOnce(&T) + Send>>(100);

        let handler_weak = ui_weak.clone();
        let thread_metrics = Arc::clone(&metrics);
        std::thread::spawn(move || {
            tracing::debug!("Update handler thread running");

            while let Some(update_fn) = ui_update_rx.blocking_recv() {
                let result = handler_weak.upgrade_in_event_loop(move |ui| {
                    update_fn(&ui);
                });

                if let Err(e) = result {
                    // The event loop is gone; nothing further can be delivered
                    tracing::warn!("Could not hand update to the event loop: {:?}", e);
                    thread_metrics.record_ui_update_error();
                    break;
                }
            }

            tracing::debug!("Update handler thread exiting");
        });

        Self {
            ui_weak,
            tokio_handle,
            ui_update_tx,
            metrics,
        }
    }

    /// Queue a UI update from any thread.
    ///
    /// The closure runs on the Slint thread with the live component on a
    /// coming event loop iteration. When the queue is full the update is
    /// dropped with a warning rather than blocking the caller; a later
    /// state change will repaint the same properties.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        send_update(&self.ui_update_tx, &self.metrics, update);
    }

    /// Run a future on the tokio runtime, from a Slint callback.
    ///
    /// # Example
    /// ```ignore
    /// ui.on_run_clicked(move || {
    ///     let workflow = Arc::clone(&workflow);
    ///     bridge.spawn_async(move || async move {
    ///         workflow.run_analysis(options).await;
    ///     });
    /// });
    /// ```
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }

    /// Weak reference to the window, for callbacks that read form values.
    pub fn ui_weak(&self) -> &Weak<T> {
        &self.ui_weak
    }

    /// A cloneable handle for moving into Slint callbacks.
    ///
    /// Slint callbacks capture by value, and several of them need the
    /// bridge at once; each gets its own handle.
    pub fn clone_handle(&self) -> EventLoopBridgeHandle<T> {
        EventLoopBridgeHandle {
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Cloneable slice of the bridge: the update queue and the spawn handle.
pub struct EventLoopBridgeHandle<T: ComponentHandle> {
    tokio_handle: tokio::runtime::Handle,
    ui_update_tx: mpsc::Sender<Box<dyn FnOnce(&T) + Send>>,
    metrics: Arc<Metrics>,
}

// Hand-written so Clone does not demand T: Clone
impl<T: ComponentHandle> Clone for EventLoopBridgeHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<T: ComponentHandle + 'static> EventLoopBridgeHandle<T> {
    /// Queue a UI update from any thread.
    ///
    /// See [`EventLoopBridge::update_ui`].
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        send_update(&self.ui_update_tx, &self.metrics, update);
    }

    /// Run a future on the tokio runtime.
    ///
    /// See [`EventLoopBridge::spawn_async`].
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }
}

fn send_update<T>(
    tx: &mpsc::Sender<Box<dyn FnOnce(&T) + Send>>,
    metrics: &Metrics,
    update: impl FnOnce(&T) + Send + 'static,
) {
    match tx.try_send(Box::new(update)) {
        Ok(_) => {
            metrics.record_ui_update();
        }
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!("UI update channel full, dropping update");
            metrics.record_ui_update_error();
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::warn!("UI update channel closed, handler thread has stopped");
            metrics.record_ui_update_error();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    // The window-facing half needs a live Slint component and a display, so
    // it is exercised through the running application; the queue accounting
    // is testable on its own.

    type Update = Box<dyn FnOnce(&()) + Send>;

    #[test]
    fn test_send_update_counts_scheduled_updates() {
        let metrics = Metrics::new();
        let (tx, mut rx) = mpsc::channel::<Update>(4);

        send_update(&tx, &metrics, |_: &()| {});

        assert_eq!(metrics.ui_updates.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.ui_update_errors.load(Ordering::Relaxed), 0);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_send_update_drops_when_queue_is_full() {
        let metrics = Metrics::new();
        let (tx, _rx) = mpsc::channel::<Update>(1);

        send_update(&tx, &metrics, |_: &()| {});
        send_update(&tx, &metrics, |_: &()| {});

        assert_eq!(metrics.ui_updates.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.ui_update_errors.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_send_update_reports_closed_queue() {
        let metrics = Metrics::new();
        let (tx, rx) = mpsc::channel::<Update>(1);
        drop(rx);

        send_update(&tx, &metrics, |_: &()| {});

        assert_eq!(metrics.ui_updates.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.ui_update_errors.load(Ordering::Relaxed), 1);
    }
}
