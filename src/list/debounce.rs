//! Debounced value propagation
//!
//! A [`Debouncer`] accepts a stream of rapidly changing values and publishes
//! a value on its watch channel only after the input has stayed unchanged
//! for the configured delay. Every new observation cancels the pending
//! publication and schedules a fresh one.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

/// Default delay used for search inputs
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Delays propagation of a value until it stops changing
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    tx: Arc<watch::Sender<T>>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a debouncer whose stable value starts at `initial`
    pub fn new(initial: T, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            delay,
            tx: Arc::new(tx),
            pending: None,
        }
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Feed a new input value.
    ///
    /// Supersedes any pending publication. Must be called inside a tokio
    /// runtime.
    pub fn observe(&mut self, value: T) {
        self.cancel();

        let tx = Arc::clone(&self.tx);
        // deadline is fixed at observation time, not when the task first runs
        let deadline = Instant::now() + self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let changed = tx.send_if_modified(|current| {
                if *current == value {
                    false
                } else {
                    *current = value;
                    true
                }
            });
            trace!(changed, "debounce window elapsed");
        }));
    }

    /// Last published stable value
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Subscribe to stable value changes
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Whether a publication is scheduled and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Drop any pending publication
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
