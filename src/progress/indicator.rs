//! Spinner shown while requests are in flight
//!
//! Uses indicatif for the spinner and console for styling the final line.

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(80);

/// Spinner for one CLI invocation
pub struct ActivityIndicator {
    spinner: ProgressBar,
    start_time: Instant,
    /// Requests started so far
    started: AtomicU64,
    /// Requests that ended in an error
    failed: AtomicU64,
    enabled: AtomicBool,
}

impl ActivityIndicator {
    /// Create a spinner drawing to stderr
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);

        Self {
            spinner,
            start_time: Instant::now(),
            started: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a hidden indicator (quiet mode, JSON output)
    pub fn disabled() -> Self {
        let indicator = Self::new();
        indicator.enabled.store(false, Ordering::SeqCst);
        indicator.spinner.set_draw_target(ProgressDrawTarget::hidden());
        indicator
    }

    /// Start spinning with `msg`
    pub fn begin(&self, msg: &str) {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.spinner.reset();
        self.spinner.set_message(msg.to_string());
        if self.is_enabled() {
            self.spinner.enable_steady_tick(TICK);
        }
    }

    /// Replace the spinner message
    pub fn set_status(&self, msg: &str) {
        self.spinner.set_message(msg.to_string());
    }

    /// Stop with a success line
    pub fn finish_success(&self, message: &str) {
        self.spinner
            .finish_with_message(format!("{} {}", style("✓").green(), message));
    }

    /// Stop with a failure line
    pub fn finish_error(&self, message: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.spinner
            .abandon_with_message(format!("{} {}", style("✗").red(), message));
    }

    /// Stop and erase the spinner line
    pub fn clear(&self) {
        self.spinner.finish_and_clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Requests started and failed so far
    pub fn counts(&self) -> (u64, u64) {
        (
            self.started.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

impl Default for ActivityIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_indicator_counts() {
        let indicator = ActivityIndicator::disabled();
        assert!(!indicator.is_enabled());

        indicator.begin("Loading artworks");
        indicator.finish_success("Loaded 50 artworks");
        indicator.begin("Approving");
        indicator.finish_error("Network error");

        assert_eq!(indicator.counts(), (2, 1));
    }
}
