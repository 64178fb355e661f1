//! Inactivity tracking
//!
//! [`IdleClock`] is the pure state machine: ticks count idle units,
//! activity resets the count, and crossing the thresholds moves the clock
//! `Active -> Warning -> Expired`. [`IdleTimer`] runs a clock on a tokio
//! task, feeding it interval ticks and activity signals through one
//! `select!` loop so a reset is never lost to a concurrent tick.

use crate::error::{AdminError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Wall time per idle unit
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

/// Idle units before the warning prompt
pub const DEFAULT_WARNING_THRESHOLD: u32 = 59;

/// Idle units before forced logout
pub const DEFAULT_IDLE_LIMIT: u32 = 60;

/// Idle timeout thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleConfig {
    pub tick: Duration,
    pub warning_threshold: u32,
    pub idle_limit: u32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            idle_limit: DEFAULT_IDLE_LIMIT,
        }
    }
}

impl IdleConfig {
    /// Check `0 < warning_threshold < idle_limit` and a non-zero tick
    pub fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(AdminError::config("idle tick must be greater than zero"));
        }
        if self.warning_threshold == 0 || self.warning_threshold >= self.idle_limit {
            return Err(AdminError::config(format!(
                "idle warning threshold ({}) must be between 1 and the idle limit ({})",
                self.warning_threshold, self.idle_limit
            )));
        }
        Ok(())
    }

    /// Wall time from last activity to forced logout
    pub fn timeout(&self) -> Duration {
        self.tick * self.idle_limit
    }
}

/// Idle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Warning,
    Expired,
}

impl fmt::Display for IdleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdleState::Active => write!(f, "active"),
            IdleState::Warning => write!(f, "warning"),
            IdleState::Expired => write!(f, "expired"),
        }
    }
}

/// Kinds of user activity that count as "not idle"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerMove,
    KeyPress,
    Click,
    Scroll,
}

/// Pure idle state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleClock {
    config: IdleConfig,
    elapsed: u32,
    warning: bool,
    expired: bool,
}

impl IdleClock {
    pub fn new(config: IdleConfig) -> Self {
        Self {
            config,
            elapsed: 0,
            warning: false,
            expired: false,
        }
    }

    /// Idle units counted since the last reset
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn state(&self) -> IdleState {
        if self.expired {
            IdleState::Expired
        } else if self.warning {
            IdleState::Warning
        } else {
            IdleState::Active
        }
    }

    /// Count one idle unit. Returns the new state when it changed.
    pub fn tick(&mut self) -> Option<IdleState> {
        if self.expired {
            return None;
        }
        self.elapsed = self.elapsed.saturating_add(1);

        if self.elapsed >= self.config.idle_limit {
            self.expired = true;
            return Some(IdleState::Expired);
        }
        if self.elapsed >= self.config.warning_threshold && !self.warning {
            self.warning = true;
            return Some(IdleState::Warning);
        }
        None
    }

    /// Zero the count after activity or renewal.
    ///
    /// Ignored once expired. Returns the new state when it changed.
    pub fn reset(&mut self) -> Option<IdleState> {
        if self.expired {
            return None;
        }
        let was_warning = self.warning;
        self.elapsed = 0;
        self.warning = false;
        was_warning.then_some(IdleState::Active)
    }
}

/// Notification from a running [`IdleTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    /// Warning threshold reached; the user should be asked to stay
    Warning,
    /// Activity or renewal cleared a pending warning
    Resumed,
    /// Idle limit reached; the expiry callback has run
    Expired,
}

#[derive(Debug)]
enum Command {
    Activity(ActivityKind),
    Reset,
}

/// Async driver for an [`IdleClock`]
///
/// Dropping the timer stops its task, so nothing fires after teardown.
#[derive(Debug)]
pub struct IdleTimer {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<IdleState>,
    task: JoinHandle<()>,
}

impl IdleTimer {
    /// Start counting. Must be called inside a tokio runtime.
    ///
    /// `on_expire` runs exactly once, on the task, when the idle limit is
    /// reached. The returned receiver yields [`IdleEvent`]s.
    pub fn start<F>(config: IdleConfig, on_expire: F) -> (Self, mpsc::UnboundedReceiver<IdleEvent>)
    where
        F: FnOnce() + Send + 'static,
    {
        let (commands, mut command_rx) = mpsc::unbounded_channel();
        let (events, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(IdleState::Active);

        let task = tokio::spawn(async move {
            let mut clock = IdleClock::new(config);
            let mut on_expire = Some(on_expire);
            let mut ticker = interval_at(Instant::now() + config.tick, config.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // activity drains before a tick scheduled for the same instant
                    biased;

                    command = command_rx.recv() => {
                        let Some(command) = command else {
                            debug!("idle timer handle dropped");
                            break;
                        };
                        if let Command::Activity(kind) = command {
                            debug!(?kind, "activity observed");
                        }
                        if let Some(state) = clock.reset() {
                            state_tx.send_replace(state);
                            info!("idle warning cleared");
                            let _ = events.send(IdleEvent::Resumed);
                        }
                    }
                    _ = ticker.tick() => {
                        match clock.tick() {
                            Some(IdleState::Warning) => {
                                state_tx.send_replace(IdleState::Warning);
                                warn!(elapsed = clock.elapsed(), "session idle, warning user");
                                let _ = events.send(IdleEvent::Warning);
                            }
                            Some(IdleState::Expired) => {
                                state_tx.send_replace(IdleState::Expired);
                                info!(elapsed = clock.elapsed(), "idle limit reached");
                                if let Some(callback) = on_expire.take() {
                                    callback();
                                }
                                let _ = events.send(IdleEvent::Expired);
                                break;
                            }
                            _ => {}
                        }
                    }
                }
            }
        });

        (
            Self {
                commands,
                state,
                task,
            },
            event_rx,
        )
    }

    /// Report user activity
    pub fn record_activity(&self, kind: ActivityKind) {
        let _ = self.commands.send(Command::Activity(kind));
    }

    /// Restart the count after a successful renewal
    pub fn reset(&self) {
        let _ = self.commands.send(Command::Reset);
    }

    pub fn state(&self) -> IdleState {
        *self.state.borrow()
    }

    /// Receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<IdleState> {
        self.state.clone()
    }

    /// Whether the counting task is still alive
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const MINUTE: Duration = Duration::from_secs(60);

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&count);
        (count, move || {
            hook.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_config_validation() {
        assert!(IdleConfig::default().validate().is_ok());
        let bad = IdleConfig {
            warning_threshold: 60,
            ..IdleConfig::default()
        };
        assert!(bad.validate().is_err());
        let zero = IdleConfig {
            tick: Duration::ZERO,
            ..IdleConfig::default()
        };
        assert!(zero.validate().is_err());
        assert_eq!(IdleConfig::default().timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_clock_thresholds() {
        let mut clock = IdleClock::new(IdleConfig::default());
        for _ in 0..58 {
            assert_eq!(clock.tick(), None);
        }
        assert_eq!(clock.tick(), Some(IdleState::Warning));
        assert_eq!(clock.state(), IdleState::Warning);
        assert_eq!(clock.tick(), Some(IdleState::Expired));
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.reset(), None);
        assert_eq!(clock.state(), IdleState::Expired);
    }

    #[test]
    fn test_reset_clears_warning() {
        let mut clock = IdleClock::new(IdleConfig {
            tick: MINUTE,
            warning_threshold: 2,
            idle_limit: 3,
        });
        clock.tick();
        clock.tick();
        assert_eq!(clock.state(), IdleState::Warning);
        assert_eq!(clock.reset(), Some(IdleState::Active));
        assert_eq!(clock.elapsed(), 0);
        assert_eq!(clock.reset(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_warning_then_forced_logout() {
        let (expired, on_expire) = counter();
        let (timer, mut events) = IdleTimer::start(IdleConfig::default(), on_expire);

        tokio::time::sleep(MINUTE * 59 + Duration::from_millis(1)).await;
        assert_eq!(timer.state(), IdleState::Warning);
        assert_eq!(events.recv().await, Some(IdleEvent::Warning));
        assert_eq!(expired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(MINUTE).await;
        assert_eq!(events.recv().await, Some(IdleEvent::Expired));
        assert_eq!(timer.state(), IdleState::Expired);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert_eq!(events.recv().await, None);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_postpones_warning() {
        let (expired, on_expire) = counter();
        let (timer, mut events) = IdleTimer::start(IdleConfig::default(), on_expire);

        tokio::time::sleep(MINUTE * 30 + Duration::from_millis(1)).await;
        timer.record_activity(ActivityKind::PointerMove);

        tokio::time::sleep(MINUTE * 29).await;
        assert_eq!(timer.state(), IdleState::Active);
        assert!(events.try_recv().is_err());

        tokio::time::sleep(MINUTE * 30).await;
        assert_eq!(events.recv().await, Some(IdleEvent::Warning));

        timer.reset();
        assert_eq!(events.recv().await, Some(IdleEvent::Resumed));
        assert_eq!(timer.state(), IdleState::Active);
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let (expired, on_expire) = counter();
        let (timer, _events) = IdleTimer::start(
            IdleConfig {
                tick: Duration::from_secs(1),
                warning_threshold: 1,
                idle_limit: 2,
            },
            on_expire,
        );
        drop(timer);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Tick,
        Activity,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![4 => Just(Step::Tick), 1 => Just(Step::Activity)]
    }

    proptest! {
        #[test]
        fn clock_transitions_are_ordered(
            warning in 1u32..10,
            extra in 1u32..5,
            steps in proptest::collection::vec(step(), 0..200),
        ) {
            let config = IdleConfig { tick: MINUTE, warning_threshold: warning, idle_limit: warning + extra };
            let mut clock = IdleClock::new(config);
            let mut expirations = 0;

            for s in steps {
                let before = clock.state();
                let change = match s {
                    Step::Tick => clock.tick(),
                    Step::Activity => clock.reset(),
                };
                let after = clock.state();

                if let Some(new) = change {
                    prop_assert_eq!(new, after);
                }
                match (before, after) {
                    (IdleState::Active, IdleState::Expired) => prop_assert!(false, "skipped warning"),
                    (IdleState::Expired, other) => prop_assert_eq!(other, IdleState::Expired),
                    _ => {}
                }
                if change == Some(IdleState::Expired) {
                    expirations += 1;
                }
            }
            prop_assert!(expirations <= 1);
            prop_assert_eq!(clock.state() == IdleState::Expired, expirations == 1);
        }
    }
}
