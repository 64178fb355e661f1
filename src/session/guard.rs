//! Idle guard for an authenticated screen
//!
//! Ties an [`IdleTimer`] to the [`SessionStore`]: reaching the idle limit
//! logs the admin out, and answering the warning prompt either renews the
//! credential or ends the session immediately.

use crate::error::{AuthFailure, Result};
use crate::gateway::AuthApi;
use crate::session::idle::{ActivityKind, IdleConfig, IdleEvent, IdleState, IdleTimer};
use crate::session::store::SessionStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Prompt shown when the warning threshold is reached
pub const WARNING_PROMPT: &str =
    "You will be logged out in less than 1 minute due to inactivity, do you wish to stay logged in?";

/// Notice shown after a forced logout
pub const INACTIVITY_NOTICE: &str = "You have been logged out due to inactivity.";

/// What the front end should render next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    /// Show the modal stay/log-out prompt
    WarningPrompt { message: &'static str },
    /// Close the prompt
    Resumed,
    /// Session is gone; go to login and show the notice
    LoggedOut { notice: &'static str },
}

/// Idle timeout enforcement for one mounted screen
pub struct SessionGuard {
    store: SessionStore,
    api: Arc<dyn AuthApi>,
    timer: IdleTimer,
    events: mpsc::UnboundedReceiver<IdleEvent>,
}

impl SessionGuard {
    /// Start guarding the current session
    pub fn start(store: SessionStore, api: Arc<dyn AuthApi>, config: IdleConfig) -> Result<Self> {
        config.validate()?;
        if !store.is_authenticated() {
            return Err(AuthFailure::MissingCredential.into());
        }

        let expiring = store.clone();
        let (timer, events) = IdleTimer::start(config, move || {
            info!("logging out after inactivity");
            expiring.logout();
        });

        Ok(Self {
            store,
            api,
            timer,
            events,
        })
    }

    /// Forward a user activity signal
    pub fn activity(&self, kind: ActivityKind) {
        self.timer.record_activity(kind);
    }

    pub fn state(&self) -> IdleState {
        self.timer.state()
    }

    /// Wait for the next thing to render. `None` once the timer has stopped.
    pub async fn next_event(&mut self) -> Option<GuardEvent> {
        let event = self.events.recv().await?;
        Some(match event {
            IdleEvent::Warning => GuardEvent::WarningPrompt {
                message: WARNING_PROMPT,
            },
            IdleEvent::Resumed => GuardEvent::Resumed,
            IdleEvent::Expired => GuardEvent::LoggedOut {
                notice: INACTIVITY_NOTICE,
            },
        })
    }

    /// "Stay logged in": renew the credential, then restart the idle count.
    ///
    /// A rejected renewal ends the session and returns the auth error.
    pub async fn stay_logged_in(&self) -> Result<()> {
        if self.timer.state() == IdleState::Expired {
            return Err(AuthFailure::MissingCredential.into());
        }
        self.store.renew(self.api.as_ref()).await?;
        self.timer.reset();
        Ok(())
    }

    /// "Log out now": end the session and stop the timer
    pub fn log_out_now(self) {
        info!("admin chose to log out");
        self.store.logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::Credential;
    use crate::session::testing::StubAuth;
    use std::time::Duration;

    fn short() -> IdleConfig {
        IdleConfig {
            tick: Duration::from_secs(60),
            warning_threshold: 2,
            idle_limit: 3,
        }
    }

    fn logged_in() -> SessionStore {
        let store = SessionStore::in_memory();
        store.login(Credential::new("tok"), "admin@immpression.art");
        store
    }

    #[tokio::test]
    async fn test_requires_session() {
        let result = SessionGuard::start(
            SessionStore::in_memory(),
            Arc::new(StubAuth::renewing("x")),
            short(),
        );
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_logs_out_once() {
        let store = logged_in();
        let mut guard = SessionGuard::start(store.clone(), Arc::new(StubAuth::renewing("x")), short()).unwrap();

        assert_eq!(
            guard.next_event().await,
            Some(GuardEvent::WarningPrompt { message: WARNING_PROMPT })
        );
        assert!(store.is_authenticated());

        assert_eq!(
            guard.next_event().await,
            Some(GuardEvent::LoggedOut { notice: INACTIVITY_NOTICE })
        );
        assert!(!store.is_authenticated());
        assert_eq!(guard.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stay_logged_in_renews_and_resets() {
        let store = logged_in();
        let api = Arc::new(StubAuth::renewing("fresh"));
        let mut guard = SessionGuard::start(store.clone(), api.clone(), short()).unwrap();

        assert!(matches!(guard.next_event().await, Some(GuardEvent::WarningPrompt { .. })));
        guard.stay_logged_in().await.unwrap();
        assert_eq!(guard.next_event().await, Some(GuardEvent::Resumed));
        assert_eq!(guard.state(), IdleState::Active);
        assert_eq!(store.credential(), Some(Credential::new("fresh")));
        assert_eq!(store.identity().as_deref(), Some("admin@immpression.art"));
        assert_eq!(api.renewed_with(), vec!["tok".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_stay_ends_session() {
        let store = logged_in();
        let mut guard = SessionGuard::start(store.clone(), Arc::new(StubAuth::rejecting()), short()).unwrap();

        guard.next_event().await;
        assert!(guard.stay_logged_in().await.unwrap_err().is_auth_error());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_log_out_now() {
        let store = logged_in();
        let guard = SessionGuard::start(store.clone(), Arc::new(StubAuth::renewing("x")), short()).unwrap();
        guard.activity(ActivityKind::KeyPress);
        guard.log_out_now();
        assert!(!store.is_authenticated());
    }
}
