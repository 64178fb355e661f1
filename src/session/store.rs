//! Authenticated session store
//!
//! [`SessionStore`] is the single authoritative holder of the admin's
//! bearer credential and identity. Clones share the same state, so a
//! renewal performed through one handle is visible to every reader on its
//! next call. The in-memory session is mirrored to a [`SessionStorage`]
//! backend and rebuilt from it with [`SessionStore::hydrate`] at startup.

use crate::error::{AdminError, AuthFailure, IoResultExt, Result};
use crate::gateway::AuthApi;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Opaque bearer token
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for the Authorization header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A logged-in session: credential and identity are always present together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    credential: Credential,
    identity: String,
}

impl AuthSession {
    pub fn new(credential: Credential, identity: impl Into<String>) -> Self {
        Self {
            credential,
            identity: identity.into(),
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Admin email
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Durable mirror format
///
/// Both fields are optional on disk; a mirror with only one of them is
/// treated as corrupt and discarded during hydration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<&AuthSession> for StoredSession {
    fn from(session: &AuthSession) -> Self {
        Self {
            token: Some(session.credential.expose().to_string()),
            email: Some(session.identity.clone()),
        }
    }
}

/// Backend that keeps the session across process restarts
pub trait SessionStorage: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file mirror
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Default location under the platform data directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("immpression-admin").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).with_path(&self.path)?;
        let stored: StoredSession = serde_json::from_str(&content)?;
        Ok(Some(stored))
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }

        let content = serde_json::to_string_pretty(session)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).with_path(&tmp)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600)).with_path(&tmp)?;
        }

        fs::rename(&tmp, &self.path).with_path(&self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AdminError::storage(&self.path, e)),
        }
    }
}

/// In-process mirror, used in tests and for ephemeral sessions
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    slot: Mutex<Option<StoredSession>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded mirror
    pub fn with(stored: StoredSession) -> Self {
        Self {
            slot: Mutex::new(Some(stored)),
        }
    }

    pub fn snapshot(&self) -> Option<StoredSession> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Shared session holder
#[derive(Debug, Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<AuthSession>>>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Empty store over `storage`. Call [`hydrate`](Self::hydrate) before use.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            storage,
        }
    }

    /// Store backed by a fresh in-memory mirror
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::new()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<AuthSession>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<AuthSession>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Populate memory from the durable mirror.
    ///
    /// Returns whether a session was restored. A half-written mirror is
    /// cleared rather than restored.
    pub fn hydrate(&self) -> Result<bool> {
        let restored = match self.storage.load()? {
            Some(StoredSession {
                token: Some(token),
                email: Some(email),
            }) if !token.is_empty() && !email.is_empty() => {
                Some(AuthSession::new(Credential::new(token), email))
            }
            Some(partial) if partial != StoredSession::default() => {
                warn!("discarding incomplete session mirror");
                self.storage.clear()?;
                None
            }
            _ => None,
        };

        let found = restored.is_some();
        if let Some(session) = &restored {
            debug!(identity = %session.identity, "session restored");
        }
        *self.write() = restored;
        Ok(found)
    }

    /// Record a successful login
    pub fn login(&self, credential: Credential, identity: impl Into<String>) {
        let session = AuthSession::new(credential, identity);
        let stored = StoredSession::from(&session);
        info!(identity = %session.identity, "admin logged in");
        *self.write() = Some(session);

        if let Err(e) = self.storage.save(&stored) {
            warn!(error = %e, "failed to persist session");
        }
    }

    /// Clear the session in memory and in the mirror. Idempotent.
    pub fn logout(&self) {
        let previous = self.write().take();
        if let Some(session) = previous {
            info!(identity = %session.identity, "admin logged out");
        }
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    /// Swap in a renewed credential, keeping the identity
    pub fn replace_credential(&self, credential: Credential) -> Result<()> {
        let stored = {
            let mut guard = self.write();
            let session = guard.as_mut().ok_or(AuthFailure::MissingCredential)?;
            session.credential = credential;
            StoredSession::from(&*session)
        };
        if let Err(e) = self.storage.save(&stored) {
            warn!(error = %e, "failed to persist renewed session");
        }
        Ok(())
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.read().clone()
    }

    /// Credential as of now
    pub fn credential(&self) -> Option<Credential> {
        self.read().as_ref().map(|s| s.credential.clone())
    }

    /// Credential as of now, or an auth error when logged out
    pub fn require_credential(&self) -> Result<Credential> {
        self.credential()
            .ok_or_else(|| AuthFailure::MissingCredential.into())
    }

    pub fn identity(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.identity.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Exchange email/password for a session. The store is unchanged on failure.
    pub async fn sign_in(&self, api: &dyn AuthApi, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AdminError::validation("email", "Email is required."));
        }
        if password.is_empty() {
            return Err(AdminError::validation("password", "Password is required."));
        }

        let grant = api.login(email, password).await?;
        let identity = if grant.identity.is_empty() {
            email.to_string()
        } else {
            grant.identity
        };
        self.login(grant.credential, identity);
        self.session()
            .ok_or_else(|| AuthFailure::MissingCredential.into())
    }

    /// Renew the current credential.
    ///
    /// On success only the credential changes. If the server rejects the
    /// credential the session is cleared; transport failures leave it as is.
    pub async fn renew(&self, api: &dyn AuthApi) -> Result<Credential> {
        let current = self.require_credential()?;

        match api.renew_token(&current).await {
            Ok(renewed) => {
                if self.credential().as_ref() != Some(&current) {
                    // logged out or replaced while the renewal was in flight
                    return Err(AuthFailure::MissingCredential.into());
                }
                self.replace_credential(renewed.clone())?;
                debug!("session token renewed");
                Ok(renewed)
            }
            Err(e) if e.is_auth_error() => {
                if self.credential().as_ref() != Some(&current) {
                    debug!(error = %e, "stale renewal rejected, session already replaced");
                    return Err(e);
                }
                warn!(error = %e, "renewal rejected, ending session");
                self.logout();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::StubAuth;
    use std::time::Duration;
    use tempfile::TempDir;

    fn store() -> (Arc<MemorySessionStorage>, SessionStore) {
        let storage = Arc::new(MemorySessionStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    #[test]
    fn test_login_round_trip() {
        let (storage, store) = store();
        store.login(Credential::new("tok-1"), "admin@immpression.art");

        let session = store.session().unwrap();
        assert_eq!(session.credential().expose(), "tok-1");
        assert_eq!(session.identity(), "admin@immpression.art");
        assert_eq!(
            storage.snapshot(),
            Some(StoredSession {
                token: Some("tok-1".into()),
                email: Some("admin@immpression.art".into()),
            })
        );
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (storage, store) = store();
        store.login(Credential::new("tok"), "a@b.c");
        store.logout();
        let once = (store.session(), storage.snapshot());
        store.logout();
        assert_eq!((store.session(), storage.snapshot()), once);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_credential_is_redacted_in_debug() {
        let cred = Credential::new("super-secret");
        assert!(!format!("{:?}", cred).contains("super-secret"));
    }

    #[test]
    fn test_hydrate_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let first = SessionStore::new(Arc::new(FileSessionStorage::new(&path)));
        first.login(Credential::new("persisted"), "ops@immpression.art");
        assert!(path.exists());

        let second = SessionStore::new(Arc::new(FileSessionStorage::new(&path)));
        assert!(!second.is_authenticated());
        assert!(second.hydrate().unwrap());
        assert_eq!(second.credential(), Some(Credential::new("persisted")));
        assert_eq!(second.identity().as_deref(), Some("ops@immpression.art"));

        second.logout();
        assert!(!path.exists());
    }

    #[test]
    fn test_hydrate_discards_partial_mirror() {
        let storage = Arc::new(MemorySessionStorage::with(StoredSession {
            token: Some("orphan".into()),
            email: None,
        }));
        let store = SessionStore::new(storage.clone());
        assert!(!store.hydrate().unwrap());
        assert!(!store.is_authenticated());
        assert_eq!(storage.snapshot(), None);
    }

    #[test]
    fn test_hydrate_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(Arc::new(FileSessionStorage::new(dir.path().join("none.json"))));
        assert!(!store.hydrate().unwrap());
    }

    #[tokio::test]
    async fn test_renew_keeps_identity_and_is_shared() {
        let (_, store) = store();
        let reader = store.clone();
        store.login(Credential::new("old"), "a@immpression.art");

        let api = StubAuth::renewing("new");
        let renewed = store.renew(&api).await.unwrap();
        assert_eq!(renewed.expose(), "new");
        assert_eq!(reader.credential(), Some(Credential::new("new")));
        assert_eq!(reader.identity().as_deref(), Some("a@immpression.art"));
        assert_eq!(api.renewed_with(), vec!["old".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_renewal_logs_out() {
        let (storage, store) = store();
        store.login(Credential::new("stale"), "a@immpression.art");

        let err = store.renew(&StubAuth::rejecting()).await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(!store.is_authenticated());
        assert_eq!(storage.snapshot(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_rejection_keeps_newer_login() {
        let (storage, store) = store();
        store.login(Credential::new("old"), "a@immpression.art");
        let api = StubAuth::slow_rejecting(Duration::from_millis(100));

        let (renewal, _) = tokio::join!(store.renew(&api), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.login(Credential::new("fresh"), "b@immpression.art");
        });

        assert!(renewal.unwrap_err().is_auth_error());
        assert_eq!(store.credential(), Some(Credential::new("fresh")));
        assert_eq!(
            storage.snapshot(),
            Some(StoredSession {
                token: Some("fresh".into()),
                email: Some("b@immpression.art".into()),
            })
        );
    }

    #[tokio::test]
    async fn test_offline_renewal_keeps_session() {
        let (_, store) = store();
        store.login(Credential::new("tok"), "a@immpression.art");

        let err = store.renew(&StubAuth::offline()).await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(store.credential(), Some(Credential::new("tok")));
    }

    #[tokio::test]
    async fn test_renew_requires_session() {
        let (_, store) = store();
        let err = store.renew(&StubAuth::renewing("x")).await.unwrap_err();
        assert!(matches!(err, AdminError::Auth(AuthFailure::MissingCredential)));
    }

    #[tokio::test]
    async fn test_failed_sign_in_leaves_store_unchanged() {
        let (_, store) = store();
        store.login(Credential::new("keep"), "first@immpression.art");

        let err = store
            .sign_in(&StubAuth::rejecting(), "x@immpression.art", "wrong")
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
        assert_eq!(store.credential(), Some(Credential::new("keep")));

        let err = store.sign_in(&StubAuth::renewing("t"), "  ", "pw").await.unwrap_err();
        assert!(matches!(err, AdminError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_sign_in_stores_grant() {
        let (_, store) = store();
        let session = store
            .sign_in(&StubAuth::renewing("unused"), "new@immpression.art", "pw")
            .await
            .unwrap();
        assert_eq!(session.identity(), "new@immpression.art");
        assert_eq!(store.credential(), Some(Credential::new("login-token")));
    }
}
