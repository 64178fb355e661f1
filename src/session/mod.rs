//! Admin session management
//!
//! - `store`: the shared credential/identity holder and its durable mirror
//! - `idle`: inactivity clock and timer
//! - `guard`: idle timeout enforcement wired to the store

pub mod guard;
pub mod idle;
pub mod store;

pub use guard::{GuardEvent, SessionGuard, INACTIVITY_NOTICE, WARNING_PROMPT};
pub use idle::{ActivityKind, IdleClock, IdleConfig, IdleEvent, IdleState, IdleTimer};
pub use store::{
    AuthSession, Credential, FileSessionStorage, MemorySessionStorage, SessionStorage,
    SessionStore, StoredSession,
};
