//! # Immpression admin - moderation console for an art marketplace
//!
//! The marketplace keeps all of its data behind a REST API. This crate is
//! the administrator side of it: it signs the admin in, keeps the session
//! alive (or ends it after inactivity), and drives the paginated moderation
//! lists for artworks, users, orders and abuse reports.
//!
//! ## Features
//!
//! - **Session store**: one shared credential, mirrored to disk, renewed in place
//! - **Idle timeout**: warning after 59 idle minutes, forced logout at 60
//! - **Debounced search**: typed text reaches the server once it settles
//! - **List controller**: one generic controller that discards stale responses
//! - **Gateway**: reqwest client with a single wire-to-domain mapping layer
//!
//! ## Quick Start
//!
//! ```no_run
//! use immpression_admin::gateway::{GatewayClient, DEFAULT_TIMEOUT};
//! use immpression_admin::list::ListController;
//! use immpression_admin::resources::{ArtworkFilter, ArtworkSource};
//! use immpression_admin::session::SessionStore;
//! use std::sync::Arc;
//!
//! # async fn demo() -> immpression_admin::Result<()> {
//! let session = SessionStore::in_memory();
//! let client = Arc::new(GatewayClient::new("https://api.example.com", DEFAULT_TIMEOUT, session.clone())?);
//! session.sign_in(client.as_ref(), "admin@example.com", "secret").await?;
//!
//! let artworks = ListController::with_defaults(Arc::new(ArtworkSource::new(client)));
//! artworks.set_filter(ArtworkFilter::Review).await;
//! for art in artworks.visible_items() {
//!     println!("{} by {}", art.name, art.artist_name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Idle timeout
//!
//! ```no_run
//! use immpression_admin::session::{ActivityKind, GuardEvent, IdleConfig, SessionGuard, SessionStore};
//! # use immpression_admin::gateway::AuthApi;
//! # use std::sync::Arc;
//!
//! # async fn demo(store: SessionStore, api: Arc<dyn AuthApi>) -> immpression_admin::Result<()> {
//! let mut guard = SessionGuard::start(store, api, IdleConfig::default())?;
//! guard.activity(ActivityKind::KeyPress);
//! while let Some(event) = guard.next_event().await {
//!     if let GuardEvent::WarningPrompt { .. } = event {
//!         guard.stay_logged_in().await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod list;
pub mod progress;
pub mod resources;
pub mod session;

// Re-export commonly used types
pub use config::{AdminConfig, CliArgs, OutputFormat};
pub use error::{AdminError, AuthFailure, Result};
pub use gateway::GatewayClient;
pub use list::ListController;
pub use session::SessionStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use immpression_admin::prelude::*;
    //! ```

    pub use crate::config::AdminConfig;
    pub use crate::error::{AdminError, AuthFailure, Result};
    pub use crate::gateway::{AuthApi, GatewayClient};
    pub use crate::list::{FetchOutcome, ListController, ListOptions, ListSource, LoadStatus, PageSlot};
    pub use crate::progress::ActivityIndicator;
    pub use crate::resources::{
        ArtworkFilter, ArtworkSource, OrderFilter, OrderSource, ReportAction, ReportFilter,
        ReportSource, UserFilter, UserSource,
    };
    pub use crate::session::{GuardEvent, IdleConfig, SessionGuard, SessionStore};
}
