//! Remote data gateway
//!
//! All data lives behind the marketplace REST API. Every authenticated
//! request carries `Authorization: Bearer <credential>`.
//!
//! | Purpose | Method & path |
//! |---|---|
//! | Login | `POST /api/admin/login` |
//! | Renew token | `POST /api/admin/renew_token` |
//! | Artworks | `GET /api/admin/all_images` (`page`, `limit`, `input`, `stage`) |
//! | Artwork stats | `GET /api/admin/all_images/stats` |
//! | Artwork detail / delete | `GET`, `DELETE /api/admin/art/{id}` |
//! | Approve / reject | `PUT /api/admin/art/{id}/approve`, `/reject` |
//! | Users | `GET /api/admin/users` |
//! | User detail / delete | `GET`, `DELETE /api/admin/user/{id}` |
//! | Orders | `GET /orders` (`page`, `limit`) |
//! | Order detail | `GET /orderDetails/{id}` |
//! | Order delete | `DELETE /order/{id}` |
//! | Payout preview / send | `GET /order/{id}/payout-preview`, `POST /order/{id}/payout` |
//! | Reports | `GET /api/admin/reports` (`page`, `limit`, `status`, `type`) |
//! | Report stats | `GET /api/admin/reports/stats` |
//! | Report detail | `GET /api/admin/reports/{id}` |
//! | Report moderation | `PUT .../{id}/status`, `POST .../{id}/warn`, `/suspend`, `/ban`, `/remove-content`, `/dismiss` |

pub mod client;
pub mod models;
pub mod wire;

use crate::error::Result;
use crate::session::store::Credential;
use async_trait::async_trait;

pub use client::{GatewayClient, DEFAULT_TIMEOUT};
pub use models::*;

/// Outcome of a successful login exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub credential: Credential,
    /// Admin email as confirmed by the server
    pub identity: String,
}

/// Credential-issuing endpoints
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange email and password for a credential
    async fn login(&self, email: &str, password: &str) -> Result<LoginGrant>;

    /// Exchange a still-valid credential for a fresh one
    async fn renew_token(&self, credential: &Credential) -> Result<Credential>;
}
