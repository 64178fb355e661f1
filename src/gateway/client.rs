//! reqwest-backed client for the admin REST API

use crate::error::{AdminError, AuthFailure, Result};
use crate::gateway::models::*;
use crate::gateway::wire::{self, *};
use crate::gateway::{AuthApi, LoginGrant};
use crate::list::query::Page;
use crate::session::store::{Credential, SessionStore};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AdminError::validation("id", "An id is required."));
    }
    Ok(id)
}

/// Client for every endpoint the console uses
///
/// Authenticated calls read the credential from the [`SessionStore`] at the
/// moment the request is built, so a renewal is picked up by the very next
/// call. With no session the call fails before any request is sent.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
    base: Url,
    session: SessionStore,
}

impl GatewayClient {
    /// Create a client for `base_url` (scheme and host, no trailing path)
    pub fn new(base_url: &str, timeout: Duration, session: SessionStore) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AdminError::config(format!(
                "API URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let base = Url::parse(&base_url)
            .map_err(|e| AdminError::config(format!("invalid API URL '{}': {}", base_url, e)))?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("immpression-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdminError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            base,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `prefix`, then `id` as one percent-encoded segment, then `action`
    fn id_path(&self, prefix: &str, id: &str, action: Option<&str>) -> Result<String> {
        let id = require_id(id)?;
        let mut url = self.base.clone();
        url.set_path(prefix);
        url.path_segments_mut()
            .map_err(|_| AdminError::config(format!("API URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(id)
            .extend(action);
        Ok(url.path().to_string())
    }

    /// Request carrying the current bearer credential
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let credential = self.session.require_credential()?;
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(credential.expose()))
    }

    /// Send and return the body of a successful response.
    ///
    /// 401/403 become `TokenRejected`; other failures become `Api` errors
    /// carrying the server's `message`/`error` text.
    async fn execute(&self, request: RequestBuilder, method: &Method, path: &str) -> Result<String> {
        let response = request.send().await.map_err(|e| {
            warn!(%method, endpoint = path, error = %e, "request failed");
            AdminError::network(path, e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdminError::network(path, e.to_string()))?;
        debug!(%method, endpoint = path, status = status.as_u16(), "api response");

        if status.is_success() {
            return Ok(body);
        }

        let explanation = serde_json::from_str::<WireError>(&body)
            .ok()
            .and_then(WireError::explanation);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthFailure::TokenRejected(
                explanation.unwrap_or_else(|| status.to_string()),
            )
            .into(),
            _ => AdminError::api(
                status.as_u16(),
                explanation.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                }),
            ),
        })
    }

    fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| AdminError::Decode(format!("{}: {}", path, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&'static str, String)]) -> Result<T> {
        let request = self.authed(Method::GET, path)?.query(query);
        let body = self.execute(request, &Method::GET, path).await?;
        Self::decode(path, &body)
    }

    async fn send<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> Result<ActionReceipt> {
        let mut request = self.authed(method.clone(), path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        let body = self.execute(request, &method, path).await?;
        wire::decode_or_default::<WireAck>(&body)
            .map_err(|e| AdminError::Decode(format!("{}: {}", path, e)))?
            .into_receipt()
            .map_err(|message| AdminError::api(200, message))
    }

    async fn list<W, R, F>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        page_size: u32,
        map: F,
    ) -> Result<Page<R>>
    where
        W: DeserializeOwned,
        F: FnMut(W) -> R,
    {
        let wire: WireList<W> = self.get(path, query).await?;
        wire.into_page(page_size, map)
            .map_err(|message| AdminError::api(200, message))
    }

    async fn enveloped<W: DeserializeOwned>(&self, path: &str) -> Result<W> {
        let envelope: Envelope<W> = self.get(path, &[]).await?;
        envelope
            .into_data()
            .map_err(|message| AdminError::api(200, message))
    }

    // --- artworks -------------------------------------------------------

    pub async fn list_artworks(&self, query: &[(&'static str, String)], page_size: u32) -> Result<Page<Artwork>> {
        self.list::<WireArtwork, _, _>("/api/admin/all_images", query, page_size, Artwork::from)
            .await
    }

    pub async fn artwork_stats(&self) -> Result<ArtworkStats> {
        let wire: WireArtworkStats = self.enveloped("/api/admin/all_images/stats").await?;
        Ok(wire.into())
    }

    pub async fn get_artwork(&self, id: &str) -> Result<Artwork> {
        let path = self.id_path("/api/admin/art", id, None)?;
        let wire: WireArtworkDetail = self.get(&path, &[]).await?;
        Ok(wire.art.into())
    }

    pub async fn approve_artwork(&self, id: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/art", id, Some("approve"))?;
        self.send(Method::PUT, &path, Some(&json!({}))).await
    }

    pub async fn reject_artwork(&self, id: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/art", id, Some("reject"))?;
        self.send(Method::PUT, &path, Some(&json!({}))).await
    }

    pub async fn delete_artwork(&self, id: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/art", id, None)?;
        self.send::<()>(Method::DELETE, &path, None).await
    }

    // --- users ----------------------------------------------------------

    pub async fn list_users(&self, query: &[(&'static str, String)], page_size: u32) -> Result<Page<AdminUser>> {
        self.list::<WireUser, _, _>("/api/admin/users", query, page_size, AdminUser::from)
            .await
    }

    pub async fn get_user(&self, id: &str) -> Result<AdminUser> {
        let path = self.id_path("/api/admin/user", id, None)?;
        let wire: WireUserDetail = self.get(&path, &[]).await?;
        Ok(wire.user.into())
    }

    pub async fn delete_user(&self, id: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/user", id, None)?;
        self.send::<()>(Method::DELETE, &path, None).await
    }

    // --- orders and payouts ---------------------------------------------

    pub async fn list_orders(&self, query: &[(&'static str, String)], page_size: u32) -> Result<Page<Order>> {
        self.list::<WireOrder, _, _>("/orders", query, page_size, Order::from)
            .await
    }

    pub async fn get_order(&self, id: &str) -> Result<Order> {
        let path = self.id_path("/orderDetails", id, None)?;
        let wire: WireOrder = self.enveloped(&path).await?;
        Ok(wire.into())
    }

    pub async fn delete_order(&self, id: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/order", id, None)?;
        self.send::<()>(Method::DELETE, &path, None).await
    }

    pub async fn payout_preview(&self, order_id: &str) -> Result<PayoutPreview> {
        let path = self.id_path("/order", order_id, Some("payout-preview"))?;
        let wire: WirePayoutPreview = self.enveloped(&path).await?;
        Ok(wire.into())
    }

    /// Send a payout. `None` lets the server pay the full remaining amount.
    pub async fn send_payout(&self, order_id: &str, amount_cents: Option<i64>) -> Result<PayoutReceipt> {
        let path = self.id_path("/order", order_id, Some("payout"))?;
        let body = match amount_cents {
            Some(cents) => json!({ "amountCents": cents.max(0) }),
            None => json!({}),
        };
        let request = self.authed(Method::POST, &path)?.json(&body);
        let text = self.execute(request, &Method::POST, &path).await?;
        let envelope: Envelope<WirePayoutReceipt> = Self::decode(&path, &text)?;
        let wire = envelope
            .into_data()
            .map_err(|message| AdminError::api(200, message))?;
        Ok(wire.into())
    }

    // --- reports --------------------------------------------------------

    pub async fn list_reports(&self, query: &[(&'static str, String)], page_size: u32) -> Result<Page<Report>> {
        self.list::<WireReport, _, _>("/api/admin/reports", query, page_size, Report::from)
            .await
    }

    pub async fn report_stats(&self) -> Result<ReportStats> {
        let wire: WireReportStats = self.enveloped("/api/admin/reports/stats").await?;
        Ok(wire.into())
    }

    pub async fn get_report(&self, id: &str) -> Result<ReportDetail> {
        let path = self.id_path("/api/admin/reports", id, None)?;
        let wire: WireReportDetail = self.enveloped(&path).await?;
        Ok(wire.into())
    }

    pub async fn update_report_status(&self, id: &str, status: ReportStatus) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/reports", id, Some("status"))?;
        self.send(Method::PUT, &path, Some(&json!({ "status": status.as_str() })))
            .await
    }

    pub async fn warn_reported_user(&self, id: &str, message: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/reports", id, Some("warn"))?;
        self.send(Method::POST, &path, Some(&json!({ "message": message })))
            .await
    }

    pub async fn suspend_reported_user(&self, id: &str, days: u16, message: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/reports", id, Some("suspend"))?;
        self.send(
            Method::POST,
            &path,
            Some(&json!({ "days": days, "message": message })),
        )
        .await
    }

    pub async fn ban_reported_user(&self, id: &str, reason: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/reports", id, Some("ban"))?;
        self.send(Method::POST, &path, Some(&json!({ "reason": reason })))
            .await
    }

    pub async fn remove_reported_content(&self, id: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/reports", id, Some("remove-content"))?;
        self.send(Method::POST, &path, Some(&json!({}))).await
    }

    pub async fn dismiss_report(&self, id: &str, reason: &str) -> Result<ActionReceipt> {
        let path = self.id_path("/api/admin/reports", id, Some("dismiss"))?;
        self.send(Method::POST, &path, Some(&json!({ "reason": reason })))
            .await
    }
}

#[async_trait]
impl AuthApi for GatewayClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginGrant> {
        let path = "/api/admin/login";
        let request = self
            .http
            .post(self.url(path))
            .json(&json!({ "email": email, "password": password }));

        let body = match self.execute(request, &Method::POST, path).await {
            Ok(body) => body,
            Err(AdminError::Auth(AuthFailure::TokenRejected(message)))
            | Err(AdminError::Api { status: 400, message }) => {
                return Err(AuthFailure::InvalidCredentials(message).into());
            }
            Err(e) => return Err(e),
        };

        let wire: WireLogin = Self::decode(path, &body)?;
        let token = wire
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AuthFailure::InvalidCredentials(
                    wire.message
                        .unwrap_or_else(|| "Login failed. Please try again.".to_string()),
                )
            })?;

        Ok(LoginGrant {
            credential: Credential::new(token),
            identity: wire.email.unwrap_or_else(|| email.to_string()),
        })
    }

    async fn renew_token(&self, credential: &Credential) -> Result<Credential> {
        let path = "/api/admin/renew_token";
        let request = self
            .http
            .post(self.url(path))
            .bearer_auth(credential.expose())
            .json(&json!({}));

        let body = self.execute(request, &Method::POST, path).await?;
        let wire: WireToken = Self::decode(path, &body)?;
        wire.token
            .filter(|t| !t.is_empty())
            .map(Credential::new)
            .ok_or_else(|| AuthFailure::TokenRejected("renewal returned no token".to_string()).into())
    }
}
