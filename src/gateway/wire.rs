//! Wire schemas and the mapping layer
//!
//! Every server payload is decoded into an explicit schema whose fields are
//! all optional, then mapped into a domain record in exactly one place.
//! Defaults for missing fields (placeholder avatar, "Untitled", zero
//! counts, ...) are substituted here and nowhere else.

use crate::gateway::models::*;
use crate::list::query::Page;
use crate::list::pagination;
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;

/// Lenient timestamp parsing: RFC 3339 or bare `YYYY-MM-DD`
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Accept numbers or numeric strings
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.map(|v| v.round() as i64))
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.map(|v| v.max(0.0).round() as u64))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// `{ message }` / `{ error }` error body
#[derive(Debug, Default, Deserialize)]
pub struct WireError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl WireError {
    /// Server-provided explanation, if any
    pub fn explanation(self) -> Option<String> {
        non_empty(self.message).or_else(|| non_empty(self.error))
    }
}

/// `{ success, data, error }` wrapper, or the bare payload
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped {
        data: T,
        #[serde(default)]
        success: Option<bool>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Bare(T),
}

impl<T> Envelope<T> {
    /// Payload, or the server's reason when it reported `success: false`
    pub fn into_data(self) -> std::result::Result<T, String> {
        match self {
            Envelope::Wrapped {
                success: Some(false),
                error,
                message,
                ..
            } => Err(non_empty(error)
                .or_else(|| non_empty(message))
                .unwrap_or_else(|| "Request was not successful.".to_string())),
            Envelope::Wrapped { data, .. } => Ok(data),
            Envelope::Bare(data) => Ok(data),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePagination {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_pages: Option<u64>,
    #[serde(default, alias = "totalItems", alias = "count", deserialize_with = "lenient_u64")]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged, bound(deserialize = "T: Deserialize<'de>"))]
enum WireListData<T> {
    Items(Vec<T>),
    Nested(WireNestedList<T>),
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct WireNestedList<T> {
    #[serde(
        default = "Vec::new",
        alias = "images",
        alias = "users",
        alias = "orders",
        alias = "reports",
        alias = "data"
    )]
    items: Vec<T>,
    #[serde(default)]
    pagination: Option<WirePagination>,
}

/// List response in any of the shapes the API uses:
/// `{ data: [...], pagination }`, `{ users: [...] }`,
/// `{ success, data: { reports: [...], pagination } }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct WireList<T> {
    #[serde(default, alias = "images", alias = "items", alias = "users", alias = "orders", alias = "reports")]
    data: Option<WireListData<T>>,
    #[serde(default)]
    pagination: Option<WirePagination>,
    #[serde(default, deserialize_with = "lenient_u64")]
    total_pages: Option<u64>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> WireList<T> {
    /// Map into a domain page. `Err` carries the server reason for `success: false`.
    pub fn into_page<R>(self, page_size: u32, map: impl FnMut(T) -> R) -> std::result::Result<Page<R>, String> {
        if self.success == Some(false) {
            return Err(non_empty(self.error).unwrap_or_else(|| "Request was not successful.".to_string()));
        }

        let (items, nested_pagination) = match self.data {
            Some(WireListData::Items(items)) => (items, None),
            Some(WireListData::Nested(nested)) => (nested.items, nested.pagination),
            None => (Vec::new(), None),
        };
        let paging = nested_pagination.or(self.pagination).unwrap_or_default();

        let items: Vec<R> = items.into_iter().map(map).collect();
        let total_pages = match (paging.total_pages.or(self.total_pages), paging.total) {
            (Some(pages), _) => u32::try_from(pages).unwrap_or(u32::MAX),
            (None, Some(total)) => pagination::total_pages(total, page_size),
            (None, None) => 1,
        };
        Ok(Page::new(items, total_pages))
    }
}

/// Populated reference (`{ _id, name }`) or a bare id string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireRef {
    Populated {
        #[serde(default, rename = "_id", alias = "id")]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    Id(String),
}

impl From<Option<WireRef>> for EntityRef {
    fn from(value: Option<WireRef>) -> Self {
        match value {
            Some(WireRef::Populated { id, name }) => EntityRef {
                id: non_empty(id),
                name: non_empty(name),
            },
            Some(WireRef::Id(id)) => EntityRef {
                id: non_empty(Some(id)),
                name: None,
            },
            None => EntityRef::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLogin {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireToken {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireArtwork {
    #[serde(default, rename = "_id", alias = "id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artist_name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_link: Option<String>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    views: Option<u64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    reviewed_by_email: Option<String>,
    #[serde(default)]
    reviewed_at: Option<String>,
}

impl From<WireArtwork> for Artwork {
    fn from(w: WireArtwork) -> Self {
        Artwork {
            id: w.id.unwrap_or_default(),
            name: non_empty(w.name).unwrap_or_else(|| "Untitled".to_string()),
            artist_name: non_empty(w.artist_name).unwrap_or_else(|| "Unknown artist".to_string()),
            category: non_empty(w.category),
            price: w.price,
            description: non_empty(w.description),
            image_link: non_empty(w.image_link),
            stage: w
                .stage
                .as_deref()
                .map(ArtworkStage::parse_lenient)
                .unwrap_or(ArtworkStage::Review),
            views: w.views.unwrap_or(0),
            created_at: parse_timestamp(w.created_at.as_deref()),
            reviewed_by_email: non_empty(w.reviewed_by_email),
            reviewed_at: parse_timestamp(w.reviewed_at.as_deref()),
        }
    }
}

/// `{ art: {...} }`
#[derive(Debug, Deserialize)]
pub struct WireArtworkDetail {
    #[serde(alias = "data", alias = "image")]
    pub art: WireArtwork,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    #[serde(default, rename = "_id", alias = "id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    account_type: Option<String>,
    #[serde(default)]
    artist_type: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    profile_picture_link: Option<String>,
    #[serde(default)]
    stripe_account_id: Option<String>,
    #[serde(default)]
    stripe_onboarding_completed: Option<bool>,
    #[serde(default, deserialize_with = "lenient_u64")]
    views: Option<u64>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<WireUser> for AdminUser {
    fn from(w: WireUser) -> Self {
        let stripe_account_id = non_empty(w.stripe_account_id);
        AdminUser {
            id: w.id.unwrap_or_default(),
            name: non_empty(w.name).unwrap_or_else(|| "Unnamed".to_string()),
            email: w.email.unwrap_or_default(),
            role: non_empty(w.role),
            account_type: non_empty(w.account_type),
            artist_type: non_empty(w.artist_type),
            bio: non_empty(w.bio),
            profile_picture_link: non_empty(w.profile_picture_link)
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
            stripe_linked: stripe_account_id.is_some(),
            stripe_account_id,
            stripe_onboarding_completed: w.stripe_onboarding_completed.unwrap_or(false),
            views: w.views.unwrap_or(0),
            created_at: parse_timestamp(w.created_at.as_deref()),
        }
    }
}

/// `{ user: {...} }`
#[derive(Debug, Deserialize)]
pub struct WireUserDetail {
    #[serde(alias = "data")]
    pub user: WireUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    #[serde(default, rename = "_id", alias = "id")]
    id: Option<String>,
    #[serde(default)]
    art_name: Option<String>,
    #[serde(default)]
    artist_name: Option<String>,
    #[serde(default, alias = "userAccountName")]
    customer: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    total_amount: Option<f64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    seller_transferred_cents: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    seller_remaining_cents: Option<i64>,
}

impl From<WireOrder> for Order {
    fn from(w: WireOrder) -> Self {
        Order {
            id: w.id.unwrap_or_default(),
            art_name: non_empty(w.art_name),
            artist_name: non_empty(w.artist_name),
            customer: non_empty(w.customer),
            customer_email: non_empty(w.customer_email),
            status: w.status.unwrap_or_default(),
            price: w.price,
            total_amount: w.total_amount,
            created_at: parse_timestamp(w.created_at.as_deref()),
            seller_transferred_cents: w.seller_transferred_cents.unwrap_or(0),
            seller_remaining_cents: w.seller_remaining_cents,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    #[serde(default)]
    image_name: Option<String>,
    #[serde(default)]
    image_link: Option<String>,
    #[serde(default)]
    image_description: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReport {
    #[serde(default, rename = "_id", alias = "id")]
    id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    target_type: Option<String>,
    #[serde(default)]
    target_user_id: Option<WireRef>,
    #[serde(default)]
    target_image_id: Option<WireRef>,
    #[serde(default)]
    reporter_user_id: Option<WireRef>,
    #[serde(default)]
    content_snapshot: Option<WireSnapshot>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    sla_deadline: Option<String>,
    #[serde(default)]
    sla_at_risk: Option<bool>,
    #[serde(default)]
    resolution_action: Option<String>,
    #[serde(default)]
    resolution_notes: Option<String>,
    #[serde(default)]
    resolved_at: Option<String>,
    #[serde(default)]
    resolved_by_admin_id: Option<WireRef>,
}

impl From<WireReport> for Report {
    fn from(w: WireReport) -> Self {
        let target_kind = match w.target_type.as_deref().map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("user") => TargetKind::User,
            Some(t) if t.eq_ignore_ascii_case("image") => TargetKind::Image,
            _ if w.target_user_id.is_some() && w.target_image_id.is_none() => TargetKind::User,
            _ => TargetKind::Image,
        };
        let snapshot = w.content_snapshot.unwrap_or_default();
        Report {
            id: w.id.unwrap_or_default(),
            reason: non_empty(w.reason).unwrap_or_else(|| "other".to_string()),
            description: non_empty(w.description),
            status: w
                .status
                .as_deref()
                .map(ReportStatus::parse_lenient)
                .unwrap_or(ReportStatus::Pending),
            target_kind,
            target_user: w.target_user_id.into(),
            target_image: w.target_image_id.into(),
            reporter: w.reporter_user_id.into(),
            snapshot: ContentSnapshot {
                image_name: non_empty(snapshot.image_name),
                image_link: non_empty(snapshot.image_link),
                image_description: non_empty(snapshot.image_description),
                user_name: non_empty(snapshot.user_name),
            },
            created_at: parse_timestamp(w.created_at.as_deref()),
            sla_deadline: parse_timestamp(w.sla_deadline.as_deref()),
            sla_at_risk: w.sla_at_risk.unwrap_or(false),
            resolution_action: non_empty(w.resolution_action),
            resolution_notes: non_empty(w.resolution_notes),
            resolved_at: parse_timestamp(w.resolved_at.as_deref()),
            resolved_by: w.resolved_by_admin_id.into(),
        }
    }
}

/// Report detail: `{ report, relatedReports }` or the report itself
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireReportDetail {
    WithRelated {
        report: WireReport,
        #[serde(default, rename = "relatedReports")]
        related_reports: Vec<WireReport>,
    },
    Single(WireReport),
}

impl From<WireReportDetail> for ReportDetail {
    fn from(w: WireReportDetail) -> Self {
        match w {
            WireReportDetail::WithRelated {
                report,
                related_reports,
            } => ReportDetail {
                report: report.into(),
                related_reports: related_reports.into_iter().map(Report::from).collect(),
            },
            WireReportDetail::Single(report) => ReportDetail {
                report: report.into(),
                related_reports: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireArtworkStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    total: Option<u64>,
    #[serde(default, alias = "review", deserialize_with = "lenient_u64")]
    pending: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    approved: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    rejected: Option<u64>,
}

impl From<WireArtworkStats> for ArtworkStats {
    fn from(w: WireArtworkStats) -> Self {
        let pending = w.pending.unwrap_or(0);
        let approved = w.approved.unwrap_or(0);
        let rejected = w.rejected.unwrap_or(0);
        ArtworkStats {
            total: w.total.unwrap_or(pending + approved + rejected),
            pending,
            approved,
            rejected,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStatusCounts {
    #[serde(default, deserialize_with = "lenient_u64")]
    pending: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    under_review: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    resolved: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    dismissed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireSla {
    #[serde(default, deserialize_with = "lenient_u64")]
    breached: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReportStats {
    #[serde(default)]
    by_status: Option<WireStatusCounts>,
    #[serde(default, deserialize_with = "lenient_u64")]
    needs_attention: Option<u64>,
    #[serde(default)]
    sla: Option<WireSla>,
}

impl From<WireReportStats> for ReportStats {
    fn from(w: WireReportStats) -> Self {
        let by_status = w.by_status.unwrap_or_default();
        let pending = by_status.pending.unwrap_or(0);
        let under_review = by_status.under_review.unwrap_or(0);
        let resolved = by_status.resolved.unwrap_or(0);
        let dismissed = by_status.dismissed.unwrap_or(0);
        ReportStats {
            total: pending + under_review + resolved + dismissed,
            pending,
            under_review,
            resolved,
            dismissed,
            urgent: w.needs_attention.unwrap_or(0),
            overdue: w.sla.and_then(|s| s.breached).unwrap_or(0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireSellerAmounts {
    #[serde(default, deserialize_with = "lenient_i64")]
    remaining: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    due: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    transferred: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireStripe {
    #[serde(default, deserialize_with = "lenient_i64")]
    fee: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireAmounts {
    #[serde(default, deserialize_with = "lenient_i64")]
    tax: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePolicy {
    #[serde(default, deserialize_with = "lenient_i64")]
    platform_hold_on_base: Option<i64>,
}

/// Payout preview in either the nested (`seller.remaining`) or the flat
/// (`sellerRemainingCents`) layout
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePayoutPreview {
    #[serde(default)]
    seller: Option<WireSellerAmounts>,
    #[serde(default)]
    stripe: Option<WireStripe>,
    #[serde(default)]
    amounts: Option<WireAmounts>,
    #[serde(default)]
    policy: Option<WirePolicy>,
    #[serde(default, deserialize_with = "lenient_i64")]
    seller_remaining_cents: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    seller_due_cents: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    seller_transferred_cents: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    stripe_fee: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    tax: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    platform_hold_on_base: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
}

impl From<WirePayoutPreview> for PayoutPreview {
    fn from(w: WirePayoutPreview) -> Self {
        let seller = w.seller.unwrap_or_default();
        PayoutPreview {
            remaining_cents: seller.remaining.or(w.seller_remaining_cents).unwrap_or(0),
            due_cents: seller.due.or(w.seller_due_cents),
            transferred_cents: seller.transferred.or(w.seller_transferred_cents),
            stripe_fee_cents: w.stripe.and_then(|s| s.fee).or(w.stripe_fee),
            tax_cents: w.amounts.and_then(|a| a.tax).or(w.tax),
            platform_hold_cents: w
                .policy
                .and_then(|p| p.platform_hold_on_base)
                .or(w.platform_hold_on_base),
            currency: non_empty(w.currency).unwrap_or_else(|| "usd".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePayoutReceipt {
    #[serde(default)]
    transfer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    amount_cents: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    seller_transferred_cents: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    seller_remaining_cents: Option<i64>,
}

impl From<WirePayoutReceipt> for PayoutReceipt {
    fn from(w: WirePayoutReceipt) -> Self {
        PayoutReceipt {
            transfer_id: non_empty(w.transfer_id),
            amount_cents: w.amount_cents.unwrap_or(0),
            currency: non_empty(w.currency).unwrap_or_else(|| "usd".to_string()),
            seller_transferred_cents: w.seller_transferred_cents,
            seller_remaining_cents: w.seller_remaining_cents,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WireAck {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl WireAck {
    /// Receipt, or the server's reason when it reported `success: false`
    pub fn into_receipt(self) -> std::result::Result<ActionReceipt, String> {
        if self.success == Some(false) {
            return Err(non_empty(self.error)
                .or_else(|| non_empty(self.message))
                .unwrap_or_else(|| "Action failed.".to_string()));
        }
        Ok(non_empty(self.message)
            .map(|message| ActionReceipt { message })
            .unwrap_or_default())
    }
}

/// Decode a body, treating an empty body as the type's default
pub fn decode_or_default<T: DeserializeOwned + Default>(body: &str) -> serde_json::Result<T> {
    if body.trim().is_empty() {
        Ok(T::default())
    } else {
        serde_json::from_str(body)
    }
}
