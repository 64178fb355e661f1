//! Domain records returned by the gateway
//!
//! These are the normalized shapes the rest of the crate works with. All
//! defaulting of missing server fields happens in [`super::wire`] before a
//! value of one of these types is built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Avatar shown for users without a profile picture
pub const PLACEHOLDER_AVATAR: &str = "https://via.placeholder.com/50";

/// Moderation stage of an artwork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkStage {
    Review,
    Approved,
    Rejected,
}

impl ArtworkStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtworkStage::Review => "review",
            ArtworkStage::Approved => "approved",
            ArtworkStage::Rejected => "rejected",
        }
    }

    /// Parse a server stage string; anything unrecognized is still under review
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" => ArtworkStage::Approved,
            "rejected" => ArtworkStage::Rejected,
            _ => ArtworkStage::Review,
        }
    }
}

impl fmt::Display for ArtworkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded artwork
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image_link: Option<String>,
    pub stage: ArtworkStage,
    pub views: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub reviewed_by_email: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// A registered marketplace user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub account_type: Option<String>,
    pub artist_type: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_link: String,
    pub stripe_account_id: Option<String>,
    pub stripe_linked: bool,
    pub stripe_onboarding_completed: bool,
    pub views: u64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Coarse order status used by the order filters and tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBucket {
    Completed,
    /// "pending" or "processing"
    Pending,
    Cancelled,
    Other,
}

/// A marketplace order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub art_name: Option<String>,
    pub artist_name: Option<String>,
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    /// Raw server status
    pub status: String,
    pub price: Option<f64>,
    pub total_amount: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub seller_transferred_cents: i64,
    pub seller_remaining_cents: Option<i64>,
}

impl Order {
    /// Bucket the raw status case-insensitively
    pub fn bucket(&self) -> OrderBucket {
        match self.status.trim().to_ascii_lowercase().as_str() {
            "completed" => OrderBucket::Completed,
            "pending" | "processing" => OrderBucket::Pending,
            "cancelled" => OrderBucket::Cancelled,
            _ => OrderBucket::Other,
        }
    }

    /// Account for a payout sent to the seller
    pub fn apply_payout(&mut self, amount_cents: i64) {
        self.seller_transferred_cents += amount_cents;
        self.seller_remaining_cents = Some((self.seller_remaining_cents.unwrap_or(0) - amount_cents).max(0));
    }
}

/// Moderation status of an abuse report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    UnderReview,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::UnderReview => "under_review",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    /// Parse a server status; unknown values are shown as pending
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "under_review" | "under review" | "underreview" => ReportStatus::UnderReview,
            "resolved" => ReportStatus::Resolved,
            "dismissed" => ReportStatus::Dismissed,
            _ => ReportStatus::Pending,
        }
    }

    /// Whether no further moderation action applies
    pub fn is_closed(&self) -> bool {
        matches!(self, ReportStatus::Resolved | ReportStatus::Dismissed)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a report is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Image,
    User,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Image => "image",
            TargetKind::User => "user",
        }
    }
}

/// A referenced account or artwork, possibly only by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl EntityRef {
    /// Best label for display
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("—")
    }
}

/// Copy of the reported content taken when the report was filed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSnapshot {
    pub image_name: Option<String>,
    pub image_link: Option<String>,
    pub image_description: Option<String>,
    pub user_name: Option<String>,
}

/// An abuse report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub reason: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub target_kind: TargetKind,
    pub target_user: EntityRef,
    pub target_image: EntityRef,
    pub reporter: EntityRef,
    pub snapshot: ContentSnapshot,
    pub created_at: Option<DateTime<Utc>>,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub sla_at_risk: bool,
    pub resolution_action: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: EntityRef,
}

impl Report {
    /// Reason with underscores shown as spaces
    pub fn reason_label(&self) -> String {
        self.reason.replace('_', " ")
    }

    /// Name of the reported user or artwork
    pub fn target_label(&self) -> &str {
        match self.target_kind {
            TargetKind::Image => self
                .target_image
                .name
                .as_deref()
                .or(self.snapshot.image_name.as_deref())
                .unwrap_or_else(|| self.target_image.label()),
            TargetKind::User => self
                .target_user
                .name
                .as_deref()
                .or(self.snapshot.user_name.as_deref())
                .unwrap_or_else(|| self.target_user.label()),
        }
    }
}

/// A report with its related reports
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    pub report: Report,
    pub related_reports: Vec<Report>,
}

/// Artwork tile counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtworkStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

/// User tile counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub stripe_linked: u64,
    pub stripe_unlinked: u64,
}

/// Order tile counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub cancelled: u64,
}

/// Report tile counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total: u64,
    pub pending: u64,
    pub under_review: u64,
    pub resolved: u64,
    pub dismissed: u64,
    /// Reports flagged as needing attention
    pub urgent: u64,
    /// Reports past their SLA deadline
    pub overdue: u64,
}

/// Non-committing estimate of what the seller is owed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutPreview {
    pub remaining_cents: i64,
    pub due_cents: Option<i64>,
    pub transferred_cents: Option<i64>,
    pub stripe_fee_cents: Option<i64>,
    pub tax_cents: Option<i64>,
    pub platform_hold_cents: Option<i64>,
    pub currency: String,
}

/// Result of an executed payout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutReceipt {
    pub transfer_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub seller_transferred_cents: Option<i64>,
    pub seller_remaining_cents: Option<i64>,
}

/// Acknowledgement of a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReceipt {
    pub message: String,
}

impl Default for ActionReceipt {
    fn default() -> Self {
        Self {
            message: "Action completed successfully".to_string(),
        }
    }
}
