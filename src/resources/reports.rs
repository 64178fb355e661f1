//! Abuse reports and moderation actions

use crate::error::{AdminError, Result};
use crate::gateway::{
    ActionReceipt, GatewayClient, Report, ReportDetail, ReportStats, ReportStatus, TargetKind,
};
use crate::list::controller::{ListController, ListSource, StatsOrigin};
use crate::list::query::{FilterKey, Page, PageRequest};
use crate::list::sort::{SortValue, Sortable};
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Page size used by the report queue
pub const REPORT_PAGE_SIZE: u32 = 20;

/// Suspension length offered by default
pub const DEFAULT_SUSPEND_DAYS: u16 = 7;

/// Longest allowed suspension
pub const MAX_SUSPEND_DAYS: u16 = 365;

/// Status and target-type narrowing; `None` means any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub target: Option<TargetKind>,
}

impl ReportFilter {
    pub fn status(status: ReportStatus) -> Self {
        Self {
            status: Some(status),
            target: None,
        }
    }
}

impl FilterKey for ReportFilter {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(target) = self.target {
            params.push(("type", target.as_str().to_string()));
        }
        params
    }

    fn label(&self) -> String {
        self.status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "all".to_string())
    }
}

/// CLI spelling of report statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    UnderReview,
    Resolved,
    Dismissed,
}

impl From<StatusArg> for ReportStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => ReportStatus::Pending,
            StatusArg::UnderReview => ReportStatus::UnderReview,
            StatusArg::Resolved => ReportStatus::Resolved,
            StatusArg::Dismissed => ReportStatus::Dismissed,
        }
    }
}

/// CLI spelling of report targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    Image,
    User,
}

impl From<TargetArg> for TargetKind {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Image => TargetKind::Image,
            TargetArg::User => TargetKind::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportColumn {
    Reason,
    Status,
    Target,
    Created,
    Sla,
}

impl Sortable for Report {
    type Column = ReportColumn;

    fn sort_value(&self, column: ReportColumn) -> SortValue<'_> {
        match column {
            ReportColumn::Reason => SortValue::Text(Some(&self.reason)),
            ReportColumn::Status => SortValue::Text(Some(self.status.as_str())),
            ReportColumn::Target => SortValue::Text(Some(self.target_label())),
            ReportColumn::Created => SortValue::Date(self.created_at),
            ReportColumn::Sla => SortValue::Date(self.sla_deadline),
        }
    }
}

/// Reports come from `/api/admin/reports`, filtered by `status` and `type`
/// server-side. Search narrows the loaded page by id or reason; tile
/// counts come from the stats endpoint.
#[derive(Debug, Clone)]
pub struct ReportSource {
    client: Arc<GatewayClient>,
}

impl ReportSource {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }
}

#[async_trait]
impl ListSource for ReportSource {
    type Record = Report;
    type Filter = ReportFilter;
    type Stats = ReportStats;

    async fn fetch(&self, request: &PageRequest<ReportFilter>) -> Result<Page<Report>> {
        let params = request.query_params(None);
        self.client.list_reports(&params, request.limit).await
    }

    fn stats_origin(&self) -> StatsOrigin {
        StatsOrigin::Endpoint
    }

    async fn fetch_stats(&self) -> Result<ReportStats> {
        self.client.report_stats().await
    }

    fn matches_locally(&self, report: &Report, request: &PageRequest<ReportFilter>) -> bool {
        match request.needle() {
            Some(needle) => {
                report.id.to_lowercase().contains(&needle)
                    || report.reason.to_lowercase().contains(&needle)
                    || report.reason_label().to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// A moderation decision on a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum ReportAction {
    /// Mark as under review
    Review,
    Warn { message: String },
    Suspend { days: u16, message: String },
    Ban { reason: String },
    RemoveContent,
    Dismiss { reason: String },
}

fn require_text(field: &str, value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AdminError::validation(field, message));
    }
    Ok(())
}

impl ReportAction {
    pub fn name(&self) -> &'static str {
        match self {
            ReportAction::Review => "review",
            ReportAction::Warn { .. } => "warn",
            ReportAction::Suspend { .. } => "suspend",
            ReportAction::Ban { .. } => "ban",
            ReportAction::RemoveContent => "remove_content",
            ReportAction::Dismiss { .. } => "dismiss",
        }
    }

    /// Reject blank required text and out-of-range durations before dispatch
    pub fn validate(&self) -> Result<()> {
        match self {
            ReportAction::Review | ReportAction::RemoveContent => Ok(()),
            ReportAction::Warn { message } => {
                require_text("message", message, "A warning message is required.")
            }
            ReportAction::Suspend { days, message } => {
                if !(1..=MAX_SUSPEND_DAYS).contains(days) {
                    return Err(AdminError::validation(
                        "days",
                        format!("Suspension must be between 1 and {} days.", MAX_SUSPEND_DAYS),
                    ));
                }
                require_text("message", message, "A suspension message is required.")
            }
            ReportAction::Ban { reason } => require_text("reason", reason, "A ban reason is required."),
            ReportAction::Dismiss { reason } => {
                require_text("reason", reason, "A dismissal reason is required.")
            }
        }
    }

    /// Status the report ends up in once the action succeeds
    pub fn resulting_status(&self) -> ReportStatus {
        match self {
            ReportAction::Review => ReportStatus::UnderReview,
            ReportAction::Dismiss { .. } => ReportStatus::Dismissed,
            _ => ReportStatus::Resolved,
        }
    }

    /// Validate, then send to the gateway
    pub async fn dispatch(&self, client: &GatewayClient, report_id: &str) -> Result<ActionReceipt> {
        self.validate()?;
        match self {
            ReportAction::Review => {
                client
                    .update_report_status(report_id, ReportStatus::UnderReview)
                    .await
            }
            ReportAction::Warn { message } => client.warn_reported_user(report_id, message.trim()).await,
            ReportAction::Suspend { days, message } => {
                client
                    .suspend_reported_user(report_id, *days, message.trim())
                    .await
            }
            ReportAction::Ban { reason } => client.ban_reported_user(report_id, reason.trim()).await,
            ReportAction::RemoveContent => client.remove_reported_content(report_id).await,
            ReportAction::Dismiss { reason } => client.dismiss_report(report_id, reason.trim()).await,
        }
    }
}

impl ListController<ReportSource> {
    /// Apply a moderation action and reflect the new status locally
    pub async fn moderate(&self, id: &str, action: &ReportAction) -> Result<ActionReceipt> {
        let receipt = action.dispatch(&self.source().client, id).await?;
        let status = action.resulting_status();
        info!(report = id, action = action.name(), %status, "report moderated");

        match self.request().filter.status {
            Some(shown) if shown != status => {
                self.remove_where(|r| r.id == id);
            }
            _ => {
                self.update_where(|r| r.id == id, |r| r.status = status);
            }
        }
        if let Err(e) = self.refresh_stats().await {
            warn!(error = %e, "report stats refresh failed");
        }
        Ok(receipt)
    }

    /// Report with its related reports
    pub async fn detail(&self, id: &str) -> Result<ReportDetail> {
        self.source().client.get_report(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_params() {
        assert!(ReportFilter::default().query_params().is_empty());
        let filter = ReportFilter {
            status: Some(ReportStatus::UnderReview),
            target: Some(TargetKind::Image),
        };
        assert_eq!(
            filter.query_params(),
            vec![
                ("status", "under_review".to_string()),
                ("type", "image".to_string())
            ]
        );
        assert_eq!(filter.label(), "under_review");
        assert_eq!(ReportFilter::default().label(), "all");
    }

    #[test]
    fn test_action_validation() {
        assert!(ReportAction::Review.validate().is_ok());
        assert!(ReportAction::RemoveContent.validate().is_ok());

        let blank = ReportAction::Warn {
            message: "   ".into(),
        };
        assert!(matches!(
            blank.validate(),
            Err(AdminError::Validation { ref field, .. }) if field == "message"
        ));

        for days in [0, 366] {
            let action = ReportAction::Suspend {
                days,
                message: "spam".into(),
            };
            assert!(action.validate().is_err(), "{days}");
        }
        let ok = ReportAction::Suspend {
            days: DEFAULT_SUSPEND_DAYS,
            message: "spam".into(),
        };
        assert!(ok.validate().is_ok());

        assert!(ReportAction::Ban { reason: "".into() }.validate().is_err());
        assert!(ReportAction::Dismiss {
            reason: "not abusive".into()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_resulting_status() {
        assert_eq!(ReportAction::Review.resulting_status(), ReportStatus::UnderReview);
        assert_eq!(
            ReportAction::Dismiss { reason: "x".into() }.resulting_status(),
            ReportStatus::Dismissed
        );
        assert_eq!(ReportAction::RemoveContent.resulting_status(), ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_blank_reason_never_reaches_gateway() {
        use crate::session::SessionStore;
        // unroutable: a dispatched request would fail with a network error
        let client = GatewayClient::new(
            "http://192.0.2.1:9",
            crate::gateway::DEFAULT_TIMEOUT,
            SessionStore::in_memory(),
        )
        .unwrap();
        let action = ReportAction::Ban { reason: " ".into() };
        let err = action.dispatch(&client, "r1").await.unwrap_err();
        assert!(matches!(err, AdminError::Validation { .. }));
    }
}
