//! Report SLA countdown

use crate::gateway::Report;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Time left to act on a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "sla", content = "minutes")]
pub enum SlaStatus {
    /// The report carries no deadline
    NoDeadline,
    Overdue,
    /// Whole minutes remaining
    Remaining(i64),
}

impl SlaStatus {
    /// Status of `deadline` as seen at `now`
    pub fn at(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(deadline) = deadline else {
            return SlaStatus::NoDeadline;
        };
        let left = deadline - now;
        if left <= Duration::zero() {
            SlaStatus::Overdue
        } else {
            SlaStatus::Remaining(left.num_minutes())
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, SlaStatus::Overdue)
    }
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlaStatus::NoDeadline => f.write_str("—"),
            SlaStatus::Overdue => f.write_str("OVERDUE"),
            SlaStatus::Remaining(minutes) if *minutes >= 60 => {
                write!(f, "{}h {}m", minutes / 60, minutes % 60)
            }
            SlaStatus::Remaining(minutes) => write!(f, "{}m", minutes),
        }
    }
}

impl Report {
    pub fn sla(&self, now: DateTime<Utc>) -> SlaStatus {
        SlaStatus::at(self.sla_deadline, now)
    }

    /// Flagged by the server as at risk of missing its SLA
    pub fn is_urgent(&self) -> bool {
        self.sla_at_risk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_formatting() {
        let now = now();
        assert_eq!(SlaStatus::at(None, now).to_string(), "—");
        assert_eq!(SlaStatus::at(Some(now), now).to_string(), "OVERDUE");
        assert_eq!(
            SlaStatus::at(Some(now - Duration::minutes(5)), now).to_string(),
            "OVERDUE"
        );
        assert_eq!(
            SlaStatus::at(Some(now + Duration::minutes(150) + Duration::seconds(59)), now).to_string(),
            "2h 30m"
        );
        assert_eq!(
            SlaStatus::at(Some(now + Duration::minutes(60)), now).to_string(),
            "1h 0m"
        );
        assert_eq!(
            SlaStatus::at(Some(now + Duration::seconds(125)), now).to_string(),
            "2m"
        );
        assert_eq!(SlaStatus::at(Some(now + Duration::seconds(30)), now).to_string(), "0m");
    }

    #[test]
    fn test_overdue_flag() {
        let now = now();
        assert!(SlaStatus::at(Some(now - Duration::hours(1)), now).is_overdue());
        assert!(!SlaStatus::at(None, now).is_overdue());
    }
}
