//! Configuration settings for the admin console
//!
//! Defines the CLI surface, the runtime configuration derived from it, and
//! the small parsers clap needs for durations and sort specs.

use crate::error::{AdminError, Result};
use crate::list::debounce::DEFAULT_DEBOUNCE;
use crate::list::sort::SortDirection;
use crate::resources::reports::{StatusArg, TargetArg, DEFAULT_SUSPEND_DAYS};
use crate::resources::{
    ArtworkColumn, ArtworkFilter, OrderColumn, OrderFilter, ReportAction, ReportColumn, Resource,
    UserColumn, UserFilter,
};
use crate::session::idle::{IdleConfig, DEFAULT_IDLE_LIMIT, DEFAULT_WARNING_THRESHOLD};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Immpression admin - moderation console for the Immpression art marketplace
#[derive(Parser, Debug, Clone)]
#[command(name = "immpression-admin")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Moderation console for the Immpression art marketplace")]
#[command(long_about = r#"
Immpression admin talks to the marketplace REST API on behalf of an
administrator.

Features:
  - Artwork review queue (approve, reject, delete)
  - User directory and order tracking
  - Seller payouts with preview
  - Abuse report moderation with SLA countdown
  - Idle session timeout with renewal

Examples:
  immpression-admin login --email admin@example.com
  immpression-admin artworks --filter review --search "van gogh"
  immpression-admin orders --filter pending --sort created:desc
  immpression-admin payout send 65f1c2 --usd 120.50
  immpression-admin report suspend 6601ab --days 7 --message "Spam listings"
"#)]
pub struct CliArgs {
    /// Base URL of the marketplace API
    #[arg(long, env = "IMMPRESSION_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Where the session is kept between runs
    #[arg(long, env = "IMMPRESSION_SESSION_FILE", value_name = "PATH", global = true)]
    pub session_file: Option<PathBuf>,

    /// Per-request timeout (e.g., 30s, 2m)
    #[arg(long, default_value = "30s", value_parser = parse_duration, value_name = "DURATION", global = true)]
    pub timeout: Duration,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Quiet mode (no spinner)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Idle clock resolution
    #[arg(long, default_value = "60s", value_parser = parse_duration, value_name = "DURATION")]
    pub idle_tick: Duration,

    /// Idle ticks before the "stay logged in?" prompt
    #[arg(long, default_value_t = DEFAULT_WARNING_THRESHOLD, value_name = "TICKS")]
    pub idle_warning: u32,

    /// Idle ticks before forced logout
    #[arg(long, default_value_t = DEFAULT_IDLE_LIMIT, value_name = "TICKS")]
    pub idle_limit: u32,

    /// Quiet period before typed search text is sent
    #[arg(long, default_value = "500ms", value_parser = parse_duration, value_name = "DURATION")]
    pub search_debounce: Duration,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Paging and search options shared by the list commands
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Page to show (1-based)
    #[arg(long, default_value_t = 1, value_name = "NUM")]
    pub page: u32,

    /// Rows per page
    #[arg(long, value_name = "NUM")]
    pub page_size: Option<u32>,

    /// Search text
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Use the narrow two-page pagination window
    #[arg(long)]
    pub narrow: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in and keep the session for later commands
    Login {
        /// Admin email
        #[arg(long)]
        email: String,
        /// Admin password (prompted when omitted)
        #[arg(long, env = "IMMPRESSION_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in admin
    Whoami,

    /// Exchange the current credential for a fresh one
    Renew,

    /// List artworks
    Artworks {
        #[command(flatten)]
        list: ListArgs,
        /// Stage tile
        #[arg(long, value_enum, default_value = "all")]
        filter: ArtworkFilter,
        /// Sort column, optionally suffixed with `:desc`
        #[arg(long, value_parser = parse_sort::<ArtworkColumn>, value_name = "COLUMN[:desc]")]
        sort: Option<SortSpec<ArtworkColumn>>,
    },

    /// List users
    Users {
        #[command(flatten)]
        list: ListArgs,
        /// Stripe tile
        #[arg(long, value_enum, default_value = "all")]
        filter: UserFilter,
        /// Sort column, optionally suffixed with `:desc`
        #[arg(long, value_parser = parse_sort::<UserColumn>, value_name = "COLUMN[:desc]")]
        sort: Option<SortSpec<UserColumn>>,
    },

    /// List orders
    Orders {
        #[command(flatten)]
        list: ListArgs,
        /// Status tile
        #[arg(long, value_enum, default_value = "all")]
        filter: OrderFilter,
        /// Sort column, optionally suffixed with `:desc`
        #[arg(long, value_parser = parse_sort::<OrderColumn>, value_name = "COLUMN[:desc]")]
        sort: Option<SortSpec<OrderColumn>>,
    },

    /// List abuse reports
    Reports {
        #[command(flatten)]
        list: ListArgs,
        /// Report status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Reported content type
        #[arg(long = "type", value_enum)]
        target: Option<TargetArg>,
        /// Sort column, optionally suffixed with `:desc`
        #[arg(long, value_parser = parse_sort::<ReportColumn>, value_name = "COLUMN[:desc]")]
        sort: Option<SortSpec<ReportColumn>>,
    },

    /// Show dashboard tile counts for a resource
    Stats {
        #[arg(value_enum)]
        resource: Resource,
    },

    /// Act on one artwork
    Artwork {
        #[command(subcommand)]
        action: ArtworkCommand,
    },

    /// Act on one user
    User {
        #[command(subcommand)]
        action: RecordCommand,
    },

    /// Act on one order
    Order {
        #[command(subcommand)]
        action: RecordCommand,
    },

    /// Preview or send a seller payout
    Payout {
        #[command(subcommand)]
        action: PayoutCommand,
    },

    /// Moderate one abuse report
    Report {
        #[command(subcommand)]
        action: ReportCommand,
    },

    /// Keep the session open and enforce the idle timeout.
    ///
    /// Each line on stdin counts as activity; `stay` renews the session and
    /// `logout` ends it.
    Watch,
}

/// Artwork subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ArtworkCommand {
    Show { id: String },
    Approve { id: String },
    Reject { id: String },
    Delete { id: String },
}

/// Read or delete a record by id
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RecordCommand {
    Show { id: String },
    Delete { id: String },
}

/// Payout subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PayoutCommand {
    /// Show what the seller is owed
    Preview { order: String },
    /// Send a payout; defaults to the remaining balance
    Send {
        order: String,
        /// Custom amount in USD
        #[arg(long, value_name = "AMOUNT")]
        usd: Option<String>,
    },
}

/// Report subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ReportCommand {
    /// Show a report and related reports
    Show { id: String },
    /// Mark as under review
    Review { id: String },
    /// Warn the reported user
    Warn {
        id: String,
        #[arg(long)]
        message: String,
    },
    /// Suspend the reported user
    Suspend {
        id: String,
        #[arg(long, default_value_t = DEFAULT_SUSPEND_DAYS)]
        days: u16,
        #[arg(long)]
        message: String,
    },
    /// Ban the reported user
    Ban {
        id: String,
        #[arg(long)]
        reason: String,
    },
    /// Remove the reported content
    Remove { id: String },
    /// Dismiss the report
    Dismiss {
        id: String,
        #[arg(long)]
        reason: String,
    },
}

impl ReportCommand {
    /// Report id and moderation action, `None` for `show`
    pub fn action(&self) -> Option<(&str, ReportAction)> {
        let (id, action) = match self {
            ReportCommand::Show { .. } => return None,
            ReportCommand::Review { id } => (id, ReportAction::Review),
            ReportCommand::Warn { id, message } => (
                id,
                ReportAction::Warn {
                    message: message.clone(),
                },
            ),
            ReportCommand::Suspend { id, days, message } => (
                id,
                ReportAction::Suspend {
                    days: *days,
                    message: message.clone(),
                },
            ),
            ReportCommand::Ban { id, reason } => (
                id,
                ReportAction::Ban {
                    reason: reason.clone(),
                },
            ),
            ReportCommand::Remove { id } => (id, ReportAction::RemoveContent),
            ReportCommand::Dismiss { id, reason } => (
                id,
                ReportAction::Dismiss {
                    reason: reason.clone(),
                },
            ),
        };
        Some((id.as_str(), action))
    }
}

/// Output format for command results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// A column to sort by and its direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<C> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C> SortSpec<C> {
    /// Column clicks needed to reach this direction from an unsorted list
    pub fn clicks(&self) -> usize {
        match self.direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => 2,
        }
    }
}

/// Parse `column` or `column:asc|desc`
pub fn parse_sort<C: ValueEnum>(s: &str) -> std::result::Result<SortSpec<C>, String> {
    let (name, direction) = match s.split_once(':') {
        Some((name, dir)) => {
            let direction = match dir.trim().to_ascii_lowercase().as_str() {
                "asc" | "ascending" => SortDirection::Ascending,
                "desc" | "descending" => SortDirection::Descending,
                other => return Err(format!("Invalid sort direction: {}", other)),
            };
            (name, direction)
        }
        None => (s, SortDirection::Ascending),
    };
    let column = C::from_str(name.trim(), true)?;
    Ok(SortSpec { column, direction })
}

/// Parse a human-readable duration (`500ms`, `30s`, `2m`)
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| format!("Invalid duration '{}': {}", s, e))
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// API base URL, absent when none was configured
    pub api_url: Option<String>,
    /// Durable session mirror
    pub session_file: Option<PathBuf>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Inactivity policy
    pub idle: IdleConfig,
    /// Search debounce window
    pub search_debounce: Duration,
    /// Result rendering
    pub output: OutputFormat,
    /// Hide the spinner
    pub quiet: bool,
    /// Answer yes to confirmations
    pub assume_yes: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            session_file: None,
            timeout: crate::gateway::DEFAULT_TIMEOUT,
            idle: IdleConfig::default(),
            search_debounce: DEFAULT_DEBOUNCE,
            output: OutputFormat::Text,
            quiet: false,
            assume_yes: false,
        }
    }
}

impl AdminConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let api_url = args
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| {
                if u.starts_with("http://") || u.starts_with("https://") {
                    Ok(u.trim_end_matches('/').to_string())
                } else {
                    Err(AdminError::config(format!(
                        "API URL must start with http:// or https://, got '{}'",
                        u
                    )))
                }
            })
            .transpose()?;

        if args.timeout.is_zero() {
            return Err(AdminError::config("Timeout must be greater than zero"));
        }

        let idle = IdleConfig {
            tick: args.idle_tick,
            warning_threshold: args.idle_warning,
            idle_limit: args.idle_limit,
        };
        idle.validate()?;

        Ok(Self {
            api_url,
            session_file: args.session_file.clone(),
            timeout: args.timeout,
            idle,
            search_debounce: args.search_debounce,
            output: args.output,
            quiet: args.quiet || args.output == OutputFormat::Json,
            assume_yes: args.yes,
        })
    }

    /// API base URL, or a configuration error naming how to set it
    pub fn require_api_url(&self) -> Result<&str> {
        self.api_url.as_deref().ok_or_else(|| {
            AdminError::config("No API URL configured; pass --api-url or set IMMPRESSION_API_URL")
        })
    }

    /// Session file to use, falling back to the per-user data directory
    pub fn session_path(&self) -> Result<PathBuf> {
        self.session_file
            .clone()
            .or_else(crate::session::FileSessionStorage::default_path)
            .ok_or_else(|| {
                AdminError::config("No data directory available; pass --session-file")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("immpression-admin").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_sort() {
        let spec: SortSpec<OrderColumn> = parse_sort("created:desc").unwrap();
        assert_eq!(spec.column, OrderColumn::Created);
        assert_eq!(spec.direction, SortDirection::Descending);
        assert_eq!(spec.clicks(), 2);

        let spec: SortSpec<ArtworkColumn> = parse_sort("Title").unwrap();
        assert_eq!(spec.direction, SortDirection::Ascending);

        assert!(parse_sort::<UserColumn>("email:sideways").is_err());
        assert!(parse_sort::<UserColumn>("shoe").is_err());
    }

    #[test]
    fn test_from_cli_defaults() {
        let args = parse(&["--api-url", "https://api.example.com/", "whoami"]);
        let config = AdminConfig::from_cli(&args).unwrap();
        assert_eq!(config.require_api_url().unwrap(), "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.idle.warning_threshold, 59);
        assert_eq!(config.idle.idle_limit, 60);
        assert_eq!(config.search_debounce, Duration::from_millis(500));
    }

    #[test]
    fn test_from_cli_rejects_bad_values() {
        let args = parse(&["--api-url", "ftp://x", "whoami"]);
        assert!(matches!(AdminConfig::from_cli(&args), Err(AdminError::Config(_))));

        let args = parse(&["--idle-warning", "60", "--idle-limit", "60", "watch"]);
        assert!(AdminConfig::from_cli(&args).is_err());

        let args = parse(&["--timeout", "0s", "whoami"]);
        assert!(AdminConfig::from_cli(&args).is_err());
    }

    #[test]
    fn test_report_command_actions() {
        let args = parse(&["report", "suspend", "r1", "--message", "spam"]);
        let Commands::Report { action } = args.command else {
            panic!("expected report command");
        };
        let (id, action) = action.action().unwrap();
        assert_eq!(id, "r1");
        assert_eq!(
            action,
            ReportAction::Suspend {
                days: DEFAULT_SUSPEND_DAYS,
                message: "spam".into()
            }
        );

        let args = parse(&["report", "show", "r1"]);
        let Commands::Report { action } = args.command else {
            panic!("expected report command");
        };
        assert!(action.action().is_none());
    }

    #[test]
    fn test_list_args() {
        let args = parse(&[
            "reports", "--status", "under-review", "--type", "image", "--page", "2", "--sort", "sla",
        ]);
        let Commands::Reports {
            list,
            status,
            target,
            sort,
        } = args.command
        else {
            panic!("expected reports command");
        };
        assert_eq!(list.page, 2);
        assert_eq!(status, Some(StatusArg::UnderReview));
        assert_eq!(target, Some(TargetArg::Image));
        assert_eq!(sort.map(|s| s.column), Some(ReportColumn::Sla));
    }
}
