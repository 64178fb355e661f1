//! Marketplace resources
//!
//! Each resource plugs a [`ListSource`](crate::list::ListSource) into the
//! generic list controller and adds its own filters, sortable columns,
//! stats policy and mutations.

pub mod artworks;
pub mod orders;
pub mod payouts;
pub mod reports;
pub mod sla;
pub mod users;

use clap::ValueEnum;
use serde::Serialize;

pub use artworks::{ArtworkColumn, ArtworkFilter, ArtworkSource};
pub use orders::{OrderColumn, OrderFilter, OrderSource};
pub use payouts::{describe_amount, format_usd, parse_usd_amount, resolve_amount};
pub use reports::{ReportAction, ReportColumn, ReportFilter, ReportSource, REPORT_PAGE_SIZE};
pub use sla::SlaStatus;
pub use users::{UserColumn, UserFilter, UserSource};

/// The four dashboard lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Artworks,
    Users,
    Orders,
    Reports,
}

impl Resource {
    /// Page size the list screen starts with
    pub fn default_page_size(&self) -> u32 {
        match self {
            Resource::Reports => REPORT_PAGE_SIZE,
            _ => crate::list::DEFAULT_PAGE_SIZE,
        }
    }
}
