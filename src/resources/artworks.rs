//! Artwork moderation list

use crate::error::Result;
use crate::gateway::{ActionReceipt, Artwork, ArtworkStage, ArtworkStats, GatewayClient};
use crate::list::controller::{ListController, ListSource, StatsOrigin};
use crate::list::query::{FilterKey, Page, PageRequest};
use crate::list::sort::{SortValue, Sortable};
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Stage tiles on the artwork screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkFilter {
    #[default]
    All,
    /// Awaiting review
    #[value(alias = "pending")]
    Review,
    Approved,
    Rejected,
}

impl ArtworkFilter {
    pub fn stage(&self) -> Option<ArtworkStage> {
        match self {
            ArtworkFilter::All => None,
            ArtworkFilter::Review => Some(ArtworkStage::Review),
            ArtworkFilter::Approved => Some(ArtworkStage::Approved),
            ArtworkFilter::Rejected => Some(ArtworkStage::Rejected),
        }
    }
}

impl FilterKey for ArtworkFilter {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        self.stage()
            .map(|stage| vec![("stage", stage.as_str().to_string())])
            .unwrap_or_default()
    }

    fn label(&self) -> String {
        self.stage()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "all".to_string())
    }
}

/// Sortable artwork columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkColumn {
    Title,
    Artist,
    Uploaded,
}

impl Sortable for Artwork {
    type Column = ArtworkColumn;

    fn sort_value(&self, column: ArtworkColumn) -> SortValue<'_> {
        match column {
            ArtworkColumn::Title => SortValue::Text(Some(&self.name)),
            ArtworkColumn::Artist => SortValue::Text(Some(&self.artist_name)),
            ArtworkColumn::Uploaded => SortValue::Date(self.created_at),
        }
    }
}

/// Artworks come from `/api/admin/all_images`, filtered and searched
/// server-side; tile counts come from the stats endpoint.
#[derive(Debug, Clone)]
pub struct ArtworkSource {
    client: Arc<GatewayClient>,
}

impl ArtworkSource {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }
}

#[async_trait]
impl ListSource for ArtworkSource {
    type Record = Artwork;
    type Filter = ArtworkFilter;
    type Stats = ArtworkStats;

    async fn fetch(&self, request: &PageRequest<ArtworkFilter>) -> Result<Page<Artwork>> {
        let params = request.query_params(Some("input"));
        self.client.list_artworks(&params, request.limit).await
    }

    fn stats_origin(&self) -> StatsOrigin {
        StatsOrigin::Endpoint
    }

    async fn fetch_stats(&self) -> Result<ArtworkStats> {
        self.client.artwork_stats().await
    }
}

impl ListController<ArtworkSource> {
    /// Approve an artwork and mark it approved in the loaded page
    pub async fn approve(&self, id: &str) -> Result<ActionReceipt> {
        self.moderate(id, ArtworkStage::Approved).await
    }

    /// Reject an artwork and mark it rejected in the loaded page
    pub async fn reject(&self, id: &str) -> Result<ActionReceipt> {
        self.moderate(id, ArtworkStage::Rejected).await
    }

    async fn moderate(&self, id: &str, stage: ArtworkStage) -> Result<ActionReceipt> {
        let client = &self.source().client;
        let receipt = match stage {
            ArtworkStage::Approved => client.approve_artwork(id).await?,
            _ => client.reject_artwork(id).await?,
        };
        info!(artwork = id, %stage, "artwork moderated");
        match self.request().filter.stage() {
            // no longer belongs under the active stage tile
            Some(shown) if shown != stage => {
                self.remove_where(|a| a.id == id);
            }
            _ => {
                self.update_where(|a| a.id == id, |a| a.stage = stage);
            }
        }
        self.refresh_tiles().await;
        Ok(receipt)
    }

    /// Delete an artwork and drop it from the loaded page
    pub async fn delete(&self, id: &str) -> Result<ActionReceipt> {
        let receipt = self.source().client.delete_artwork(id).await?;
        info!(artwork = id, "artwork deleted");
        self.remove_where(|a| a.id == id);
        self.refresh_tiles().await;
        Ok(receipt)
    }

    // tiles come from the server, so re-read them after a mutation
    async fn refresh_tiles(&self) {
        if let Err(e) = self.refresh_stats().await {
            warn!(error = %e, "artwork stats refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_params() {
        assert!(ArtworkFilter::All.query_params().is_empty());
        assert_eq!(
            ArtworkFilter::Review.query_params(),
            vec![("stage", "review".to_string())]
        );
        assert_eq!(ArtworkFilter::Rejected.label(), "rejected");
        assert_eq!(ArtworkFilter::from_str("pending", true), Ok(ArtworkFilter::Review));
    }

    #[test]
    fn test_search_goes_to_input_param() {
        let request = PageRequest {
            page: 2,
            limit: 25,
            filter: ArtworkFilter::Approved,
            search: " monet ".to_string(),
        };
        let params = request.query_params(Some("input"));
        assert!(params.contains(&("input", "monet".to_string())));
        assert!(params.contains(&("stage", "approved".to_string())));
        assert!(params.contains(&("page", "2".to_string())));
    }
}
