//! Orders

use crate::error::Result;
use crate::gateway::{ActionReceipt, GatewayClient, Order, OrderBucket, OrderStats};
use crate::list::controller::{ListController, ListSource};
use crate::list::query::{FilterKey, Page, PageRequest};
use crate::list::sort::{SortValue, Sortable};
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Order status tiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrderFilter {
    #[default]
    All,
    Completed,
    /// Pending or processing
    Pending,
    Cancelled,
}

impl OrderFilter {
    pub fn admits(&self, order: &Order) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::Completed => order.bucket() == OrderBucket::Completed,
            OrderFilter::Pending => order.bucket() == OrderBucket::Pending,
            OrderFilter::Cancelled => order.bucket() == OrderBucket::Cancelled,
        }
    }
}

impl FilterKey for OrderFilter {
    // `/orders` only paginates
    fn query_params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn label(&self) -> String {
        match self {
            OrderFilter::All => "all",
            OrderFilter::Completed => "completed",
            OrderFilter::Pending => "pending",
            OrderFilter::Cancelled => "cancelled",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrderColumn {
    Id,
    Artwork,
    Customer,
    Status,
    Total,
    Created,
}

impl Sortable for Order {
    type Column = OrderColumn;

    fn sort_value(&self, column: OrderColumn) -> SortValue<'_> {
        match column {
            OrderColumn::Id => SortValue::Text(Some(&self.id)),
            OrderColumn::Artwork => SortValue::Text(self.art_name.as_deref()),
            OrderColumn::Customer => SortValue::Text(self.customer.as_deref()),
            OrderColumn::Status => SortValue::Text(Some(&self.status)),
            OrderColumn::Total => SortValue::Number(self.total_amount.or(self.price)),
            OrderColumn::Created => SortValue::Date(self.created_at),
        }
    }
}

/// Orders come from `/orders`, which takes only `page` and `limit`.
/// Status filtering, search and tile counts all work on the loaded page.
#[derive(Debug, Clone)]
pub struct OrderSource {
    client: Arc<GatewayClient>,
}

impl OrderSource {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }
}

fn contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

#[async_trait]
impl ListSource for OrderSource {
    type Record = Order;
    type Filter = OrderFilter;
    type Stats = OrderStats;

    async fn fetch(&self, request: &PageRequest<OrderFilter>) -> Result<Page<Order>> {
        let params = request.query_params(None);
        self.client.list_orders(&params, request.limit).await
    }

    fn derive_stats(&self, items: &[Order]) -> OrderStats {
        items.iter().fold(
            OrderStats {
                total: items.len() as u64,
                ..Default::default()
            },
            |mut stats, order| {
                match order.bucket() {
                    OrderBucket::Completed => stats.completed += 1,
                    OrderBucket::Pending => stats.pending += 1,
                    OrderBucket::Cancelled => stats.cancelled += 1,
                    OrderBucket::Other => {}
                }
                stats
            },
        )
    }

    fn matches_locally(&self, order: &Order, request: &PageRequest<OrderFilter>) -> bool {
        if !request.filter.admits(order) {
            return false;
        }
        match request.needle() {
            Some(needle) => {
                contains(Some(&order.id), &needle)
                    || contains(order.customer.as_deref(), &needle)
                    || contains(order.customer_email.as_deref(), &needle)
            }
            None => true,
        }
    }
}

impl ListController<OrderSource> {
    /// Delete an order and drop it from the loaded page
    pub async fn delete(&self, id: &str) -> Result<ActionReceipt> {
        let receipt = self.source().client.delete_order(id).await?;
        info!(order = id, "order deleted");
        self.remove_where(|o| o.id == id);
        Ok(receipt)
    }
}
