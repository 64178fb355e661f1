//! User directory

use crate::error::Result;
use crate::gateway::{ActionReceipt, AdminUser, GatewayClient, UserStats};
use crate::list::controller::{ListController, ListSource};
use crate::list::query::{FilterKey, Page, PageRequest};
use crate::list::sort::{SortValue, Sortable};
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Stripe onboarding tiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UserFilter {
    #[default]
    All,
    #[value(alias = "linked")]
    StripeLinked,
    #[value(alias = "unlinked")]
    StripeUnlinked,
}

impl UserFilter {
    pub fn admits(&self, user: &AdminUser) -> bool {
        match self {
            UserFilter::All => true,
            UserFilter::StripeLinked => user.stripe_linked,
            UserFilter::StripeUnlinked => !user.stripe_linked,
        }
    }
}

impl FilterKey for UserFilter {
    // the users endpoint has no stripe filter
    fn query_params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn label(&self) -> String {
        match self {
            UserFilter::All => "all",
            UserFilter::StripeLinked => "stripe_linked",
            UserFilter::StripeUnlinked => "stripe_unlinked",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UserColumn {
    Name,
    Email,
    Joined,
    Views,
}

impl Sortable for AdminUser {
    type Column = UserColumn;

    fn sort_value(&self, column: UserColumn) -> SortValue<'_> {
        match column {
            UserColumn::Name => SortValue::Text(Some(&self.name)),
            UserColumn::Email => SortValue::Text(Some(&self.email)),
            UserColumn::Joined => SortValue::Date(self.created_at),
            UserColumn::Views => SortValue::Number(Some(self.views as f64)),
        }
    }
}

/// Users come from `/api/admin/users`. The server paginates and searches
/// by `input`; the stripe filter and name/email matching also narrow the
/// loaded page, and tile counts are derived from it.
#[derive(Debug, Clone)]
pub struct UserSource {
    client: Arc<GatewayClient>,
}

impl UserSource {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }
}

#[async_trait]
impl ListSource for UserSource {
    type Record = AdminUser;
    type Filter = UserFilter;
    type Stats = UserStats;

    async fn fetch(&self, request: &PageRequest<UserFilter>) -> Result<Page<AdminUser>> {
        let params = request.query_params(Some("input"));
        self.client.list_users(&params, request.limit).await
    }

    fn derive_stats(&self, items: &[AdminUser]) -> UserStats {
        let linked = items.iter().filter(|u| u.stripe_linked).count() as u64;
        UserStats {
            total: items.len() as u64,
            stripe_linked: linked,
            stripe_unlinked: items.len() as u64 - linked,
        }
    }

    fn matches_locally(&self, user: &AdminUser, request: &PageRequest<UserFilter>) -> bool {
        if !request.filter.admits(user) {
            return false;
        }
        match request.needle() {
            Some(needle) => {
                user.name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

impl ListController<UserSource> {
    /// Delete a user account and drop it from the loaded page
    pub async fn delete(&self, id: &str) -> Result<ActionReceipt> {
        let receipt = self.source().client.delete_user(id).await?;
        info!(user = id, "user deleted");
        self.remove_where(|u| u.id == id);
        Ok(receipt)
    }
}
