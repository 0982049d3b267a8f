//! Storage abstraction.
//!
//! Handlers and the costing/auth cores only see these traits; `PgStore` and
//! `MemoryStore` provide the implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::database::models::{
    InventoryInput, InventoryItem, NewRecipe, Recipe, RecipeUpdate, User,
};

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity name, e.g. "recipe"
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A unique column rejected the write; carries the column name
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Search + paging parameters for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-insensitive substring
    pub search: Option<String>,
    /// 1-based
    pub page: u32,
    pub limit: u32,
}

impl ListFilter {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub(crate) fn matches(&self, value: &str) -> bool {
        match &self.search {
            Some(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            search: None,
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus the unpaged total
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Name lookup used by the costing engine.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_by_name(&self, item_name: &str) -> Result<Option<InventoryItem>, StoreError>;
}

#[async_trait]
pub trait Store: Catalog {
    // inventory
    async fn list_inventory(&self, filter: &ListFilter) -> Result<Paged<InventoryItem>, StoreError>;
    async fn create_inventory(&self, input: &InventoryInput) -> Result<InventoryItem, StoreError>;
    async fn update_inventory(&self, id: i64, input: &InventoryInput) -> Result<InventoryItem, StoreError>;
    async fn delete_inventory(&self, id: i64) -> Result<(), StoreError>;

    // recipes
    async fn list_recipes(&self, filter: &ListFilter) -> Result<Paged<Recipe>, StoreError>;
    async fn get_recipe(&self, id: i64) -> Result<Recipe, StoreError>;
    /// Most recently created recipe across all users
    async fn latest_recipe(&self) -> Result<Option<Recipe>, StoreError>;
    /// Atomically reserve the next SKU sequence number for `day`.
    async fn next_sku_sequence(&self, day: NaiveDate) -> Result<u32, StoreError>;
    async fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError>;
    async fn update_recipe(&self, id: i64, update: &RecipeUpdate) -> Result<Recipe, StoreError>;

    // users
    /// Whether `token` has ever been redeemed, by any user.
    async fn is_magic_link_consumed(&self, token: &str) -> Result<bool, StoreError>;
    /// Mark `token` consumed and upsert the user for `email` with it as the
    /// access token, atomically.
    ///
    /// Fails with `StoreError::Conflict("access_token")` when `token` was
    /// already consumed, including by an earlier redemption that a newer
    /// token has since overwritten on the user row.
    async fn store_access_token(&self, email: &str, token: &str) -> Result<User, StoreError>;
}
