//! Catalog storage.
//!
//! The repository is the registry of issued product codes. Writes must be
//! atomic with respect to code uniqueness: inserting a product whose code is
//! already stored fails with [`RepositoryError::Conflict`] and the caller
//! allocates again.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::aggregates::{Category, Product, ProductStatus};
use crate::domain::value_objects::{CategoryName, Sku};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error("stored row is invalid: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub category: Option<CategoryName>,
    pub status: Option<ProductStatus>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self { category: None, status: None, page: 1, per_page: DEFAULT_PER_PAGE }
    }
}

impl ProductFilter {
    /// Clamps paging to `1..` and `1..=MAX_PER_PAGE`.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.category.as_ref().map_or(true, |c| product.category() == c)
            && self.status.map_or(true, |s| product.status() == s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Every issued product code, in no particular order.
    async fn product_codes(&self) -> Result<Vec<String>, RepositoryError>;

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Returns `false` when no product has this code.
    async fn update_product(&self, product: &Product) -> Result<bool, RepositoryError>;

    async fn get_product(&self, sku: &Sku) -> Result<Option<Product>, RepositoryError>;

    async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, RepositoryError>;

    async fn delete_product(&self, sku: &Sku) -> Result<bool, RepositoryError>;

    async fn categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn get_category(&self, name: &CategoryName) -> Result<Option<Category>, RepositoryError>;

    async fn insert_category(&self, category: &Category) -> Result<(), RepositoryError>;
}
