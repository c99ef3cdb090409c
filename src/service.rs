//! Catalog service: the only caller of the code allocator.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::aggregates::{Category, Product, ProductStatus};
use crate::domain::codes::{Allocation, AllocationStatsSnapshot, CodeAllocator, KnownPrefixes};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{CategoryName, Money, Sku};
use crate::events::EventPublisher;
use crate::repository::{CatalogRepository, Page, ProductFilter, RepositoryError};
use crate::{Result, StoreError};

/// Times a create re-reads the registry and allocates again after losing a
/// write race.
pub const MAX_CREATE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Explicit code; allocated from the category when absent.
    pub sku: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub currency: Option<String>,
    #[serde(default)]
    pub stock: u32,
    pub category: String,
    #[serde(default)]
    pub status: ProductStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    pub status: Option<ProductStatus>,
}

pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
    allocator: CodeAllocator,
    publisher: EventPublisher,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>, allocator: CodeAllocator, publisher: EventPublisher) -> Self {
        Self { repo, allocator, publisher }
    }

    pub fn allocator_stats(&self) -> AllocationStatsSnapshot { self.allocator.stats().snapshot() }

    /// Configured table plus every stored category's prefix.
    async fn known_prefixes(&self) -> Result<KnownPrefixes> {
        let stored = self.repo.categories().await?;
        Ok(self.allocator.known().merged(stored.into_iter().map(|c| (c.name().to_string(), c.prefix().clone()))))
    }

    pub async fn categories(&self) -> Result<Vec<Category>> { Ok(self.repo.categories().await?) }

    pub async fn get_category(&self, name: &str) -> Result<Category> {
        let name = CategoryName::new(name)?;
        self.repo.get_category(&name).await?.ok_or_else(|| StoreError::CategoryNotFound(name.to_string()))
    }

    pub async fn register_category(&self, name: &str) -> Result<Category> {
        let name = CategoryName::new(name)?;
        if self.repo.get_category(&name).await?.is_some() {
            return Err(StoreError::CategoryExists(name.to_string()));
        }
        let codes = self.repo.product_codes().await?;
        let known = self.known_prefixes().await?;
        let resolved = self.allocator.resolve_prefix(name.as_str(), &codes, &known);
        let mut category = Category::register(name, resolved.prefix.clone());
        match self.repo.insert_category(&category).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => return Err(StoreError::CategoryExists(category.name().to_string())),
            Err(e) => return Err(e.into()),
        }
        self.allocator.record_prefix(category.name().as_str(), &resolved);
        tracing::info!(category = %category.name(), prefix = %category.prefix(), source = ?resolved.source, "registered category");
        self.publisher.publish(category.take_events()).await;
        Ok(category)
    }

    async fn ensure_category(&self, name: &CategoryName) -> Result<Category> {
        if let Some(existing) = self.repo.get_category(name).await? {
            return Ok(existing);
        }
        match self.register_category(name.as_str()).await {
            Err(StoreError::CategoryExists(_)) => self.get_category(name.as_str()).await,
            other => other,
        }
    }

    /// The code the next product in `category` would get right now. Nothing
    /// is written or counted.
    pub async fn preview_code(&self, category: &str) -> Result<Allocation> {
        let category = CategoryName::new(category)?;
        let codes = self.repo.product_codes().await?;
        let known = self.known_prefixes().await?;
        Ok(self.allocator.propose(category.as_str(), &codes, &known))
    }

    /// Creates a product, allocating its code unless one is given. Input is
    /// checked before the category is registered so a rejected create
    /// leaves nothing behind.
    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let category = CategoryName::new(new.category.as_str())?;
        Product::check(&new.name, &price(&new))?;
        let explicit = new.sku.as_deref().map(Sku::new).transpose()?;
        if let Some(sku) = &explicit {
            if self.repo.get_product(sku).await?.is_some() {
                return Err(StoreError::SkuTaken(sku.to_string()));
            }
        }
        self.ensure_category(&category).await?;

        if let Some(sku) = explicit {
            let product = build(sku, &new, category)?;
            return match self.repo.insert_product(&product).await {
                Ok(()) => Ok(self.created(product).await),
                Err(RepositoryError::Conflict(_)) => Err(StoreError::SkuTaken(product.sku().to_string())),
                Err(e) => Err(e.into()),
            };
        }

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let codes = self.repo.product_codes().await?;
            let known = self.known_prefixes().await?;
            let allocation = self.allocator.propose(category.as_str(), &codes, &known);
            let product = build(Sku::new(allocation.code.as_str())?, &new, category.clone())?;
            match self.repo.insert_product(&product).await {
                Ok(()) => {
                    self.allocator.record(category.as_str(), &allocation);
                    return Ok(self.created(product).await);
                }
                Err(RepositoryError::Conflict(_)) => {
                    tracing::warn!(sku = %product.sku(), attempt, "product code taken by a concurrent write; allocating again");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::CodeConflict { attempts: MAX_CREATE_ATTEMPTS })
    }

    async fn created(&self, mut product: Product) -> Product {
        tracing::info!(sku = %product.sku(), category = %product.category(), "created product");
        self.publisher.publish(product.take_events()).await;
        product
    }

    pub async fn get_product(&self, sku: &str) -> Result<Product> {
        let sku = Sku::new(sku)?;
        self.repo.get_product(&sku).await?.ok_or_else(|| StoreError::ProductNotFound(sku.to_string()))
    }

    pub async fn list_products(&self, filter: ProductFilter) -> Result<Page<Product>> {
        Ok(self.repo.list_products(&filter.normalized()).await?)
    }

    pub async fn update_product(&self, sku: &str, update: ProductUpdate) -> Result<Product> {
        let mut product = self.get_product(sku).await?;
        if let Some(name) = update.name { product.rename(name)?; }
        if let Some(description) = update.description { product.describe(description); }
        if let Some(amount) = update.price {
            let currency = product.price().currency().to_string();
            product.update_price(Money::new(amount, &currency))?;
        }
        if let Some(stock) = update.stock { product.set_stock(stock)?; }
        if let Some(status) = update.status { product.set_status(status)?; }

        if !self.repo.update_product(&product).await? {
            return Err(StoreError::ProductNotFound(product.sku().to_string()));
        }
        self.publisher.publish(product.take_events()).await;
        Ok(product)
    }

    pub async fn delete_product(&self, sku: &str) -> Result<()> {
        let sku = Sku::new(sku)?;
        if !self.repo.delete_product(&sku).await? {
            return Err(StoreError::ProductNotFound(sku.to_string()));
        }
        tracing::info!(%sku, "deleted product");
        self.publisher.publish(vec![DomainEvent::Product(ProductEvent::Deleted { sku })]).await;
        Ok(())
    }

    /// Loads `fixtures` when the catalog holds no products yet. Returns how
    /// many products were created.
    pub async fn seed(&self, fixtures: Vec<NewProduct>) -> Result<usize> {
        if !self.repo.product_codes().await?.is_empty() {
            tracing::debug!("catalog not empty; skipping seed");
            return Ok(0);
        }
        let count = fixtures.len();
        for fixture in fixtures {
            self.create_product(fixture).await?;
        }
        tracing::info!(count, "seeded catalog");
        Ok(count)
    }
}

fn price(new: &NewProduct) -> Money {
    Money::new(new.price, new.currency.as_deref().unwrap_or(Money::DEFAULT_CURRENCY))
}

fn build(sku: Sku, new: &NewProduct, category: CategoryName) -> Result<Product> {
    let mut product = Product::create(sku, new.name.as_str(), price(new), category)?;
    if !new.description.is_empty() { product.describe(new.description.as_str()); }
    if new.stock > 0 { product.add_stock(new.stock); }
    product.set_status(new.status)?;
    Ok(product)
}
