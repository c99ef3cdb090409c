//! Junimo Store catalog service
//!
//! Product catalog for the Junimo storefront and seller panel.
//!
//! ## Features
//! - Category-scoped product codes (`AC001`, `MD014`, ...)
//! - Category registry with stable prefixes
//! - Product catalog management and stock tracking
//! - In-memory or PostgreSQL storage
//! - Optional NATS event publishing

pub mod api;
pub mod config;
pub mod domain;
pub mod events;
pub mod repository;
pub mod service;

pub use domain::codes::{allocate, CodeAllocator};
pub use service::CatalogService;

use thiserror::Error;

use domain::aggregates::ProductError;
use domain::value_objects::{CategoryError, SkuError};
use repository::RepositoryError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Category {0:?} not found")]
    CategoryNotFound(String),

    #[error("Category {0:?} already exists")]
    CategoryExists(String),

    #[error("Product code {0} already in use")]
    SkuTaken(String),

    #[error("Could not register a unique product code after {attempts} attempts")]
    CodeConflict { attempts: u32 },

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error("Invalid product code: {0}")]
    Sku(#[from] SkuError),

    #[error("Invalid category: {0}")]
    Category(#[from] CategoryError),

    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
