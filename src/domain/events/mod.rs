//! Domain events
use crate::domain::value_objects::{CategoryName, CodePrefix, Sku};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Category(CategoryEvent),
}

impl DomainEvent {
    /// Subject suffix used when publishing, e.g. `product.created`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Created { .. }) => "product.created",
            Self::Product(ProductEvent::Published { .. }) => "product.published",
            Self::Product(ProductEvent::Archived { .. }) => "product.archived",
            Self::Product(ProductEvent::PriceChanged { .. }) => "product.price_changed",
            Self::Product(ProductEvent::StockAdded { .. }) => "product.stock_added",
            Self::Product(ProductEvent::StockRemoved { .. }) => "product.stock_removed",
            Self::Product(ProductEvent::Deleted { .. }) => "product.deleted",
            Self::Category(CategoryEvent::Registered { .. }) => "category.registered",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { sku: Sku, category: CategoryName },
    Published { sku: Sku },
    Archived { sku: Sku },
    PriceChanged { sku: Sku, amount: Decimal },
    StockAdded { sku: Sku, quantity: u32 },
    StockRemoved { sku: Sku, quantity: u32 },
    Deleted { sku: Sku },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CategoryEvent {
    Registered { name: CategoryName, prefix: CodePrefix },
}
