//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{CategoryName, Money, Quantity, Sku};
use crate::domain::events::{DomainEvent, ProductEvent};

#[derive(Clone, Debug, Serialize)]
pub struct Product {
    pub(crate) id: Uuid,
    pub(crate) sku: Sku,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) price: Money,
    pub(crate) stock: Quantity,
    pub(crate) category: CategoryName,
    pub(crate) status: ProductStatus,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus { #[default] Draft, Active, Archived }

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Draft => "draft", Self::Active => "active", Self::Archived => "archived" }
    }
}

impl FromStr for ProductStatus {
    type Err = ProductError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(ProductError::UnknownStatus(other.to_string())),
        }
    }
}

impl Product {
    pub fn create(sku: Sku, name: impl Into<String>, price: Money, category: CategoryName) -> Result<Self, ProductError> {
        let name = name.into().trim().to_string();
        Self::check(&name, &price)?;
        let now = Utc::now();
        let mut product = Self {
            id: Uuid::now_v7(), sku: sku.clone(), name, description: String::new(), price, stock: Quantity::default(),
            category: category.clone(), status: ProductStatus::Draft, created_at: now, updated_at: now, events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { sku, category }));
        Ok(product)
    }

    /// Field checks `create` runs, for callers that must reject input before
    /// writing anything else.
    pub fn check(name: &str, price: &Money) -> Result<(), ProductError> {
        if name.trim().is_empty() { return Err(ProductError::MissingName); }
        if price.is_negative() { return Err(ProductError::NegativePrice); }
        Ok(())
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn sku(&self) -> &Sku { &self.sku }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> &Money { &self.price }
    pub fn stock(&self) -> Quantity { self.stock }
    pub fn category(&self) -> &CategoryName { &self.category }
    pub fn status(&self) -> ProductStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_in_stock(&self) -> bool { !self.stock.is_zero() }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ProductError> {
        let name = name.into().trim().to_string();
        if name.is_empty() { return Err(ProductError::MissingName); }
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn describe(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.touch();
    }

    pub fn publish(&mut self) -> Result<(), ProductError> {
        if self.status == ProductStatus::Archived { return Err(ProductError::Archived); }
        if self.status == ProductStatus::Active { return Ok(()); }
        self.status = ProductStatus::Active;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::Published { sku: self.sku.clone() }));
        Ok(())
    }

    pub fn archive(&mut self) {
        if self.status == ProductStatus::Archived { return; }
        self.status = ProductStatus::Archived;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::Archived { sku: self.sku.clone() }));
    }

    /// Moves to `status`; archived products can only go back to draft.
    pub fn set_status(&mut self, status: ProductStatus) -> Result<(), ProductError> {
        match status {
            ProductStatus::Active => self.publish(),
            ProductStatus::Archived => { self.archive(); Ok(()) }
            ProductStatus::Draft => {
                if self.status != ProductStatus::Draft { self.status = ProductStatus::Draft; self.touch(); }
                Ok(())
            }
        }
    }

    pub fn update_price(&mut self, new_price: Money) -> Result<(), ProductError> {
        if new_price.is_negative() { return Err(ProductError::NegativePrice); }
        if new_price == self.price { return Ok(()); }
        let amount = new_price.amount();
        self.price = new_price;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::PriceChanged { sku: self.sku.clone(), amount }));
        Ok(())
    }

    pub fn add_stock(&mut self, qty: u32) {
        self.stock = self.stock.add(qty);
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::StockAdded { sku: self.sku.clone(), quantity: qty }));
    }

    pub fn remove_stock(&mut self, qty: u32) -> Result<(), ProductError> {
        self.stock = self.stock.subtract(qty).ok_or(ProductError::InsufficientStock)?;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::StockRemoved { sku: self.sku.clone(), quantity: qty }));
        Ok(())
    }

    /// Sets stock to `qty`, recording the difference as an addition or removal.
    pub fn set_stock(&mut self, qty: u32) -> Result<(), ProductError> {
        let current = self.stock.value();
        if qty > current { self.add_stock(qty - current); }
        else if qty < current { self.remove_stock(current - qty)?; }
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Missing name")]
    MissingName,
    #[error("Price cannot be negative")]
    NegativePrice,
    #[error("Insufficient stock")]
    InsufficientStock,
    #[error("Archived products cannot be published")]
    Archived,
    #[error("Unknown product status {0:?}")]
    UnknownStatus(String),
}
