//! Category Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{CategoryName, CodePrefix};
use crate::domain::events::{CategoryEvent, DomainEvent};

/// A product category and the code prefix it was first given.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    name: CategoryName,
    prefix: CodePrefix,
    created_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Category {
    pub fn register(name: CategoryName, prefix: CodePrefix) -> Self {
        let mut category = Self { name, prefix, created_at: Utc::now(), events: vec![] };
        category.events.push(DomainEvent::Category(CategoryEvent::Registered {
            name: category.name.clone(),
            prefix: category.prefix.clone(),
        }));
        category
    }

    /// Rebuilds a stored category without raising events.
    pub fn restore(name: CategoryName, prefix: CodePrefix, created_at: DateTime<Utc>) -> Self {
        Self { name, prefix, created_at, events: vec![] }
    }

    pub fn name(&self) -> &CategoryName { &self.name }
    pub fn prefix(&self) -> &CodePrefix { &self.prefix }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
}
