//! Catalog domain: value objects, aggregates, events and code allocation.
pub mod aggregates;
pub mod codes;
pub mod events;
pub mod value_objects;
