//! Value Objects for the catalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Product code (SKU). Stored upper-cased, e.g. `AC007`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub const MAX_LEN: usize = 50;

    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.chars().count() > Self::MAX_LEN { return Err(SkuError::TooLong); }
        if value.chars().any(char::is_whitespace) { return Err(SkuError::Whitespace); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for Sku {
    type Error = SkuError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self { sku.0 }
}

impl AsRef<str> for Sku {
    fn as_ref(&self) -> &str { &self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkuError {
    #[error("SKU empty")]
    Empty,
    #[error("SKU too long")]
    TooLong,
    #[error("SKU contains whitespace")]
    Whitespace,
}

/// Category label used to group products. Case-sensitive, trimmed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    pub const MAX_LEN: usize = 60;

    pub fn new(value: impl Into<String>) -> Result<Self, CategoryError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(CategoryError::Empty); }
        if value.chars().count() > Self::MAX_LEN { return Err(CategoryError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for CategoryName {
    type Error = CategoryError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<CategoryName> for String {
    fn from(name: CategoryName) -> Self { name.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error("category name empty")]
    Empty,
    #[error("category name too long")]
    TooLong,
}

/// Alphabetic lead of a product code.
///
/// Digits are rejected so the numeric suffix of a code can always be
/// recovered by stripping the prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodePrefix(String);

impl CodePrefix {
    pub const MAX_LEN: usize = 8;

    pub fn new(value: impl Into<String>) -> Result<Self, PrefixError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(PrefixError::Empty); }
        if value.chars().count() > Self::MAX_LEN { return Err(PrefixError::TooLong); }
        if !value.chars().all(char::is_alphabetic) { return Err(PrefixError::NotAlphabetic(value)); }
        Ok(Self(value))
    }

    /// Wraps a prefix the allocator derived, or one read back from storage.
    /// Both are already upper-cased and alphabetic.
    pub(crate) fn derived(value: String) -> Self { Self(value) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CodePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for CodePrefix {
    type Error = PrefixError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<CodePrefix> for String {
    fn from(prefix: CodePrefix) -> Self { prefix.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    #[error("prefix empty")]
    Empty,
    #[error("prefix too long")]
    TooLong,
    #[error("prefix {0:?} must be alphabetic")]
    NotAlphabetic(String),
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub const DEFAULT_CURRENCY: &'static str = "CLP";

    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_uppercase() } }
    pub fn clp(amount: Decimal) -> Self { Self::new(amount, Self::DEFAULT_CURRENCY) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_negative(&self) -> bool { self.amount.is_sign_negative() && !self.amount.is_zero() }
}

impl Default for Money { fn default() -> Self { Self::zero(Self::DEFAULT_CURRENCY) } }

/// Stock quantity value object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> { self.0.checked_sub(other).map(Self) }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_sku() { let sku = Sku::new(" ac-001 ").unwrap(); assert_eq!(sku.as_str(), "AC-001"); }
    #[test]
    fn test_sku_rejects_inner_whitespace() { assert_eq!(Sku::new("AC 001"), Err(SkuError::Whitespace)); }
    #[test]
    fn test_category_is_case_sensitive() {
        let a = CategoryName::new("Accesorios").unwrap();
        let b = CategoryName::new("accesorios").unwrap();
        assert_ne!(a, b);
        assert_eq!(CategoryName::new("   "), Err(CategoryError::Empty));
    }
    #[test]
    fn test_prefix_rejects_digits() {
        assert_eq!(CodePrefix::new("ac").unwrap().as_str(), "AC");
        assert!(matches!(CodePrefix::new("A1"), Err(PrefixError::NotAlphabetic(_))));
    }
    #[test]
    fn test_money_sign_and_currency() {
        assert_eq!(Money::new(Decimal::ONE, "usd").currency(), "USD");
        assert_eq!(Money::default().currency(), "CLP");
        assert!(Money::clp(Decimal::new(-1, 0)).is_negative());
        assert!(!Money::clp(Decimal::new(0, 0)).is_negative());
    }
    #[test]
    fn test_quantity_subtract() {
        assert_eq!(Quantity::new(3).subtract(5), None);
        assert_eq!(Quantity::new(3).subtract(3), Some(Quantity::new(0)));
    }
}
