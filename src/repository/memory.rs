//! In-process store, used when no database is configured and in tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{CatalogRepository, Page, ProductFilter, RepositoryError};
use crate::domain::aggregates::{Category, Product};
use crate::domain::value_objects::{CategoryName, Sku};

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<Sku, Product>,
    categories: BTreeMap<CategoryName, Category>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn stored(product: &Product) -> Product {
    let mut product = product.clone();
    product.events.clear();
    product
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn product_codes(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.state.read().await.products.keys().map(|sku| sku.as_str().to_string()).collect())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.products.contains_key(product.sku()) {
            return Err(RepositoryError::Conflict(format!("product {}", product.sku())));
        }
        state.products.insert(product.sku().clone(), stored(product));
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        match state.products.get_mut(product.sku()) {
            Some(existing) => { *existing = stored(product); Ok(true) }
            None => Ok(false),
        }
    }

    async fn get_product(&self, sku: &Sku) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state.read().await.products.get(sku).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, RepositoryError> {
        let state = self.state.read().await;
        let matching: Vec<&Product> = state.products.values().filter(|p| filter.matches(p)).collect();
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let data = matching.iter().skip(offset).take(filter.per_page as usize).map(|p| (*p).clone()).collect();
        Ok(Page { data, total: matching.len() as u64, page: filter.page })
    }

    async fn delete_product(&self, sku: &Sku) -> Result<bool, RepositoryError> {
        Ok(self.state.write().await.products.remove(sku).is_some())
    }

    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.state.read().await.categories.values().cloned().collect())
    }

    async fn get_category(&self, name: &CategoryName) -> Result<Option<Category>, RepositoryError> {
        Ok(self.state.read().await.categories.get(name).cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.categories.contains_key(category.name()) {
            return Err(RepositoryError::Conflict(format!("category {:?}", category.name().as_str())));
        }
        let restored = Category::restore(category.name().clone(), category.prefix().clone(), category.created_at());
        state.categories.insert(category.name().clone(), restored);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::ProductStatus;
    use crate::domain::value_objects::{CodePrefix, Money};

    fn product(code: &str, category: &str) -> Product {
        Product::create(Sku::new(code).unwrap(), "Item", Money::default(), CategoryName::new(category).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_product(&product("AC001", "Accesorios")).await.unwrap();
        let err = store.insert_product(&product("AC001", "Accesorios")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.product_codes().await.unwrap(), ["AC001"]);
    }

    #[tokio::test]
    async fn stored_products_carry_no_events() {
        let store = MemoryStore::new();
        store.insert_product(&product("AC001", "Accesorios")).await.unwrap();
        let mut fetched = store.get_product(&Sku::new("AC001").unwrap()).await.unwrap().unwrap();
        assert!(fetched.take_events().is_empty());
    }

    #[tokio::test]
    async fn list_filters_and_pages() {
        let store = MemoryStore::new();
        for code in ["AC001", "AC002", "AC003"] {
            store.insert_product(&product(code, "Accesorios")).await.unwrap();
        }
        store.insert_product(&product("PE001", "Peluches")).await.unwrap();

        let filter = ProductFilter { category: Some(CategoryName::new("Accesorios").unwrap()), per_page: 2, page: 2, ..Default::default() };
        let page = store.list_products(&filter).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].sku().as_str(), "AC003");

        let drafts = ProductFilter { status: Some(ProductStatus::Active), ..Default::default() };
        assert_eq!(store.list_products(&drafts).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn categories_are_unique_by_name() {
        let store = MemoryStore::new();
        let velas = Category::register(CategoryName::new("Velas").unwrap(), CodePrefix::new("VE").unwrap());
        store.insert_category(&velas).await.unwrap();
        assert!(matches!(store.insert_category(&velas).await, Err(RepositoryError::Conflict(_))));
        assert_eq!(store.categories().await.unwrap().len(), 1);
    }
}
