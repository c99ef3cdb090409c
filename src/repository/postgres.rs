//! PostgreSQL store. The primary keys on `products.sku` and
//! `categories.name` are what make registration atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{CatalogRepository, Page, ProductFilter, RepositoryError};
use crate::domain::aggregates::{Category, Product, ProductStatus};
use crate::domain::value_objects::{CategoryName, CodePrefix, Money, Quantity, Sku};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid, sku: String, name: String, description: String, price: Decimal, currency: String,
    stock: i64, category: String, status: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow { name: String, prefix: String, created_at: DateTime<Utc> }

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;
    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| RepositoryError::Corrupt(format!("product {}: {e}", r.sku));
        let stock = u32::try_from(r.stock).map_err(|e| corrupt(&e))?;
        Ok(Product {
            id: r.id, sku: Sku::new(r.sku.clone()).map_err(|e| corrupt(&e))?,
            name: r.name.clone(), description: r.description.clone(),
            price: Money::new(r.price, &r.currency), stock: Quantity::new(stock),
            category: CategoryName::new(r.category.clone()).map_err(|e| corrupt(&e))?,
            status: r.status.parse::<ProductStatus>().map_err(|e| corrupt(&e))?,
            created_at: r.created_at, updated_at: r.updated_at, events: vec![],
        })
    }
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;
    fn try_from(r: CategoryRow) -> Result<Self, Self::Error> {
        let name = CategoryName::new(r.name).map_err(|e| RepositoryError::Corrupt(format!("category: {e}")))?;
        Ok(Category::restore(name, CodePrefix::derived(r.prefix), r.created_at))
    }
}

fn write_error(err: sqlx::Error, what: impl FnOnce() -> String) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() { return RepositoryError::Conflict(what()); }
    }
    RepositoryError::Database(err)
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn product_codes(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(sqlx::query_scalar::<_, String>("SELECT sku FROM products").fetch_all(&self.pool).await?)
    }

    async fn insert_product(&self, p: &Product) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO products (id, sku, name, description, price, currency, stock, category, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)")
            .bind(p.id()).bind(p.sku().as_str()).bind(p.name()).bind(p.description()).bind(p.price().amount()).bind(p.price().currency())
            .bind(i64::from(p.stock().value())).bind(p.category().as_str()).bind(p.status().as_str()).bind(p.created_at()).bind(p.updated_at())
            .execute(&self.pool).await.map_err(|e| write_error(e, || format!("product {}", p.sku())))?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, currency = $5, stock = $6, status = $7, updated_at = $8 WHERE sku = $1")
            .bind(p.sku().as_str()).bind(p.name()).bind(p.description()).bind(p.price().amount()).bind(p.price().currency())
            .bind(i64::from(p.stock().value())).bind(p.status().as_str()).bind(p.updated_at())
            .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_product(&self, sku: &Sku) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE sku = $1").bind(sku.as_str())
            .fetch_optional(&self.pool).await?.map(Product::try_from).transpose()
    }

    async fn list_products(&self, f: &ProductFilter) -> Result<Page<Product>, RepositoryError> {
        let category = f.category.as_ref().map(CategoryName::as_str);
        let status = f.status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE ($1::text IS NULL OR category = $1) AND ($2::text IS NULL OR status = $2) ORDER BY sku LIMIT $3 OFFSET $4")
            .bind(category).bind(status).bind(i64::from(f.per_page)).bind(i64::try_from(f.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE ($1::text IS NULL OR category = $1) AND ($2::text IS NULL OR status = $2)")
            .bind(category).bind(status).fetch_one(&self.pool).await?;
        let data = rows.into_iter().map(Product::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page { data, total: u64::try_from(total.0).unwrap_or(0), page: f.page })
    }

    async fn delete_product(&self, sku: &Sku) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE sku = $1").bind(sku.as_str()).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        sqlx::query_as::<_, CategoryRow>("SELECT name, prefix, created_at FROM categories ORDER BY name")
            .fetch_all(&self.pool).await?.into_iter().map(Category::try_from).collect()
    }

    async fn get_category(&self, name: &CategoryName) -> Result<Option<Category>, RepositoryError> {
        sqlx::query_as::<_, CategoryRow>("SELECT name, prefix, created_at FROM categories WHERE name = $1").bind(name.as_str())
            .fetch_optional(&self.pool).await?.map(Category::try_from).transpose()
    }

    async fn insert_category(&self, c: &Category) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO categories (name, prefix, created_at) VALUES ($1, $2, $3)")
            .bind(c.name().as_str()).bind(c.prefix().as_str()).bind(c.created_at())
            .execute(&self.pool).await.map_err(|e| write_error(e, || format!("category {:?}", c.name().as_str())))?;
        Ok(())
    }
}
