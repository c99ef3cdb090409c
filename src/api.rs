//! HTTP surface of the catalog.

use axum::{extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use crate::domain::aggregates::{Category, Product, ProductStatus};
use crate::domain::codes::{PrefixSource, SuffixSource};
use crate::domain::value_objects::CategoryName;
use crate::repository::{Page, ProductFilter, DEFAULT_PER_PAGE};
use crate::service::{CatalogService, NewProduct, ProductUpdate};
use crate::StoreError;

#[derive(Clone)]
pub struct AppState { pub catalog: Arc<CatalogService> }

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/:sku", get(get_product).put(update_product).delete(delete_product))
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route("/api/v1/categories/:name", get(get_category))
        .route("/api/v1/codes/preview", post(preview_code))
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiErrorBody { pub error: ApiErrorDetail }

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Serialize)]
pub struct FieldError { pub field: String, pub message: String }

#[derive(Debug)]
pub struct ApiError { pub status: StatusCode, pub code: &'static str, pub message: String, pub details: Option<Vec<FieldError>> }

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), details: None }
    }
    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message) }
    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message) }
    pub fn conflict(message: impl Into<String>) -> Self { Self::new(StatusCode::CONFLICT, "CONFLICT", message) }
    pub fn internal() -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "An internal error occurred") }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody { error: ApiErrorDetail { code: self.code, message: self.message, details: self.details } };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(_) | StoreError::CategoryNotFound(_) => Self::not_found(err.to_string()),
            StoreError::CategoryExists(_) | StoreError::SkuTaken(_) | StoreError::CodeConflict { .. } => Self::conflict(err.to_string()),
            StoreError::Product(_) | StoreError::Sku(_) | StoreError::Category(_) => Self::bad_request(err.to_string()),
            StoreError::Repository(e) => { tracing::error!(error = %e, "storage error"); Self::internal() }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors.field_errors().into_iter().flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()),
            })
        }).collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        Self { details: Some(details), ..Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Validation failed") }
    }
}

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListParams { pub page: Option<u32>, pub per_page: Option<u32>, pub category: Option<String>, pub status: Option<ProductStatus> }

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 50))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(default)]
    pub stock: u32,
    #[validate(length(min = 1, max = 60))]
    pub category: String,
    #[serde(default)]
    pub status: ProductStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 60))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CodePreview { pub code: String, pub prefix: String, pub prefix_source: PrefixSource, pub suffix_source: SuffixSource }

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(s): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy", "service": "junimo-store", "allocator": s.catalog.allocator_stats()}))
}

async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> ApiResult<Json<Page<Product>>> {
    let category = p.category.map(CategoryName::new).transpose().map_err(StoreError::from)?;
    let filter = ProductFilter { category, status: p.status, page: p.page.unwrap_or(1), per_page: p.per_page.unwrap_or(DEFAULT_PER_PAGE) };
    Ok(Json(s.catalog.list_products(filter).await?))
}

async fn create_product(State(s): State<AppState>, Json(r): Json<CreateProductRequest>) -> ApiResult<(StatusCode, Json<Product>)> {
    r.validate()?;
    let new = NewProduct { sku: r.sku, name: r.name, description: r.description, price: r.price, currency: r.currency, stock: r.stock, category: r.category, status: r.status };
    Ok((StatusCode::CREATED, Json(s.catalog.create_product(new).await?)))
}

async fn get_product(State(s): State<AppState>, Path(sku): Path<String>) -> ApiResult<Json<Product>> {
    Ok(Json(s.catalog.get_product(&sku).await?))
}

async fn update_product(State(s): State<AppState>, Path(sku): Path<String>, Json(r): Json<UpdateProductRequest>) -> ApiResult<Json<Product>> {
    r.validate()?;
    let update = ProductUpdate { name: r.name, description: r.description, price: r.price, stock: r.stock, status: r.status };
    Ok(Json(s.catalog.update_product(&sku, update).await?))
}

async fn delete_product(State(s): State<AppState>, Path(sku): Path<String>) -> ApiResult<StatusCode> {
    s.catalog.delete_product(&sku).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_categories(State(s): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(s.catalog.categories().await?))
}

async fn get_category(State(s): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Category>> {
    Ok(Json(s.catalog.get_category(&name).await?))
}

async fn create_category(State(s): State<AppState>, Json(r): Json<CategoryRequest>) -> ApiResult<(StatusCode, Json<Category>)> {
    r.validate()?;
    Ok((StatusCode::CREATED, Json(s.catalog.register_category(&r.name).await?)))
}

async fn preview_code(State(s): State<AppState>, Json(r): Json<CategoryRequest>) -> ApiResult<Json<CodePreview>> {
    r.validate()?;
    let a = s.catalog.preview_code(&r.name).await?;
    Ok(Json(CodePreview { code: a.code, prefix: a.prefix.to_string(), prefix_source: a.prefix_source, suffix_source: a.suffix_source }))
}
