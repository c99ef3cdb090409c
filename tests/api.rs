use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use junimo_store::api::{self, AppState};
use junimo_store::events::EventPublisher;
use junimo_store::repository::MemoryStore;
use junimo_store::service::NewProduct;
use junimo_store::{CatalogService, CodeAllocator};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const FIXTURES: &str = include_str!("../fixtures/products.json");

fn catalog() -> CatalogService {
    CatalogService::new(Arc::new(MemoryStore::new()), CodeAllocator::default(), EventPublisher::Log)
}

fn app(catalog: CatalogService) -> Router {
    api::router(AppState { catalog: Arc::new(catalog) })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder.header("content-type", "application/json").body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

fn product(name: &str, category: &str) -> Value {
    json!({"name": name, "price": 9990, "stock": 2, "category": category, "status": "active"})
}

#[tokio::test]
async fn create_allocates_category_codes() {
    let app = app(catalog());
    let (status, body) = send(&app, "POST", "/api/v1/products", Some(product("Sombrero", "Accesorios"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sku"], "AC001");
    assert_eq!(body["category"], "Accesorios");
    assert_eq!(body["status"], "active");

    let (_, body) = send(&app, "POST", "/api/v1/products", Some(product("Bufanda", "Accesorios"))).await;
    assert_eq!(body["sku"], "AC002");

    let (status, body) = send(&app, "GET", "/api/v1/products/ac002", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bufanda");
}

#[tokio::test]
async fn new_categories_get_distinct_prefixes() {
    let app = app(catalog());
    let (_, a) = send(&app, "POST", "/api/v1/products", Some(product("Monitor", "Monitores"))).await;
    let (_, b) = send(&app, "POST", "/api/v1/products", Some(product("Mochila", "Mochilas"))).await;
    let (_, c) = send(&app, "POST", "/api/v1/products", Some(product("Pack", "Mods Digitales"))).await;
    assert_eq!((a["sku"].as_str(), b["sku"].as_str(), c["sku"].as_str()), (Some("MO001"), Some("MC001"), Some("MD001")));

    let (status, categories) = send(&app, "GET", "/api/v1/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    let prefixes: Vec<&str> = categories.as_array().unwrap().iter().map(|c| c["prefix"].as_str().unwrap()).collect();
    assert_eq!(prefixes.len(), 3);
    assert!(prefixes.contains(&"MO") && prefixes.contains(&"MC") && prefixes.contains(&"MD"));
}

#[tokio::test]
async fn preview_does_not_write() {
    let app = app(catalog());
    send(&app, "POST", "/api/v1/products", Some(product("Sombrero", "Accesorios"))).await;
    let (status, body) = send(&app, "POST", "/api/v1/codes/preview", Some(json!({"name": "Accesorios"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"code": "AC002", "prefix": "AC", "prefix_source": "known", "suffix_source": "sequential"}));

    let (_, again) = send(&app, "POST", "/api/v1/codes/preview", Some(json!({"name": "Accesorios"}))).await;
    assert_eq!(again["code"], "AC002");
}

#[tokio::test]
async fn explicit_sku_conflicts_are_rejected() {
    let app = app(catalog());
    let mut body = product("Figura", "Figuras");
    body["sku"] = json!("FI001");
    let (status, _) = send(&app, "POST", "/api/v1/products", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, err) = send(&app, "POST", "/api/v1/products", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn validation_errors_list_fields() {
    let app = app(catalog());
    let (status, err) = send(&app, "POST", "/api/v1/products", Some(json!({"name": "", "price": 10, "category": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = err["error"]["details"].as_array().unwrap().iter().map(|d| d["field"].as_str().unwrap()).collect();
    assert_eq!(fields, ["category", "name"]);

    let (status, err) = send(&app, "POST", "/api/v1/products", Some(json!({"name": "X", "price": -5, "category": "Ropa"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], "BAD_REQUEST");

    let (_, categories) = send(&app, "GET", "/api/v1/categories", None).await;
    assert_eq!(categories, json!([]));
    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["allocator"]["allocations"], 0);
}

#[tokio::test]
async fn update_list_and_delete() {
    let app = app(catalog());
    for name in ["Uno", "Dos", "Tres"] {
        send(&app, "POST", "/api/v1/products", Some(product(name, "Peluches"))).await;
    }
    send(&app, "POST", "/api/v1/products", Some(product("Polera", "Ropa"))).await;

    let (status, body) = send(&app, "PUT", "/api/v1/products/PE002", Some(json!({"stock": 0, "status": "archived"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stock"], 0);
    assert_eq!(body["status"], "archived");

    let (_, page) = send(&app, "GET", "/api/v1/products?category=Peluches&per_page=2&page=1", None).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);

    let (_, active) = send(&app, "GET", "/api/v1/products?status=active", None).await;
    assert_eq!(active["total"], 3);

    let (status, _) = send(&app, "DELETE", "/api/v1/products/PE002", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, err) = send(&app, "GET", "/api/v1/products/PE002", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn duplicate_category_is_a_conflict() {
    let app = app(catalog());
    let (status, body) = send(&app, "POST", "/api/v1/categories", Some(json!({"name": "Velas"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["prefix"], "VE");
    let (status, _) = send(&app, "POST", "/api/v1/categories", Some(json!({"name": "Velas"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, body) = send(&app, "GET", "/api/v1/categories/Velas", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Velas");
}

#[tokio::test]
async fn fixtures_seed_the_catalog() {
    let catalog = catalog();
    let fixtures: Vec<NewProduct> = serde_json::from_str(FIXTURES).unwrap();
    assert_eq!(catalog.seed(fixtures).await.unwrap(), 7);
    let app = app(catalog);

    let (_, page) = send(&app, "GET", "/api/v1/products?per_page=100", None).await;
    let codes: Vec<&str> = page["data"].as_array().unwrap().iter().map(|p| p["sku"].as_str().unwrap()).collect();
    assert_eq!(codes, ["AC001", "AC002", "FI010", "MD001", "PE001", "PE002", "TA001"]);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["allocator"]["allocations"], 6);
    assert_eq!(health["allocator"]["timestamp_fallbacks"], 0);
}
