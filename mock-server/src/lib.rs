//! json-server-style stand-in for the remote product resource.
//!
//! Implements the slice of the json-server query dialect the client core
//! uses: `q` full-text filter, `category` filter, `_sort`/`_order`, and the
//! half-open `_start`/`_end` offset range, with the filtered total in the
//! `X-Total-Count` response header. Product DTOs are defined independently
//! from the core crate; integration tests catch schema drift.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub stock: u32,
    pub is_active: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Create/update payload: a product without the server-assigned id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    #[serde(default)]
    pub category: Option<String>,
    pub stock: u32,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

/// Query parameters of the list endpoint, json-server dialect.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "_start")]
    pub start: Option<usize>,
    #[serde(rename = "_end")]
    pub end: Option<usize>,
    pub q: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "_sort")]
    pub sort: Option<String>,
    #[serde(rename = "_order")]
    pub order: Option<String>,
}

/// Insertion-ordered store, like a json-server db.json.
#[derive(Debug, Default)]
pub struct Store {
    pub items: Vec<Product>,
    pub next_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Vec::new())
}

pub fn app_with(seed: Vec<Product>) -> Router {
    let next_id = seed.iter().map(|p| p.id).max().unwrap_or(0) + 1;
    let db: Db = Arc::new(RwLock::new(Store {
        items: seed,
        next_id,
    }));
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product).put(update_product))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_products(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let store = db.read().await;
    let mut matches: Vec<Product> = store
        .items
        .iter()
        .filter(|product| matches_search(product, params.q.as_deref()))
        .filter(|product| matches_category(product, params.category.as_deref()))
        .cloned()
        .collect();

    match params.sort.as_deref() {
        Some("name") => matches.sort_by(|a, b| a.name.cmp(&b.name)),
        Some("price") => matches.sort_by(|a, b| a.price.total_cmp(&b.price)),
        Some("createdAt") => matches.sort_by_key(|p| p.created_at),
        _ => {}
    }
    if params.sort.is_some() && params.order.as_deref() == Some("desc") {
        matches.reverse();
    }

    let total = matches.len();
    let start = params.start.unwrap_or(0).min(total);
    let end = params.end.unwrap_or(total).clamp(start, total);
    let page = matches[start..end].to_vec();

    ([("x-total-count", total.to_string())], Json(page))
}

async fn get_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, (StatusCode, Json<Value>)> {
    let store = db.read().await;
    store
        .items
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn create_product(
    State(db): State<Db>,
    Json(input): Json<ProductInput>,
) -> (StatusCode, Json<Product>) {
    let mut store = db.write().await;
    let id = store.next_id;
    store.next_id += 1;
    let product = Product {
        id,
        name: input.name,
        description: input.description,
        price: input.price,
        currency: input.currency,
        category: input.category,
        stock: input.stock,
        is_active: input.is_active,
        created_at: input.created_at,
        updated_at: input.updated_at,
    };
    store.items.push(product.clone());
    (StatusCode::CREATED, Json(product))
}

async fn update_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, (StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    let product = store
        .items
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(not_found)?;
    product.name = input.name;
    product.description = input.description;
    product.price = input.price;
    product.currency = input.currency;
    product.category = input.category;
    product.stock = input.stock;
    product.is_active = input.is_active;
    product.created_at = input.created_at;
    product.updated_at = input.updated_at;
    Ok(Json(product.clone()))
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "Product not found"})),
    )
}

fn matches_search(product: &Product, q: Option<&str>) -> bool {
    let Some(q) = q else { return true };
    let needle = q.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.description.to_lowercase().contains(&needle)
        || product
            .category
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(&needle))
}

fn matches_category(product: &Product, category: Option<&str>) -> bool {
    match category {
        Some(category) => product.category.as_deref() == Some(category),
        None => true,
    }
}
