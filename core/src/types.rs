//! Domain DTOs for the product catalog API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Field names are camelCase on the wire to match the remote resource's JSON;
//! integration tests catch any schema drift between the two crates.
//! `ProductQuery` is a value object: controllers replace it wholesale on every
//! change so an in-flight request can never observe a half-mutated query.

use serde::{Deserialize, Serialize};

/// Page size the list controller starts with.
pub const DEFAULT_PAGE_SIZE: u32 = 4;

/// A single product returned by the API.
///
/// `id` is server-assigned and immutable after creation. `created_at` is set
/// once at creation; `updated_at` is rewritten on every create or update, so
/// `created_at <= updated_at` always holds for server-owned records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub stock: u32,
    pub is_active: bool,
    /// Epoch milliseconds.
    pub created_at: u64,
    /// Epoch milliseconds.
    pub updated_at: u64,
}

/// Request payload for creating a product. The server is the sole assigner
/// of `id`, so the payload carries everything but.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub stock: u32,
    pub is_active: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Ils,
}

/// Sortable product fields, named as the remote resource spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
    CreatedAt,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::CreatedAt => "createdAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A list query as the controllers understand it, before translation to wire
/// parameters by [`crate::query::build_params`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
    /// 1-based page index.
    pub page: u32,
    pub limit: u32,
}

impl Default for ProductQuery {
    /// The list controller's initial query: newest products first.
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            sort_by: Some(SortField::CreatedAt),
            order: Some(SortOrder::Desc),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of products plus the total match count.
///
/// `total_count` comes from the `X-Total-Count` response header and counts
/// every match, independent of the page slice in `items`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductsResponse {
    pub items: Vec<Product>,
    pub total_count: u64,
}
