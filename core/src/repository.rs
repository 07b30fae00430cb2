//! Repository for the product collection resource.
//!
//! # Design
//! `ProductRepository` holds a `base_url` and an injected [`Transport`], and
//! carries no state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`; the async operation composes the two around a single
//! transport round-trip. The split keeps request construction and response
//! interpretation testable without any network.
//!
//! Every failure path — unreachable host, non-success status, malformed
//! body — is normalized into [`ApiError`] before it leaves this module.

use tracing::debug;

use crate::error::{normalize, ApiError, RawFailure};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::query::build_params;
use crate::types::{NewProduct, Product, ProductQuery, ProductsResponse};

const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Data access for the remote product collection.
#[derive(Debug, Clone)]
pub struct ProductRepository<T> {
    base_url: String,
    transport: T,
}

impl<T: Transport> ProductRepository<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// Fetch one page of products matching `query`.
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductsResponse, ApiError> {
        let request = self.build_list(query);
        let response = self.execute(request).await?;
        Self::parse_list(response)
    }

    /// Fetch a single product by id. A missing product surfaces as
    /// `RequestFailed` with the server's 404 status.
    pub async fn get(&self, id: u64) -> Result<Product, ApiError> {
        let request = self.build_get(id);
        let response = self.execute(request).await?;
        Self::parse_product(response)
    }

    /// Create a product. The server assigns the id.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, ApiError> {
        let request = self.build_create(input)?;
        let response = self.execute(request).await?;
        Self::parse_product(response)
    }

    /// Replace the product addressed by `input.id`.
    pub async fn update(&self, input: &Product) -> Result<Product, ApiError> {
        let request = self.build_update(input)?;
        let response = self.execute(request).await?;
        Self::parse_product(response)
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = ?request.method, path = %request.path, "issuing request");
        self.transport
            .execute(request)
            .await
            .map_err(|failure| normalize(RawFailure::Transport(failure)))
    }

    fn build_list(&self, query: &ProductQuery) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/products", self.base_url),
            query: build_params(query),
            headers: Vec::new(),
            body: None,
        }
    }

    fn build_get(&self, id: u64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/products/{id}", self.base_url),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    fn build_create(&self, input: &NewProduct) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| normalize(RawFailure::Decode(e)))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/products", self.base_url),
            query: Vec::new(),
            headers: json_headers(),
            body: Some(body),
        })
    }

    fn build_update(&self, input: &Product) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| normalize(RawFailure::Decode(e)))?;
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/products/{}", self.base_url, input.id),
            query: Vec::new(),
            headers: json_headers(),
            body: Some(body),
        })
    }

    /// Items come from the body (absent body ⇒ empty page), the total from
    /// the `X-Total-Count` header (absent header ⇒ 0).
    fn parse_list(response: HttpResponse) -> Result<ProductsResponse, ApiError> {
        let response = check_success(response)?;
        let total_count = response
            .header(TOTAL_COUNT_HEADER)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0);
        let items = if response.body.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&response.body).map_err(|e| normalize(RawFailure::Decode(e)))?
        };
        Ok(ProductsResponse { items, total_count })
    }

    fn parse_product(response: HttpResponse) -> Result<Product, ApiError> {
        let response = check_success(response)?;
        serde_json::from_str(&response.body).map_err(|e| normalize(RawFailure::Decode(e)))
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn check_success(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(normalize(RawFailure::Status(response)))
    }
}
