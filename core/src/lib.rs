//! Client-side data-access core for a paginated product catalog.
//!
//! # Overview
//! Translates structured queries into wire parameters, derives pagination
//! metadata from response headers, normalizes transport failures into a
//! three-variant taxonomy, and keeps the list and form view-models
//! consistent while requests race. Rendering and routing live outside this
//! crate; they send commands through the controller handles and redraw from
//! the published view-models.
//!
//! # Design
//! - `ProductRepository` is explicitly constructed around an injected
//!   [`Transport`]; requests and responses are plain data, so unit tests
//!   script the wire and integration tests plug in a real HTTP agent.
//! - Controllers are tokio actor tasks: mpsc commands in, a watch view-model
//!   out. Free-text search is debounced by a cancellable one-shot; list
//!   responses carry a generation tag so a stale reply can never overwrite a
//!   newer one.
//! - Every failure funnels through [`error::normalize`] — controllers only
//!   ever see [`ApiError`].

pub mod error;
pub mod form_controller;
pub mod http;
pub mod list_controller;
pub mod query;
pub mod repository;
pub mod types;

pub use error::{normalize, ApiError, RawFailure};
pub use form_controller::{
    FormCommand, FormController, FormHandle, FormMode, FormValues, FormViewModel, ProductForm,
};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportFailure};
pub use list_controller::{
    ListCommand, ListController, ListHandle, ListViewModel, SEARCH_DEBOUNCE,
};
pub use query::build_params;
pub use repository::ProductRepository;
pub use types::{
    Currency, NewProduct, Product, ProductQuery, ProductsResponse, SortField, SortOrder,
    DEFAULT_PAGE_SIZE,
};
