//! HTTP transport boundary.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and parses `HttpResponse` values; the actual round-trip is executed
//! by an injected [`Transport`] implementation, which keeps the repository
//! deterministic under test — unit tests script responses, integration tests
//! plug in a real HTTP agent.
//!
//! A transport reports [`TransportFailure`] only when it could not obtain a
//! response at all. A response that arrived with a non-success status is
//! still an `HttpResponse`; status interpretation belongs to the repository.

use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// An HTTP request described as plain data.
///
/// `query` holds the wire parameters separately from `path` so transports can
/// apply their own URL encoding.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Why a transport produced no response.
#[derive(Debug, Clone)]
pub enum TransportFailure {
    /// The host could not be reached at all (DNS failure, refused
    /// connection). Maps to the status-0 shape of the error taxonomy.
    Unreachable { detail: String },
    /// Anything else that prevented obtaining a response.
    Other { detail: String },
}

/// Executes an `HttpRequest` and returns the raw outcome.
///
/// The returned future is `Send` so repository calls can be spawned onto the
/// runtime by the controllers.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportFailure>> + Send;
}
