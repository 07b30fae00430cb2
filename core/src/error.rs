//! Error taxonomy and the failure normalizer.
//!
//! # Design
//! Every failure from every repository operation passes through
//! [`normalize`]; no raw transport error escapes the repository boundary.
//! Controllers never inspect failure internals — they read `message()` and
//! `status()` and render their own fixed user-facing strings, so the detail
//! here exists for logging and diagnostics.

use std::fmt;

use serde::Deserialize;

use crate::http::{HttpResponse, TransportFailure};

/// A normalized API failure, exhaustive over the three shapes a repository
/// operation can fail in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was obtained at all.
    Unreachable,
    /// The server answered with a non-success status.
    RequestFailed { status: u16, message: String },
    /// Anything that does not match the two transport shapes above
    /// (malformed response body, unserializable payload).
    Unexpected,
}

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            ApiError::Unreachable => "Unable to reach server",
            ApiError::RequestFailed { message, .. } => message,
            ApiError::Unexpected => "Unexpected error occurred",
        }
    }

    /// The HTTP status, if a response was involved. Unreachability is status
    /// 0 by convention; `Unexpected` carries none.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unreachable => Some(0),
            ApiError::RequestFailed { status, .. } => Some(*status),
            ApiError::Unexpected => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status() {
            Some(status) => write!(f, "{} (status {status})", self.message()),
            None => f.write_str(self.message()),
        }
    }
}

impl std::error::Error for ApiError {}

/// A raw failure as seen at the repository boundary, before normalization.
#[derive(Debug)]
pub enum RawFailure {
    /// The transport obtained no response.
    Transport(TransportFailure),
    /// A response arrived with a non-success status.
    Status(HttpResponse),
    /// A response body (or an outgoing payload) failed (de)serialization.
    Decode(serde_json::Error),
}

/// Optional error body the server may attach to a failure response.
#[derive(Deserialize)]
struct ServerMessage {
    message: String,
}

/// Collapse a raw failure into the three-variant taxonomy.
pub fn normalize(failure: RawFailure) -> ApiError {
    match failure {
        RawFailure::Transport(TransportFailure::Unreachable { .. }) => ApiError::Unreachable,
        RawFailure::Transport(TransportFailure::Other { .. }) => ApiError::Unexpected,
        RawFailure::Status(response) => ApiError::RequestFailed {
            status: response.status,
            message: server_message(&response.body),
        },
        RawFailure::Decode(_) => ApiError::Unexpected,
    }
}

/// Best-effort extraction of `{"message": ...}` from a failure body.
fn server_message(body: &str) -> String {
    match serde_json::from_str::<ServerMessage>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ => "Request failed".to_string(),
    }
}
