//! Transport seam between the scanner and the REST gateway.
//!
//! The scanner only needs `put`, `get` and `delete` keyed by a resource path.
//! [`HttpConnection`](crate::connection::HttpConnection) is the production
//! implementation; tests plug in in-memory gateways.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// HTTP status returned by the gateway once a scanner has no more rows.
pub const STATUS_NO_CONTENT: u16 = 204;

/// Parsed response of a `put` or `get` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestResponse {
    pub status: u16,

    /// Header names are stored lower-cased
    pub headers: HashMap<String, String>,

    /// Parsed JSON body; `None` for empty bodies. Non-JSON bodies are kept as
    /// a JSON string.
    pub body: Option<JsonValue>,
}

impl RestResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort error text for a failed response.
    pub fn error_message(&self) -> String {
        match &self.body {
            Some(JsonValue::String(text)) if !text.is_empty() => text.clone(),
            Some(JsonValue::Null) | None => "Unknown error".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Resource-path keyed primitives the scanner is built on.
///
/// Implementations own connection handling, authentication and retries.
/// A non-success status is returned as a [`RestResponse`], not as an error;
/// errors are reserved for calls that produced no response at all.
#[async_trait]
pub trait RestTransport: Send + Sync {
    async fn put(&self, path: &str, body: &JsonValue) -> Result<RestResponse>;

    async fn get(&self, path: &str) -> Result<RestResponse>;

    /// Returns whether the resource was removed.
    async fn delete(&self, path: &str) -> Result<bool>;
}
