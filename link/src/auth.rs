//! Authentication provider for gateway requests.
//!
//! REST gateways fronted by a proxy (Knox, nginx) usually expect HTTP Basic
//! Auth; a bare gateway needs no credentials.

use base64::{engine::general_purpose, Engine as _};

/// Authentication credentials for the REST gateway.
///
/// # Examples
///
/// ```rust
/// use hbase_link::AuthProvider;
///
/// let auth = AuthProvider::basic_auth("username".to_string(), "password".to_string());
///
/// // Unsecured gateway
/// let auth = AuthProvider::none();
/// ```
#[derive(Debug, Clone)]
pub enum AuthProvider {
    /// HTTP Basic Auth (username, password)
    BasicAuth(String, String),

    /// No authentication
    None,
}

impl AuthProvider {
    /// Create HTTP Basic Auth (RFC 7617).
    pub fn basic_auth(username: String, password: String) -> Self {
        Self::BasicAuth(username, password)
    }

    /// No authentication
    pub fn none() -> Self {
        Self::None
    }

    /// Value of the `Authorization` header, if any.
    pub fn authorization_header(&self) -> Option<String> {
        match self {
            Self::BasicAuth(username, password) => {
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(format!("Basic {}", encoded))
            },
            Self::None => None,
        }
    }

    /// Attach authentication headers to an HTTP request builder
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.authorization_header() {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }

    /// Check if authentication is configured
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
