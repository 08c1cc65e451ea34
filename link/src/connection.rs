//! HTTP transport to the REST gateway.

use crate::{
    auth::AuthProvider,
    error::{HBaseLinkError, Result},
    transport::{RestResponse, RestTransport, STATUS_NO_CONTENT},
};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Method};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Instant;

/// Sends scanner calls to the gateway over HTTP with JSON bodies.
///
/// Requests that fail before reaching the server (connect errors) are retried
/// up to `max_retries` times with a linear backoff; anything that reached the
/// server is returned as is.
#[derive(Clone)]
pub struct HttpConnection {
    base_url: String,
    http_client: reqwest::Client,
    auth: AuthProvider,
    max_retries: u32,
}

impl HttpConnection {
    pub(crate) fn new(
        base_url: String,
        http_client: reqwest::Client,
        auth: AuthProvider,
        max_retries: u32,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            auth,
            max_retries,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&JsonValue>,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        let mut retries = 0;
        let overall_start = Instant::now();

        loop {
            // Request builders with bodies cannot be cloned, so rebuild per attempt
            let mut req_builder = self
                .http_client
                .request(method.clone(), &url)
                .header(header::ACCEPT, "application/json");
            if let Some(body) = body {
                req_builder = req_builder.json(body);
            }
            req_builder = self.auth.apply_to_request(req_builder);

            let attempt_start = Instant::now();
            debug!(
                "[LINK_HTTP] Sending {} to {} (attempt {}/{})",
                method,
                url,
                retries + 1,
                self.max_retries + 1
            );

            match req_builder.send().await {
                Ok(response) => {
                    debug!(
                        "[LINK_HTTP] Response received: status={} duration_ms={}",
                        response.status(),
                        attempt_start.elapsed().as_millis()
                    );
                    return Ok(response);
                },
                Err(e) if retries < self.max_retries && Self::is_retriable(&e) => {
                    warn!(
                        "[LINK_HTTP] Retriable error (attempt {}/{}): {} duration_ms={}",
                        retries + 1,
                        self.max_retries + 1,
                        e,
                        attempt_start.elapsed().as_millis()
                    );
                    retries += 1;
                    tokio::time::sleep(tokio::time::Duration::from_millis(100 * retries as u64))
                        .await;
                },
                Err(e) => {
                    warn!(
                        "[LINK_HTTP] Fatal error: {} {} failed: {} total_ms={}",
                        method,
                        url,
                        e,
                        overall_start.elapsed().as_millis()
                    );
                    return Err(e.into());
                },
            }
        }
    }

    // Only errors where the request never reached the server are safe to
    // repeat; a repeated scanner PUT would leak the first scanner.
    fn is_retriable(err: &reqwest::Error) -> bool {
        err.is_connect()
    }

    async fn into_rest_response(response: reqwest::Response) -> Result<RestResponse> {
        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }

        let text = response.text().await?;
        let body = if status == STATUS_NO_CONTENT || text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<JsonValue>(&text) {
                Ok(json) => Some(json),
                Err(_) => Some(JsonValue::String(text)),
            }
        };

        Ok(RestResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl RestTransport for HttpConnection {
    async fn put(&self, path: &str, body: &JsonValue) -> Result<RestResponse> {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        Self::into_rest_response(response).await
    }

    async fn get(&self, path: &str) -> Result<RestResponse> {
        let response = self.send(Method::GET, path, None).await?;
        Self::into_rest_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let response = self.send(Method::DELETE, path, None).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            // Scanner lease already expired on the region server
            debug!("[LINK_HTTP] DELETE {} returned 404", path);
            return Ok(false);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(HBaseLinkError::ServerError {
            status_code: status.as_u16(),
            message,
        })
    }
}
