//! Main HBase REST client with builder pattern.
//!
//! Provides the primary interface for opening scanners against a REST
//! gateway and consuming them as streams of cells.

use crate::{
    auth::AuthProvider,
    codec::Encoding,
    connection::HttpConnection,
    error::{HBaseLinkError, Result},
    models::{Cell, ScanOptions},
    scanner::{ScanCursor, ScanStream},
    timeouts::HBaseLinkTimeouts,
    transport::RestTransport,
};
use std::{sync::Arc, time::Duration};

/// Main HBase REST client.
///
/// Use [`HBaseLinkClientBuilder`] to construct instances with custom configuration.
/// Cloning is cheap; clones share the underlying connection pool.
///
/// # Examples
///
/// ```rust,no_run
/// use hbase_link::{HBaseLinkClient, ScanOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HBaseLinkClient::builder()
///     .base_url("http://localhost:8080")
///     .timeout(std::time::Duration::from_secs(30))
///     .build()?;
///
/// let cells = client.scan("users")?.collect_cells().await?;
/// println!("Scanned {} cells", cells.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HBaseLinkClient {
    transport: Arc<dyn RestTransport>,
    encoding: Encoding,
    timeouts: HBaseLinkTimeouts,
}

impl HBaseLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> HBaseLinkClientBuilder {
        HBaseLinkClientBuilder::new()
    }

    /// Default encoding of row keys, columns and values
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Get the configured timeouts
    pub fn timeouts(&self) -> &HBaseLinkTimeouts {
        &self.timeouts
    }

    /// Create a scanner cursor without issuing any call.
    ///
    /// Fails with [`HBaseLinkError::MissingRequiredOption`] when no table is
    /// given.
    pub fn cursor(&self, options: impl Into<ScanOptions>) -> Result<ScanCursor> {
        ScanCursor::new(Arc::clone(&self.transport), options.into(), self.encoding)
    }

    /// Start a lazy scan.
    ///
    /// Options are validated now; the scanner itself is only created on the
    /// first pull.
    ///
    /// # Example
    /// ```rust,no_run
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = hbase_link::HBaseLinkClient::builder().base_url("http://localhost:8080").build()?;
    /// use hbase_link::{FilterNode, ScanOptions};
    ///
    /// // Whole table
    /// let mut scan = client.scan("users")?;
    ///
    /// // Row range with a prefix filter
    /// let mut scan = client.scan(
    ///     ScanOptions::new("users")
    ///         .with_start_row("a")
    ///         .with_end_row("n")
    ///         .with_filter(FilterNode::prefix("adm")),
    /// )?;
    /// while let Some(cell) = scan.next().await {
    ///     println!("{:?}", cell?);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn scan(&self, options: impl Into<ScanOptions>) -> Result<ScanStream> {
        let cursor = self.cursor(options)?;
        log::debug!(
            "[CLIENT] Prepared scan of table={} batch={}",
            cursor.table(),
            cursor.request().batch
        );
        Ok(ScanStream::new(cursor).with_release_timeout(self.timeouts.release_timeout))
    }

    /// Handle scoped to one table.
    pub fn table(&self, name: impl Into<String>) -> Table {
        Table {
            client: self.clone(),
            name: name.into(),
        }
    }
}

/// A client bound to a single table.
///
/// The table name replaces whatever table the scan options carry.
#[derive(Clone)]
pub struct Table {
    client: HBaseLinkClient,
    name: String,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scan(&self, options: ScanOptions) -> Result<ScanStream> {
        self.client.scan(ScanOptions {
            table: self.name.clone(),
            ..options
        })
    }

    /// Run a whole scan and return every cell.
    pub async fn scan_all(&self, options: ScanOptions) -> Result<Vec<Cell>> {
        self.scan(options)?.collect_cells().await
    }
}

/// Builder for configuring [`HBaseLinkClient`] instances.
pub struct HBaseLinkClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    auth: AuthProvider,
    max_retries: u32,
    timeouts: HBaseLinkTimeouts,
    encoding: Encoding,
    transport: Option<Arc<dyn RestTransport>>,
}

impl HBaseLinkClientBuilder {
    fn new() -> Self {
        let timeouts = HBaseLinkTimeouts::default();
        Self {
            base_url: None,
            timeout: timeouts.request_timeout,
            auth: AuthProvider::none(),
            max_retries: 3,
            timeouts,
            encoding: Encoding::default(),
            transport: None,
        }
    }

    /// Set the base URL of the REST gateway
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set request timeout (for HTTP requests)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set HTTP Basic Auth credentials
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthProvider::basic_auth(username.into(), password.into());
        self
    }

    /// Set authentication provider directly
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use hbase_link::{AuthProvider, HBaseLinkClient};
    ///
    /// # fn example() -> hbase_link::Result<()> {
    /// let client = HBaseLinkClient::builder()
    ///     .base_url("https://gateway.example.com:8443/gateway/default/hbase")
    ///     .auth(AuthProvider::basic_auth("alice".to_string(), "secret".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    /// Set maximum number of retries for requests that never reached the gateway
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set comprehensive timeout configuration for all operations
    ///
    /// This overrides individual timeout settings like `timeout()`.
    pub fn timeouts(mut self, timeouts: HBaseLinkTimeouts) -> Self {
        self.timeout = timeouts.request_timeout;
        self.timeouts = timeouts;
        self
    }

    /// Default encoding for scans that don't set their own
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Use a custom transport instead of HTTP.
    ///
    /// `base_url`, `auth`, `timeout` and `max_retries` are ignored when set.
    pub fn transport(mut self, transport: Arc<dyn RestTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<HBaseLinkClient> {
        let transport = match self.transport {
            Some(transport) => {
                log::debug!("[CLIENT] Using caller-supplied transport");
                transport
            },
            None => {
                let base_url = self.base_url.ok_or_else(|| {
                    HBaseLinkError::ConfigurationError("base_url is required".into())
                })?;

                // Scanner pages are fetched one after another on the same
                // host, so keep-alive saves a handshake per page
                let mut client_builder = reqwest::Client::builder()
                    .connect_timeout(self.timeouts.connection_timeout)
                    .pool_max_idle_per_host(10)
                    .pool_idle_timeout(Duration::from_secs(90));
                if !HBaseLinkTimeouts::is_no_timeout(self.timeout) {
                    client_builder = client_builder.timeout(self.timeout);
                }

                let http_client = client_builder
                    .build()
                    .map_err(|e| HBaseLinkError::ConfigurationError(e.to_string()))?;

                log::debug!("[CLIENT] Connecting to gateway at {}", base_url);
                Arc::new(HttpConnection::new(
                    base_url,
                    http_client,
                    self.auth,
                    self.max_retries,
                ))
            },
        };

        Ok(HBaseLinkClient {
            transport,
            encoding: self.encoding,
            timeouts: self.timeouts,
        })
    }
}
