//! Timeout configuration for gateway calls.
//!
//! Covers connection establishment, individual scanner calls, and the
//! best-effort scanner release performed when a scan is dropped mid-way.

use std::time::Duration;

/// Timeout configuration for hbase-link operations.
///
/// # Examples
///
/// ```rust
/// use hbase_link::HBaseLinkTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = HBaseLinkTimeouts::default();
///
/// // Region servers under heavy compaction can be slow to answer a page
/// let timeouts = HBaseLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(30))
///     .request_timeout(Duration::from_secs(120))
///     .build();
///
/// // Aggressive timeouts for a local gateway
/// let timeouts = HBaseLinkTimeouts::fast();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HBaseLinkTimeouts {
    /// Timeout for establishing connections (TCP + TLS handshake).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for a whole scanner call (open, page or close).
    /// Default: 60 seconds
    pub request_timeout: Duration,

    /// Timeout for the background scanner release issued when a scan is
    /// dropped before it was closed.
    /// Default: 5 seconds
    pub release_timeout: Duration,
}

impl Default for HBaseLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            release_timeout: Duration::from_secs(5),
        }
    }
}

impl HBaseLinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> HBaseLinkTimeoutsBuilder {
        HBaseLinkTimeoutsBuilder::new()
    }

    /// Create timeouts suited to a gateway on localhost.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            release_timeout: Duration::from_secs(2),
        }
    }

    /// Create timeouts suited to remote or heavily loaded clusters.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
            release_timeout: Duration::from_secs(15),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365) // > 1 year
    }
}

/// Builder for creating custom [`HBaseLinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct HBaseLinkTimeoutsBuilder {
    timeouts: HBaseLinkTimeouts,
}

impl HBaseLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: HBaseLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout (TCP + TLS handshake).
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the per-call timeout. Set to 0 to disable.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    /// Set the per-call timeout in seconds.
    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    /// Set the timeout of the background release on drop.
    pub fn release_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.release_timeout = timeout;
        self
    }

    /// Build the timeout configuration.
    pub fn build(self) -> HBaseLinkTimeouts {
        self.timeouts
    }
}
