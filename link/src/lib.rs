//! # hbase-link
//!
//! Streaming scanner client for the HBase REST gateway (Stargate).
//!
//! A scan creates a server-side scanner, pulls it page by page and deletes it
//! once the rows run out or the consumer stops early. Row keys, columns and
//! values travel base64-encoded; they are decoded with a per-client default
//! [`Encoding`] that a scan may override.
//!
//! ## Architecture
//!
//! ```text
//! HBaseLinkClient / Table
//!     ↓
//! ScanStream (pull-based cells, one page buffered)
//!     ↓
//! ScanCursor (open → page → close)
//!     ↓
//! RestTransport (HttpConnection over reqwest)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use hbase_link::{FilterNode, HBaseLinkClient, ScanOptions};
//!
//! # async fn example() -> hbase_link::Result<()> {
//! let client = HBaseLinkClient::builder()
//!     .base_url("http://localhost:8080")
//!     .build()?;
//!
//! let options = ScanOptions::new("users")
//!     .with_columns(vec!["info:name", "info:email"])
//!     .with_batch_size(100)
//!     .with_filter(FilterNode::prefix("user_"));
//!
//! let mut scan = client.scan(options)?;
//! while let Some(cell) = scan.next().await {
//!     let cell = cell?;
//!     println!("{} {} {} = {}", cell.row_key, cell.column, cell.timestamp, cell.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod connection;
pub mod error;
pub mod filter;
pub mod models;
pub mod scanner;
pub mod timeouts;
pub mod transport;

pub use auth::AuthProvider;
pub use client::{HBaseLinkClient, HBaseLinkClientBuilder, Table};
pub use codec::{Encoding, Value, ValueCodec};
pub use connection::HttpConnection;
pub use error::{HBaseLinkError, Result};
pub use filter::{
    Comparator, ComparatorKind, CompareOp, FilterKind, FilterLeaf, FilterNode, ListOperator,
};
pub use models::{Cell, ColumnSelection, ScanOptions, ScanRequest};
pub use scanner::{CursorPhase, ScanCursor, ScanStream};
pub use timeouts::{HBaseLinkTimeouts, HBaseLinkTimeoutsBuilder};
pub use transport::{RestResponse, RestTransport};
