//! Data models for hbase-link.
//!
//! Scan options supplied by callers, the wire payloads exchanged with the REST
//! gateway's scanner resource, and the decoded [`Cell`] records.

pub mod cell;
pub mod row_set;
pub mod scan_options;
pub mod scan_request;

pub use cell::Cell;
pub use row_set::{CellWire, RowSet, RowWire};
pub use scan_options::{ColumnSelection, ScanOptions};
pub use scan_request::{ScanRequest, DEFAULT_BATCH_SIZE};
