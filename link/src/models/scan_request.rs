use serde::{Deserialize, Serialize};

/// Default number of rows fetched per page.
pub const DEFAULT_BATCH_SIZE: u32 = 1000;

/// Payload of the "create scanner" call (`PUT /{table}/scanner`).
///
/// Row bounds and columns are already base64-encoded; `filter` is the encoded
/// filter tree serialized as JSON text. Built by
/// [`ScanRequest::build`](crate::models::ScanRequest::build).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub batch: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_row: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_versions: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}
