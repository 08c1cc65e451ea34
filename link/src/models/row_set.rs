use serde::{Deserialize, Serialize};

/// Body of a successful scanner page: `{"Row":[{"key":..,"Cell":[..]}]}`.
///
/// Every binary field is base64 text; see [`crate::scanner::decode_rows`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowSet {
    #[serde(rename = "Row", alias = "rows", default)]
    pub rows: Vec<RowWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowWire {
    pub key: String,

    #[serde(rename = "Cell", alias = "cells", default)]
    pub cells: Vec<CellWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellWire {
    pub column: String,

    #[serde(default)]
    pub timestamp: i64,

    /// Cell content, `$` on the wire
    #[serde(rename = "$", alias = "value", default)]
    pub value: String,
}
