use std::collections::HashMap;

use crate::codec::{Encoding, Value};
use crate::error::{HBaseLinkError, Result};
use crate::filter::FilterNode;

/// Column restriction of a scan: one column or an ordered list.
///
/// A single column is sent as a one-element list.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSelection {
    Single(Value),
    List(Vec<Value>),
}

impl ColumnSelection {
    pub fn into_list(self) -> Vec<Value> {
        match self {
            ColumnSelection::Single(column) => vec![column],
            ColumnSelection::List(columns) => columns,
        }
    }
}

impl From<&str> for ColumnSelection {
    fn from(column: &str) -> Self {
        ColumnSelection::Single(Value::from(column))
    }
}

impl From<String> for ColumnSelection {
    fn from(column: String) -> Self {
        ColumnSelection::Single(Value::from(column))
    }
}

impl From<Value> for ColumnSelection {
    fn from(column: Value) -> Self {
        ColumnSelection::Single(column)
    }
}

impl From<Vec<Value>> for ColumnSelection {
    fn from(columns: Vec<Value>) -> Self {
        ColumnSelection::List(columns)
    }
}

impl From<Vec<&str>> for ColumnSelection {
    fn from(columns: Vec<&str>) -> Self {
        ColumnSelection::List(columns.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<String>> for ColumnSelection {
    fn from(columns: Vec<String>) -> Self {
        ColumnSelection::List(columns.into_iter().map(Value::from).collect())
    }
}

/// Options of a single scan.
///
/// Only `table` is required. Row and time bounds are half-open: the start is
/// included, the end is not.
///
/// # Examples
///
/// ```rust
/// use hbase_link::{Encoding, ScanOptions};
///
/// let options = ScanOptions::new("my_table")
///     .with_start_row("a")
///     .with_end_row("z")
///     .with_columns(vec!["cf:name", "cf:email"])
///     .with_batch_size(500)
///     .with_encoding(Encoding::Raw);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOptions {
    pub table: String,
    pub start_row: Option<Value>,
    pub end_row: Option<Value>,
    pub columns: Option<ColumnSelection>,

    /// Rows per page. Defaults to 1000.
    pub batch_size: Option<u32>,

    pub max_versions: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub filter: Option<FilterNode>,

    /// Overrides the client's default encoding for this scan.
    /// [`Encoding::Raw`] returns row keys, columns and values as bytes.
    pub encoding: Option<Encoding>,
}

impl ScanOptions {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_start_row(mut self, row: impl Into<Value>) -> Self {
        self.start_row = Some(row.into());
        self
    }

    pub fn with_end_row(mut self, row: impl Into<Value>) -> Self {
        self.end_row = Some(row.into());
        self
    }

    pub fn with_columns(mut self, columns: impl Into<ColumnSelection>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_max_versions(mut self, max_versions: u32) -> Self {
        self.max_versions = Some(max_versions);
        self
    }

    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_end_time(mut self, end_time: i64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<FilterNode>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Build options from string key/value pairs.
    ///
    /// Accepts both snake_case keys and the gateway's camelCase names
    /// (`startRow`, `maxVersions`, ...). `columns` is comma separated and
    /// `filter` is the filter tree as JSON text. The table may be left out and
    /// supplied later through [`crate::Table::scan`].
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let mut options = Self::new(get_str(map, "table", "table").unwrap_or_default());

        options.start_row = get_str(map, "start_row", "startRow").map(Value::from);
        options.end_row = get_str(map, "end_row", "endRow").map(Value::from);
        if let Some(value) = get_str(map, "columns", "column") {
            let columns: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned)
                .collect();
            options.columns = match columns.len() {
                0 => None,
                1 => columns.into_iter().next().map(ColumnSelection::from),
                _ => Some(ColumnSelection::from(columns)),
            };
        }
        if let Some(value) = get_str(map, "batch_size", "batch") {
            options.batch_size = Some(parse_u32(&value, "batch_size")?);
        }
        if let Some(value) = get_str(map, "max_versions", "maxVersions") {
            options.max_versions = Some(parse_u32(&value, "max_versions")?);
        }
        if let Some(value) = get_str(map, "start_time", "startTime") {
            options.start_time = Some(parse_i64(&value, "start_time")?);
        }
        if let Some(value) = get_str(map, "end_time", "endTime") {
            options.end_time = Some(parse_i64(&value, "end_time")?);
        }
        if let Some(value) = get_str(map, "encoding", "encoding") {
            options.encoding = Some(value.parse()?);
        }
        if let Some(value) = get_str(map, "filter", "filter") {
            let json: serde_json::Value = serde_json::from_str(&value).map_err(|e| {
                HBaseLinkError::InvalidFilter(format!("filter is not valid JSON: {}", e))
            })?;
            options.filter = Some(FilterNode::from_json(&json)?);
        }

        Ok(options)
    }
}

impl From<&str> for ScanOptions {
    fn from(table: &str) -> Self {
        ScanOptions::new(table)
    }
}

impl From<String> for ScanOptions {
    fn from(table: String) -> Self {
        ScanOptions::new(table)
    }
}

fn get_str(map: &HashMap<String, String>, key: &str, alias: &str) -> Option<String> {
    map.get(key).cloned().or_else(|| map.get(alias).cloned())
}

fn parse_u32(value: &str, field: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        HBaseLinkError::ConfigurationError(format!("Invalid {} value: {}", field, value))
    })
}

fn parse_i64(value: &str, field: &str) -> Result<i64> {
    value.trim().parse::<i64>().map_err(|_| {
        HBaseLinkError::ConfigurationError(format!("Invalid {} value: {}", field, value))
    })
}
