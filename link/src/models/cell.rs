use crate::codec::Value;

/// A single (row, column, timestamp, value) unit returned by a scanner.
///
/// Cells are yielded in the order the gateway returned them; rows are never
/// re-sorted or de-duplicated on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Row key, decoded once per row and shared by all its cells
    pub row_key: Value,

    /// Column as `family:qualifier`
    pub column: Value,

    /// Cell timestamp in milliseconds since the epoch
    pub timestamp: i64,

    pub value: Value,
}
