use crate::codec::ValueCodec;
use crate::error::Result;
use crate::models::{Cell, RowSet};

/// Flatten a scanner page into cells, in the order the gateway sent them.
///
/// The row key is decoded once per row. A single undecodable field fails the
/// whole page.
pub fn decode_rows(row_set: RowSet, codec: &ValueCodec) -> Result<Vec<Cell>> {
    let mut cells = Vec::with_capacity(row_set.rows.iter().map(|r| r.cells.len()).sum());
    for row in row_set.rows {
        let row_key = codec.decode(&row.key)?;
        for cell in row.cells {
            cells.push(Cell {
                row_key: row_key.clone(),
                column: codec.decode(&cell.column)?,
                timestamp: cell.timestamp,
                value: codec.decode(&cell.value)?,
            });
        }
    }
    Ok(cells)
}
