use crate::codec::ValueCodec;
use crate::error::{HBaseLinkError, Result};
use crate::models::{ScanOptions, ScanRequest, DEFAULT_BATCH_SIZE};

/// Reject options that can never produce a valid scanner.
pub(crate) fn validate_options(options: &ScanOptions) -> Result<()> {
    if options.table.trim().is_empty() {
        return Err(HBaseLinkError::MissingRequiredOption("table".into()));
    }
    // The name becomes a path segment; HBase names are [A-Za-z0-9_.-] with an optional namespace
    if let Some(c) = options.table.chars().find(|c| !is_table_name_char(*c)) {
        return Err(HBaseLinkError::ConfigurationError(format!(
            "table name '{}' contains invalid character '{}'",
            options.table, c
        )));
    }
    if options.batch_size == Some(0) {
        return Err(HBaseLinkError::ConfigurationError(
            "batch_size must be a positive integer".into(),
        ));
    }
    if options.max_versions == Some(0) {
        return Err(HBaseLinkError::ConfigurationError(
            "max_versions must be a positive integer".into(),
        ));
    }
    Ok(())
}

fn is_table_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

impl ScanRequest {
    /// Map scan options to the "create scanner" payload.
    ///
    /// Only options that are set are copied. Empty row bounds count as unset.
    pub fn build(options: &ScanOptions, codec: &ValueCodec) -> Result<Self> {
        validate_options(options)?;

        let start_row = match &options.start_row {
            Some(row) if !row.is_empty() => Some(codec.encode(row)?),
            _ => None,
        };
        let end_row = match &options.end_row {
            Some(row) if !row.is_empty() => Some(codec.encode(row)?),
            _ => None,
        };
        let column = match &options.columns {
            Some(selection) => Some(
                selection
                    .clone()
                    .into_list()
                    .iter()
                    .map(|c| codec.encode(c))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };
        let filter = match &options.filter {
            Some(filter) => Some(filter.to_wire_string(codec)?),
            None => None,
        };

        Ok(ScanRequest {
            batch: options.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            start_row,
            end_row,
            column,
            start_time: options.start_time,
            end_time: options.end_time,
            max_versions: options.max_versions,
            filter,
        })
    }
}
