use crate::database::range::Span;
use crate::error::LoaderError;
use crate::loader::properties::PropertyError;

/// Default target schema
pub const DEFAULT_SCHEMA_NAME: &str = "public";
/// Default number of rows per insert statement
pub const DEFAULT_ROWS_PER_BATCH: usize = 1000;
/// Default first data row: the second spreadsheet row
pub const DEFAULT_FIRST_DATA_ROW: usize = 1;

/// Options shared by every write of a loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Target schema name, lower case
    pub schema_name: String,
    /// Truncate the table before inserting
    pub overwrite: bool,
    /// Rows rendered into one insert statement
    pub rows_per_batch: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            schema_name: DEFAULT_SCHEMA_NAME.to_owned(),
            overwrite: true,
            rows_per_batch: DEFAULT_ROWS_PER_BATCH,
        }
    }
}

impl LoaderConfig {
    /// A blank schema name keeps the default; a zero batch size is rejected.
    pub fn new(schema_name: &str, overwrite: bool, rows_per_batch: usize) -> Result<Self, LoaderError> {
        if rows_per_batch == 0 {
            Err(PropertyError::InvalidBatchSize(rows_per_batch))?
        }
        let schema_name = match schema_name.trim() {
            "" => DEFAULT_SCHEMA_NAME.to_owned(),
            name => name.to_lowercase(),
        };
        Ok(LoaderConfig {
            schema_name,
            overwrite,
            rows_per_batch,
        })
    }
}

/// Data rows of one request, all 0-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowSelection {
    /// Header row; defaults to the row above the first data row when field names are not given
    pub header_row: Option<usize>,
    pub first_data_row: usize,
    /// Last data row, the sheet's last row when absent
    pub last_data_row: Option<usize>,
}

impl Default for RowSelection {
    fn default() -> Self {
        RowSelection {
            header_row: None,
            first_data_row: DEFAULT_FIRST_DATA_ROW,
            last_data_row: None,
        }
    }
}

/// Everything needed to write one sheet into one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRequest {
    pub sheet_name: String,
    pub table_name: String,
    /// Header row; always present when `field_names` is empty
    pub header_row: Option<usize>,
    pub first_data_row: usize,
    pub last_data_row: Option<usize>,
    /// Explicit field names; empty means the header row names the columns
    pub field_names: Vec<String>,
    /// Sheet columns to load, bounded by the header row or the field names when absent
    pub columns: Option<Span>,
}

impl WriteRequest {
    pub fn new(
        sheet_name: &str,
        table_name: &str,
        rows: RowSelection,
        field_names: Vec<String>,
        columns: Option<Span>,
    ) -> Result<Self, LoaderError> {
        let header_row = match rows.header_row {
            Some(header_row) => Some(header_row),
            None if field_names.is_empty() => rows.first_data_row.checked_sub(1),
            None => None,
        };
        if field_names.is_empty() && header_row.is_none() {
            Err(PropertyError::MissingHeaderRow(sheet_name.to_owned()))?
        }
        if let Some(header_row) = header_row.filter(|header_row| *header_row >= rows.first_data_row) {
            Err(PropertyError::HeaderBelowData(sheet_name.to_owned(), header_row + 1, rows.first_data_row + 1))?
        }
        Ok(WriteRequest {
            sheet_name: sheet_name.to_owned(),
            table_name: table_name.to_owned(),
            header_row,
            first_data_row: rows.first_data_row,
            last_data_row: rows.last_data_row,
            field_names,
            columns,
        })
    }

    /// Header mode: no explicit field names were given.
    pub fn uses_header(&self) -> bool {
        self.field_names.is_empty()
    }
}
