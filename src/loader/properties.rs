//! Delimited property strings describing which sheets go to which tables.
//!
//! Every list is positional: item *i* applies to sheet *i*, and a missing or blank item takes
//! the default for that sheet. Row numbers and column ranges are 1-based here and 0-based
//! everywhere else.

use crate::database::range::Span;
use crate::error::LoaderError;
use crate::loader::request::RowSelection;
use crate::loader::request::WriteRequest;
use crate::loader::request::DEFAULT_FIRST_DATA_ROW;
use crate::transliterate::field_name;
use crate::transliterate::Transliterate;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static COLUMN_RANGES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\w+\s*-\s*\w+\s*(,\s*\w+\s*-\s*\w+\s*)*$").expect("Hardcode regex pattern")
});

#[derive(Error, Debug)]
pub enum PropertyError {
    #[error("Sheet name list must not be empty")]
    NoSheets,

    #[error("Invalid row number '{0}'")]
    InvalidRowNumber(String),

    #[error("Invalid column range '{0}'")]
    InvalidColumnRange(String),

    #[error("Invalid batch size {0}")]
    InvalidBatchSize(usize),

    #[error("Sheet '{0}' needs a header row or field names")]
    MissingHeaderRow(String),

    #[error("Sheet '{0}': header row {1} must be above first data row {2}")]
    HeaderBelowData(String, usize, usize),
}

/// Raw property strings, as given on the command line or in a properties file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    /// Comma separated sheet names
    pub sheet_names: String,
    /// Comma separated table names
    pub table_names: String,
    /// Comma separated 1-based header row numbers
    pub header_rows: String,
    /// Comma separated 1-based first data row numbers
    pub first_data_rows: String,
    /// Comma separated 1-based last data row numbers
    pub last_data_rows: String,
    /// `;` separated groups of comma separated field names
    pub field_names: String,
    /// Comma separated 1-based column ranges such as `4-6` or `D-F`
    pub data_columns: String,
}

impl Properties {
    /// Builds one write request per sheet name.
    pub fn requests(&self, transliterator: &dyn Transliterate) -> Result<Vec<WriteRequest>, LoaderError> {
        let sheet_names = split_list(&self.sheet_names);
        if sheet_names.is_empty() {
            Err(PropertyError::NoSheets)?
        }
        let table_names = split_list(&self.table_names);
        let header_rows = parse_rows(&self.header_rows)?;
        let first_data_rows = parse_rows(&self.first_data_rows)?;
        let last_data_rows = parse_rows(&self.last_data_rows)?;
        let field_names: Vec<Vec<String>> = self.field_names
            .split(';')
            .map(|group| split_list(group).into_iter().filter(|name| !name.is_empty()).collect())
            .collect();
        let data_columns = parse_columns(&self.data_columns)?;

        let mut requests = Vec::with_capacity(sheet_names.len());
        for (index, sheet_name) in sheet_names.iter().enumerate() {
            let table_name = match table_names.get(index).filter(|name| !name.is_empty()) {
                Some(name) => name.to_owned(),
                None => field_name(transliterator, sheet_name),
            };
            let rows = RowSelection {
                header_row: header_rows.get(index).copied().flatten(),
                first_data_row: first_data_rows.get(index).copied().flatten().unwrap_or(DEFAULT_FIRST_DATA_ROW),
                last_data_row: last_data_rows.get(index).copied().flatten(),
            };
            requests.push(WriteRequest::new(
                sheet_name,
                &table_name,
                rows,
                field_names.get(index).cloned().unwrap_or_default(),
                data_columns.get(index).copied(),
            )?);
        }
        Ok(requests)
    }
}

/// Splits a comma separated list, trimming items; a blank string is an empty list.
fn split_list(value: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    value.split(',').map(|item| item.trim().to_owned()).collect()
}

/// Parses 1-based row numbers to 0-based indexes; blank items stay unset.
fn parse_rows(value: &str) -> Result<Vec<Option<usize>>, LoaderError> {
    split_list(value)
        .into_iter()
        .map(|item| {
            if item.is_empty() {
                return Ok(None);
            }
            match item.parse::<usize>() {
                Ok(number) if number > 0 => Ok(Some(number - 1)),
                _ => Err(PropertyError::InvalidRowNumber(item))?,
            }
        })
        .collect()
}

fn parse_columns(value: &str) -> Result<Vec<Span>, LoaderError> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    if !COLUMN_RANGES.is_match(value) {
        Err(PropertyError::InvalidColumnRange(value.trim().to_owned()))?
    }
    value
        .split(',')
        .map(|item| Span::try_from(item).map_err(|_| PropertyError::InvalidColumnRange(item.trim().to_owned()).into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transliterate::RussianLatin;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_per_sheet() {
        let properties = Properties {
            sheet_names: "Закупки, Sales 2024".to_owned(),
            ..Default::default()
        };
        let requests = properties.requests(&RussianLatin).unwrap();

        assert_eq!(requests, vec![
            WriteRequest {
                sheet_name: "Закупки".to_owned(),
                table_name: "Zakupki".to_owned(),
                header_row: Some(0),
                first_data_row: 1,
                last_data_row: None,
                field_names: vec![],
                columns: None,
            },
            WriteRequest {
                sheet_name: "Sales 2024".to_owned(),
                table_name: "Sales_2024".to_owned(),
                header_row: Some(0),
                first_data_row: 1,
                last_data_row: None,
                field_names: vec![],
                columns: None,
            },
        ]);
    }

    #[test]
    fn positional_lists() {
        let properties = Properties {
            sheet_names: "a,b,c".to_owned(),
            table_names: "t_a,,t_c".to_owned(),
            header_rows: "2".to_owned(),
            first_data_rows: "4, 3".to_owned(),
            last_data_rows: ",,10".to_owned(),
            field_names: "; id, name ;".to_owned(),
            data_columns: "1-3, D-E".to_owned(),
        };
        let requests = properties.requests(&RussianLatin).unwrap();

        assert_eq!(requests[0].table_name, "t_a");
        assert_eq!(requests[0].header_row, Some(1));
        assert_eq!(requests[0].first_data_row, 3);
        assert_eq!(requests[0].columns, Span::new(0, 2));

        assert_eq!(requests[1].table_name, "b");
        assert_eq!(requests[1].header_row, None);
        assert_eq!(requests[1].field_names, vec!["id".to_owned(), "name".to_owned()]);
        assert_eq!(requests[1].columns, Span::new(3, 4));

        assert_eq!(requests[2].header_row, Some(0));
        assert_eq!(requests[2].first_data_row, 1);
        assert_eq!(requests[2].last_data_row, Some(9));
        assert!(requests[2].field_names.is_empty());
        assert_eq!(requests[2].columns, None);
    }

    #[test]
    fn rejects_missing_sheets() {
        let error = Properties::default().requests(&RussianLatin).err().unwrap();
        assert!(matches!(error, LoaderError::PropertyError(PropertyError::NoSheets)));
    }

    #[test]
    fn rejects_bad_row_numbers() {
        for rows in ["0", "x", "-1"] {
            let properties = Properties {
                sheet_names: "a".to_owned(),
                first_data_rows: rows.to_owned(),
                ..Default::default()
            };
            let error = properties.requests(&RussianLatin).err().unwrap();
            assert!(matches!(error, LoaderError::PropertyError(PropertyError::InvalidRowNumber(_))), "{rows}");
        }
    }

    #[test]
    fn rejects_bad_column_ranges() {
        for columns in ["4", "4-6;8-9", "4-6,", "6-4", "0-2"] {
            let properties = Properties {
                sheet_names: "a".to_owned(),
                data_columns: columns.to_owned(),
                ..Default::default()
            };
            let error = properties.requests(&RussianLatin).err().unwrap();
            assert!(matches!(error, LoaderError::PropertyError(PropertyError::InvalidColumnRange(_))), "{columns}");
        }
    }
}
