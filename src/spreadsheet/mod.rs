//! # Spreadsheet Module
//!
//! In-memory workbook model used by the loader. A workbook is a list of named sheets;
//! each sheet is a sparse collection of rows, and each row a sparse collection of cells.
//! A missing row or cell is *absent*, which the loader treats differently from a blank cell.
//!
//! Workbooks are read from Office Open XML packages (`.xlsx`, `.xlsm`).

pub mod cell;
pub mod classify;
pub mod reference;
pub mod sheet;
mod xlsx;

use crate::error::LoaderError;
use crate::error::ResultMessage;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxReader;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Cannot detect spreadsheet format for '{0}'")]
    UnsupportedFormat(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    EmptyWorkbook(String),

    #[error("Missing workbook part '{0}'")]
    FileError(String),

    #[error("Invalid cell value in '{0}' at {1}!{2}: {3}")]
    CellValueError(String, String, String, String),
}

/// An immutable workbook: sheet names are unique and keep their workbook order.
#[derive(Clone, Debug, PartialEq)]
pub struct Workbook {
    /// File name the workbook was read from
    pub name: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Builds a workbook; a later sheet with an already used name is dropped.
    pub fn new(name: &str, sheets: Vec<Sheet>) -> Self {
        let mut unique: Vec<Sheet> = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            if !unique.iter().any(|it| it.name == sheet.name) {
                unique.push(sheet);
            }
        }
        Workbook {
            name: name.to_owned(),
            sheets: unique,
        }
    }

    /// Reads an XLSX package from memory
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Workbook, LoaderError> {
        XlsxReader::open(name, UnifiedReader::from(bytes))?.read()
    }

    /// Looks up a sheet by exact name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    pub fn first_sheet_name(&self) -> Option<&str> {
        self.sheets.first().map(|sheet| sheet.name.as_str())
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}

/// Opens a workbook file, detecting the format from its extension.
pub fn open_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook, LoaderError> {
    let path = path.as_ref();
    let name = path.file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_owned();
    let extension = path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => {
            let reader = UnifiedReader::open(path)
                .with_prefix(&format!("Open '{}' failed", path.display()))?;
            let workbook = XlsxReader::open(&name, reader)?.read()?;
            info!(file = %name, sheets = workbook.sheets.len(), "workbook opened");
            Ok(workbook)
        }
        _ => Err(SpreadsheetError::UnsupportedFormat(path.to_string_lossy().to_string()))?,
    }
}
