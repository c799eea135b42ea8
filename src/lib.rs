//! # Rusty Sheet Loader
//!
//! Loads tabular spreadsheet data into relational tables.
//!
//! ## Features
//!
//! - **Workbook reading**: Excel 2007+ workbooks (`.xlsx`, `.xlsm`) read into a sparse,
//!   immutable model that keeps absent rows and cells apart from blank ones
//! - **Schema inference**: column names from a header row or an explicit field list, column
//!   types from one sampled data row (`DOUBLE PRECISION`, `TIMESTAMP`, `BOOLEAN`, `TEXT`)
//! - **Formula cells**: classified and rendered by their evaluated result
//! - **Literal rendering**: every cell becomes a literal of its column's type, or `NULL`
//!   when the kinds do not match
//! - **Batched writes**: table creation, optional truncation and bounded `INSERT` batches,
//!   stopping at the first failure or at the first absent row
//! - **Name transliteration**: Russian sheet and header names become Latin identifiers
//!
//! ## Example
//!
//! ```no_run
//! use rusty_sheet_loader::{open_workbook, DuckDbSink, Loader, LoaderConfig, Properties};
//!
//! # fn main() -> Result<(), rusty_sheet_loader::LoaderError> {
//! let workbook = open_workbook("purchases.xlsx")?;
//! let sink = DuckDbSink::open(None)?;
//! let mut loader = Loader::new(workbook, sink, LoaderConfig::default());
//! let properties = Properties {
//!     sheet_names: "Purchases".to_owned(),
//!     ..Default::default()
//! };
//! let requests = properties.requests(loader.transliterator())?;
//! loader.write_all(&requests)?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod error;
mod helpers;
pub mod loader;
pub mod spreadsheet;
pub mod transliterate;

pub use crate::database::sink::DuckDbSink;
pub use crate::database::sink::Sink;
pub use crate::error::LoaderError;
pub use crate::loader::properties::Properties;
pub use crate::loader::request::LoaderConfig;
pub use crate::loader::request::RowSelection;
pub use crate::loader::request::WriteRequest;
pub use crate::loader::writer::WriteError;
pub use crate::loader::writer::WriteSummary;
pub use crate::loader::Loader;
pub use crate::spreadsheet::open_workbook;
pub use crate::spreadsheet::Workbook;
