//! Resolution of a cell to its effective runtime value.
//!
//! Formula cells are resolved by evaluating them through a [`FormulaEvaluator`]. Nothing is
//! cached between calls: schema inference and literal rendering each resolve the cell again.

use crate::spreadsheet::cell::format_number;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::Formula;
use crate::spreadsheet::cell::FormulaResult;
use crate::spreadsheet::cell::Number;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;

/// Effective kind of a cell after formula resolution
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Numeric { date_formatted: bool },
    Boolean,
    Text,
    Blank,
    Error,
    /// A formula whose result could not be obtained, or whose result kind is unsupported
    Unresolved,
}

/// Effective value of a cell, borrowing text from the workbook where possible
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue<'a> {
    Numeric(Number),
    Boolean(bool),
    Text(Cow<'a, str>),
    Blank,
    Error(Cow<'a, str>),
    Unresolved,
}

impl CellValue<'_> {
    pub fn kind(&self) -> ValueKind {
        match self {
            CellValue::Numeric(number) => ValueKind::Numeric {
                date_formatted: number.is_date_formatted(),
            },
            CellValue::Boolean(_) => ValueKind::Boolean,
            CellValue::Text(_) => ValueKind::Text,
            CellValue::Blank => ValueKind::Blank,
            CellValue::Error(_) => ValueKind::Error,
            CellValue::Unresolved => ValueKind::Unresolved,
        }
    }

    /// Text shown for the value, `None` for blank, error and unresolved values
    pub fn display_text(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Text(text) => Some(Cow::Borrowed(text.as_ref())),
            CellValue::Numeric(number) if number.is_date_formatted() => {
                number.to_date_string().map(Cow::Owned)
            }
            CellValue::Numeric(number) => Some(Cow::Owned(format_number(number.value))),
            CellValue::Boolean(value) => Some(Cow::Borrowed(if *value { "true" } else { "false" })),
            CellValue::Blank | CellValue::Error(_) | CellValue::Unresolved => None,
        }
    }
}

/// Evaluates formula cells.
/// Implementations should only produce numeric, text or boolean values; anything else is
/// treated as unresolved by the [`Classifier`].
pub trait FormulaEvaluator: Debug + Send + Sync {
    fn evaluate<'a>(&self, formula: &'a Formula) -> CellValue<'a>;
}

/// Uses the result stored with the formula by the application that last calculated it.
#[derive(Copy, Clone, Debug, Default)]
pub struct CachedResultEvaluator;

impl FormulaEvaluator for CachedResultEvaluator {
    fn evaluate<'a>(&self, formula: &'a Formula) -> CellValue<'a> {
        match &formula.cached {
            Some(FormulaResult::Numeric(number)) => CellValue::Numeric(*number),
            Some(FormulaResult::Text(text)) => CellValue::Text(Cow::Borrowed(text)),
            Some(FormulaResult::Boolean(value)) => CellValue::Boolean(*value),
            Some(FormulaResult::Error(_)) | None => CellValue::Unresolved,
        }
    }
}

/// Stateless cell classifier, cheap to clone and share.
#[derive(Clone, Debug)]
pub struct Classifier {
    evaluator: Arc<dyn FormulaEvaluator>,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(CachedResultEvaluator)
    }
}

impl Classifier {
    pub fn new<E: FormulaEvaluator + 'static>(evaluator: E) -> Self {
        Classifier {
            evaluator: Arc::new(evaluator),
        }
    }

    /// Resolves a cell to its effective value, evaluating formulas.
    pub fn resolve<'a>(&self, cell: &'a Cell) -> CellValue<'a> {
        match cell {
            Cell::Numeric(number) => CellValue::Numeric(*number),
            Cell::Boolean(value) => CellValue::Boolean(*value),
            Cell::Text(text) => CellValue::Text(Cow::Borrowed(text)),
            Cell::Blank => CellValue::Blank,
            Cell::Error(code) => CellValue::Error(Cow::Borrowed(code)),
            Cell::Formula(formula) => match self.evaluator.evaluate(formula) {
                value @ (CellValue::Numeric(_) | CellValue::Text(_) | CellValue::Boolean(_)) => value,
                _ => CellValue::Unresolved,
            },
        }
    }

    pub fn classify(&self, cell: &Cell) -> ValueKind {
        self.resolve(cell).kind()
    }
}
