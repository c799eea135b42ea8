use crate::error::LoaderError;
use crate::spreadsheet::reference::col_to_index;
use regex::Regex;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Errors related to column range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid column range '{0}'")]
    FormatError(String),
}

/// An inclusive, non-empty 0-based index window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    /// First index (inclusive)
    pub from: usize,
    /// Last index (inclusive)
    pub to: usize,
}

impl Span {
    /// Creates a span, `None` when `from > to`.
    pub fn new(from: usize, to: usize) -> Option<Span> {
        (from <= to).then_some(Span { from, to })
    }

    pub fn width(&self) -> usize {
        self.to - self.from + 1
    }

    /// Checks the span is no wider than a declared field count.
    pub fn fits(&self, field_count: usize) -> bool {
        self.width() <= field_count
    }

    pub fn indexes(&self) -> RangeInclusive<usize> {
        self.from..=self.to
    }
}

/// Resolves optional requested bounds against hard bounds.
///
/// An absent bound takes the hard bound; a present one is clamped into `[lower, upper]`.
/// Returns `None` when nothing is left after clamping.
pub fn resolve(requested_from: Option<usize>, requested_to: Option<usize>, lower: usize, upper: usize) -> Option<Span> {
    let from = requested_from.map_or(lower, |from| from.max(lower));
    let to = requested_to.map_or(upper, |to| to.min(upper));
    Span::new(from, to)
}

impl TryFrom<&str> for Span {
    type Error = LoaderError;

    /// Parses a 1-based column range such as `4-6` or `D-F` into a 0-based span.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^\s*(\w+)\s*-\s*(\w+)\s*$").expect("Hardcode regex pattern");
        let error = || RangeError::FormatError(value.trim().to_owned());
        let captures = pattern.captures(value).ok_or_else(error)?;
        let from = captures.get(1).and_then(|matcher| parse_column(matcher.as_str())).ok_or_else(error)?;
        let to = captures.get(2).and_then(|matcher| parse_column(matcher.as_str())).ok_or_else(error)?;
        Ok(Span::new(from, to).ok_or_else(error)?)
    }
}

/// Parses a 1-based column number or column letters to a 0-based index.
fn parse_column(value: &str) -> Option<usize> {
    match value.parse::<usize>() {
        Ok(number) => number.checked_sub(1),
        Err(_) => col_to_index(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_bounds_take_hard_bounds() {
        assert_eq!(resolve(None, None, 2, 7), Some(Span { from: 2, to: 7 }));
    }

    #[test]
    fn present_bounds_are_clamped() {
        assert_eq!(resolve(Some(0), Some(9), 2, 7), Some(Span { from: 2, to: 7 }));
        assert_eq!(resolve(Some(3), Some(5), 2, 7), Some(Span { from: 3, to: 5 }));
        assert_eq!(resolve(Some(8), None, 2, 7), None);
        assert_eq!(resolve(Some(5), Some(4), 0, 10), None);
    }

    #[test]
    fn width_checks() {
        let span = Span::new(3, 5).unwrap();
        assert_eq!(span.width(), 3);
        assert!(span.fits(3));
        assert!(span.fits(4));
        assert!(!span.fits(2));
        assert_eq!(span.indexes().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn parse_column_ranges() {
        assert_eq!(Span::try_from("4-6").unwrap(), Span { from: 3, to: 5 });
        assert_eq!(Span::try_from(" D - F ").unwrap(), Span { from: 3, to: 5 });
        assert_eq!(Span::try_from("a-AA").unwrap(), Span { from: 0, to: 26 });
        assert!(Span::try_from("0-3").is_err());
        assert!(Span::try_from("6-4").is_err());
        assert!(Span::try_from("4").is_err());
        assert!(Span::try_from("A1-B2").is_err());
    }
}
