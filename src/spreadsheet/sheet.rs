use crate::spreadsheet::cell::Cell;
use std::collections::BTreeMap;

/// A sparse row: column indexes without a cell are absent, which is not the same as a blank cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    cells: BTreeMap<usize, Cell>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell at a 0-based column, `None` when absent.
    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Index of the leftmost present cell.
    pub fn first_col(&self) -> Option<usize> {
        self.cells.keys().next().copied()
    }

    /// Index of the rightmost present cell.
    pub fn last_col(&self) -> Option<usize> {
        self.cells.keys().next_back().copied()
    }

    /// Number of present cells, blank cells included.
    pub fn physical_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().map(|(col, cell)| (*col, cell))
    }

    /// Indexes of the leftmost and rightmost cells that are not blank.
    pub fn filled_bounds(&self) -> Option<(usize, usize)> {
        let mut filled = self.cells()
            .filter(|(_, cell)| !matches!(cell, Cell::Blank))
            .map(|(col, _)| col);
        let first = filled.next()?;
        Some((first, filled.last().unwrap_or(first)))
    }

    pub fn insert(&mut self, col: usize, cell: Cell) {
        self.cells.insert(col, cell);
    }
}

impl FromIterator<(usize, Cell)> for Row {
    fn from_iter<I: IntoIterator<Item = (usize, Cell)>>(cells: I) -> Self {
        Row { cells: cells.into_iter().collect() }
    }
}

/// A named sheet holding a sparse sequence of rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    /// Sheet name
    pub name: String,
    rows: BTreeMap<usize, Row>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Sheet {
            name: name.to_owned(),
            rows: BTreeMap::new(),
        }
    }

    /// Returns true if the sheet contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first present row.
    pub fn first_row(&self) -> Option<usize> {
        self.rows.keys().next().copied()
    }

    /// Index of the last present row.
    pub fn last_row(&self) -> Option<usize> {
        self.rows.keys().next_back().copied()
    }

    /// Returns the row at a 0-based index, `None` when absent.
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Returns the cell at (row, col), `None` when either the row or the cell is absent.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.row(row).and_then(|row| row.cell(col))
    }

    /// Checks whether a row index lies within the observed first/last rows.
    pub fn contains_row(&self, index: usize) -> bool {
        match (self.first_row(), self.last_row()) {
            (Some(first), Some(last)) => first <= index && index <= last,
            _ => false,
        }
    }

    /// Inserts or replaces a row.
    pub fn push_row(&mut self, index: usize, row: Row) {
        self.rows.insert(index, row);
    }

    /// Adds a cell, creating its row when needed.
    pub fn push(&mut self, row: usize, col: usize, cell: Cell) {
        self.rows.entry(row).or_default().insert(col, cell);
    }
}
