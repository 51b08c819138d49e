//! Row codec between sparse worksheet cells and dense string rows.
//!
//! Worksheets only store the cells that exist, each tagged with its column.
//! [`decode_row`] fills the gaps with empty strings and resolves shared-string
//! references; [`encode_row`] turns a dense row back into literal text cells.

use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref CELL_REFERENCE_REGEX: Regex =
        Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").unwrap();
}

/// Zero-based position of a cell, displayed in `A1` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellReference {
    pub column: usize,
    pub row: usize,
}

impl CellReference {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// Parses an `A1`-style reference (absolute markers allowed).
    pub fn parse(reference: &str) -> Option<Self> {
        let captures = CELL_REFERENCE_REGEX.captures(reference.trim())?;
        let column = captures[1]
            .bytes()
            .map(|b| (b.to_ascii_uppercase() - b'A') as usize + 1)
            .fold(0usize, |acc, digit| acc * 26 + digit);
        let row = captures[2].parse::<usize>().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self::new(column - 1, row - 1))
    }

    /// Column letters for a zero-based column index (`0` → `A`, `26` → `AA`).
    pub fn column_name(column: usize) -> String {
        let mut letters = Vec::new();
        let mut n = column + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        letters.reverse();
        String::from_utf8(letters).unwrap_or_default()
    }
}

impl Display for CellReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", Self::column_name(self.column), self.row + 1)
    }
}

/// What a cell stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    /// A literal `<v>` payload.
    Value(String),

    /// A `t="s"` cell: the `<v>` payload is an index into the shared string table.
    SharedString(String),

    /// A cell without `<v>`: the concatenation of its `<t>` runs (inline strings).
    Text(String),
}

/// One stored cell of a worksheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Zero-based column position.
    pub column: usize,
    pub content: CellContent,
}

impl Cell {
    pub fn new(column: usize, content: CellContent) -> Self {
        Self { column, content }
    }

    /// Resolves the cell to its display text.
    ///
    /// A shared-string reference that cannot be resolved (no table, index not a
    /// number, index out of range) yields the raw stored text instead of failing.
    pub fn text(&self, shared_strings: Option<&[String]>) -> String {
        match &self.content {
            CellContent::Value(text) | CellContent::Text(text) => text.clone(),
            CellContent::SharedString(raw) => {
                let resolved = shared_strings.and_then(|table| {
                    raw.trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| table.get(index))
                });
                match resolved {
                    Some(text) => text.clone(),
                    None => {
                        debug!(raw = %raw, "unresolved shared string, using stored text");
                        raw.clone()
                    }
                }
            }
        }
    }
}

/// Expands a sparse row into one string per column, starting at column `A`.
pub fn decode_row(cells: &[Cell], shared_strings: Option<&[String]>) -> Vec<String> {
    let mut values = Vec::with_capacity(cells.last().map_or(0, |c| c.column + 1));
    for cell in cells {
        while values.len() < cell.column {
            values.push(String::new());
        }
        values.push(cell.text(shared_strings));
    }
    values
}

/// Turns a dense row into literal text cells, one per value.
pub fn encode_row<S: AsRef<str>>(values: &[S]) -> Vec<Cell> {
    values
        .iter()
        .enumerate()
        .map(|(column, value)| Cell::new(column, CellContent::Text(value.as_ref().to_string())))
        .collect()
}
