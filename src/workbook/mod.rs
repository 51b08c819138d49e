//! In-memory workbook model and its `.xlsx` package encoding.
//!
//! A [`Workbook`] is what the export engine produces and what the import
//! engine consumes. Reading or writing a file is a single [`Parser`] call that
//! owns the file handle for its whole duration.

pub mod cells;
mod package;

use std::io::{Read, Seek, Write};

use crate::{error::Error, traits::Parser};

pub use cells::{Cell, CellContent, CellReference, decode_row, encode_row};

/// One named table (tab) of a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,

    /// Rows in document order, each holding only the cells that are stored.
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Builds a sheet whose cells are all literal text, one per value.
    pub fn from_table<I, R, S>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            rows: rows.into_iter().map(|row| encode_row(row.as_ref())).collect(),
        }
    }

    pub fn push_row<S: AsRef<str>>(&mut self, values: &[S]) {
        self.rows.push(encode_row(values));
    }

    /// First row, decoded to dense strings.
    pub fn first_row(&self, shared_strings: Option<&[String]>) -> Option<Vec<String>> {
        self.rows.first().map(|cells| decode_row(cells, shared_strings))
    }

    /// All rows, decoded to dense strings.
    pub fn table(&self, shared_strings: Option<&[String]>) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|cells| decode_row(cells, shared_strings))
            .collect()
    }
}

/// A whole workbook: its sheets in file order plus the optional shared string table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub shared_strings: Option<Vec<String>>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn shared_strings(&self) -> Option<&[String]> {
        self.shared_strings.as_deref()
    }

    /// Decoded cells of `sheet`, resolved against this workbook's shared strings.
    pub fn table(&self, sheet: &Sheet) -> Vec<Vec<String>> {
        sheet.table(self.shared_strings())
    }

    pub fn find_sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

impl Parser for Workbook {
    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, Error> {
        package::read_package(reader)
    }

    fn to_writer<W: Write + Seek>(&self, writer: W) -> Result<(), Error> {
        package::write_package(self, writer)
    }
}
