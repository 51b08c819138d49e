//! The two workbook layouts and detection of which one a workbook uses.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Fixed leading headers of the single-sheet layout.
pub const SINGLE_SHEET_FIXED_COLUMNS: [&str; 3] = ["Project", "File", "Key"];

/// Fixed leading header of every table handed to the table importer.
pub const KEY_COLUMN: &str = "Key";

/// How resources are laid out in a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetLayout {
    /// One sheet holding every entry, prefixed by project and file columns.
    #[default]
    SingleSheet,
    /// One sheet per resource entity.
    MultipleSheets,
}

impl Display for SheetLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetLayout::SingleSheet => write!(f, "single"),
            SheetLayout::MultipleSheets => write!(f, "multiple"),
        }
    }
}

impl FromStr for SheetLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "single-sheet" | "single_sheet" => Ok(SheetLayout::SingleSheet),
            "multiple" | "multiple-sheets" | "multiple_sheets" => Ok(SheetLayout::MultipleSheets),
            other => Err(Error::UnknownLayout(other.to_string())),
        }
    }
}

/// Classifies a workbook by the first row of its first sheet.
///
/// Only a row starting with exactly `Project`, `File`, `Key` selects the
/// single-sheet layout; anything else, including no row at all, is read as
/// one sheet per entity.
pub fn detect_layout<S: AsRef<str>>(first_row: Option<&[S]>) -> SheetLayout {
    let is_single_sheet = first_row.is_some_and(|row| {
        row.len() >= SINGLE_SHEET_FIXED_COLUMNS.len()
            && row
                .iter()
                .zip(SINGLE_SHEET_FIXED_COLUMNS)
                .all(|(cell, expected)| cell.as_ref() == expected)
    });

    if is_single_sheet {
        SheetLayout::SingleSheet
    } else {
        SheetLayout::MultipleSheets
    }
}
