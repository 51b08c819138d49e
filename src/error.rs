//! All error types for the langsheet crate.
//!
//! These are returned from every fallible operation (workbook parsing, export, import, etc.).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown sheet layout `{0}`")]
    UnknownLayout(String),

    #[error("invalid workbook: {0}")]
    InvalidWorkbook(String),

    /// A package part inflates to more bytes than the reader accepts.
    #[error("workbook part `{part}` is too large: {size} bytes uncompressed (max {max})")]
    PartTooLarge { part: String, size: u64, max: u64 },

    #[error("invalid table: {0}")]
    InvalidTable(String),

    #[error("invalid culture `{0}`")]
    InvalidCulture(String),

    /// A sheet of a multi-sheet workbook does not belong to any current entity.
    #[error("import mapping error: sheet `{sheet}` does not match any resource file")]
    ImportMapping { sheet: String },

    #[error("failed to generate a unique sheet name for `{0}`")]
    SheetName(String),
}

impl Error {
    /// Creates a new invalid workbook error
    pub fn invalid_workbook(message: impl Into<String>) -> Self {
        Error::InvalidWorkbook(message.into())
    }

    /// Creates a new import mapping error for the given sheet name
    pub fn import_mapping(sheet: impl Into<String>) -> Self {
        Error::ImportMapping {
            sheet: sheet.into(),
        }
    }
}
