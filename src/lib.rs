//! Localization resources to Excel and back.
//!
//! Exports a set of resource entities (keyed strings with per-language values
//! and comments) to an `.xlsx` workbook, either as one sheet holding every
//! entry or as one sheet per entity. Importing an edited workbook compares it
//! against the current entities and returns a list of [`EntryChange`]s; nothing
//! is applied to the entities.
//!
//! ```rust,no_run
//! use langsheet::{Codec, ExportOptions, ImportOptions, SheetLayout};
//!
//! let codec = Codec::load_from_file("entities.json")?;
//! let options = ExportOptions::new().with_layout(SheetLayout::MultipleSheets);
//! codec.export_excel_file("Resources.xlsx", None, &options)?;
//!
//! // ... the workbook is edited by translators ...
//!
//! for change in codec.import_excel_file("Resources.xlsx", &ImportOptions::new())? {
//!     println!("{change}");
//! }
//! Ok::<(), langsheet::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod codec;
pub mod diff;
pub mod error;
pub mod export;
pub mod import;
pub mod layout;
pub mod naming;
pub mod options;
pub mod scope;
pub mod traits;
pub mod types;
pub mod workbook;

// Re-export most used types for easy consumption
pub use crate::{
    codec::Codec,
    diff::EntryTableImporter,
    error::Error,
    layout::SheetLayout,
    options::{ExportOptions, ImportOptions},
    scope::{Scope, ScopedEntry},
    traits::{Parser, TableImporter},
    types::{ChangeField, CultureKey, EntryChange, ResourceEntity, ResourceTableEntry},
    workbook::{Sheet, Workbook},
};
