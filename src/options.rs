//! Options for exporting to and importing from workbooks.

use crate::{
    layout::SheetLayout,
    scope::{Scope, all_languages},
    types::{CultureKey, ResourceEntity},
};

/// Default name of the sheet written by the single-sheet layout.
pub const DEFAULT_SHEET_NAME: &str = "Resources";

/// Export behavior for [`crate::Codec`] and [`crate::export::export_workbook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Which layout to produce.
    pub layout: SheetLayout,
    /// Name of the one sheet in the single-sheet layout.
    pub sheet_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            layout: SheetLayout::default(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

impl ExportOptions {
    /// Creates default export options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the layout.
    pub fn with_layout(mut self, layout: SheetLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the single-sheet name.
    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }
}

/// Which languages an import compares. `None` means every language known to any entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportOptions {
    /// Cultures whose value columns are compared.
    pub languages: Option<Vec<CultureKey>>,
    /// Cultures whose comment columns are compared.
    pub comment_languages: Option<Vec<CultureKey>>,
}

impl ImportOptions {
    /// Creates default import options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_languages(mut self, languages: Option<Vec<CultureKey>>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_comment_languages(mut self, comment_languages: Option<Vec<CultureKey>>) -> Self {
        self.comment_languages = comment_languages;
        self
    }

    /// Copies the value and comment language sets of `scope`.
    pub fn from_scope(scope: &Scope<'_>) -> Self {
        Self {
            languages: Some(scope.languages().to_vec()),
            comment_languages: Some(scope.comments().to_vec()),
        }
    }

    /// Concrete `(languages, comment_languages)` for `entities`.
    pub fn resolve(&self, entities: &[ResourceEntity]) -> (Vec<CultureKey>, Vec<CultureKey>) {
        let known = || all_languages(entities);
        (
            self.languages.clone().unwrap_or_else(known),
            self.comment_languages.clone().unwrap_or_else(known),
        )
    }
}
