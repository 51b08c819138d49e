//! Renders a resource set into a [`Workbook`] in either layout.

use tracing::debug;

use crate::{
    error::Error,
    layout::{KEY_COLUMN, SINGLE_SHEET_FIXED_COLUMNS, SheetLayout},
    naming::sheet_names,
    options::ExportOptions,
    scope::Scope,
    types::{CultureKey, LanguageColumn, ResourceEntity, ResourceTableEntry},
    workbook::{Sheet, Workbook},
};

/// Builds the workbook for `entities`, restricted to `scope` when one is given.
pub fn export_workbook(
    entities: &[ResourceEntity],
    scope: Option<&Scope<'_>>,
    options: &ExportOptions,
) -> Result<Workbook, Error> {
    let workbook = match options.layout {
        SheetLayout::SingleSheet => Workbook::new().with_sheet(single_sheet(
            entities,
            scope,
            &options.sheet_name,
        )),
        SheetLayout::MultipleSheets => multiple_sheets(entities, scope)?,
    };

    debug!(
        layout = %options.layout,
        sheets = workbook.sheets.len(),
        "exported workbook"
    );
    Ok(workbook)
}

/// Comment then value column per culture, each only when the scope includes it.
fn language_columns(languages: &[CultureKey], scope: Option<&Scope<'_>>) -> Vec<LanguageColumn> {
    let mut columns = Vec::with_capacity(languages.len() * 2);
    for culture in languages {
        if scope.is_none_or(|s| s.includes_comment(culture)) {
            columns.push(LanguageColumn::Comment(culture.clone()));
        }
        if scope.is_none_or(|s| s.includes_value(culture)) {
            columns.push(LanguageColumn::Value(culture.clone()));
        }
    }
    columns
}

fn column_text<'e>(entry: &'e ResourceTableEntry, column: &LanguageColumn) -> &'e str {
    match column {
        LanguageColumn::Comment(culture) => entry.comment(culture),
        LanguageColumn::Value(culture) => entry.value(culture),
    }
}

fn single_sheet(entities: &[ResourceEntity], scope: Option<&Scope<'_>>, name: &str) -> Sheet {
    let full;
    let scope = match scope {
        Some(scope) => scope,
        None => {
            full = Scope::full(entities);
            &full
        }
    };

    let columns = language_columns(&scope.column_languages(), Some(scope));

    let mut sheet = Sheet::new(name);
    let header: Vec<String> = SINGLE_SHEET_FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(columns.iter().map(LanguageColumn::header))
        .collect();
    sheet.push_row(&header);

    for scoped in scope.entries() {
        let row: Vec<&str> = [
            scoped.entity.project_name.as_str(),
            scoped.entity.unique_name.as_str(),
            scoped.entry.key.as_str(),
        ]
        .into_iter()
        .chain(columns.iter().map(|c| column_text(scoped.entry, c)))
        .collect();
        sheet.push_row(&row);
    }

    debug!(sheet = %sheet.name, rows = sheet.rows.len(), "exported single sheet");
    sheet
}

fn multiple_sheets(
    entities: &[ResourceEntity],
    scope: Option<&Scope<'_>>,
) -> Result<Workbook, Error> {
    let mut workbook = Workbook::new();

    // Names come from every entity so they match what import recomputes.
    for (entity, name) in sheet_names(entities)? {
        if scope.is_some_and(|s| !s.contains_entity(entity)) {
            continue;
        }

        let columns = language_columns(&entity.languages, scope);
        let mut sheet = Sheet::new(name);
        let header: Vec<String> = std::iter::once(KEY_COLUMN.to_string())
            .chain(columns.iter().map(LanguageColumn::header))
            .collect();
        sheet.push_row(&header);

        let entries: Vec<&ResourceTableEntry> = match scope {
            Some(scope) => scope.entries_of(entity).collect(),
            None => entity.entries.iter().collect(),
        };
        for entry in entries {
            let row: Vec<&str> = std::iter::once(entry.key.as_str())
                .chain(columns.iter().map(|c| column_text(entry, c)))
                .collect();
            sheet.push_row(&row);
        }

        debug!(sheet = %sheet.name, rows = sheet.rows.len(), "exported entity sheet");
        workbook.sheets.push(sheet);
    }

    Ok(workbook)
}
