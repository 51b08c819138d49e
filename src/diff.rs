//! Table reconciliation: compares a string table against one entity.

use tracing::debug;

use crate::{
    error::Error,
    layout::KEY_COLUMN,
    traits::TableImporter,
    types::{ChangeField, CultureKey, EntryChange, LanguageColumn, ResourceEntity},
};

/// Default [`TableImporter`]: one change per cell that differs from the entity.
///
/// Keys the entity does not have yet produce changes without an original text
/// for every non-empty cell, so callers can decide whether to add them.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryTableImporter;

impl EntryTableImporter {
    pub fn new() -> Self {
        Self
    }
}

impl TableImporter for EntryTableImporter {
    fn import_table(
        &self,
        entity: &ResourceEntity,
        fixed_columns: &[&str],
        table: &[Vec<String>],
        languages: &[CultureKey],
        comment_languages: &[CultureKey],
    ) -> Result<Vec<EntryChange>, Error> {
        let Some((header, rows)) = table.split_first() else {
            return Ok(Vec::new());
        };

        if fixed_columns.is_empty() {
            return Err(Error::InvalidTable("no fixed columns given".to_string()));
        }
        let starts_with_fixed = header.len() >= fixed_columns.len()
            && header
                .iter()
                .zip(fixed_columns)
                .all(|(cell, fixed)| cell == fixed);
        if !starts_with_fixed {
            return Err(Error::InvalidTable(format!(
                "header {:?} does not start with {:?}",
                header, fixed_columns
            )));
        }

        let key_index = fixed_columns
            .iter()
            .position(|c| *c == KEY_COLUMN)
            .unwrap_or(0);

        let columns: Vec<(usize, LanguageColumn)> = header
            .iter()
            .enumerate()
            .skip(fixed_columns.len())
            .filter_map(|(index, name)| match LanguageColumn::parse(name) {
                Some(column) => Some((index, column)),
                None => {
                    debug!(column = %name, "ignoring unrecognized column");
                    None
                }
            })
            .filter(|(_, column)| match column {
                LanguageColumn::Value(culture) => languages.contains(culture),
                LanguageColumn::Comment(culture) => comment_languages.contains(culture),
            })
            .collect();

        let mut changes = Vec::new();
        for row in rows {
            let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or_default();

            let key = cell(key_index);
            if key.is_empty() {
                continue;
            }
            let entry = entity.find_entry(key);

            for (index, column) in &columns {
                let text = cell(*index);
                let (culture, field) = match column {
                    LanguageColumn::Value(culture) => (culture, ChangeField::Value),
                    LanguageColumn::Comment(culture) => (culture, ChangeField::Comment),
                };

                let original_text = match entry {
                    Some(entry) => {
                        let current = match field {
                            ChangeField::Value => entry.value(culture),
                            ChangeField::Comment => entry.comment(culture),
                        };
                        if current == text {
                            continue;
                        }
                        Some(current.to_string())
                    }
                    None if text.is_empty() => continue,
                    None => None,
                };

                changes.push(EntryChange {
                    project_name: entity.project_name.clone(),
                    unique_name: entity.unique_name.clone(),
                    key: key.to_string(),
                    culture: culture.clone(),
                    field,
                    original_text,
                    text: text.to_string(),
                });
            }
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceTableEntry;

    fn culture(name: &str) -> CultureKey {
        CultureKey::new(name).unwrap()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn entity() -> ResourceEntity {
        ResourceEntity::new("App", "Strings")
            .with_language(culture(""))
            .with_language(culture("de"))
            .with_entry(
                ResourceTableEntry::new("Greeting")
                    .with_value(culture(""), "Hello")
                    .with_value(culture("de"), "Hallo")
                    .with_comment(culture(""), "on start"),
            )
    }

    fn import(table: &[Vec<String>]) -> Result<Vec<EntryChange>, Error> {
        let all = vec![culture(""), culture("de")];
        EntryTableImporter::new().import_table(&entity(), &["Key"], table, &all, &all)
    }

    #[test]
    fn test_empty_table_has_no_changes() {
        assert!(import(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unchanged_table_has_no_changes() {
        let table = vec![
            row(&["Key", "Comment", "", "Comment.de", ".de"]),
            row(&["Greeting", "on start", "Hello", "", "Hallo"]),
        ];
        assert!(import(&table).unwrap().is_empty());
    }

    #[test]
    fn test_changed_value_and_comment() {
        let table = vec![
            row(&["Key", "Comment.de", ".de"]),
            row(&["Greeting", "formal", "Guten Tag"]),
        ];
        let changes = import(&table).unwrap();
        assert_eq!(changes.len(), 2);

        assert_eq!(changes[0].field, ChangeField::Comment);
        assert_eq!(changes[0].original_text.as_deref(), Some(""));
        assert_eq!(changes[0].text, "formal");

        assert_eq!(changes[1].field, ChangeField::Value);
        assert_eq!(changes[1].culture, culture("de"));
        assert_eq!(changes[1].original_text.as_deref(), Some("Hallo"));
        assert_eq!(changes[1].text, "Guten Tag");
        assert_eq!(changes[1].unique_name, "Strings");
    }

    #[test]
    fn test_missing_trailing_cells_read_as_empty() {
        let table = vec![row(&["Key", "", ".de"]), row(&["Greeting", "Hello"])];
        let changes = import(&table).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].culture, culture("de"));
        assert_eq!(changes[0].text, "");
    }

    #[test]
    fn test_unknown_key_proposes_non_empty_cells() {
        let table = vec![row(&["Key", "", ".de"]), row(&["Farewell", "Bye", ""])];
        let changes = import(&table).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, "Farewell");
        assert_eq!(changes[0].original_text, None);
        assert_eq!(changes[0].text, "Bye");
    }

    #[test]
    fn test_empty_keys_and_unknown_headers_are_ignored() {
        let table = vec![
            row(&["Key", "Remarks (internal)", ""]),
            row(&["", "x", "Something"]),
            row(&["Greeting", "y", "Hello"]),
        ];
        assert!(import(&table).unwrap().is_empty());
    }

    #[test]
    fn test_languages_filter_columns() {
        let table = vec![
            row(&["Key", "Comment", "", ".de"]),
            row(&["Greeting", "changed", "Hi", "Servus"]),
        ];
        let changes = EntryTableImporter::new()
            .import_table(&entity(), &["Key"], &table, &[culture("de")], &[])
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].text, "Servus");
    }

    #[test]
    fn test_header_must_start_with_fixed_columns() {
        let table = vec![row(&["Name", ""]), row(&["Greeting", "Hello"])];
        assert!(matches!(import(&table), Err(Error::InvalidTable(_))));
    }
}
