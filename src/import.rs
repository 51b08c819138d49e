//! Reads a [`Workbook`] back into per-entity tables and collects the changes
//! a [`TableImporter`] reports for them.

use tracing::{debug, warn};

use crate::{
    error::Error,
    layout::{KEY_COLUMN, SINGLE_SHEET_FIXED_COLUMNS, SheetLayout, detect_layout},
    naming::{find_entity, sheet_names},
    traits::TableImporter,
    types::{CultureKey, EntryChange, ResourceEntity, eq_ignore_case},
    workbook::{Sheet, Workbook},
};

/// Number of leading single-sheet columns that locate the entity (`Project`, `File`).
const ENTITY_COLUMNS: usize = SINGLE_SHEET_FIXED_COLUMNS.len() - 1;

/// Compares `workbook` against `entities` and returns the proposed changes.
///
/// A workbook without sheets yields no changes. In the multiple-sheets layout
/// every sheet must belong to an entity, otherwise the whole import fails with
/// [`Error::ImportMapping`] before any table is compared.
pub fn import_workbook(
    entities: &[ResourceEntity],
    workbook: &Workbook,
    languages: &[CultureKey],
    comment_languages: &[CultureKey],
    importer: &dyn TableImporter,
) -> Result<Vec<EntryChange>, Error> {
    let Some(first_sheet) = workbook.sheets.first() else {
        debug!("workbook has no sheets");
        return Ok(Vec::new());
    };

    let layout = detect_layout(first_sheet.first_row(workbook.shared_strings()).as_deref());
    debug!(%layout, sheets = workbook.sheets.len(), "importing workbook");

    let changes = match layout {
        SheetLayout::SingleSheet => {
            if workbook.sheets.len() > 1 {
                debug!(
                    ignored = workbook.sheets.len() - 1,
                    "single-sheet layout, ignoring further sheets"
                );
            }
            import_single_sheet(
                entities,
                workbook,
                first_sheet,
                languages,
                comment_languages,
                importer,
            )?
        }
        SheetLayout::MultipleSheets => {
            import_multiple_sheets(entities, workbook, languages, comment_languages, importer)?
        }
    };

    debug!(changes = changes.len(), "import finished");
    Ok(changes)
}

/// Rows of one file within one project, stripped of the `Project`/`File` cells.
struct FileGroup {
    file: String,
    rows: Vec<Vec<String>>,
}

struct ProjectGroup {
    project: String,
    files: Vec<FileGroup>,
}

/// Groups data rows by project then file, both ignoring case, in first-seen order.
fn group_rows(rows: &[Vec<String>]) -> Vec<ProjectGroup> {
    let mut projects: Vec<ProjectGroup> = Vec::new();

    for row in rows {
        let project = row.first().map(String::as_str).unwrap_or_default();
        let file = row.get(1).map(String::as_str).unwrap_or_default();
        if project.is_empty() || file.is_empty() {
            continue;
        }

        let index = match projects
            .iter()
            .position(|g| eq_ignore_case(&g.project, project))
        {
            Some(index) => index,
            None => {
                projects.push(ProjectGroup {
                    project: project.to_string(),
                    files: Vec::new(),
                });
                projects.len() - 1
            }
        };
        let files = &mut projects[index].files;

        let index = match files.iter().position(|g| eq_ignore_case(&g.file, file)) {
            Some(index) => index,
            None => {
                files.push(FileGroup {
                    file: file.to_string(),
                    rows: Vec::new(),
                });
                files.len() - 1
            }
        };
        files[index]
            .rows
            .push(row.iter().skip(ENTITY_COLUMNS).cloned().collect());
    }

    projects
}

/// Entity of `project` whose unique name, or failing that base name, equals `file`.
fn resolve_entity<'a>(
    entities: &'a [ResourceEntity],
    project: &str,
    file: &str,
) -> Option<&'a ResourceEntity> {
    let in_project: Vec<&ResourceEntity> = entities
        .iter()
        .filter(|e| eq_ignore_case(&e.project_name, project))
        .collect();

    in_project
        .iter()
        .find(|e| eq_ignore_case(&e.unique_name, file))
        .or_else(|| in_project.iter().find(|e| eq_ignore_case(&e.base_name, file)))
        .copied()
}

fn import_single_sheet(
    entities: &[ResourceEntity],
    workbook: &Workbook,
    sheet: &Sheet,
    languages: &[CultureKey],
    comment_languages: &[CultureKey],
    importer: &dyn TableImporter,
) -> Result<Vec<EntryChange>, Error> {
    let table = workbook.table(sheet);
    let Some((header, rows)) = table.split_first() else {
        return Ok(Vec::new());
    };
    let language_header: Vec<String> = header.iter().skip(ENTITY_COLUMNS).cloned().collect();

    let mut changes = Vec::new();
    for project in group_rows(rows) {
        for group in project.files {
            let Some(entity) = resolve_entity(entities, &project.project, &group.file) else {
                warn!(
                    project = %project.project,
                    file = %group.file,
                    rows = group.rows.len(),
                    "no resource file matches, skipping rows"
                );
                continue;
            };

            let mut entity_table = Vec::with_capacity(group.rows.len() + 1);
            entity_table.push(language_header.clone());
            entity_table.extend(group.rows);

            changes.extend(importer.import_table(
                entity,
                &[KEY_COLUMN],
                &entity_table,
                languages,
                comment_languages,
            )?);
        }
    }

    Ok(changes)
}

fn import_multiple_sheets(
    entities: &[ResourceEntity],
    workbook: &Workbook,
    languages: &[CultureKey],
    comment_languages: &[CultureKey],
    importer: &dyn TableImporter,
) -> Result<Vec<EntryChange>, Error> {
    let named = sheet_names(entities)?;

    let mapped = workbook
        .sheets
        .iter()
        .map(|sheet| {
            find_entity(&named, &sheet.name)
                .map(|found| (found.entity, sheet))
                .ok_or_else(|| Error::import_mapping(&sheet.name))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut changes = Vec::new();
    for (entity, sheet) in mapped {
        let table = workbook.table(sheet);
        debug!(sheet = %sheet.name, rows = table.len(), "comparing sheet");
        changes.extend(importer.import_table(
            entity,
            &[KEY_COLUMN],
            &table,
            languages,
            comment_languages,
        )?);
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diff::EntryTableImporter,
        types::{ChangeField, ResourceTableEntry},
    };

    fn culture(name: &str) -> CultureKey {
        CultureKey::new(name).unwrap()
    }

    fn entities() -> Vec<ResourceEntity> {
        vec![
            ResourceEntity::new("App", "Strings")
                .with_unique_name("Properties/Strings")
                .with_language(culture(""))
                .with_language(culture("de"))
                .with_entry(
                    ResourceTableEntry::new("Greeting")
                        .with_value(culture(""), "Hello")
                        .with_value(culture("de"), "Hallo"),
                ),
            ResourceEntity::new("Lib", "Errors")
                .with_language(culture(""))
                .with_entry(ResourceTableEntry::new("Failed").with_value(culture(""), "Failed")),
        ]
    }

    fn import(entities: &[ResourceEntity], workbook: &Workbook) -> Result<Vec<EntryChange>, Error> {
        let all = vec![culture(""), culture("de")];
        import_workbook(entities, workbook, &all, &all, &EntryTableImporter)
    }

    fn single(rows: Vec<Vec<&str>>) -> Workbook {
        Workbook::new().with_sheet(Sheet::from_table("Resources", rows))
    }

    #[test]
    fn test_no_sheets_no_changes() {
        assert!(import(&entities(), &Workbook::new()).unwrap().is_empty());
    }

    #[test]
    fn test_single_sheet_changes() {
        let workbook = single(vec![
            vec!["Project", "File", "Key", "", ".de"],
            vec!["app", "properties/strings", "Greeting", "Hello", "Servus"],
            vec!["Lib", "Errors", "Failed", "Failed", ""],
        ]);
        let changes = import(&entities(), &workbook).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].unique_name, "Properties/Strings");
        assert_eq!(changes[0].field, ChangeField::Value);
        assert_eq!(changes[0].text, "Servus");
    }

    #[test]
    fn test_single_sheet_falls_back_to_base_name() {
        let workbook = single(vec![
            vec!["Project", "File", "Key", ".de"],
            vec!["App", "Strings", "Greeting", "Moin"],
        ]);
        let changes = import(&entities(), &workbook).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].project_name, "App");
        assert_eq!(changes[0].text, "Moin");
    }

    #[test]
    fn test_single_sheet_skips_unknown_and_empty_groups() {
        let workbook = single(vec![
            vec!["Project", "File", "Key", ".de"],
            vec!["Gone", "Strings", "Greeting", "Moin"],
            vec!["", "Strings", "Greeting", "Moin"],
            vec!["App", "", "Greeting", "Moin"],
        ]);
        assert!(import(&entities(), &workbook).unwrap().is_empty());
    }

    #[test]
    fn test_group_rows_orders_by_project_then_file() {
        let rows = vec![
            vec!["P1".to_string(), "F1".to_string(), "a".to_string()],
            vec!["P2".to_string(), "F1".to_string(), "b".to_string()],
            vec!["p1".to_string(), "F2".to_string(), "c".to_string()],
            vec!["P1".to_string(), "f1".to_string(), "d".to_string()],
        ];
        let groups = group_rows(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].project, "P1");
        assert_eq!(groups[0].files.len(), 2);
        assert_eq!(groups[0].files[0].rows, vec![vec!["a"], vec!["d"]]);
        assert_eq!(groups[0].files[1].file, "F2");
        assert_eq!(groups[1].files[0].rows, vec![vec!["b"]]);
    }

    #[test]
    fn test_multiple_sheets_changes() {
        let workbook = Workbook::new()
            .with_sheet(Sheet::from_table(
                "app|strings",
                vec![vec!["Key", ".de"], vec!["Greeting", "Tach"]],
            ))
            .with_sheet(Sheet::from_table(
                "Lib|Errors",
                vec![vec!["Key", ""], vec!["Failed", "Failed"]],
            ));
        let changes = import(&entities(), &workbook).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].text, "Tach");
    }

    #[test]
    fn test_unmapped_sheet_fails_whole_import() {
        let workbook = Workbook::new()
            .with_sheet(Sheet::from_table(
                "App|Strings",
                vec![vec!["Key", ".de"], vec!["Greeting", "Tach"]],
            ))
            .with_sheet(Sheet::from_table("Other|Strings", vec![vec!["Key"]]));
        let err = import(&entities(), &workbook).unwrap_err();
        assert!(matches!(err, Error::ImportMapping { sheet } if sheet == "Other|Strings"));
    }

    #[test]
    fn test_empty_first_sheet_is_multiple_sheets() {
        let workbook = Workbook::new().with_sheet(Sheet::new("Unknown"));
        assert!(matches!(
            import(&entities(), &workbook),
            Err(Error::ImportMapping { .. })
        ));
    }
}
