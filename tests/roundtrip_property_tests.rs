use langsheet::naming::{MAX_SHEET_NAME_LENGTH, sheet_name_length, sheet_names};
use langsheet::{
    Codec, CultureKey, ExportOptions, ImportOptions, Parser, ResourceEntity, ResourceTableEntry,
    SheetLayout, Workbook,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

fn key_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,15}").expect("valid key regex")
}

fn text_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 _<>&'\"\\-\\.,!\\?äöüß]{0,30}")
        .expect("valid text regex")
}

fn name_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z][A-Za-z0-9𝒜😀]{0,24}").expect("valid name regex")
}

/// Per key: neutral value, German value, neutral comment.
type EntityData = BTreeMap<String, (String, String, String)>;

fn entity_strategy() -> impl Strategy<Value = (String, String, EntityData)> {
    (
        name_strategy(),
        name_strategy(),
        prop::collection::btree_map(
            key_strategy(),
            (text_strategy(), text_strategy(), text_strategy()),
            0..6,
        ),
    )
}

fn build_entities(data: &[(String, String, EntityData)]) -> Vec<ResourceEntity> {
    let neutral = CultureKey::neutral();
    let german = CultureKey::new("de").expect("valid culture");

    data.iter()
        .enumerate()
        .map(|(index, (project, base, entries))| {
            let mut entity = ResourceEntity::new(project.clone(), base.clone())
                .with_unique_name(format!("{base}/{index}"))
                .with_language(neutral.clone())
                .with_language(german.clone());
            for (key, (value, translation, comment)) in entries {
                entity = entity.with_entry(
                    ResourceTableEntry::new(key.clone())
                        .with_value(neutral.clone(), value.clone())
                        .with_value(german.clone(), translation.clone())
                        .with_comment(neutral.clone(), comment.clone()),
                );
            }
            entity
        })
        .collect()
}

fn roundtrip_changes(codec: &Codec, layout: SheetLayout) -> Result<usize, TestCaseError> {
    let tmp = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
    let path = tmp.path().join("roundtrip.xlsx");

    codec
        .export_excel_file(&path, None, &ExportOptions::new().with_layout(layout))
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    let changes = codec
        .import_excel_file(&path, &ImportOptions::new())
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    Ok(changes.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn single_sheet_roundtrip_proposes_no_changes(data in prop::collection::vec(entity_strategy(), 1..4)) {
        let codec = Codec::from_entities(build_entities(&data));
        prop_assert_eq!(roundtrip_changes(&codec, SheetLayout::SingleSheet)?, 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn multiple_sheets_roundtrip_proposes_no_changes(data in prop::collection::vec(entity_strategy(), 1..4)) {
        let codec = Codec::from_entities(build_entities(&data));
        prop_assert_eq!(roundtrip_changes(&codec, SheetLayout::MultipleSheets)?, 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sheet_names_are_unique_and_bounded(data in prop::collection::vec(entity_strategy(), 1..12)) {
        let entities = build_entities(&data);
        let named = sheet_names(&entities).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(named.len(), entities.len());

        let mut seen = HashSet::new();
        for (_, name) in &named {
            prop_assert!(sheet_name_length(name) <= MAX_SHEET_NAME_LENGTH);
            prop_assert!(seen.insert(name.to_lowercase()), "duplicate sheet name {}", name);
        }

        let workbook = Codec::from_entities(entities.clone())
            .export_workbook(None, &ExportOptions::new().with_layout(SheetLayout::MultipleSheets))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let bytes = workbook.to_bytes().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let reparsed = Workbook::from_bytes(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(reparsed, workbook);
    }
}
