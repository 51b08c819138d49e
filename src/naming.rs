//! Sheet names for the multiple-sheets layout.
//!
//! Every entity gets one sheet named `Project|BaseName`. Excel limits sheet
//! names to 31 UTF-16 code units and treats them case-insensitively, so long or
//! colliding names are shortened and tagged with a `~N` suffix. Names depend on
//! processing order: the first entity claims the bare name and later ones get
//! suffixes. Export and import therefore run the same pass over the same
//! ordering.

use std::collections::HashSet;

use crate::{error::Error, types::ResourceEntity};

/// Maximum sheet name length accepted by Excel, in UTF-16 code units.
pub const MAX_SHEET_NAME_LENGTH: usize = 31;

const SHORT_NAME_SEPARATOR: char = '~';

/// Assigns unique sheet names, remembering every name handed out so far.
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_used(&self, name: &str) -> bool {
        self.used.contains(&name.to_lowercase())
    }

    /// Returns the sheet name for `project_name|base_name` and marks it as used.
    pub fn next_name(&mut self, project_name: &str, base_name: &str) -> Result<String, Error> {
        let name = format!("{}|{}", project_name, base_name);

        let name = if sheet_name_length(&name) > MAX_SHEET_NAME_LENGTH || self.is_used(&name) {
            (0..=u32::MAX)
                .filter_map(|i| short_name(&name, i))
                .find(|candidate| !self.is_used(candidate))
                .ok_or_else(|| Error::SheetName(name.clone()))?
        } else {
            name
        };

        self.used.insert(name.to_lowercase());
        Ok(name)
    }
}

/// Length of a sheet name as Excel counts it.
pub fn sheet_name_length(name: &str) -> usize {
    name.encode_utf16().count()
}

/// `name` cut down so that `name~i` fits into [`MAX_SHEET_NAME_LENGTH`].
///
/// Cuts only between characters, so a surrogate pair is never split.
fn short_name(name: &str, i: u32) -> Option<String> {
    let suffix = format!("{}{}", SHORT_NAME_SEPARATOR, i);
    let suffix_length = sheet_name_length(&suffix);
    if suffix_length >= MAX_SHEET_NAME_LENGTH {
        return None;
    }
    let budget = MAX_SHEET_NAME_LENGTH - suffix_length;

    let mut prefix = String::new();
    let mut used = 0;
    for c in name.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        prefix.push(c);
    }
    Some(prefix + &suffix)
}

/// An entity paired with the sheet it owns in the multiple-sheets layout.
#[derive(Debug, Clone, Copy)]
pub struct NamedEntity<'a> {
    pub entity: &'a ResourceEntity,
    pub sheet_name: &'a str,
}

/// Sheet names for `entities`, ordered by project name then base name.
///
/// The returned names line up with the sorted entity order, which is also the
/// order sheets are written in.
pub fn sheet_names(entities: &[ResourceEntity]) -> Result<Vec<(&ResourceEntity, String)>, Error> {
    let mut sorted: Vec<&ResourceEntity> = entities.iter().collect();
    sorted.sort_by(|a, b| {
        a.project_name
            .cmp(&b.project_name)
            .then_with(|| a.base_name.cmp(&b.base_name))
    });

    let mut namer = SheetNamer::new();
    sorted
        .into_iter()
        .map(|entity| {
            let name = namer.next_name(&entity.project_name, &entity.base_name)?;
            Ok((entity, name))
        })
        .collect()
}

/// Looks up the entity that owns `sheet_name`, ignoring case.
pub fn find_entity<'a>(
    named: &'a [(&'a ResourceEntity, String)],
    sheet_name: &str,
) -> Option<NamedEntity<'a>> {
    named
        .iter()
        .find(|(_, name)| crate::types::eq_ignore_case(name, sheet_name))
        .map(|(entity, name)| NamedEntity {
            entity: *entity,
            sheet_name: name.as_str(),
        })
}
