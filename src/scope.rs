//! Restricts which entries, value languages and comment languages take part
//! in an export or import.

use crate::types::{CultureKey, ResourceEntity, ResourceTableEntry};

/// An entry together with the entity that owns it.
#[derive(Debug, Clone, Copy)]
pub struct ScopedEntry<'a> {
    pub entity: &'a ResourceEntity,
    pub entry: &'a ResourceTableEntry,
}

impl ScopedEntry<'_> {
    /// Whether this entry is owned by `entity` (identity, not equality).
    pub fn belongs_to(&self, entity: &ResourceEntity) -> bool {
        std::ptr::eq(self.entity, entity)
    }
}

/// A read-only selection over a resource set, built for one call and then dropped.
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    entries: Vec<ScopedEntry<'a>>,
    languages: Vec<CultureKey>,
    comments: Vec<CultureKey>,
}

impl<'a> Scope<'a> {
    pub fn new(
        entries: Vec<ScopedEntry<'a>>,
        languages: Vec<CultureKey>,
        comments: Vec<CultureKey>,
    ) -> Self {
        Self {
            entries,
            languages,
            comments,
        }
    }

    /// Every entry of every entity; all known languages for both values and comments.
    pub fn full(entities: &'a [ResourceEntity]) -> Self {
        let languages = all_languages(entities);
        Self {
            entries: entities
                .iter()
                .flat_map(|entity| {
                    entity
                        .entries
                        .iter()
                        .map(move |entry| ScopedEntry { entity, entry })
                })
                .collect(),
            comments: languages.clone(),
            languages,
        }
    }

    /// Every entry of a single entity, with that entity's languages.
    pub fn for_entity(entity: &'a ResourceEntity) -> Self {
        Self {
            entries: entity
                .entries
                .iter()
                .map(|entry| ScopedEntry { entity, entry })
                .collect(),
            languages: entity.languages.clone(),
            comments: entity.languages.clone(),
        }
    }

    pub fn with_languages(mut self, languages: Vec<CultureKey>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_comments(mut self, comments: Vec<CultureKey>) -> Self {
        self.comments = comments;
        self
    }

    /// Keeps only the entries matching `predicate`.
    pub fn retain_entries<F>(mut self, mut predicate: F) -> Self
    where
        F: FnMut(&ScopedEntry<'a>) -> bool,
    {
        self.entries.retain(|entry| predicate(entry));
        self
    }

    pub fn entries(&self) -> &[ScopedEntry<'a>] {
        &self.entries
    }

    /// Cultures whose values participate.
    pub fn languages(&self) -> &[CultureKey] {
        &self.languages
    }

    /// Cultures whose comments participate.
    pub fn comments(&self) -> &[CultureKey] {
        &self.comments
    }

    pub fn includes_value(&self, culture: &CultureKey) -> bool {
        self.languages.contains(culture)
    }

    pub fn includes_comment(&self, culture: &CultureKey) -> bool {
        self.comments.contains(culture)
    }

    /// Whether at least one scoped entry belongs to `entity`.
    pub fn contains_entity(&self, entity: &ResourceEntity) -> bool {
        self.entries.iter().any(|e| e.belongs_to(entity))
    }

    /// Scoped entries of `entity`, in scope order.
    pub fn entries_of<'s>(
        &'s self,
        entity: &'s ResourceEntity,
    ) -> impl Iterator<Item = &'a ResourceTableEntry> + 's {
        self.entries
            .iter()
            .filter(move |e| e.belongs_to(entity))
            .map(|e| e.entry)
    }

    /// Value languages followed by comment-only languages, without duplicates.
    pub fn column_languages(&self) -> Vec<CultureKey> {
        let mut languages: Vec<CultureKey> = Vec::new();
        for culture in self.languages.iter().chain(&self.comments) {
            if !languages.contains(culture) {
                languages.push(culture.clone());
            }
        }
        languages
    }
}

/// Union of the languages of `entities`, in first-seen order.
pub fn all_languages(entities: &[ResourceEntity]) -> Vec<CultureKey> {
    let mut languages: Vec<CultureKey> = Vec::new();
    for culture in entities.iter().flat_map(|entity| &entity.languages) {
        if !languages.contains(culture) {
            languages.push(culture.clone());
        }
    }
    languages
}
