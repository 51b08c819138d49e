//! Resource model types shared by the export and import engines.
//!
//! The engines only ever borrow these read-only; an import produces
//! [`EntryChange`] records instead of touching the entities.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// Prefix that turns a culture column token into a comment column header.
pub const COMMENT_HEADER_PREFIX: &str = "Comment";

/// Identifies a language/culture. The neutral (invariant) culture carries no identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CultureKey(Option<LanguageIdentifier>);

impl CultureKey {
    /// The neutral culture, i.e. the default resource file.
    pub const fn neutral() -> Self {
        CultureKey(None)
    }

    /// Parses a culture name; the empty string is the neutral culture.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Self::neutral());
        }
        name.parse::<LanguageIdentifier>()
            .map(|id| CultureKey(Some(id)))
            .map_err(|_| Error::InvalidCulture(name.to_string()))
    }

    pub fn is_neutral(&self) -> bool {
        self.0.is_none()
    }

    pub fn language_identifier(&self) -> Option<&LanguageIdentifier> {
        self.0.as_ref()
    }

    /// Token used in column headers: `""` for neutral, `".de"` otherwise.
    pub fn column_token(&self) -> String {
        match &self.0 {
            Some(id) => format!(".{}", id),
            None => String::new(),
        }
    }

    /// Inverse of [`CultureKey::column_token`]: `""` or `"."` followed by a culture name.
    pub fn from_column_token(token: &str) -> Result<Self, Error> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Self::neutral());
        }
        match token.strip_prefix('.') {
            Some(name) if !name.trim().is_empty() => Self::new(name),
            _ => Err(Error::InvalidCulture(token.to_string())),
        }
    }
}

impl Display for CultureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(id) => write!(f, "{}", id),
            None => Ok(()),
        }
    }
}

impl FromStr for CultureKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CultureKey::new(s)
    }
}

impl Serialize for CultureKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CultureKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        CultureKey::new(&name).map_err(serde::de::Error::custom)
    }
}

/// A language column of the tabular form: either the comments or the values of one culture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageColumn {
    Comment(CultureKey),
    Value(CultureKey),
}

impl LanguageColumn {
    pub fn culture(&self) -> &CultureKey {
        match self {
            LanguageColumn::Comment(culture) | LanguageColumn::Value(culture) => culture,
        }
    }

    pub fn header(&self) -> String {
        match self {
            LanguageColumn::Comment(culture) => {
                format!("{}{}", COMMENT_HEADER_PREFIX, culture.column_token())
            }
            LanguageColumn::Value(culture) => culture.column_token(),
        }
    }

    /// Classifies a header cell; `None` when it names no valid culture.
    pub fn parse(header: &str) -> Option<Self> {
        match header.strip_prefix(COMMENT_HEADER_PREFIX) {
            Some(token) => CultureKey::from_column_token(token)
                .ok()
                .map(LanguageColumn::Comment),
            None => CultureKey::from_column_token(header)
                .ok()
                .map(LanguageColumn::Value),
        }
    }
}

/// A logical resource group: one base resource file across all of its language variants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceEntity {
    pub project_name: String,

    pub base_name: String,

    /// Project-relative name, unique within the project (e.g. `"Properties/Resources"`).
    pub unique_name: String,

    /// Languages this entity has resource files for, in display order.
    #[serde(default)]
    pub languages: Vec<CultureKey>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub entries: Vec<ResourceTableEntry>,
}

impl ResourceEntity {
    /// Creates an entity whose unique name equals its base name.
    pub fn new(project_name: impl Into<String>, base_name: impl Into<String>) -> Self {
        let base_name = base_name.into();
        Self {
            project_name: project_name.into(),
            unique_name: base_name.clone(),
            base_name,
            languages: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn with_unique_name(mut self, unique_name: impl Into<String>) -> Self {
        self.unique_name = unique_name.into();
        self
    }

    pub fn with_language(mut self, culture: CultureKey) -> Self {
        self.add_language(culture);
        self
    }

    pub fn with_entry(mut self, entry: ResourceTableEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn add_language(&mut self, culture: CultureKey) {
        if !self.languages.contains(&culture) {
            self.languages.push(culture);
        }
    }

    pub fn find_entry(&self, key: &str) -> Option<&ResourceTableEntry> {
        self.entries.iter().find(|e| e.key == key)
    }
}

/// One key within an entity, with an optional value and comment per culture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceTableEntry {
    pub key: String,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    pub values: HashMap<CultureKey, String>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    pub comments: HashMap<CultureKey, String>,
}

impl ResourceTableEntry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: HashMap::new(),
            comments: HashMap::new(),
        }
    }

    pub fn with_value(mut self, culture: CultureKey, value: impl Into<String>) -> Self {
        self.values.insert(culture, value.into());
        self
    }

    pub fn with_comment(mut self, culture: CultureKey, comment: impl Into<String>) -> Self {
        self.comments.insert(culture, comment.into());
        self
    }

    /// The value for `culture`, or `""` when there is none.
    pub fn value(&self, culture: &CultureKey) -> &str {
        self.values.get(culture).map(String::as_str).unwrap_or_default()
    }

    /// The comment for `culture`, or `""` when there is none.
    pub fn comment(&self, culture: &CultureKey) -> &str {
        self.comments
            .get(culture)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Which part of an entry a change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeField {
    Value,
    Comment,
}

/// A proposed change to one field of one entry in one culture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntryChange {
    pub project_name: String,
    pub unique_name: String,
    pub key: String,
    pub culture: CultureKey,
    pub field: ChangeField,

    /// Current text, or `None` when the entity has no entry with this key yet.
    #[serde(default)]
    pub original_text: Option<String>,

    /// Text found in the workbook.
    pub text: String,
}

impl Display for EntryChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EntryChange {{ {}|{} {} [{}] {:?}: {:?} -> {:?} }}",
            self.project_name,
            self.unique_name,
            self.key,
            self.culture,
            self.field,
            self.original_text,
            self.text
        )
    }
}

/// Case-insensitive comparison used for project, file and sheet name lookups.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
