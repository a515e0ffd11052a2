//! Represents tags in all their glory.

use std::collections::BTreeMap;

use crate::tags::codec;

/// The date-typed keys every photo carries. They're stored like tags, but
/// they're not listed as tags and can't be deleted.
pub const SYSTEM_TAGS: &[&str] = &["date_clicked", "date_uploaded"];

/// Whether this tag name is one of the built-in date fields.
pub fn is_system_tag(name: &str) -> bool {
    SYSTEM_TAGS.contains(&name)
}

/// Which value of another tag a value depends on.
///
/// On the wire, this is a map like `{"continent": "Asia"}`. A well-formed
/// one has exactly one entry, but we keep the map shape so malformed input
/// can be reported instead of silently dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ParentInfo(pub BTreeMap<String, String>);

impl ParentInfo {
    pub fn new(parent_tag: impl Into<String>, parent_value: impl Into<String>) -> Self {
        Self(BTreeMap::from([(parent_tag.into(), parent_value.into())]))
    }

    /// The single `(parent tag, parent value)` pair, if there's exactly one.
    pub fn single(&self) -> Option<(&str, &str)> {
        if self.0.len() != 1 {
            return None;
        }

        self.0.iter().next().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The value selected for the given parent tag.
    pub fn get(&self, parent_tag: &str) -> Option<&str> {
        self.0.get(parent_tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the tags this refers to.
    pub fn parent_tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// One selectable value for a tag.
///
/// Older values are bare strings. Newer ones are objects that may be scoped
/// to a parent tag's value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ValueEntry {
    Bare(String),
    Scoped {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_info: Option<ParentInfo>,
    },
}

impl ValueEntry {
    /// Makes a structured value. An empty `parent_info` counts as none.
    pub fn new(value: impl Into<String>, parent_info: Option<ParentInfo>) -> Self {
        Self::Scoped {
            value: value.into(),
            parent_info: parent_info.filter(|p| !p.is_empty()),
        }
    }

    /// A value that depends on `parent_tag` being set to `parent_value`.
    pub fn with_parent(
        value: impl Into<String>,
        parent_tag: impl Into<String>,
        parent_value: impl Into<String>,
    ) -> Self {
        Self::new(value, Some(ParentInfo::new(parent_tag, parent_value)))
    }

    pub fn value(&self) -> &str {
        match self {
            ValueEntry::Bare(v) => v,
            ValueEntry::Scoped { value, .. } => value,
        }
    }

    pub fn parent_info(&self) -> Option<&ParentInfo> {
        match self {
            ValueEntry::Bare(_) => None,
            ValueEntry::Scoped { parent_info, .. } => {
                parent_info.as_ref().filter(|p| !p.is_empty())
            }
        }
    }

    /// Checks this value against every `(parent tag, parent value)` filter.
    ///
    /// Values without parent info never match a non-empty filter set.
    pub fn matches_parents(&self, filters: &BTreeMap<String, String>) -> bool {
        match self.parent_info() {
            Some(info) => filters
                .iter()
                .all(|(tag, value)| info.get(tag) == Some(value.as_str())),
            None => filters.is_empty(),
        }
    }
}

impl From<&str> for ValueEntry {
    fn from(value: &str) -> Self {
        Self::Bare(value.to_string())
    }
}

/// A named facet (like species or location) with a set of values.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Tag {
    /// The normalized storage key, like `bird_family`. Unique among tags.
    pub name: String,

    /// Every value that can be picked for this tag.
    #[serde(default)]
    pub values: Vec<ValueEntry>,
}

impl Tag {
    /// Creates a tag from either a display label or a key. The name is
    /// always normalized.
    pub fn new(name: &str, values: Vec<ValueEntry>) -> Self {
        Self {
            name: codec::display_to_db_key(name.trim()),
            values,
        }
    }

    /// The label to show for this tag.
    pub fn display_name(&self) -> String {
        codec::db_key_to_display(&self.name)
    }

    /// Finds a value entry by its value string.
    pub fn find_value(&self, value: &str) -> Option<&ValueEntry> {
        self.values.iter().find(|v| v.value() == value)
    }

    pub fn has_value(&self, value: &str) -> bool {
        self.find_value(value).is_some()
    }

    /// All tags that any of this tag's values depend on.
    pub fn parent_tags(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter_map(ValueEntry::parent_info)
            .flat_map(ParentInfo::parent_tags)
    }
}
