//! Builds the structured search request from what someone picked in the
//! search form.

use std::collections::BTreeMap;
use std::fmt;

use crate::tags::codec;

/// A `start`/`end` pair of `YYYY-MM-DDTHH:MM` strings. Either side may be
/// empty, meaning "unbounded".
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Neither side is set.
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }

    /// Both sides are set and `start` comes after `end`.
    ///
    /// These aren't rejected. (the search just finds nothing)
    pub fn is_inverted(&self) -> bool {
        !self.start.is_empty() && !self.end.is_empty() && self.start > self.end
    }
}

/// What gets sent to the search endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchCriteria {
    /// Normalized tag key -> values to look for.
    #[serde(default)]
    pub filters: BTreeMap<String, Vec<String>>,

    /// Date field key (like `date_clicked`) -> range.
    #[serde(default)]
    pub date_ranges: BTreeMap<String, DateRange>,
}

impl SearchCriteria {
    /// No filters at all, so everything matches.
    pub fn is_empty(&self) -> bool {
        self.filters.values().all(Vec::is_empty) && self.date_ranges.values().all(DateRange::is_empty)
    }
}

/// What an active filter chip points at. Clearing a chip uses this.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterKind {
    /// A tag filter, by normalized key.
    Tag(String),
    /// The `start` side of a date range, by field key.
    DateStart(String),
    /// The `end` side of a date range, by field key.
    DateEnd(String),
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Tag(key) => write!(f, "{key}"),
            FilterKind::DateStart(field) => write!(f, "{field}_start"),
            FilterKind::DateEnd(field) => write!(f, "{field}_end"),
        }
    }
}

/// One applied-filter chip, like "Species: Sparrow".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveFilter {
    pub kind: FilterKind,
    pub label: String,
    pub value: String,
}

impl fmt::Display for ActiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// The result of building a search: the request itself, plus the chips to
/// show for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuiltSearch {
    pub criteria: SearchCriteria,
    pub active_filters: Vec<ActiveFilter>,
}

/// Builds the search request.
///
/// `selected` is keyed by display name ("Species"), and values with an empty
/// list are dropped. Date ranges are keyed by field and are only included
/// when at least one side is set. They're copied as-is, even when inverted.
#[tracing::instrument(level = "debug")]
pub fn build_search(
    selected: &BTreeMap<String, Vec<String>>,
    date_ranges: &BTreeMap<String, DateRange>,
) -> BuiltSearch {
    let filters: BTreeMap<String, Vec<String>> = selected
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(display, values)| (codec::display_to_db_key(display), values.clone()))
        .collect();

    let date_ranges: BTreeMap<String, DateRange> = date_ranges
        .iter()
        .filter(|(_, range)| !range.is_empty())
        .map(|(field, range)| {
            if range.is_inverted() {
                tracing::warn!(
                    "date range for `{field}` starts after it ends ({} > {}). passing it along anyway.",
                    range.start,
                    range.end
                );
            }
            (field.clone(), range.clone())
        })
        .collect();

    let mut active_filters: Vec<ActiveFilter> = filters
        .iter()
        .map(|(key, values)| ActiveFilter {
            kind: FilterKind::Tag(key.clone()),
            label: codec::db_key_to_display(key),
            value: values[0].clone(),
        })
        .collect();

    for (field, range) in &date_ranges {
        let display = codec::db_key_to_display(field);

        if !range.start.is_empty() {
            active_filters.push(ActiveFilter {
                kind: FilterKind::DateStart(field.clone()),
                label: format!("{display} From"),
                value: range.start.clone(),
            });
        }
        if !range.end.is_empty() {
            active_filters.push(ActiveFilter {
                kind: FilterKind::DateEnd(field.clone()),
                label: format!("{display} To"),
                value: range.end.clone(),
            });
        }
    }

    BuiltSearch {
        criteria: SearchCriteria {
            filters,
            date_ranges,
        },
        active_filters,
    }
}
