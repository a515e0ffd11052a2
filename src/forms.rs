//! Form state for tagging photos and searching them.
//!
//! Forms never change in place. Every transition takes the current state and
//! returns the next one, so a caller can keep the old state around (for undo,
//! or to compare) without worrying about it shifting underneath them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    models::{photo::PhotoTags, tags::SYSTEM_TAGS},
    search::criteria::{build_search, BuiltSearch, DateRange, FilterKind},
    tags::{codec, filter::ParentSelections, graph::TagGraph},
};

/// The tag values picked in an upload or edit form, by normalized key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagForm {
    values: BTreeMap<String, String>,
}

impl TagForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an edit form from a photo's current tags.
    pub fn from_photo_tags(tags: &PhotoTags) -> Self {
        Self {
            values: tags
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn value(&self, tag: &str) -> Option<&str> {
        self.values.get(tag).map(String::as_str)
    }

    /// Sets `tag` to `value`. An empty value clears it.
    ///
    /// When the value actually changes, every tag that depends on `tag`
    /// (directly or further down) is cleared too, since whatever was picked
    /// there was scoped to the old value.
    pub fn with_value(&self, graph: &TagGraph, tag: &str, value: &str) -> Self {
        if self.value(tag).unwrap_or_default() == value {
            return self.clone();
        }

        let mut next = self.clone();
        if value.is_empty() {
            next.values.remove(tag);
        } else {
            next.values.insert(tag.to_string(), value.to_string());
        }

        for dependent in graph.descendants_of(tag) {
            if next.values.remove(&dependent).is_some() {
                tracing::debug!("cleared `{dependent}` because `{tag}` changed");
            }
        }

        next
    }

    /// Clears `tag` (and so, everything depending on it).
    pub fn cleared(&self, graph: &TagGraph, tag: &str) -> Self {
        self.with_value(graph, tag, "")
    }

    /// Everything picked so far, for feeding the dependent-value filter.
    pub fn parent_selections(&self) -> ParentSelections {
        self.values.clone()
    }

    /// A tag is locked while any tag it depends on hasn't been picked yet.
    pub fn is_locked(&self, graph: &TagGraph, tag: &str) -> bool {
        graph.parents_of(tag).any(|parent| self.value(parent).is_none())
    }

    /// The picked values, ready to be sent with an upload or edit.
    pub fn into_tags(self) -> PhotoTags {
        self.values
    }
}

/// The search form: tag filters by display name, plus the date ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchForm {
    selected: BTreeMap<String, Vec<String>>,
    date_ranges: BTreeMap<String, DateRange>,
}

impl Default for SearchForm {
    /// An empty form with a blank range for each date field.
    fn default() -> Self {
        Self {
            selected: BTreeMap::new(),
            date_ranges: SYSTEM_TAGS
                .iter()
                .map(|field| (field.to_string(), DateRange::default()))
                .collect(),
        }
    }
}

impl SearchForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks `value` for the tag shown as `display_name`. An empty value
    /// removes the filter.
    pub fn with_filter(&self, display_name: &str, value: &str) -> Self {
        let mut next = self.clone();
        if value.is_empty() {
            next.selected.remove(display_name);
        } else {
            next.selected
                .insert(display_name.to_string(), vec![value.to_string()]);
        }
        next
    }

    pub fn with_date_start(&self, field: &str, start: &str) -> Self {
        let mut next = self.clone();
        next.date_ranges.entry(field.to_string()).or_default().start = start.to_string();
        next
    }

    pub fn with_date_end(&self, field: &str, end: &str) -> Self {
        let mut next = self.clone();
        next.date_ranges.entry(field.to_string()).or_default().end = end.to_string();
        next
    }

    /// Removes whatever an active filter chip points at.
    pub fn without(&self, kind: &FilterKind) -> Self {
        let mut next = self.clone();
        match kind {
            FilterKind::Tag(key) => next
                .selected
                .retain(|display, _| codec::display_to_db_key(display) != *key),
            FilterKind::DateStart(field) => {
                if let Some(range) = next.date_ranges.get_mut(field) {
                    range.start.clear();
                }
            }
            FilterKind::DateEnd(field) => {
                if let Some(range) = next.date_ranges.get_mut(field) {
                    range.end.clear();
                }
            }
        }
        next
    }

    /// Back to an empty form.
    pub fn cleared(&self) -> Self {
        Self::default()
    }

    pub fn build(&self) -> BuiltSearch {
        build_search(&self.selected, &self.date_ranges)
    }
}

/// Hands out increasing tickets for autocomplete requests, so a response
/// that arrives after a newer request was started can be thrown away.
#[derive(Debug, Default)]
pub struct SuggestionSequence {
    latest: AtomicU64,
}

/// Marks one autocomplete request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SuggestionTicket(u64);

impl SuggestionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call this right before sending a request.
    pub fn begin(&self) -> SuggestionTicket {
        SuggestionTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no newer request has started since this ticket.
    pub fn is_current(&self, ticket: SuggestionTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Passes the response through only if its request is still the newest.
    pub fn accept<T>(&self, ticket: SuggestionTicket, response: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(response)
        } else {
            tracing::trace!("dropping stale suggestions for ticket {}", ticket.0);
            None
        }
    }
}
