//! Narrows a tag's values down to the ones that fit the parent values picked
//! so far.
//!
//! For example, once `continent` is set to "Asia", the `location` field should
//! only suggest locations scoped to Asia.

use std::collections::BTreeMap;
use std::future::Future;

use crate::{
    error::BirdLensError,
    models::tags::{Tag, ValueEntry},
};

use super::graph::TagGraph;

/// Parent tag name -> the value picked for it.
pub type ParentSelections = BTreeMap<String, String>;

/// Something that can answer "which values of this tag fit these parents?"
///
/// The database implements this. Tests can use a plain list of tags.
pub trait TagService {
    fn filtered_values(
        &self,
        tag_name: &str,
        parent_filters: &ParentSelections,
    ) -> impl Future<Output = Result<Vec<ValueEntry>, BirdLensError>> + Send;
}

/// Picks out the selections that matter for `tag_name`: those naming one of
/// its parents with a non-empty value.
pub fn active_parent_filters(
    graph: &TagGraph,
    tag_name: &str,
    selections: &ParentSelections,
) -> ParentSelections {
    graph
        .parents_of(tag_name)
        .filter_map(|parent| {
            selections
                .get(parent)
                .filter(|v| !v.is_empty())
                .map(|v| (parent.to_string(), v.clone()))
        })
        .collect()
}

/// Keeps the values whose `parent_info` matches every filter, in order.
///
/// With no filters, everything is kept.
pub fn filter_values<'a>(
    values: impl IntoIterator<Item = &'a ValueEntry>,
    parent_filters: &ParentSelections,
) -> Vec<ValueEntry> {
    values
        .into_iter()
        .filter(|v| parent_filters.is_empty() || v.matches_parents(parent_filters))
        .cloned()
        .collect()
}

/// Computes the suggestions for `tag`, given the parent values picked so far.
///
/// When none of the tag's parents have been picked, this returns the tag's
/// raw values without asking the service. Nothing is cached.
#[tracing::instrument(skip(service, graph, tag), fields(tag = %tag.name))]
pub async fn suggestions<S: TagService>(
    service: &S,
    graph: &TagGraph,
    tag: &Tag,
    selections: &ParentSelections,
) -> Result<Vec<ValueEntry>, BirdLensError> {
    let active = active_parent_filters(graph, &tag.name, selections);

    if active.is_empty() {
        tracing::trace!("no parents picked. returning all values.");
        return Ok(tag.values.clone());
    }

    tracing::debug!("filtering by parents: {active:?}");
    service
        .filtered_values(&tag.name, &active)
        .await
        .inspect_err(|e| tracing::warn!("failed to get filtered values! err: {e}"))
}
