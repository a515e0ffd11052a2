//! Checks a new tag value against the rest of the tag collection before it's
//! stored.

use crate::{
    error::TagError,
    models::tags::{Tag, ValueEntry},
};

use super::graph::TagGraph;

/// Makes sure `entry` can be added to the tag named `tag_name`.
///
/// When the value has `parent_info`, it must:
/// - name exactly one parent tag,
/// - not name `tag_name` itself,
/// - name a tag that exists, and a value that tag has,
/// - not make the tag graph cyclic.
pub fn check_value(tags: &[Tag], tag_name: &str, entry: &ValueEntry) -> Result<(), TagError> {
    if entry.value().trim().is_empty() {
        return Err(TagError::EmptyValue);
    }

    let Some(info) = entry.parent_info() else {
        return Ok(());
    };

    let (parent_tag, parent_value) = info.single().ok_or(TagError::ParentInfoArity(info.len()))?;

    if parent_tag == tag_name {
        return Err(TagError::SelfParent(tag_name.to_string()));
    }

    let parent = tags
        .iter()
        .find(|t| t.name == parent_tag)
        .ok_or_else(|| TagError::ParentNotFound(parent_tag.to_string()))?;

    if !parent.has_value(parent_value) {
        return Err(TagError::ParentValueNotFound {
            tag: parent_tag.to_string(),
            value: parent_value.to_string(),
        });
    }

    let graph = TagGraph::from_tags(tags);
    if graph.would_create_cycle(tag_name, parent_tag) {
        tracing::warn!("refusing `{tag_name}` -> `{parent_tag}`. it would make a cycle.");
        return Err(TagError::DependencyCycle {
            child: tag_name.to_string(),
            parent: parent_tag.to_string(),
        });
    }

    Ok(())
}

/// Makes sure no other tag's values still depend on `tag_name`.
pub fn check_tag_removal(tags: &[Tag], tag_name: &str) -> Result<(), TagError> {
    let graph = TagGraph::from_tags(tags);

    let result = match graph.children_of(tag_name).find(|child| *child != tag_name) {
        Some(child) => Err(TagError::StillReferenced {
            target: tag_name.to_string(),
            child: child.to_string(),
        }),
        None => Ok(()),
    };
    result
}

/// Makes sure no value anywhere is scoped to `value` of `tag_name`.
pub fn check_value_removal(tags: &[Tag], tag_name: &str, value: &str) -> Result<(), TagError> {
    let dependent = tags.iter().find(|t| {
        t.values
            .iter()
            .filter_map(ValueEntry::parent_info)
            .any(|info| info.get(tag_name) == Some(value))
    });

    match dependent {
        Some(child) => Err(TagError::StillReferenced {
            target: format!("{tag_name}: {value}"),
            child: child.name.clone(),
        }),
        None => Ok(()),
    }
}
