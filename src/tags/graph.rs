//! The dependency graph between tags.
//!
//! An edge `child -> parent` exists when any of `child`'s values carries
//! `parent_info` naming `parent`. The graph is rebuilt from the tag
//! collection whenever it's needed rather than kept in sync by hand.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::tags::Tag;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagGraph {
    /// tag name -> the tags it depends on
    parents: BTreeMap<String, BTreeSet<String>>,
}

impl TagGraph {
    /// Builds the graph from every tag's values.
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a Tag>) -> Self {
        let mut graph = Self::default();

        for tag in tags {
            let entry = graph.parents.entry(tag.name.clone()).or_default();
            entry.extend(tag.parent_tags().map(str::to_string));
        }

        graph
    }

    /// Records that `child` depends on `parent`.
    pub fn add_edge(&mut self, child: &str, parent: &str) {
        self.parents
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string());
        self.parents.entry(parent.to_string()).or_default();
    }

    /// Tags that `tag` directly depends on.
    pub fn parents_of(&self, tag: &str) -> impl Iterator<Item = &str> {
        self.parents
            .get(tag)
            .into_iter()
            .flat_map(|p| p.iter().map(String::as_str))
    }

    /// Tags that directly depend on `tag`.
    pub fn children_of<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.parents
            .iter()
            .filter(move |(_, parents)| parents.contains(tag))
            .map(|(child, _)| child.as_str())
    }

    /// Every tag that depends on `tag`, directly or through other tags.
    ///
    /// `tag` itself is never included, even when the graph has a cycle.
    pub fn descendants_of(&self, tag: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![tag.to_string()];

        while let Some(current) = stack.pop() {
            for child in self.children_of(&current) {
                if child != tag && seen.insert(child.to_string()) {
                    stack.push(child.to_string());
                }
            }
        }

        seen
    }

    /// Whether `ancestor` can be reached by following parent edges up from
    /// `tag`.
    pub fn depends_on(&self, tag: &str, ancestor: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack = vec![tag];

        while let Some(current) = stack.pop() {
            for parent in self.parents_of(current) {
                if parent == ancestor {
                    return true;
                }
                if seen.insert(parent) {
                    stack.push(parent);
                }
            }
        }

        false
    }

    /// Whether adding `child -> parent` would close a loop.
    pub fn would_create_cycle(&self, child: &str, parent: &str) -> bool {
        child == parent || self.depends_on(parent, child)
    }

    /// Finds one dependency cycle, if the graph has any. The returned path
    /// starts and ends on the same tag.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            graph: &'a TagGraph,
            tag: &'a str,
            marks: &mut BTreeMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            match marks.get(tag) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|t| *t == tag).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|t| t.to_string()).collect();
                    cycle.push(tag.to_string());
                    return Some(cycle);
                }
                None => (),
            }

            marks.insert(tag, Mark::Visiting);
            path.push(tag);
            for parent in graph.parents_of(tag) {
                if let Some(cycle) = visit(graph, parent, marks, path) {
                    return Some(cycle);
                }
            }
            path.pop();
            marks.insert(tag, Mark::Done);

            None
        }

        let mut marks = BTreeMap::new();
        for tag in self.parents.keys() {
            let mut path = Vec::new();
            if let Some(cycle) = visit(self, tag, &mut marks, &mut path) {
                return Some(cycle);
            }
        }

        None
    }

    /// All tag names in the graph.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }
}
