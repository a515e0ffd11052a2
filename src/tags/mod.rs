//! The tag taxonomy: key naming, the dependency graph between tags, and
//! dependent-value filtering.

pub mod codec;
pub mod filter;
pub mod graph;
pub mod rules;
