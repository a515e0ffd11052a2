//! Search utilities for BirdLens.
//!
//! [`criteria`] builds the request from form selections. [`query`] turns that
//! request into SQL for the photo table.

pub mod criteria;
pub mod query;

pub use criteria::{build_search, ActiveFilter, BuiltSearch, DateRange, FilterKind, SearchCriteria};
