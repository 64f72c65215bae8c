//! Chart rendering
//!
//! Walks an [`crate::org::OrgModel`] and emits a Graphviz DOT document:
//! one cluster per department, one edge statement per manager.

pub mod dot;
pub mod filters;

pub use dot::{quote, ChartRenderer, GRAPH_NAME};
pub use filters::{
    leading_component, name_and_title, resolve_name, resolve_title, slugify, LabelFilters,
    MISSING_TITLE,
};
