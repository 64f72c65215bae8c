//! Organisation model
//!
//! Turns the flat, normalized record stream into department groupings and a
//! manager -> reports tree, plus per-identifier lookup tables.

pub mod model;
pub mod record;

pub use model::{IdentifierSet, OrgModel, OrgModelBuilder};
pub use record::Record;
