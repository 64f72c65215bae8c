//! orgchart
//!
//! Builds an organisational chart from directory personnel records and
//! writes it as a Graphviz DOT document.
//!
//! # Pipeline
//!
//! - `directory`: search an LDAP server (or a saved snapshot) and normalize
//!   Active Directory / inetOrgPerson attributes onto one vocabulary
//! - `org`: group people by department and link them to their managers
//! - `render`: one cluster per department, one edge statement per manager
//!
//! ## Example Usage
//!
//! ```rust
//! use orgchart::org::{OrgModel, Record};
//! use orgchart::render::ChartRenderer;
//!
//! let model = OrgModel::from_records(vec![
//!     Record::new("cn=a").with_manager("cn=b").with_department("Eng")
//!         .with_display_name("Alice").with_title("Dev"),
//!     Record::new("cn=b").with_department("Eng")
//!         .with_display_name("Bob").with_title("Mgr"),
//! ]);
//!
//! let dot = ChartRenderer::new().render_to_string(&model).unwrap();
//! assert!(dot.contains("subgraph cluster_eng {"));
//! assert!(dot.contains("\"Bob\\nMgr\" -> {"));
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod directory;
pub mod org;
pub mod pipeline;
pub mod render;

// Re-export main types for convenience
pub use config::{ChartConfig, ConfigError, ConfigResult, ConnectionConfig};

pub use directory::{
    DirectoryError, DirectoryResult, DirectorySource, LdapDirectory, RawEntry, Schema,
    SchemaError, SearchRequest, SearchScope, SnapshotDirectory,
};

pub use org::{OrgModel, OrgModelBuilder, Record};

pub use pipeline::{
    build_model, fetch_entries, fetch_records, generate_chart, render_chart, ChartSummary,
};

pub use render::{ChartRenderer, LabelFilters};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
