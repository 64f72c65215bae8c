//! Graphviz DOT writer

use super::filters::LabelFilters;
use crate::org::OrgModel;
use std::io::{self, Write};
use tracing::debug;

/// Name of the top-level graph
pub const GRAPH_NAME: &str = "orgchart";

const FONT_NAME: &str = "Helvetica";
const FONT_SIZE: u32 = 10;
const NODE_SHAPE: &str = "box";

/// Writes an [`OrgModel`] as a strict directed Graphviz graph.
///
/// Layout of the document:
/// - header with global font and node styling
/// - one `subgraph cluster_<slug>` per department, one node per member
/// - one `"manager" -> { "report" ... }` statement per manager
///
/// Nodes are identified by their two-line label, so the same person is the
/// same node in a cluster and on either end of an edge. Output depends only
/// on the model, which makes it byte-for-byte reproducible.
#[derive(Debug, Clone, Default)]
pub struct ChartRenderer {
    filters: LabelFilters,
}

impl ChartRenderer {
    /// Create a renderer with the standard filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with custom filters
    pub fn with_filters(filters: LabelFilters) -> Self {
        Self { filters }
    }

    /// Stream the chart into `out`.
    ///
    /// Errors come only from the writer and are returned untouched.
    pub fn render<W: Write + ?Sized>(&self, model: &OrgModel, out: &mut W) -> io::Result<()> {
        self.write_header(out)?;

        for (department, members) in model.departments() {
            writeln!(out)?;
            writeln!(out, "  subgraph cluster_{} {{", (self.filters.slug)(department))?;
            writeln!(out, "    label = {};", quote(department))?;
            for identifier in members {
                writeln!(out, "    {};", self.node(model, identifier))?;
            }
            writeln!(out, "  }}")?;
        }

        for (manager, reports) in model.edge_groups() {
            writeln!(out)?;
            writeln!(out, "  {} -> {{", self.node(model, manager))?;
            for identifier in reports {
                writeln!(out, "    {}", self.node(model, identifier))?;
            }
            writeln!(out, "  }}")?;
        }

        writeln!(out, "}}")?;
        out.flush()?;

        debug!(
            "Rendered {} clusters and {} edge groups",
            model.department_count(),
            model.edge_group_count()
        );
        Ok(())
    }

    /// Render into an in-memory string
    pub fn render_to_string(&self, model: &OrgModel) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.render(model, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn write_header<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "strict digraph {} {{", GRAPH_NAME)?;
        writeln!(out, "  fontsize = {};", FONT_SIZE)?;
        writeln!(out, "  fontname = {};", quote(FONT_NAME))?;
        writeln!(out, "  node [")?;
        writeln!(out, "    shape = {},", NODE_SHAPE)?;
        writeln!(out, "    fontname = {},", quote(FONT_NAME))?;
        writeln!(out, "    fontsize = {}", FONT_SIZE)?;
        writeln!(out, "  ];")
    }

    fn node(&self, model: &OrgModel, identifier: &str) -> String {
        quote(&(self.filters.name_and_title)(model, identifier))
    }
}

/// Quote a value as a DOT string literal; newlines become `\n` line breaks.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
