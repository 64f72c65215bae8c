//! End-to-end chart generation
//!
//! query -> normalize -> build -> render. Only the query step touches the
//! network; everything after it is a synchronous pass over in-memory data.

use crate::directory::{
    normalize_entries, DirectoryResult, DirectorySource, RawEntry, Schema, SearchRequest,
    SearchScope,
};
use crate::org::{OrgModel, Record};
use crate::render::ChartRenderer;
use std::io::{self, Write};
use tracing::{info, warn};

/// Counts reported after a chart is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChartSummary {
    pub records: usize,
    pub departments: usize,
    pub edge_groups: usize,
}

/// Run the personnel search for `schema` under `base_dn`
pub async fn fetch_entries<D>(
    directory: &mut D,
    base_dn: &str,
    schema: Schema,
) -> DirectoryResult<Vec<RawEntry>>
where
    D: DirectorySource + ?Sized,
{
    let plan = schema.query_plan();
    let request = SearchRequest::new(base_dn, SearchScope::Subtree, plan.filter)
        .with_attributes(plan.attributes);

    info!("Searching {} as {} with {}", base_dn, schema, request.filter);
    let entries = directory.search(&request).await?;
    info!("Directory returned {} results", entries.len());
    Ok(entries)
}

/// Run the personnel search and normalize the results, in result order
pub async fn fetch_records<D>(
    directory: &mut D,
    base_dn: &str,
    schema: Schema,
) -> DirectoryResult<Vec<Record>>
where
    D: DirectorySource + ?Sized,
{
    let entries = fetch_entries(directory, base_dn, schema).await?;
    Ok(normalize_entries(entries).collect())
}

/// Build the org model and report anything suspicious in it
pub fn build_model(records: Vec<Record>) -> OrgModel {
    let model = OrgModel::from_records(records);

    for manager in model.dangling_managers() {
        warn!("Manager {} is not among the search results", manager);
    }
    for cycle in model.management_cycles() {
        warn!("Management cycle: {}", cycle.join(" -> "));
    }

    info!(
        "Org model: {} people, {} departments, {} managers",
        model.len(),
        model.department_count(),
        model.edge_group_count()
    );
    model
}

/// Render `model` into `out` with the standard renderer
pub fn render_chart<W: Write + ?Sized>(model: &OrgModel, out: &mut W) -> io::Result<()> {
    ChartRenderer::new().render(model, out)
}

/// Normalize, build and render in one pass
pub fn generate_chart<W: Write + ?Sized>(
    entries: Vec<RawEntry>,
    out: &mut W,
) -> io::Result<ChartSummary> {
    let records: Vec<Record> = normalize_entries(entries).collect();
    if records.is_empty() {
        warn!("No directory entries matched; the chart will be empty");
    }

    let model = build_model(records);
    render_chart(&model, out)?;

    Ok(ChartSummary {
        records: model.len(),
        departments: model.department_count(),
        edge_groups: model.edge_group_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::SnapshotDirectory;

    #[tokio::test]
    async fn test_fetch_entries_uses_schema_plan() {
        let mut directory = SnapshotDirectory::from_entries(vec![
            RawEntry::new("cn=a,dc=x").with_attribute("displayName", ["A"]),
            RawEntry::new("cn=b,dc=y").with_attribute("displayName", ["B"]),
        ]);

        let entries = fetch_entries(&mut directory, "dc=x", Schema::InetOrgPerson)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].dn.as_deref(), Some("cn=a,dc=x"));

        let records = fetch_records(&mut directory, "dc=y", Schema::ActiveDirectory)
            .await
            .unwrap();
        assert_eq!(records, vec![Record::new("cn=b,dc=y").with_display_name("B")]);
    }

    #[test]
    fn test_generate_chart_summary() {
        let entries = vec![
            RawEntry::new("cn=a")
                .with_attribute("displayName", ["Alice"])
                .with_attribute("title", ["Dev"])
                .with_attribute("department", ["Eng"])
                .with_attribute("manager", ["cn=b"]),
            RawEntry::marker(),
            RawEntry::new("cn=b")
                .with_attribute("displayName", ["Bob"])
                .with_attribute("title", ["Mgr"])
                .with_attribute("department", ["Eng"]),
        ];

        let mut out = Vec::new();
        let summary = generate_chart(entries, &mut out).unwrap();

        assert_eq!(
            summary,
            ChartSummary {
                records: 2,
                departments: 1,
                edge_groups: 1
            }
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("subgraph cluster_eng {"));
    }

    #[test]
    fn test_generate_chart_markers_only() {
        let mut out = Vec::new();
        let summary =
            generate_chart(vec![RawEntry::marker(), RawEntry::marker()], &mut out).unwrap();
        assert_eq!(summary, ChartSummary::default());
        assert!(String::from_utf8(out).unwrap().ends_with("];\n}\n"));
    }

    #[test]
    fn test_generate_chart_empty() {
        let mut out = Vec::new();
        let summary = generate_chart(Vec::new(), &mut out).unwrap();
        assert_eq!(summary, ChartSummary::default());
        assert!(String::from_utf8(out).unwrap().starts_with("strict digraph orgchart {"));
    }
}
