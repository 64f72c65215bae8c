//! In-memory org model
//!
//! The model is built in a single pass over the record stream and is
//! read-only afterwards:
//! - reports_of: manager -> ordered reports (edge groups)
//! - members_of: department -> ordered members (clusters)
//! - display_name_of / title_of: identifier -> lookup value
//! - department_of / manager_of: identifier -> current group key
//!
//! Group order and member order follow first appearance in the input. Field
//! values follow the last record seen for an identifier. A group emptied by
//! a re-keyed identifier stays in place (hidden) so that a later record
//! refilling it keeps its first-seen position.

use super::record::Record;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use tracing::debug;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Ordered, duplicate-free set of identifiers
pub type IdentifierSet = IndexSet<String, FxBuildHasher>;

/// Query-optimized organisation structure consumed by the renderer
#[derive(Debug, Clone, Default)]
pub struct OrgModel {
    reports_of: FxIndexMap<String, IdentifierSet>,
    members_of: FxIndexMap<String, IdentifierSet>,
    display_name_of: FxHashMap<String, String>,
    title_of: FxHashMap<String, String>,
    department_of: FxIndexMap<String, String>,
    manager_of: FxIndexMap<String, String>,
}

impl OrgModel {
    /// Build a model from records in directory result order
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut builder = OrgModelBuilder::new();
        builder.extend(records);
        builder.build()
    }

    /// Number of distinct identifiers seen
    pub fn len(&self) -> usize {
        self.display_name_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.display_name_of.is_empty()
    }

    /// Whether a record with this identifier was part of the input
    pub fn contains(&self, identifier: &str) -> bool {
        self.display_name_of.contains_key(identifier)
    }

    pub fn display_name_of(&self, identifier: &str) -> Option<&str> {
        self.display_name_of.get(identifier).map(String::as_str)
    }

    pub fn title_of(&self, identifier: &str) -> Option<&str> {
        self.title_of.get(identifier).map(String::as_str)
    }

    pub fn department_of(&self, identifier: &str) -> Option<&str> {
        self.department_of.get(identifier).map(String::as_str)
    }

    pub fn manager_of(&self, identifier: &str) -> Option<&str> {
        self.manager_of.get(identifier).map(String::as_str)
    }

    pub fn reports_of(&self, manager: &str) -> Option<&IdentifierSet> {
        self.reports_of.get(manager).filter(|reports| !reports.is_empty())
    }

    pub fn members_of(&self, department: &str) -> Option<&IdentifierSet> {
        self.members_of.get(department).filter(|members| !members.is_empty())
    }

    /// Departments with their members, in first-appearance order
    pub fn departments(&self) -> impl Iterator<Item = (&str, &IdentifierSet)> {
        non_empty(&self.members_of)
    }

    /// Managers with their direct reports, in first-appearance order
    pub fn edge_groups(&self) -> impl Iterator<Item = (&str, &IdentifierSet)> {
        non_empty(&self.reports_of)
    }

    pub fn department_count(&self) -> usize {
        self.departments().count()
    }

    pub fn edge_group_count(&self) -> usize {
        self.edge_groups().count()
    }

    /// Managers referenced by some record but absent from the input
    pub fn dangling_managers(&self) -> impl Iterator<Item = &str> {
        self.edge_groups()
            .map(|(mgr, _)| mgr)
            .filter(|mgr| !self.contains(mgr))
    }

    /// Every distinct cycle in the manager chains, self-loops included.
    ///
    /// Each cycle starts at the member whose manager was recorded first.
    /// This is a diagnostic; building and rendering accept cycles as-is.
    pub fn management_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited: FxHashSet<&str> = FxHashSet::default();

        for start in self.manager_of.keys() {
            if visited.contains(start.as_str()) {
                continue;
            }

            let mut path: Vec<&str> = Vec::new();
            let mut on_path: FxHashMap<&str, usize> = FxHashMap::default();
            let mut current = start.as_str();

            loop {
                if let Some(&pos) = on_path.get(current) {
                    let mut cycle: Vec<String> =
                        path[pos..].iter().map(|id| id.to_string()).collect();
                    let first = cycle
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, id)| self.manager_of.get_index_of(id.as_str()))
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                    cycle.rotate_left(first);
                    cycles.push(cycle);
                    break;
                }
                if visited.contains(current) {
                    break;
                }
                on_path.insert(current, path.len());
                path.push(current);
                match self.manager_of.get(current) {
                    Some(manager) => current = manager.as_str(),
                    None => break,
                }
            }

            visited.extend(path);
        }

        cycles
    }
}

/// Single-pass builder for [`OrgModel`]
#[derive(Debug, Default)]
pub struct OrgModelBuilder {
    model: OrgModel,
}

impl OrgModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record.
    ///
    /// A repeated identifier overwrites the earlier name, title, department
    /// and manager. It keeps its position in a group it stays in, and moves
    /// to the end of a group it joins.
    pub fn push(&mut self, record: Record) -> &mut Self {
        let Record {
            identifier,
            display_name,
            title,
            department,
            manager,
        } = record;

        if self.model.contains(&identifier) {
            debug!("Duplicate identifier {}, overwriting earlier fields", identifier);
        }

        self.model
            .display_name_of
            .insert(identifier.clone(), display_name);
        self.model.title_of.insert(identifier.clone(), title);

        // No cycle validation: self-management and longer manager cycles are
        // kept and rendered as ordinary edges.
        assign(
            &mut self.model.reports_of,
            &mut self.model.manager_of,
            &identifier,
            manager,
        );
        assign(
            &mut self.model.members_of,
            &mut self.model.department_of,
            &identifier,
            department,
        );

        self
    }

    pub fn extend<I>(&mut self, records: I) -> &mut Self
    where
        I: IntoIterator<Item = Record>,
    {
        for record in records {
            self.push(record);
        }
        self
    }

    pub fn build(self) -> OrgModel {
        self.model
    }
}

fn non_empty(
    groups: &FxIndexMap<String, IdentifierSet>,
) -> impl Iterator<Item = (&str, &IdentifierSet)> {
    groups
        .iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|(key, members)| (key.as_str(), members))
}

/// Place `identifier` in the group named `key` (no group when empty),
/// leaving any group it previously belonged to.
fn assign(
    groups: &mut FxIndexMap<String, IdentifierSet>,
    owner_of: &mut FxIndexMap<String, String>,
    identifier: &str,
    key: String,
) {
    let previous = owner_of.get(identifier).cloned();
    if previous.as_deref() == Some(key.as_str()) {
        return;
    }

    // An emptied group keeps its slot; readers skip it
    if let Some(previous) = previous {
        if let Some(members) = groups.get_mut(&previous) {
            members.shift_remove(identifier);
        }
    }

    if key.is_empty() {
        owner_of.shift_remove(identifier);
        return;
    }

    groups
        .entry(key.clone())
        .or_default()
        .insert(identifier.to_string());
    owner_of.insert(identifier.to_string(), key);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(set: &IdentifierSet) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    fn scenario() -> Vec<Record> {
        vec![
            Record::new("cn=a")
                .with_manager("cn=b")
                .with_department("Eng")
                .with_display_name("Alice")
                .with_title("Dev"),
            Record::new("cn=b")
                .with_department("Eng")
                .with_display_name("Bob")
                .with_title("Mgr"),
        ]
    }

    #[test]
    fn test_empty_input() {
        let model = OrgModel::from_records(Vec::new());
        assert!(model.is_empty());
        assert_eq!(model.department_count(), 0);
        assert_eq!(model.edge_group_count(), 0);
        assert!(model.management_cycles().is_empty());
    }

    #[test]
    fn test_scenario_grouping_and_hierarchy() {
        let model = OrgModel::from_records(scenario());

        let depts: Vec<_> = model.departments().map(|(d, _)| d).collect();
        assert_eq!(depts, vec!["Eng"]);
        assert_eq!(ids(model.members_of("Eng").unwrap()), vec!["cn=a", "cn=b"]);

        let groups: Vec<_> = model.edge_groups().map(|(m, _)| m).collect();
        assert_eq!(groups, vec!["cn=b"]);
        assert_eq!(ids(model.reports_of("cn=b").unwrap()), vec!["cn=a"]);

        assert_eq!(model.display_name_of("cn=a"), Some("Alice"));
        assert_eq!(model.title_of("cn=b"), Some("Mgr"));
        assert_eq!(model.department_of("cn=a"), Some("Eng"));
        assert_eq!(model.manager_of("cn=a"), Some("cn=b"));
        assert_eq!(model.manager_of("cn=b"), None);
    }

    #[test]
    fn test_record_without_manager_or_department() {
        let model = OrgModel::from_records(vec![Record::new("cn=loner").with_title("Hermit")]);
        assert!(model.contains("cn=loner"));
        assert_eq!(model.department_count(), 0);
        assert_eq!(model.edge_group_count(), 0);
        assert_eq!(model.department_of("cn=loner"), None);
    }

    #[test]
    fn test_many_reports_to_same_manager() {
        let records = (0..5).map(|i| Record::new(format!("cn={}", i)).with_manager("cn=boss"));
        let model = OrgModel::from_records(records);

        let reports = model.reports_of("cn=boss").unwrap();
        assert_eq!(ids(reports), vec!["cn=0", "cn=1", "cn=2", "cn=3", "cn=4"]);
    }

    #[test]
    fn test_duplicate_identifier_last_write_wins() {
        let model = OrgModel::from_records(vec![
            Record::new("cn=a").with_department("Eng").with_title("Dev"),
            Record::new("cn=b").with_department("Eng"),
            Record::new("cn=a").with_department("Eng").with_title("Lead"),
        ]);

        assert_eq!(model.len(), 2);
        assert_eq!(model.title_of("cn=a"), Some("Lead"));
        // Stays at its first-seen position, listed once
        assert_eq!(ids(model.members_of("Eng").unwrap()), vec!["cn=a", "cn=b"]);
    }

    #[test]
    fn test_duplicate_identifier_moves_group() {
        let model = OrgModel::from_records(vec![
            Record::new("cn=a").with_department("Eng").with_manager("cn=x"),
            Record::new("cn=a").with_department("Ops").with_manager("cn=y"),
        ]);

        assert!(model.members_of("Eng").is_none());
        assert_eq!(ids(model.members_of("Ops").unwrap()), vec!["cn=a"]);
        assert!(model.reports_of("cn=x").is_none());
        assert_eq!(ids(model.reports_of("cn=y").unwrap()), vec!["cn=a"]);
        assert_eq!(model.department_of("cn=a"), Some("Ops"));
    }

    #[test]
    fn test_refilled_group_keeps_first_seen_position() {
        let model = OrgModel::from_records(vec![
            Record::new("cn=a").with_department("Eng").with_manager("cn=x"),
            Record::new("cn=b").with_department("Ops").with_manager("cn=y"),
            Record::new("cn=a").with_department("Ops").with_manager("cn=y"),
            Record::new("cn=c").with_department("Eng").with_manager("cn=x"),
        ]);

        let depts: Vec<_> = model.departments().map(|(d, _)| d).collect();
        assert_eq!(depts, vec!["Eng", "Ops"]);
        assert_eq!(ids(model.members_of("Eng").unwrap()), vec!["cn=c"]);
        assert_eq!(ids(model.members_of("Ops").unwrap()), vec!["cn=b", "cn=a"]);

        let groups: Vec<_> = model.edge_groups().map(|(m, _)| m).collect();
        assert_eq!(groups, vec!["cn=x", "cn=y"]);
        assert_eq!(ids(model.reports_of("cn=x").unwrap()), vec!["cn=c"]);
    }

    #[test]
    fn test_emptied_groups_are_hidden() {
        let model = OrgModel::from_records(vec![
            Record::new("cn=a").with_department("Eng").with_manager("cn=ghost"),
            Record::new("cn=a").with_department("Ops"),
        ]);

        assert_eq!(model.department_count(), 1);
        assert_eq!(model.edge_group_count(), 0);
        assert_eq!(model.dangling_managers().count(), 0);
        assert!(model.members_of("Eng").is_none());
    }

    #[test]
    fn test_duplicate_identifier_drops_department() {
        let model = OrgModel::from_records(vec![
            Record::new("cn=a").with_department("Eng"),
            Record::new("cn=a"),
        ]);

        assert_eq!(model.department_count(), 0);
        assert_eq!(model.department_of("cn=a"), None);
    }

    #[test]
    fn test_dangling_manager() {
        let model = OrgModel::from_records(vec![Record::new("cn=a").with_manager("cn=ghost")]);

        assert_eq!(ids(model.reports_of("cn=ghost").unwrap()), vec!["cn=a"]);
        assert!(!model.contains("cn=ghost"));
        assert_eq!(model.dangling_managers().collect::<Vec<_>>(), vec!["cn=ghost"]);
    }

    #[test]
    fn test_self_management_is_kept() {
        let model = OrgModel::from_records(vec![Record::new("cn=ceo").with_manager("cn=ceo")]);

        assert_eq!(ids(model.reports_of("cn=ceo").unwrap()), vec!["cn=ceo"]);
        assert_eq!(model.management_cycles(), vec![vec!["cn=ceo".to_string()]]);
    }

    #[test]
    fn test_management_cycles() {
        let model = OrgModel::from_records(vec![
            Record::new("cn=x").with_manager("cn=a"),
            Record::new("cn=b").with_manager("cn=a"),
            Record::new("cn=a").with_manager("cn=b"),
            Record::new("cn=c").with_manager("cn=d"),
        ]);

        let cycles = model.management_cycles();
        assert_eq!(cycles, vec![vec!["cn=b".to_string(), "cn=a".to_string()]]);
        // Mutual edges are still present
        assert_eq!(ids(model.reports_of("cn=a").unwrap()), vec!["cn=x", "cn=b"]);
        assert_eq!(ids(model.reports_of("cn=b").unwrap()), vec!["cn=a"]);
    }

    #[test]
    fn test_acyclic_chain_has_no_cycles() {
        let model = OrgModel::from_records(vec![
            Record::new("cn=a").with_manager("cn=b"),
            Record::new("cn=b").with_manager("cn=c"),
            Record::new("cn=c"),
        ]);
        assert!(model.management_cycles().is_empty());
    }
}
