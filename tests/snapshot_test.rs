//! Saving search results and rendering from the saved copy

use orgchart::directory::{load_snapshot, save_snapshot_file};
use orgchart::*;
use tempfile::TempDir;

fn directory_entries() -> Vec<RawEntry> {
    vec![
        RawEntry::new("cn=Alice,ou=People,dc=example,dc=com")
            .with_attribute("displayName", ["Alice"])
            .with_attribute("title", ["Engineer"])
            .with_attribute("departmentNumber", ["R&D"])
            .with_attribute("manager", ["cn=Bob,ou=People,dc=example,dc=com"]),
        RawEntry::new("cn=Bob,ou=People,dc=example,dc=com")
            .with_attribute("displayName", ["Bob"])
            .with_attribute("title", ["Director"])
            .with_attribute("departmentNumber", ["R&D"]),
        RawEntry::new("cn=Eve,ou=Contractors,dc=other,dc=org")
            .with_attribute("displayName", ["Eve"])
            .with_attribute("title", ["Auditor"]),
    ]
}

#[tokio::test]
async fn test_snapshot_renders_same_chart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.json");
    save_snapshot_file(&path, &directory_entries()).unwrap();

    let mut live = Vec::new();
    generate_chart(directory_entries(), &mut live).unwrap();

    let mut replayed = Vec::new();
    let summary = generate_chart(load_snapshot(&path).unwrap(), &mut replayed).unwrap();

    assert_eq!(live, replayed);
    assert_eq!(summary.records, 3);
    assert_eq!(summary.departments, 1);
    assert_eq!(summary.edge_groups, 1);
}

#[tokio::test]
async fn test_snapshot_directory_honours_base() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.json");
    save_snapshot_file(&path, &directory_entries()).unwrap();

    let mut directory = SnapshotDirectory::open(&path).unwrap();
    let records = fetch_records(&mut directory, "DC=example,DC=com", Schema::InetOrgPerson)
        .await
        .unwrap();

    let names: Vec<_> = records.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    let model = build_model(records);
    let mut out = Vec::new();
    render_chart(&model, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("  subgraph cluster_r_d {\n    label = \"R&D\";"));
    assert!(!text.contains("Eve"));
}

#[test]
fn test_corrupt_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = load_snapshot(&path).unwrap_err();
    assert!(matches!(err, DirectoryError::Snapshot(_)));
}

#[test]
fn test_missing_snapshot() {
    let err = load_snapshot(std::path::Path::new("/nonexistent/people.json")).unwrap_err();
    assert!(matches!(err, DirectoryError::Io(_)));
}
