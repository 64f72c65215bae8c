//! Attribute normalization
//!
//! Active Directory and inetOrgPerson name the same personnel attributes
//! differently. Entries are first renamed onto the inetOrgPerson vocabulary,
//! then the fields the org model needs are extracted. Nothing here fails:
//! missing or empty attributes become empty strings.

use super::{attribute_values, RawAttributes, RawEntry};
use crate::org::Record;
use tracing::trace;

/// Schema-variant attribute name -> canonical attribute name
pub const ATTRIBUTE_RENAMES: &[(&str, &str)] = &[
    ("department", "departmentNumber"),
    ("comment", "description"),
    ("company", "o"),
    ("employeeID", "employeeNumber"),
    ("thumbnailPhoto", "jpegPhoto"),
    ("streetaddress", "street"),
];

/// Canonical attribute names read into a [`Record`]
pub mod attr {
    pub const DISPLAY_NAME: &str = "displayName";
    pub const TITLE: &str = "title";
    pub const MANAGER: &str = "manager";
    pub const DEPARTMENT: &str = "departmentNumber";
}

/// Canonical name for a schema-variant attribute name
pub fn canonical_name(name: &str) -> Option<&'static str> {
    ATTRIBUTE_RENAMES
        .iter()
        .find(|(variant, _)| variant.eq_ignore_ascii_case(name))
        .map(|(_, canonical)| *canonical)
}

/// Rename schema-variant attributes to their canonical names.
///
/// A renamed attribute replaces a canonical one of the same name. Attributes
/// that are already canonical pass through unchanged.
pub fn canonicalize(attributes: RawAttributes) -> RawAttributes {
    let mut canonical = RawAttributes::with_capacity(attributes.len());
    let mut renamed = Vec::new();

    for (name, values) in attributes {
        match canonical_name(&name) {
            Some(target) => renamed.push((target, values)),
            None => {
                canonical.insert(name, values);
            }
        }
    }

    for (target, values) in renamed {
        canonical.retain(|name, _| !name.eq_ignore_ascii_case(target));
        canonical.insert(target.to_string(), values);
    }

    canonical
}

/// First value of an attribute decoded as UTF-8, or "" when absent
pub fn first_value(attributes: &RawAttributes, name: &str) -> String {
    attribute_values(attributes, name)
        .and_then(|values| values.first())
        .map(|value| String::from_utf8_lossy(value).into_owned())
        .unwrap_or_default()
}

/// Turn one directory entry into a canonical record
pub fn normalize(dn: impl Into<String>, attributes: RawAttributes) -> Record {
    let attributes = canonicalize(attributes);
    Record {
        identifier: dn.into(),
        display_name: first_value(&attributes, attr::DISPLAY_NAME),
        title: first_value(&attributes, attr::TITLE),
        department: first_value(&attributes, attr::DEPARTMENT),
        manager: first_value(&attributes, attr::MANAGER),
    }
}

/// Normalize a result set, skipping non-entry results
pub fn normalize_entries<I>(entries: I) -> impl Iterator<Item = Record>
where
    I: IntoIterator<Item = RawEntry>,
{
    entries.into_iter().filter_map(|entry| match entry.dn {
        Some(dn) => Some(normalize(dn, entry.attributes)),
        None => {
            trace!("Skipping non-entry search result");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> RawAttributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), vec![v.as_bytes().to_vec()]))
            .collect()
    }

    #[test]
    fn test_active_directory_names_are_renamed() {
        let canonical = canonicalize(attrs(&[
            ("displayName", "Alice"),
            ("company", "Example Corp"),
            ("department", "Eng"),
            ("employeeID", "42"),
        ]));

        assert_eq!(first_value(&canonical, "departmentNumber"), "Eng");
        assert_eq!(first_value(&canonical, "o"), "Example Corp");
        assert_eq!(first_value(&canonical, "employeeNumber"), "42");
        assert!(canonical.get("department").is_none());
        assert!(canonical.get("company").is_none());
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let canonical = attrs(&[
            ("displayName", "Bob"),
            ("title", "Mgr"),
            ("departmentNumber", "Ops"),
            ("o", "Example"),
        ]);

        assert_eq!(canonicalize(canonical.clone()), canonical);
        assert_eq!(canonicalize(canonicalize(canonical.clone())), canonical);
    }

    #[test]
    fn test_renamed_value_wins_over_canonical() {
        let canonical = canonicalize(attrs(&[("departmentNumber", "Old"), ("department", "New")]));
        assert_eq!(first_value(&canonical, "departmentNumber"), "New");
        assert_eq!(canonical.len(), 1);
    }

    #[test]
    fn test_rename_is_case_insensitive() {
        let canonical = canonicalize(attrs(&[("Department", "Eng"), ("streetAddress", "Main St")]));
        assert_eq!(first_value(&canonical, "departmentNumber"), "Eng");
        assert_eq!(first_value(&canonical, "street"), "Main St");
    }

    #[test]
    fn test_normalize_active_directory_entry() {
        let record = normalize(
            "CN=Alice,OU=Staff,DC=example,DC=com",
            attrs(&[
                ("displayName", "Alice"),
                ("title", "Dev"),
                ("department", "Eng"),
                ("manager", "CN=Bob,OU=Staff,DC=example,DC=com"),
            ]),
        );

        assert_eq!(
            record,
            Record::new("CN=Alice,OU=Staff,DC=example,DC=com")
                .with_display_name("Alice")
                .with_title("Dev")
                .with_department("Eng")
                .with_manager("CN=Bob,OU=Staff,DC=example,DC=com")
        );
    }

    #[test]
    fn test_missing_and_empty_attributes_degrade_to_empty() {
        let mut attributes = attrs(&[("displayName", "Carol")]);
        attributes.insert("title".to_string(), Vec::new());

        let record = normalize("cn=carol", attributes);
        assert_eq!(record.display_name, "Carol");
        assert_eq!(record.title, "");
        assert_eq!(record.department, "");
        assert_eq!(record.manager, "");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut attributes = RawAttributes::new();
        attributes.insert("displayName".to_string(), vec![vec![0x44, 0xff, 0x61]]);

        let record = normalize("cn=d", attributes);
        assert_eq!(record.display_name, "D\u{fffd}a");
    }

    #[test]
    fn test_only_first_value_is_used() {
        let mut attributes = RawAttributes::new();
        attributes.insert(
            "title".to_string(),
            vec![b"Primary".to_vec(), b"Secondary".to_vec()],
        );
        assert_eq!(normalize("cn=e", attributes).title, "Primary");
    }

    #[test]
    fn test_normalize_entries_skips_markers() {
        let entries = vec![
            RawEntry::new("cn=a").with_attribute("displayName", ["A"]),
            RawEntry::marker(),
            RawEntry::new("cn=b"),
        ];

        let ids: Vec<_> = normalize_entries(entries).map(|r| r.identifier).collect();
        assert_eq!(ids, vec!["cn=a", "cn=b"]);
    }
}
