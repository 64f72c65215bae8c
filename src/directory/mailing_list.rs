//! Mailing-list membership
//!
//! Exchange dynamic distribution lists store a base DN and an LDAP filter
//! instead of a member list. Expanding a group therefore means running each
//! nested list's stored search, recursively, until only people remain.

use super::error::DirectoryResult;
use super::{DirectorySource, SearchRequest, SearchScope};
use crate::render::leading_component;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, warn};

pub const GROUP_FILTER: &str = "(objectclass=group)";
pub const DYNAMIC_LIST_FILTER: &str = "(objectclass=msExchDynamicDistributionList)";
pub const MEMBER_ATTR: &str = "member";
pub const DYNAMIC_BASE_ATTR: &str = "msExchDynamicDLBaseDN";
pub const DYNAMIC_FILTER_ATTR: &str = "msExchDynamicDLFilter";
const COMMON_NAME_ATTR: &str = "cn";

/// One resolved member of a mailing list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub dn: String,
    /// `None` when the DN has no entry in the directory
    pub common_name: Option<String>,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.common_name {
            Some(cn) => f.write_str(cn),
            None => write!(f, "DN {} not found", self.dn),
        }
    }
}

/// DNs of everyone on the list at `list_dn`, sorted and de-duplicated.
///
/// Returns `None` when `list_dn` is not a group entry.
pub async fn expand_members<D>(directory: &mut D, list_dn: &str) -> DirectoryResult<Option<Vec<String>>>
where
    D: DirectorySource + ?Sized,
{
    let groups = directory
        .search(
            &SearchRequest::new(list_dn, SearchScope::Base, GROUP_FILTER).with_attributes([MEMBER_ATTR]),
        )
        .await?;
    let groups: Vec<_> = groups.into_iter().filter(|g| g.is_entry()).collect();
    if groups.is_empty() {
        return Ok(None);
    }

    let mut pending: Vec<String> = groups
        .iter()
        .filter_map(|group| group.values(MEMBER_ATTR))
        .flatten()
        .map(|value| String::from_utf8_lossy(value).into_owned())
        .collect();

    let mut seen = HashSet::new();
    let mut members = BTreeSet::new();

    while let Some(dn) = pending.pop() {
        if !seen.insert(dn.to_ascii_lowercase()) {
            continue;
        }

        let lists = directory
            .search(
                &SearchRequest::new(&dn, SearchScope::Base, DYNAMIC_LIST_FILTER)
                    .with_attributes([DYNAMIC_BASE_ATTR, DYNAMIC_FILTER_ATTR]),
            )
            .await?;
        let lists: Vec<_> = lists.into_iter().filter(|l| l.is_entry()).collect();

        if lists.is_empty() {
            members.insert(dn);
            continue;
        }

        for list in lists {
            let (Some(base), Some(filter)) = (
                list.first_text(DYNAMIC_BASE_ATTR),
                list.first_text(DYNAMIC_FILTER_ATTR),
            ) else {
                warn!("Dynamic list {} has no base DN or filter, skipping", dn);
                continue;
            };

            debug!("Expanding dynamic list {} ({} under {})", dn, filter, base);
            let found = directory
                .search(&SearchRequest::new(base, SearchScope::Subtree, filter))
                .await?;
            pending.extend(found.into_iter().filter_map(|entry| entry.dn));
        }
    }

    Ok(Some(members.into_iter().collect()))
}

/// Look up the common name of each DN
pub async fn resolve_members<D>(directory: &mut D, dns: Vec<String>) -> DirectoryResult<Vec<Member>>
where
    D: DirectorySource + ?Sized,
{
    let mut members = Vec::with_capacity(dns.len());
    for dn in dns {
        let entries = directory
            .search(
                &SearchRequest::new(&dn, SearchScope::Subtree, "(objectClass=*)")
                    .with_attributes([COMMON_NAME_ATTR]),
            )
            .await?;
        let common_name = entries
            .into_iter()
            .find(|entry| entry.is_entry())
            .map(|entry| {
                entry
                    .first_text(COMMON_NAME_ATTR)
                    .unwrap_or_else(|| leading_component(&dn))
            });
        members.push(Member { dn, common_name });
    }
    Ok(members)
}

/// Expand the list at `list_dn` and resolve every member's common name
pub async fn list_members<D>(directory: &mut D, list_dn: &str) -> DirectoryResult<Option<Vec<Member>>>
where
    D: DirectorySource + ?Sized,
{
    match expand_members(directory, list_dn).await? {
        Some(dns) => Ok(Some(resolve_members(directory, dns).await?)),
        None => Ok(None),
    }
}
