//! Directory access
//!
//! Everything between the directory server and the org model:
//! - the raw entry type yielded by every adapter
//! - the [`DirectorySource`] seam (LDAP server or saved snapshot)
//! - schema dispatch and search filter construction
//! - attribute normalization into canonical [`crate::org::Record`]s
//! - mailing-list expansion

pub mod error;
pub mod ldap;
pub mod mailing_list;
pub mod normalize;
pub mod schema;
pub mod snapshot;

pub use error::{result_code_description, DirectoryError, DirectoryResult};
pub use ldap::LdapDirectory;
pub use mailing_list::{expand_members, list_members, Member};
pub use normalize::{canonicalize, normalize, normalize_entries, ATTRIBUTE_RENAMES};
pub use schema::{build_filter, FilterClause, QueryPlan, Schema, SchemaError};
pub use snapshot::{load_snapshot, save_snapshot, save_snapshot_file, SnapshotDirectory};

use async_trait::async_trait;
use indexmap::IndexMap;

/// Attribute name -> values, as returned by the directory
pub type RawAttributes = IndexMap<String, Vec<Vec<u8>>>;

/// One search result.
///
/// `dn` is `None` for results that are not entries (referrals, paging
/// continuation markers); consumers skip those.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub dn: Option<String>,
    pub attributes: RawAttributes,
}

impl RawEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: Some(dn.into()),
            attributes: RawAttributes::new(),
        }
    }

    /// A non-entry result
    pub fn marker() -> Self {
        Self::default()
    }

    pub fn with_attribute<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Vec<u8>>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_entry(&self) -> bool {
        self.dn.is_some()
    }

    /// Values of an attribute; attribute names compare case-insensitively
    pub fn values(&self, name: &str) -> Option<&Vec<Vec<u8>>> {
        attribute_values(&self.attributes, name)
    }

    /// First value of an attribute as text, if present
    pub fn first_text(&self, name: &str) -> Option<String> {
        self.values(name)
            .and_then(|values| values.first())
            .map(|value| String::from_utf8_lossy(value).into_owned())
    }
}

pub(crate) fn attribute_values<'a>(
    attributes: &'a RawAttributes,
    name: &str,
) -> Option<&'a Vec<Vec<u8>>> {
    attributes
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, values)| values)
}

/// Search scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// The base object only
    Base,
    /// The base object and everything below it
    Subtree,
}

/// A directory search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub scope: SearchScope,
    pub filter: String,
    /// Requested attributes; empty means all user attributes
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(base: impl Into<String>, scope: SearchScope, filter: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            scope,
            filter: filter.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// Something that can answer directory searches.
///
/// Results come back complete and in server order; how pages were fetched
/// and merged is up to the implementation.
#[async_trait]
pub trait DirectorySource: Send {
    async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<RawEntry>>;

    /// Release the underlying connection, if any
    async fn close(&mut self) -> DirectoryResult<()> {
        Ok(())
    }
}
