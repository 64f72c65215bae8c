//! JSON snapshots of search results
//!
//! A snapshot records the raw entries of a personnel search so a chart can be
//! re-rendered later without a directory connection.
//!
//! Values that are valid UTF-8 are stored as JSON strings. Anything else
//! (`jpegPhoto`, `objectGUID`, ...) is stored as `{"base64": "..."}` so the
//! exact bytes come back on load.

use super::error::{DirectoryError, DirectoryResult};
use super::{DirectorySource, RawAttributes, RawEntry, SearchRequest, SearchScope};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    dn: String,
    #[serde(default)]
    attributes: IndexMap<String, Vec<SnapshotValue>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum SnapshotValue {
    Text(String),
    Binary { base64: String },
}

impl SnapshotValue {
    fn from_bytes(value: &[u8]) -> Self {
        match std::str::from_utf8(value) {
            Ok(text) => SnapshotValue::Text(text.to_string()),
            Err(_) => SnapshotValue::Binary {
                base64: BASE64.encode(value),
            },
        }
    }

    fn into_bytes(self) -> DirectoryResult<Vec<u8>> {
        match self {
            SnapshotValue::Text(text) => Ok(text.into_bytes()),
            SnapshotValue::Binary { base64 } => BASE64.decode(base64.as_bytes()).map_err(|e| {
                DirectoryError::Snapshot(serde::de::Error::custom(format!(
                    "invalid base64 value: {}",
                    e
                )))
            }),
        }
    }
}

impl SnapshotEntry {
    fn from_raw(dn: &str, attributes: &RawAttributes) -> Self {
        Self {
            dn: dn.to_string(),
            attributes: attributes
                .iter()
                .map(|(name, values)| {
                    let values = values.iter().map(|v| SnapshotValue::from_bytes(v)).collect();
                    (name.clone(), values)
                })
                .collect(),
        }
    }

    fn into_raw(self) -> DirectoryResult<RawEntry> {
        let mut attributes = RawAttributes::with_capacity(self.attributes.len());
        for (name, values) in self.attributes {
            let values = values
                .into_iter()
                .map(SnapshotValue::into_bytes)
                .collect::<DirectoryResult<Vec<_>>>()?;
            attributes.insert(name, values);
        }
        Ok(RawEntry {
            dn: Some(self.dn),
            attributes,
        })
    }
}

/// Write entries as a pretty-printed JSON array; non-entry results are dropped
pub fn save_snapshot<W: Write>(out: W, entries: &[RawEntry]) -> DirectoryResult<()> {
    let snapshot: Vec<SnapshotEntry> = entries
        .iter()
        .filter_map(|entry| {
            entry
                .dn
                .as_deref()
                .map(|dn| SnapshotEntry::from_raw(dn, &entry.attributes))
        })
        .collect();
    serde_json::to_writer_pretty(out, &snapshot)?;
    Ok(())
}

pub fn save_snapshot_file(path: &Path, entries: &[RawEntry]) -> DirectoryResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    save_snapshot(&mut writer, entries)?;
    writer.flush()?;
    info!("Saved {} entries to {}", entries.len(), path.display());
    Ok(())
}

pub fn load_snapshot(path: &Path) -> DirectoryResult<Vec<RawEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let snapshot: Vec<SnapshotEntry> = serde_json::from_reader(reader)?;
    debug!("Loaded {} entries from {}", snapshot.len(), path.display());
    snapshot.into_iter().map(SnapshotEntry::into_raw).collect()
}

/// Offline directory backed by snapshot entries.
///
/// Scope is honoured; filters are not evaluated because a snapshot already
/// holds a filtered result.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDirectory {
    entries: Vec<RawEntry>,
}

impl SnapshotDirectory {
    pub fn open(path: &Path) -> DirectoryResult<Self> {
        Ok(Self::from_entries(load_snapshot(path)?))
    }

    pub fn from_entries(entries: Vec<RawEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RawEntry] {
        &self.entries
    }

    fn in_scope(dn: &str, base: &str, scope: SearchScope) -> bool {
        let dn = dn.trim();
        let base = base.trim();
        match scope {
            SearchScope::Base => dn.eq_ignore_ascii_case(base),
            SearchScope::Subtree => {
                if base.is_empty() || dn.eq_ignore_ascii_case(base) {
                    return true;
                }
                let suffix_start = dn.len().checked_sub(base.len() + 1);
                match suffix_start {
                    Some(start) if dn.is_char_boundary(start) => {
                        let suffix = &dn[start..];
                        suffix.starts_with(',') && suffix[1..].eq_ignore_ascii_case(base)
                    }
                    _ => false,
                }
            }
        }
    }
}

#[async_trait]
impl DirectorySource for SnapshotDirectory {
    async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<RawEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                entry
                    .dn
                    .as_deref()
                    .is_some_and(|dn| Self::in_scope(dn, &request.base, request.scope))
            })
            .cloned()
            .collect())
    }
}
