//! Canonical personnel record

use serde::{Deserialize, Serialize};

/// One directory entry after attribute normalization.
///
/// Every field except `identifier` uses the empty string for "absent",
/// matching what the normalizer produces for missing attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Distinguished name; the join key for every relationship
    pub identifier: String,
    pub display_name: String,
    pub title: String,
    pub department: String,
    /// Distinguished name of this record's manager
    pub manager: String,
}

impl Record {
    /// Create a record with only an identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = manager.into();
        self
    }

    pub fn has_manager(&self) -> bool {
        !self.manager.is_empty()
    }

    pub fn has_department(&self) -> bool {
        !self.department.is_empty()
    }
}
