//! Supported directory schemas and search filter construction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Schema selection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unsupported schema \"{0}\" (expected inetOrgPerson or ActiveDirectory)")]
    Unsupported(String),
}

/// Personnel schema of the directory being queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Schema {
    /// RFC 2798 inetOrgPerson (OpenLDAP, 389-ds, ...)
    InetOrgPerson,
    /// Microsoft Active Directory
    #[default]
    ActiveDirectory,
}

/// Attributes and filter for the personnel search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub attributes: Vec<String>,
    pub filter: String,
}

impl Schema {
    pub const ALL: [Schema; 2] = [Schema::InetOrgPerson, Schema::ActiveDirectory];

    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::InetOrgPerson => "inetOrgPerson",
            Schema::ActiveDirectory => "ActiveDirectory",
        }
    }

    /// Attributes requested from the directory, in this schema's naming
    pub fn attributes(&self) -> &'static [&'static str] {
        match self {
            Schema::InetOrgPerson => &[
                "dn",
                "displayName",
                "title",
                "manager",
                "o",
                "departmentNumber",
            ],
            Schema::ActiveDirectory => &[
                "dn",
                "displayName",
                "title",
                "manager",
                "company",
                "department",
            ],
        }
    }

    /// Filter clauses ANDed together for the personnel search
    pub fn filter_clauses(&self) -> Vec<FilterClause> {
        let mut clauses = vec![
            FilterClause::present("displayName"),
            FilterClause::present("title"),
        ];
        if let Schema::ActiveDirectory = self {
            // Normal user accounts that are not disabled
            clauses.push(FilterClause::equals("sAMAccountType", "805306368"));
            clauses.push(FilterClause::not_equals(
                "userAccountControl:1.2.840.113556.1.4.803:",
                "2",
            ));
        }
        clauses
    }

    /// Attribute list and filter string for this schema
    pub fn query_plan(&self) -> QueryPlan {
        QueryPlan {
            attributes: self.attributes().iter().map(|a| a.to_string()).collect(),
            filter: build_filter(&self.filter_clauses()),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schema::ALL
            .into_iter()
            .find(|schema| schema.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SchemaError::Unsupported(s.to_string()))
    }
}

impl TryFrom<String> for Schema {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Schema> for String {
    fn from(schema: Schema) -> Self {
        schema.as_str().to_string()
    }
}

/// One `(attr<op>value)` term of an LDAP filter, optionally negated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub attribute: String,
    pub operator: &'static str,
    pub value: String,
    pub negated: bool,
}

impl FilterClause {
    pub fn new(attribute: impl Into<String>, operator: &'static str, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
            negated: false,
        }
    }

    /// `(attr=*)`
    pub fn present(attribute: impl Into<String>) -> Self {
        Self::new(attribute, "=", "*")
    }

    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, "=", value)
    }

    /// `(!(attr=value))`
    pub fn not_equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            negated: true,
            ..Self::new(attribute, "=", value)
        }
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "(!({}{}{}))", self.attribute, self.operator, self.value)
        } else {
            write!(f, "({}{}{})", self.attribute, self.operator, self.value)
        }
    }
}

/// AND the clauses together. One clause is returned as-is, none yields "".
pub fn build_filter(clauses: &[FilterClause]) -> String {
    match clauses {
        [] => String::new(),
        [single] => single.to_string(),
        many => {
            let body: String = many.iter().map(|c| c.to_string()).collect();
            format!("(&{})", body)
        }
    }
}
