//! Run configuration
//!
//! Settings may come from a YAML file; command-line flags override them.
//!
//! ```yaml
//! connection:
//!   uri: ldaps://ad.example.com
//!   bind_dn: svc-orgchart@example.com
//!   password_file: /etc/orgchart/password
//!   timeout_secs: 30
//! base_dn: dc=example,dc=com
//! schema: ActiveDirectory
//! output: orgchart.dot
//! ```

use crate::directory::Schema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Directory connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// LDAP URI, e.g. `ldaps://ad.example.com`
    pub uri: String,
    pub bind_dn: Option<String>,
    /// File whose first line is the bind password
    pub password_file: Option<PathBuf>,
    pub starttls: bool,
    /// PEM file with the CA certificate used to verify the server
    pub ca_file: Option<PathBuf>,
    /// Connect timeout in seconds; negative waits forever
    pub timeout_secs: i64,
    /// Entries per page for paged searches
    pub page_size: i32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            bind_dn: None,
            password_file: None,
            starttls: false,
            ca_file: None,
            timeout_secs: -1,
            page_size: 500,
        }
    }
}

impl ConnectionConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.timeout_secs).ok().map(Duration::from_secs)
    }

    /// Password from `password_file`, if one is configured
    pub fn read_password(&self) -> ConfigResult<Option<String>> {
        self.password_file
            .as_deref()
            .map(read_password_file)
            .transpose()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.uri.trim().is_empty() {
            return Err(ConfigError::Missing("connection.uri"));
        }
        Ok(())
    }
}

/// Settings for one chart run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub connection: ConnectionConfig,
    /// Search base, e.g. `dc=example,dc=com`
    pub base_dn: String,
    pub schema: Schema,
    /// Output file; standard output when absent or `-`
    pub output: Option<PathBuf>,
}

impl ChartConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.connection.validate()?;
        if self.base_dn.trim().is_empty() {
            return Err(ConfigError::Missing("base_dn"));
        }
        Ok(())
    }

    /// Output path, with `-` meaning standard output
    pub fn output_path(&self) -> Option<&Path> {
        self.output
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }
}

/// First line of a password file, surrounding whitespace removed
pub fn read_password_file(path: &Path) -> ConfigResult<String> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw.lines().next().unwrap_or_default().trim().to_string())
}
