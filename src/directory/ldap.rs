//! LDAP directory adapter
//!
//! Thin wrapper over `ldap3`: connect (optionally STARTTLS with a custom CA),
//! simple bind, paged searches. Server-side failures keep the server's
//! result code and diagnostic text.

use super::error::{DirectoryError, DirectoryResult};
use super::{DirectorySource, RawAttributes, RawEntry, SearchRequest, SearchScope};
use crate::config::ConnectionConfig;
use async_trait::async_trait;
use ldap3::adapters::{Adapter, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};
use std::path::Path;
use tracing::{debug, info, warn};

/// Live connection to an LDAP server
pub struct LdapDirectory {
    ldap: Ldap,
    uri: String,
    page_size: i32,
}

impl LdapDirectory {
    /// Open a connection as described by `config`; no bind is performed
    pub async fn connect(config: &ConnectionConfig) -> DirectoryResult<Self> {
        let mut settings = LdapConnSettings::new().set_starttls(config.starttls);
        if let Some(timeout) = config.timeout() {
            settings = settings.set_conn_timeout(timeout);
        }
        if let Some(ca_file) = &config.ca_file {
            settings = settings.set_connector(tls_connector(ca_file)?);
        }

        info!("Connecting to {}", config.uri);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &config.uri)
            .await
            .map_err(|e| DirectoryError::Connect {
                uri: config.uri.clone(),
                message: e.to_string(),
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection error: {}", e);
            }
        });

        Ok(Self {
            ldap,
            uri: config.uri.clone(),
            page_size: config.page_size,
        })
    }

    /// Simple bind with a DN and password
    pub async fn bind(&mut self, bind_dn: &str, password: &str) -> DirectoryResult<()> {
        debug!("Binding to {} as {}", self.uri, bind_dn);
        self.ldap
            .simple_bind(bind_dn, password)
            .await
            .and_then(|result| result.success())
            .map_err(|e| ldap_error("Bind", e))?;
        info!("Bound as {}", bind_dn);
        Ok(())
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[async_trait]
impl DirectorySource for LdapDirectory {
    async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<RawEntry>> {
        let scope = match request.scope {
            SearchScope::Base => Scope::Base,
            SearchScope::Subtree => Scope::Subtree,
        };
        let attributes: Vec<&str> = request.attributes.iter().map(String::as_str).collect();
        let adapters: Vec<Box<dyn Adapter<_, _>>> =
            vec![Box::new(PagedResults::new(self.page_size))];

        debug!(
            "Searching {} ({:?}) with filter {}",
            request.base, request.scope, request.filter
        );
        let mut stream = self
            .ldap
            .streaming_search_with(adapters, &request.base, scope, &request.filter, attributes)
            .await
            .map_err(|e| ldap_error("Search", e))?;

        let mut entries = Vec::new();
        while let Some(entry) = stream.next().await.map_err(|e| ldap_error("Search", e))? {
            if entry.is_ref() || entry.is_intermediate() {
                entries.push(RawEntry::marker());
                continue;
            }
            entries.push(raw_entry(SearchEntry::construct(entry)));
        }

        match stream.finish().await.success() {
            Ok(_) => {}
            Err(e) => {
                let err = ldap_error("Search", e);
                if err.is_no_such_object() {
                    debug!("No such object: {}", request.base);
                    return Ok(Vec::new());
                }
                return Err(err);
            }
        }

        debug!("Search under {} returned {} results", request.base, entries.len());
        Ok(entries)
    }

    async fn close(&mut self) -> DirectoryResult<()> {
        self.ldap
            .unbind()
            .await
            .map_err(|e| ldap_error("Unbind", e))
    }
}

fn ldap_error(operation: &str, err: LdapError) -> DirectoryError {
    match err {
        LdapError::LdapResult { result } => DirectoryError::server(operation, result.rc, &result.text),
        other => DirectoryError::Protocol {
            operation: operation.to_string(),
            message: other.to_string(),
        },
    }
}

fn raw_entry(entry: SearchEntry) -> RawEntry {
    let mut attributes: Vec<(String, Vec<Vec<u8>>)> = entry
        .attrs
        .into_iter()
        .map(|(name, values)| (name, values.into_iter().map(String::into_bytes).collect()))
        .chain(entry.bin_attrs)
        .collect();
    // Server attribute order is not preserved by ldap3
    attributes.sort_by(|a, b| a.0.cmp(&b.0));

    RawEntry {
        dn: Some(entry.dn),
        attributes: attributes.into_iter().collect::<RawAttributes>(),
    }
}

fn tls_connector(ca_file: &Path) -> DirectoryResult<native_tls::TlsConnector> {
    let pem = std::fs::read(ca_file).map_err(|e| {
        DirectoryError::Tls(format!("cannot read CA file {}: {}", ca_file.display(), e))
    })?;
    let certificate = native_tls::Certificate::from_pem(&pem)
        .map_err(|e| DirectoryError::Tls(format!("invalid CA file {}: {}", ca_file.display(), e)))?;

    native_tls::TlsConnector::builder()
        .add_root_certificate(certificate)
        .build()
        .map_err(|e| DirectoryError::Tls(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_raw_entry_merges_text_and_binary_attributes() {
        let mut attrs = HashMap::new();
        attrs.insert("title".to_string(), vec!["Dev".to_string()]);
        attrs.insert("displayName".to_string(), vec!["Alice".to_string()]);
        let mut bin_attrs = HashMap::new();
        bin_attrs.insert("thumbnailPhoto".to_string(), vec![vec![0xff, 0xd8]]);

        let entry = raw_entry(SearchEntry {
            dn: "cn=a".to_string(),
            attrs,
            bin_attrs,
        });

        assert_eq!(entry.dn.as_deref(), Some("cn=a"));
        let names: Vec<_> = entry.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["displayName", "thumbnailPhoto", "title"]);
        assert_eq!(entry.first_text("title"), Some("Dev".to_string()));
    }

    #[test]
    fn test_ldap_result_error_keeps_server_text() {
        let err = ldap_error(
            "Bind",
            LdapError::LdapResult {
                result: ldap3::LdapResult {
                    rc: 49,
                    matched: String::new(),
                    text: "bad password".to_string(),
                    refs: vec![],
                    ctrls: vec![],
                },
            },
        );
        assert_eq!(err.to_string(), "Bind failed: Invalid credentials: bad password");
    }

    #[test]
    fn test_missing_ca_file() {
        let err = tls_connector(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, DirectoryError::Tls(_)));
    }
}
