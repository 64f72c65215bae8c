//! Directory access errors

use thiserror::Error;

/// LDAP result code for a missing base object
pub const NO_SUCH_OBJECT: u32 = 32;

/// Errors raised while talking to a directory or reading a snapshot
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The connection could not be opened (DNS, TCP, TLS handshake, STARTTLS)
    #[error("Connection to {uri} failed: {message}")]
    Connect { uri: String, message: String },

    /// The server answered with a non-success result
    #[error("{operation} failed: {diagnostic}")]
    Server {
        operation: String,
        code: u32,
        diagnostic: String,
    },

    /// Client-side protocol failure after the connection was established
    #[error("{operation} failed: {message}")]
    Protocol { operation: String, message: String },

    /// CA certificate could not be loaded
    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

impl DirectoryError {
    /// Build a server error from a result code and the server's diagnostic text
    pub fn server(operation: impl Into<String>, code: u32, text: &str) -> Self {
        let description = result_code_description(code);
        let text = text.trim();
        let diagnostic = if text.is_empty() {
            description.to_string()
        } else {
            format!("{}: {}", description, text)
        };
        DirectoryError::Server {
            operation: operation.into(),
            code,
            diagnostic,
        }
    }

    pub fn is_no_such_object(&self) -> bool {
        matches!(self, DirectoryError::Server { code, .. } if *code == NO_SUCH_OBJECT)
    }
}

/// Short description of an LDAP result code (RFC 4511)
pub fn result_code_description(code: u32) -> &'static str {
    match code {
        0 => "Success",
        1 => "Operations error",
        2 => "Protocol error",
        3 => "Time limit exceeded",
        4 => "Size limit exceeded",
        7 => "Authentication method not supported",
        8 => "Strong(er) authentication required",
        10 => "Referral",
        11 => "Administrative limit exceeded",
        13 => "Confidentiality required",
        32 => "No such object",
        34 => "Invalid DN syntax",
        48 => "Inappropriate authentication",
        49 => "Invalid credentials",
        50 => "Insufficient access",
        51 => "Server is busy",
        52 => "Server is unavailable",
        53 => "Server is unwilling to perform",
        80 => "Other (e.g., implementation specific) error",
        _ => "Unknown result code",
    }
}
