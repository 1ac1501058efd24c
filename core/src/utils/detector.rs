/// Database error phrasing that leaks through when a payload breaks a query.
pub const SQL_ERROR_SIGNATURES: &[&str] = &[
    "You have an error in your SQL syntax;",
    "Warning: mysql_fetch_array()",
    "check the manual that corresponds to your MariaDB server version",
    "quoted string not properly terminated",
    "unclosed quotation mark after the character string",
];

/// Why a 200 response to a sensitive path was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FalsePositive {
    /// A binary archive was requested but an HTML page came back.
    HtmlInsteadOfBinary,
    /// An `.env` response that is markup or holds no `key=value` lines.
    NotAnEnvFile,
    /// A soft-404 or login wall served with status 200.
    SoftNotFound,
}

/// Signature-based response classifier shared by the probes.
pub struct VulnerabilityDetector;

impl VulnerabilityDetector {
    pub fn new() -> Self {
        Self
    }

    /// Case-insensitive search for any database error signature.
    pub fn is_sql_error(&self, body: &str) -> bool {
        let body = body.to_lowercase();
        SQL_ERROR_SIGNATURES
            .iter()
            .any(|signature| body.contains(&signature.to_lowercase()))
    }

    /// The payload came back verbatim, i.e. unescaped.
    pub fn is_reflected(&self, body: &str, payload: &str) -> bool {
        !payload.is_empty() && body.contains(payload)
    }

    /// Applies the false-positive filters to a 200 response in order and
    /// returns the first one that matches.
    pub fn path_false_positive(&self, path: &str, body: &str) -> Option<FalsePositive> {
        let content = body.to_lowercase();

        if path.ends_with(".zip") && content.contains("html") {
            return Some(FalsePositive::HtmlInsteadOfBinary);
        }

        if path == ".env" && (content.contains("<html") || !content.contains('=')) {
            return Some(FalsePositive::NotAnEnvFile);
        }

        if content.contains("page not found") || content.contains("login") {
            return Some(FalsePositive::SoftNotFound);
        }

        None
    }
}

impl Default for VulnerabilityDetector {
    fn default() -> Self {
        Self::new()
    }
}
