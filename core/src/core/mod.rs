pub mod engine;
pub mod knowledge;
pub mod mutator;
pub mod result_aggregator;
pub mod target;

use serde::{Deserialize, Serialize};

/// Vulnerability type classification. Also the key of the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VulnerabilityType {
    SqlInjection,
    ReflectedXss,
    SensitivePathDisclosure,
    MissingHeaders,
}

impl std::fmt::Display for VulnerabilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VulnerabilityType::SqlInjection => write!(f, "SQL Injection"),
            VulnerabilityType::ReflectedXss => write!(f, "Reflected XSS"),
            VulnerabilityType::SensitivePathDisclosure => write!(f, "Sensitive Path Disclosed"),
            VulnerabilityType::MissingHeaders => write!(f, "Missing Headers"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// One detected weakness. Findings are append-only and never deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub vuln_type: VulnerabilityType,
    pub url: String,
    pub payload: Option<String>,
    pub severity: Severity,
    pub details: String,
}

impl Finding {
    pub fn sql_injection(url: &str, payload: &str) -> Self {
        Self {
            vuln_type: VulnerabilityType::SqlInjection,
            url: url.to_string(),
            payload: Some(payload.to_string()),
            severity: Severity::Critical,
            details: "Database error message returned.".to_string(),
        }
    }

    pub fn reflected_xss(url: &str, payload: &str) -> Self {
        Self {
            vuln_type: VulnerabilityType::ReflectedXss,
            url: url.to_string(),
            payload: Some(payload.to_string()),
            severity: Severity::High,
            details: "Payload reflected in response HTML.".to_string(),
        }
    }

    /// Severity follows the literal path: anything containing "admin" is
    /// Medium, every other exposed path is High.
    pub fn sensitive_path(url: &str, path: &str) -> Self {
        let severity = if path.contains("admin") {
            Severity::Medium
        } else {
            Severity::High
        };
        Self {
            vuln_type: VulnerabilityType::SensitivePathDisclosure,
            url: url.to_string(),
            payload: Some(format!("GET {}", path)),
            severity,
            details: format!("Direct access allowed to '{}'. Potential information leak.", path),
        }
    }
}
