//! Static lookup tables consumed by the probes and the risk aggregator.
//!
//! The built-in tables are the default configuration. An external JSON file
//! can overlay individual entries at startup; keys that the file does not
//! mention keep their built-in values.

use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::core::{Severity, VulnerabilityType};
use crate::error::KnowledgeError;

/// Base score deducted (times 0.5) for a finding type the table does not know.
pub const FALLBACK_BASE_SCORE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub owasp: String,
    pub base_score: f64,
    pub default_severity: Severity,
    pub description: String,
    pub remediation_title: String,
    pub remediation_snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Safe,
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl RiskTier {
    /// Tiers that cost the target points in the risk score.
    pub fn is_penalized(&self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskTier::Safe => "Safe",
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
            RiskTier::Critical => "Critical",
            RiskTier::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortInfo {
    pub service: String,
    pub risk: RiskTier,
    pub remediation: String,
}

impl PortInfo {
    pub fn unknown() -> Self {
        Self {
            service: "Unknown".to_string(),
            risk: RiskTier::Unknown,
            remediation: "Check manually".to_string(),
        }
    }
}

/// Shape of an overlay file. Both sections are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KnowledgeOverlay {
    vulnerabilities: HashMap<VulnerabilityType, KnowledgeEntry>,
    ports: HashMap<u16, PortInfo>,
}

#[derive(Debug, Clone)]
pub struct Knowledge {
    vulnerabilities: HashMap<VulnerabilityType, KnowledgeEntry>,
    ports: HashMap<u16, PortInfo>,
}

impl Knowledge {
    pub fn builtin() -> Self {
        let mut vulnerabilities = HashMap::new();

        vulnerabilities.insert(VulnerabilityType::SqlInjection, KnowledgeEntry {
            owasp: "A03:2021-Injection".to_string(),
            base_score: 9.0,
            default_severity: Severity::Critical,
            description: "Untrusted data is sent to an interpreter as part of a command or query.".to_string(),
            remediation_title: "Use Parameterized Queries".to_string(),
            remediation_snippet: r#"# VULNERABLE:
cursor.execute("SELECT * FROM users WHERE user = '" + username + "'")

# SECURE:
cursor.execute("SELECT * FROM users WHERE user = %s", (username,))"#.to_string(),
        });

        vulnerabilities.insert(VulnerabilityType::ReflectedXss, KnowledgeEntry {
            owasp: "A03:2021-Injection".to_string(),
            base_score: 7.5,
            default_severity: Severity::High,
            description: "The application includes untrusted data in a new web page without proper validation.".to_string(),
            remediation_title: "Context-Aware Encoding".to_string(),
            remediation_snippet: r#"<div>Welcome, <?php echo $_GET['user']; ?></div>

<div>Welcome, <?php echo htmlspecialchars($_GET['user']); ?></div>"#.to_string(),
        });

        vulnerabilities.insert(VulnerabilityType::SensitivePathDisclosure, KnowledgeEntry {
            owasp: "A05:2021-Security Misconfiguration".to_string(),
            base_score: 6.5,
            default_severity: Severity::Medium,
            description: "Sensitive files (config, backups) are accessible to the public.".to_string(),
            remediation_title: "Restrict Access".to_string(),
            remediation_snippet: r#"# Apache (.htaccess):
<FilesMatch "\.(env|sql|git)">
    Require all denied
</FilesMatch>"#.to_string(),
        });

        vulnerabilities.insert(VulnerabilityType::MissingHeaders, KnowledgeEntry {
            owasp: "A05:2021-Security Misconfiguration".to_string(),
            base_score: 4.0,
            default_severity: Severity::Low,
            description: "Important security headers (CSP, HSTS) are missing.".to_string(),
            remediation_title: "Server Configuration".to_string(),
            remediation_snippet: r#"# Nginx:
add_header X-Frame-Options "SAMEORIGIN";
add_header Content-Security-Policy "default-src 'self'";
add_header Strict-Transport-Security "max-age=31536000";"#.to_string(),
        });

        let mut ports = HashMap::new();
        let mut port = |number: u16, service: &str, risk: RiskTier, remediation: &str| {
            ports.insert(number, PortInfo {
                service: service.to_string(),
                risk,
                remediation: remediation.to_string(),
            });
        };
        port(21, "FTP", RiskTier::High, "Use SFTP (Port 22).");
        port(22, "SSH", RiskTier::Medium, "Disable root login.");
        port(80, "HTTP", RiskTier::Low, "Redirect to HTTPS.");
        port(443, "HTTPS", RiskTier::Safe, "Ensure TLS 1.2+.");
        port(3306, "MySQL", RiskTier::Critical, "Block external access.");

        Self { vulnerabilities, ports }
    }

    /// Built-in tables overlaid with the entries of a JSON file.
    pub fn load_overlay(path: &str) -> Result<Self, KnowledgeError> {
        let raw = fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::builtin().overlay_json(&raw)
    }

    pub fn overlay_json(mut self, raw: &str) -> Result<Self, KnowledgeError> {
        let overlay: KnowledgeOverlay = serde_json::from_str(raw)?;

        for (key, entry) in &overlay.vulnerabilities {
            if !(0.0..=10.0).contains(&entry.base_score) {
                return Err(KnowledgeError::ScoreOutOfRange {
                    key: format!("{:?}", key),
                    score: entry.base_score,
                });
            }
        }

        self.vulnerabilities.extend(overlay.vulnerabilities);
        self.ports.extend(overlay.ports);
        Ok(self)
    }

    pub fn entry(&self, vuln_type: VulnerabilityType) -> Option<&KnowledgeEntry> {
        self.vulnerabilities.get(&vuln_type)
    }

    pub fn base_score(&self, vuln_type: VulnerabilityType) -> f64 {
        self.entry(vuln_type)
            .map(|e| e.base_score)
            .unwrap_or(FALLBACK_BASE_SCORE)
    }

    pub fn port_info(&self, port: u16) -> PortInfo {
        self.ports.get(&port).cloned().unwrap_or_else(PortInfo::unknown)
    }
}

impl Default for Knowledge {
    fn default() -> Self {
        Self::builtin()
    }
}
