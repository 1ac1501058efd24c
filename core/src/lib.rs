pub mod core;
pub mod error;
pub mod http;
pub mod modules;
pub mod report;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use crate::core::engine::{ScanEngine, ScanReport};
pub use crate::core::knowledge::{Knowledge, KnowledgeEntry, PortInfo, RiskTier};
pub use crate::core::result_aggregator::{Grade, ResultAggregator, RiskAssessment};
pub use crate::core::target::{normalize_url, Target, TargetManager};
pub use crate::core::{Finding, Severity, VulnerabilityType};
pub use crate::error::{KnowledgeError, ProbeError, ScanError};
pub use crate::http::HttpClient;
pub use crate::report::ReportWriter;
pub use crate::utils::read_lines;

/// Ports probed when no override is configured.
pub const DEFAULT_PORTS: [u16; 6] = [21, 22, 80, 443, 3306, 8080];

/// Shared scan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// HTTP timeout in seconds for crawl, header and injection requests.
    pub timeout: u64,
    /// Timeout in seconds for each sensitive-path request.
    pub path_timeout: u64,
    pub port_timeout_ms: u64,
    pub ports: Vec<u16>,
    pub proxy: String,
    /// Extra request headers, each `Name: value`.
    pub headers: Vec<String>,
    pub user_agent: String,
    pub reports_dir: String,
    pub html_report: bool,
    pub knowledge_base: String,
    pub verbose: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: 5,
            path_timeout: 3,
            port_timeout_ms: 500,
            ports: DEFAULT_PORTS.to_vec(),
            proxy: String::new(),
            headers: Vec::new(),
            user_agent: "Mozilla/5.0 (Educational Vulnerability Scanner)".to_string(),
            reports_dir: "reports".to_string(),
            html_report: false,
            knowledge_base: String::new(),
            verbose: false,
        }
    }
}

impl ScanConfig {
    pub fn parsed_headers(&self) -> Vec<(String, String)> {
        parse_custom_headers(&self.headers)
    }

    pub fn proxy_ref(&self) -> Option<&str> {
        if self.proxy.is_empty() { None } else { Some(&self.proxy) }
    }

    pub fn knowledge_base_ref(&self) -> Option<&str> {
        if self.knowledge_base.is_empty() { None } else { Some(&self.knowledge_base) }
    }
}

pub fn parse_custom_headers(raw: &[String]) -> Vec<(String, String)> {
    raw.iter().filter_map(|h| {
        let mut parts = h.splitn(2, ':');
        let key = parts.next()?.trim().to_string();
        let val = parts.next().unwrap_or("").trim().to_string();
        if key.is_empty() { return None; }
        Some((key, val))
    }).collect()
}

/// Output abstraction for the scan pipeline.
pub trait ScanEventSink: Send + Sync {
    fn on_log(&self, level: &str, message: &str);
    fn on_finding(&self, finding: &Finding);
    fn on_progress(&self, phase: &str, current: usize, total: usize);
}

pub type SinkRef = Arc<dyn ScanEventSink>;

/// Terminal output sink.
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new_ref() -> SinkRef {
        Arc::new(Self)
    }
}

impl ScanEventSink for ConsoleSink {
    fn on_log(&self, level: &str, message: &str) {
        use colored::*;
        let colored = match level {
            "success" => message.green().to_string(),
            "error"   => message.red().to_string(),
            "warn"    => message.yellow().to_string(),
            "phase"   => message.bright_cyan().bold().to_string(),
            _         => message.to_string(),
        };
        println!("{}", colored);
    }

    fn on_finding(&self, finding: &Finding) {
        use colored::*;
        println!(
            "\n{} {} detected! [{}]",
            "[+]".green().bold(),
            finding.vuln_type.to_string().red().bold(),
            finding.severity
        );
        println!("    Target:  {}", finding.url.white());
        if let Some(ref payload) = finding.payload {
            println!("    Payload: {}", payload.bright_yellow());
        }
    }

    fn on_progress(&self, phase: &str, current: usize, total: usize) {
        use colored::*;
        if total > 0 {
            println!("{}", format!("[*] {} ({}/{})", phase, current, total).bright_cyan());
        } else {
            println!("{}", format!("[*] {}", phase).bright_cyan());
        }
    }
}

/// Discards every event.
pub struct SilentSink;

impl SilentSink {
    pub fn new_ref() -> SinkRef {
        Arc::new(Self)
    }
}

impl ScanEventSink for SilentSink {
    fn on_log(&self, _level: &str, _message: &str) {}
    fn on_finding(&self, _finding: &Finding) {}
    fn on_progress(&self, _phase: &str, _current: usize, _total: usize) {}
}
