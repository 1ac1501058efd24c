use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::knowledge::{Knowledge, KnowledgeEntry, PortInfo};
use crate::core::result_aggregator::{Grade, ResultAggregator, RiskAssessment};
use crate::core::target::Target;
use crate::core::Finding;
use crate::error::ScanError;
use crate::http::HttpClient;
use crate::modules::crawler::{self, FormDescriptor};
use crate::modules::headers::{HeaderProbe, HeaderReport};
use crate::modules::paths::PathProbe;
use crate::modules::ports::PortProbe;
use crate::modules::sqli::SqlInjectionProbe;
use crate::modules::xss::ReflectedXssProbe;
use crate::modules::FormProbe;
use crate::{ScanConfig, SinkRef};

/// A finding together with its knowledge-base metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedFinding {
    #[serde(flatten)]
    pub finding: Finding,
    pub knowledge: Option<KnowledgeEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortAnalysis {
    pub port: u16,
    #[serde(flatten)]
    pub info: PortInfo,
}

/// The terminal aggregate of one scan, handed to the report writer.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: String,
    pub ip: IpAddr,
    pub date: String,
    pub forms_found: usize,
    pub vuln_count: usize,
    pub findings: Vec<ReportedFinding>,
    pub headers: HeaderReport,
    pub ports: Vec<PortAnalysis>,
    pub open_ports: BTreeSet<u16>,
    pub risk_score: f64,
    pub grade: Grade,
    pub grade_color: &'static str,
}

/// What the probes produced besides findings.
struct ProbeOutcome {
    forms_found: usize,
    headers: HeaderReport,
    open_ports: BTreeSet<u16>,
}

/// Single-target scan orchestrator.
///
/// The engine:
/// 1. Resolves the target host, failing fast when it cannot
/// 2. Crawls the target page for forms
/// 3. Runs every form probe against each form, one form at a time, on the
///    scan's own cookie-carrying session
/// 4. Runs the header, path and port probes concurrently
/// 5. Scores the union of findings and assembles the report
pub struct ScanEngine {
    config: ScanConfig,
    knowledge: Arc<Knowledge>,
    form_probes: Vec<Box<dyn FormProbe>>,
    sink: SinkRef,
}

impl ScanEngine {
    pub fn new(config: ScanConfig, knowledge: Arc<Knowledge>, sink: SinkRef) -> Self {
        Self {
            config,
            knowledge,
            form_probes: vec![
                Box::new(SqlInjectionProbe::new()),
                Box::new(ReflectedXssProbe::new()),
            ],
            sink,
        }
    }

    /// Scans one target. Only resolution (and client construction) can fail;
    /// every probe failure degrades to "no contribution".
    pub async fn run_scan(&self, target_url: &str) -> Result<ScanReport, ScanError> {
        let target = Target::resolve(target_url).await?;
        info!("Scanning {} ({})", target.as_str(), target.address);

        // A fresh session per scan keeps cookies from leaking across targets.
        let client = HttpClient::new(&self.config)?;
        let (result_tx, result_rx) = mpsc::channel::<Finding>(100);

        let (outcome, findings) = tokio::join!(
            self.run_probes(&target, &client, result_tx),
            ResultAggregator::run(result_rx, Arc::clone(&self.sink))
        );
        ResultAggregator::report_summary(&findings, &self.sink);

        let risk = RiskAssessment::assess(
            &findings,
            &outcome.headers,
            &outcome.open_ports,
            &self.knowledge,
        );

        Ok(self.assemble(&target, outcome, findings, risk))
    }

    async fn run_probes(
        &self,
        target: &Target,
        client: &HttpClient,
        result_tx: mpsc::Sender<Finding>,
    ) -> ProbeOutcome {
        let url = target.as_str();
        let http_timeout = Duration::from_secs(self.config.timeout);

        self.sink.on_progress("Crawling for forms", 0, 0);
        let forms: Vec<FormDescriptor> = crawler::fetch_forms(client, url, http_timeout)
            .await
            .iter()
            .map(|node| crawler::extract_form(node, url))
            .collect();
        self.sink.on_log("info", &format!("[+] Found {} form(s).", forms.len()));

        for (i, form) in forms.iter().enumerate() {
            self.sink.on_progress("Testing forms", i + 1, forms.len());
            for probe in &self.form_probes {
                debug!("Running {} against {}", probe.name(), form.action);
                for finding in probe.scan_form(client, form).await {
                    forward(&result_tx, finding).await;
                }
            }
        }

        self.sink.on_progress("Checking headers, sensitive paths and ports", 0, 0);
        let header_probe = HeaderProbe::new(http_timeout);
        let path_probe = PathProbe::new(Duration::from_secs(self.config.path_timeout));
        let port_probe = PortProbe::new(
            self.config.ports.clone(),
            Duration::from_millis(self.config.port_timeout_ms),
        );

        let (headers, path_findings, open_ports) = tokio::join!(
            header_probe.scan(client, url),
            path_probe.scan(client, url),
            port_probe.scan(target.address)
        );

        let headers = headers.unwrap_or_else(|e| {
            warn!("Header check skipped for {}: {}", url, e);
            HeaderReport::unchecked(url)
        });

        for finding in path_findings {
            forward(&result_tx, finding).await;
        }

        ProbeOutcome {
            forms_found: forms.len(),
            headers,
            open_ports,
        }
    }

    fn assemble(
        &self,
        target: &Target,
        outcome: ProbeOutcome,
        findings: Vec<Finding>,
        risk: RiskAssessment,
    ) -> ScanReport {
        let findings: Vec<ReportedFinding> = findings
            .into_iter()
            .map(|finding| ReportedFinding {
                knowledge: self.knowledge.entry(finding.vuln_type).cloned(),
                finding,
            })
            .collect();

        let ports = outcome
            .open_ports
            .iter()
            .map(|&port| PortAnalysis {
                port,
                info: self.knowledge.port_info(port),
            })
            .collect();

        ScanReport {
            target: target.as_str().to_string(),
            ip: target.address,
            date: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
            forms_found: outcome.forms_found,
            vuln_count: findings.len(),
            findings,
            headers: outcome.headers,
            ports,
            open_ports: outcome.open_ports,
            risk_score: risk.score,
            grade: risk.grade,
            grade_color: risk.color,
        }
    }
}

/// Hands a finding to the aggregator. Returns false, and logs it, when the
/// aggregator is gone and the finding is lost.
async fn forward(result_tx: &mpsc::Sender<Finding>, finding: Finding) -> bool {
    match result_tx.send(finding).await {
        Ok(()) => true,
        Err(mpsc::error::SendError(lost)) => {
            warn!("Result channel closed, dropping {} on {}", lost.vuln_type, lost.url);
            false
        }
    }
}
