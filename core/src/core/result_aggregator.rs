use std::collections::BTreeSet;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::knowledge::Knowledge;
use crate::core::Finding;
use crate::modules::headers::HeaderReport;
use crate::SinkRef;

const START_SCORE: f64 = 10.0;
const FINDING_WEIGHT: f64 = 0.5;
const MISSING_HEADERS_PENALTY: f64 = 1.0;
const RISKY_PORT_PENALTY: f64 = 1.5;

/// Collects findings from the probes in arrival order. Nothing is
/// deduplicated: each finding counts on its own.
pub struct ResultAggregator;

impl ResultAggregator {
    pub async fn run(mut receiver: mpsc::Receiver<Finding>, sink: SinkRef) -> Vec<Finding> {
        let mut findings = Vec::new();
        while let Some(finding) = receiver.recv().await {
            sink.on_finding(&finding);
            findings.push(finding);
        }
        findings
    }

    pub fn report_summary(findings: &[Finding], sink: &SinkRef) {
        if findings.is_empty() {
            sink.on_log("success", "[+] No vulnerabilities found.");
        } else {
            sink.on_log("warn", &format!("[+] {} finding(s) discovered:", findings.len()));
            for (i, f) in findings.iter().enumerate() {
                sink.on_log("error", &format!(
                    "  #{} {} [{}] → {} (payload: {})",
                    i + 1,
                    f.vuln_type,
                    f.severity,
                    f.url,
                    f.payload.as_deref().unwrap_or("-")
                ));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Inclusive lower bounds: 9.0 A, 7.5 B, 5.0 C, 2.5 D.
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            Grade::A
        } else if score >= 7.5 {
            Grade::B
        } else if score >= 5.0 {
            Grade::C
        } else if score >= 2.5 {
            Grade::D
        } else {
            Grade::F
        }
    }

    /// Cosmetic tag for the report front end.
    pub fn color(&self) -> &'static str {
        match self {
            Grade::A => "success",
            Grade::B => "info",
            Grade::C => "warning",
            Grade::D | Grade::F => "danger",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub grade: Grade,
    pub color: &'static str,
}

impl RiskAssessment {
    /// Deterministic weighted score in `[0, 10]`, rounded to one decimal.
    pub fn assess(
        findings: &[Finding],
        headers: &HeaderReport,
        open_ports: &BTreeSet<u16>,
        knowledge: &Knowledge,
    ) -> Self {
        let mut score = START_SCORE;

        for finding in findings {
            score -= knowledge.base_score(finding.vuln_type) * FINDING_WEIGHT;
        }

        if !headers.missing.is_empty() {
            score -= MISSING_HEADERS_PENALTY;
        }

        for &port in open_ports {
            if knowledge.port_info(port).risk.is_penalized() {
                score -= RISKY_PORT_PENALTY;
            }
        }

        let score = round_one_decimal(score.clamp(0.0, START_SCORE));
        Self::from_score(score)
    }

    pub fn from_score(score: f64) -> Self {
        let grade = Grade::from_score(score);
        Self {
            score,
            grade,
            color: grade.color(),
        }
    }
}

/// Rounds the exact decimal value of `value`, so 8.95 (stored as
/// 8.9499...) becomes 8.9 and the exact tie 6.25 becomes 6.2.
fn round_one_decimal(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}
