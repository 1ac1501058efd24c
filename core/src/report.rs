//! Report writer for finished scans.
//!
//! Always writes the JSON form of the report. The optional HTML form is a
//! single self-contained file with embedded CSS and no external assets.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::info;
use regex::Regex;

use crate::core::engine::ScanReport;

pub struct ReportWriter {
    dir: PathBuf,
    html: bool,
    scheme: Regex,
}

impl ReportWriter {
    pub fn new(dir: impl AsRef<Path>, html: bool) -> anyhow::Result<Self> {
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            html,
            scheme: Regex::new(r"^https?://(www\.)?")?,
        })
    }

    /// `scan_report_<host>`: scheme and leading `www.` stripped, cut at the
    /// first `/`, anything outside `[A-Za-z0-9._-]` replaced by `_`.
    pub fn file_stem(&self, target: &str) -> String {
        let stripped = self.scheme.replace(target, "");
        let host = stripped.split('/').next().unwrap_or_default();
        let safe: String = host
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        format!("scan_report_{}", safe)
    }

    /// Returns the paths written, JSON first.
    pub fn write(&self, report: &ScanReport) -> anyhow::Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create reports directory {}", self.dir.display()))?;

        let stem = self.file_stem(&report.target);
        let mut written = Vec::new();

        let json_path = self.dir.join(format!("{}.json", stem));
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&json_path, json)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        info!("JSON report written to {}", json_path.display());
        written.push(json_path);

        if self.html {
            let html_path = self.dir.join(format!("{}.html", stem));
            fs::write(&html_path, render_html(report))
                .with_context(|| format!("Failed to write {}", html_path.display()))?;
            info!("HTML report written to {}", html_path.display());
            written.push(html_path);
        }

        Ok(written)
    }
}

pub fn render_html(report: &ScanReport) -> String {
    let mut finding_rows = String::new();
    for (i, reported) in report.findings.iter().enumerate() {
        let f = &reported.finding;
        let (owasp, remediation) = match &reported.knowledge {
            Some(k) => (k.owasp.as_str(), k.remediation_title.as_str()),
            None => ("-", "-"),
        };
        finding_rows.push_str(&format!(
            r#"<tr>
                <td>{}</td>
                <td><span class="sev sev-{}">{}</span></td>
                <td>{}</td>
                <td class="mono">{}</td>
                <td class="mono">{}</td>
                <td>{}</td>
                <td>{}</td>
            </tr>"#,
            i + 1,
            f.severity.to_string().to_lowercase(),
            f.severity,
            html_escape(&f.vuln_type.to_string()),
            html_escape(&f.url),
            html_escape(f.payload.as_deref().unwrap_or("-")),
            html_escape(owasp),
            html_escape(remediation),
        ));
    }

    let findings_panel = if report.findings.is_empty() {
        r#"<div class="empty">No vulnerabilities found.</div>"#.to_string()
    } else {
        format!(
            r#"<table><thead><tr><th>#</th><th>Severity</th><th>Type</th><th>URL</th><th>Payload</th><th>OWASP</th><th>Remediation</th></tr></thead><tbody>{}</tbody></table>"#,
            finding_rows
        )
    };

    let headers_panel = if !report.headers.checked {
        r#"<div class="empty">Headers could not be checked.</div>"#.to_string()
    } else if report.headers.missing.is_empty() {
        r#"<div class="empty">All required security headers present.</div>"#.to_string()
    } else {
        let items: String = report
            .headers
            .missing
            .iter()
            .map(|h| format!("<li class=\"mono\">{}</li>", html_escape(h)))
            .collect();
        format!("<ul>{}</ul>", items)
    };

    let ports_panel = if report.ports.is_empty() {
        r#"<div class="empty">No open ports detected.</div>"#.to_string()
    } else {
        let rows: String = report
            .ports
            .iter()
            .map(|p| {
                format!(
                    "<tr><td class=\"mono\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    p.port,
                    html_escape(&p.info.service),
                    p.info.risk,
                    html_escape(&p.info.remediation)
                )
            })
            .collect();
        format!(
            "<table><thead><tr><th>Port</th><th>Service</th><th>Risk</th><th>Remediation</th></tr></thead><tbody>{}</tbody></table>",
            rows
        )
    };

    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Scan Report: {target}</title>
<style>
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
body {{ background: #0a0a0c; color: #e1e1e6; font-family: system-ui, sans-serif; padding: 2rem; }}
.header {{ display: flex; align-items: center; gap: 1rem; margin-bottom: 2rem; }}
.header h1 {{ font-size: 1.5rem; font-weight: 700; }}
.grade {{ font-size: 1.25rem; font-weight: 800; padding: 0.25rem 0.9rem; border-radius: 8px; }}
.grade.success {{ background: rgba(16,185,129,0.15); color: #10b981; }}
.grade.info {{ background: rgba(59,130,246,0.15); color: #3b82f6; }}
.grade.warning {{ background: rgba(234,179,8,0.15); color: #eab308; }}
.grade.danger {{ background: rgba(244,63,94,0.15); color: #f43f5e; }}
.meta {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 1rem; margin-bottom: 2rem; }}
.meta-card {{ background: rgba(255,255,255,0.035); border: 1px solid rgba(255,255,255,0.08); border-radius: 12px; padding: 1.25rem; }}
.meta-card .label {{ font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.08em; color: #64647a; margin-bottom: 0.5rem; }}
.meta-card .value {{ font-size: 1.25rem; font-weight: 700; font-family: monospace; word-break: break-all; }}
table {{ width: 100%; border-collapse: collapse; font-size: 0.85rem; }}
thead th {{ text-align: left; padding: 0.75rem 1rem; border-bottom: 1px solid rgba(255,255,255,0.08); color: #64647a; font-size: 0.7rem; text-transform: uppercase; }}
tbody td {{ padding: 0.75rem 1rem; border-bottom: 1px solid rgba(255,255,255,0.04); }}
ul {{ padding: 1rem 2.5rem; }}
.mono {{ font-family: monospace; font-size: 0.8rem; }}
.sev {{ padding: 0.15rem 0.5rem; border-radius: 9999px; font-size: 0.7rem; font-weight: 700; text-transform: uppercase; }}
.sev-critical {{ background: rgba(244,63,94,0.1); color: #f43f5e; }}
.sev-high {{ background: rgba(249,115,22,0.1); color: #f97316; }}
.sev-medium {{ background: rgba(234,179,8,0.1); color: #eab308; }}
.sev-low {{ background: rgba(59,130,246,0.1); color: #3b82f6; }}
.panel {{ background: rgba(255,255,255,0.02); border: 1px solid rgba(255,255,255,0.08); border-radius: 12px; overflow: hidden; margin-bottom: 2rem; }}
.panel-header {{ padding: 1rem 1.25rem; border-bottom: 1px solid rgba(255,255,255,0.08); font-weight: 600; font-size: 0.85rem; }}
.empty {{ padding: 2rem; text-align: center; color: #64647a; }}
</style>
</head>
<body>
<div class="header">
    <h1>Vulnerability Scan Report</h1>
    <span class="grade {color}">{grade}</span>
</div>

<div class="meta">
    <div class="meta-card"><div class="label">Target</div><div class="value">{target}</div></div>
    <div class="meta-card"><div class="label">IP Address</div><div class="value">{ip}</div></div>
    <div class="meta-card"><div class="label">Date</div><div class="value">{date}</div></div>
    <div class="meta-card"><div class="label">Risk Score</div><div class="value">{score:.1} / 10</div></div>
    <div class="meta-card"><div class="label">Forms Found</div><div class="value">{forms}</div></div>
    <div class="meta-card"><div class="label">Findings</div><div class="value">{count}</div></div>
</div>

<div class="panel">
    <div class="panel-header">Findings</div>
    {findings_panel}
</div>

<div class="panel">
    <div class="panel-header">Missing Security Headers</div>
    {headers_panel}
</div>

<div class="panel">
    <div class="panel-header">Open Ports</div>
    {ports_panel}
</div>
</body>
</html>"#,
        target = html_escape(&report.target),
        ip = report.ip,
        date = html_escape(&report.date),
        score = report.risk_score,
        grade = report.grade,
        color = report.grade_color,
        forms = report.forms_found,
        count = report.vuln_count,
        findings_panel = findings_panel,
        headers_panel = headers_panel,
        ports_panel = ports_panel,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
