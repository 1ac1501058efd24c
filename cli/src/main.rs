mod spinner;

use clap::Parser;
use colored::*;
use std::process;
use std::sync::Arc;

use cyberscan_core::{
    read_lines, ConsoleSink, Knowledge, ReportWriter, ScanConfig, ScanEngine, ScanError,
    ScanReport, SinkRef, TargetManager, DEFAULT_PORTS,
};

use crate::spinner::SpinnerSink;

#[derive(Parser, Debug)]
#[command(
    name = "cyberscan",
    version,
    about = "Single-target web vulnerability scanner",
    override_usage = "cyberscan <target>  <options>",
    after_help = "\x1b[1;36mEXAMPLES:\x1b[0m
  Quick scan:                     cyberscan http://target.test
  Verbose mode:                   cyberscan http://target.test -v
  HTML report:                    cyberscan http://target.test --html -o out/
  With proxy (Burp):              cyberscan http://target.test --proxy http://127.0.0.1:8080
  Authenticated session:          cyberscan http://target.test -H \"Cookie: sess=abc\"
  Custom ports:                   cyberscan http://target.test -p 22,80,443,5432
  Scan from file:                 cyberscan -l targets.txt
  Dry-run test:                   cyberscan http://target.test --dry-run"
)]
pub struct Args {
    #[arg(required_unless_present = "list")]
    pub target: Option<String>,

    #[arg(short = 'l', long = "list", help = "File containing target URLs (one per line)")]
    pub list: Option<String>,

    #[arg(long, default_value_t = 5, help = "HTTP request timeout in seconds")]
    pub timeout: u64,

    #[arg(long, default_value_t = 3, help = "Sensitive-path request timeout in seconds")]
    pub path_timeout: u64,

    #[arg(long, default_value_t = 500, help = "TCP connect timeout in milliseconds")]
    pub port_timeout: u64,

    #[arg(short = 'p', long, value_delimiter = ',', help = "Ports to probe (default 21,22,80,443,3306,8080)")]
    pub ports: Option<Vec<u16>>,

    #[arg(short = 'o', long = "output-dir", default_value = "reports", help = "Directory for report files")]
    pub output_dir: String,

    #[arg(long, help = "Also write a self-contained HTML report")]
    pub html: bool,

    #[arg(long, help = "Proxy URL (e.g. http://127.0.0.1:8080)")]
    pub proxy: Option<String>,

    #[arg(short = 'H', long = "header", help = "Custom header (e.g. \"Cookie: sess=abc\")")]
    pub headers: Vec<String>,

    #[arg(long, help = "JSON file overlaying the built-in knowledge base")]
    pub knowledge_base: Option<String>,

    #[arg(short = 'v', long, default_value_t = false, help = "Show the whole process (Verbose Mode)")]
    pub verbose: bool,

    #[arg(long, help = "List the targets without sending any request")]
    pub dry_run: bool,
}

impl Args {
    fn to_config(&self) -> ScanConfig {
        ScanConfig {
            timeout: self.timeout,
            path_timeout: self.path_timeout,
            port_timeout_ms: self.port_timeout,
            ports: self.ports.clone().unwrap_or_else(|| DEFAULT_PORTS.to_vec()),
            proxy: self.proxy.clone().unwrap_or_default(),
            headers: self.headers.clone(),
            reports_dir: self.output_dir.clone(),
            html_report: self.html,
            knowledge_base: self.knowledge_base.clone().unwrap_or_default(),
            verbose: self.verbose,
            ..ScanConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let args = Args::parse();
    init_logger(args.verbose);
    print_banner();

    let mut targets = TargetManager::new();

    if let Some(ref list_path) = args.list {
        match read_lines(list_path) {
            Ok(lines) => {
                println!("{}", format!("[+] Loaded {} target(s) from {}", lines.len(), list_path).green().bold());
                for line in &lines {
                    targets.add_target(line);
                }
            }
            Err(e) => {
                eprintln!("{}", format!("[!] Failed to read '{}': {}", list_path, e).red());
                process::exit(1);
            }
        }
    }

    if let Some(ref t) = args.target {
        targets.add_target(t);
    }

    if targets.is_empty() {
        eprintln!("{}", "[!] No targets specified. Provide a URL or use -l <file>.".red());
        process::exit(1);
    }

    if args.dry_run {
        while let Some(target) = targets.next() {
            println!("[DRY RUN] Would scan target: {}", target);
        }
        return;
    }

    let config = args.to_config();
    let knowledge = match load_knowledge(&config) {
        Ok(kb) => Arc::new(kb),
        Err(e) => {
            eprintln!("{}", format!("[!] {:#}", e).red());
            process::exit(1);
        }
    };

    let writer = match ReportWriter::new(&config.reports_dir, config.html_report) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("{}", format!("[!] {:#}", e).red());
            process::exit(1);
        }
    };

    let total = targets.len();
    let mut failed = 0usize;
    let mut index = 0usize;

    while let Some(target) = targets.next() {
        index += 1;
        if total > 1 {
            println!("\n{}", format!("━━━ Target {}/{}: {} ━━━", index, total, target).bright_white().bold());
        }
        print_scan_config(&target, &config);

        if let Err(e) = scan_target(&target, &config, &knowledge, &writer).await {
            eprintln!("{}", format!("[!] {:#}", e).red());
            failed += 1;
        }
    }

    if failed > 0 {
        eprintln!("{}", format!("[!] {} of {} target(s) failed.", failed, total).red().bold());
        process::exit(1);
    }
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_knowledge(config: &ScanConfig) -> anyhow::Result<Knowledge> {
    match config.knowledge_base_ref() {
        Some(path) => {
            let kb = Knowledge::load_overlay(path)?;
            println!("{}", format!("[+] Knowledge base overlay loaded from {}", path).green());
            Ok(kb)
        }
        None => Ok(Knowledge::builtin()),
    }
}

/// Runs one scan on its own engine and session, then writes the reports.
async fn scan_target(
    target: &str,
    config: &ScanConfig,
    knowledge: &Arc<Knowledge>,
    writer: &ReportWriter,
) -> anyhow::Result<()> {
    // Verbose output streams through the logger; a spinner would garble it.
    let (sink, spinner): (SinkRef, Option<Arc<SpinnerSink>>) = if config.verbose {
        (ConsoleSink::new_ref(), None)
    } else {
        let s = SpinnerSink::start(target);
        let sink: SinkRef = s.clone();
        (sink, Some(s))
    };

    let engine = ScanEngine::new(config.clone(), Arc::clone(knowledge), sink);
    let result = engine.run_scan(target).await;

    if let Some(s) = spinner {
        s.finish();
    }

    let report = match result {
        Ok(report) => report,
        Err(ScanError::Resolution { host }) => {
            anyhow::bail!("Error: could not resolve host '{}'", host);
        }
        Err(e) => return Err(e.into()),
    };

    print_summary(&report);

    for path in writer.write(&report)? {
        println!("{}", format!("[+] Report saved to {}", path.display()).green());
    }
    Ok(())
}

fn print_banner() {
    let banner = r#"
   ______      __              _____
  / ____/_  __/ /_  ___  _____/ ___/_________ _____
 / /   / / / / __ \/ _ \/ ___/\__ \/ ___/ __ `/ __ \
/ /___/ /_/ / /_/ /  __/ /   ___/ / /__/ /_/ / / / /
\____/\__, /_.___/\___/_/   /____/\___/\__,_/_/ /_/
     /____/
    "#;
    println!("{}", banner.bright_cyan().bold());
    println!("{}", "──────────────────────────────────────────────────".dimmed());
}

fn print_scan_config(target: &str, config: &ScanConfig) {
    let ports: Vec<String> = config.ports.iter().map(|p| p.to_string()).collect();

    println!("{}", format!("[+] Target:     {}", target).green().bold());
    println!("{}", format!("[+] Timeout:    {}s (paths {}s, ports {}ms)", config.timeout, config.path_timeout, config.port_timeout_ms).blue());
    println!("{}", format!("[+] Ports:      {}", ports.join(",")).blue());
    println!("{}", format!("[+] Reports:    {}{}", config.reports_dir, if config.html_report { " (json + html)" } else { " (json)" }).blue());
    if let Some(proxy) = config.proxy_ref() {
        println!("{}", format!("[+] Proxy:      {}", proxy).yellow());
    }
    if !config.headers.is_empty() {
        println!("{}", format!("[+] Headers:    {} custom", config.headers.len()).yellow());
    }
    println!("{}", "──────────────────────────────────────────────────".dimmed());
}

fn print_summary(report: &ScanReport) {
    let grade = format!("Grade {}  ({:.1}/10)", report.grade, report.risk_score);
    let grade = match report.grade_color {
        "success" => grade.green().bold(),
        "info" => grade.blue().bold(),
        "warning" => grade.yellow().bold(),
        _ => grade.red().bold(),
    };

    println!("\n{}", "━━━ Scan Summary ━━━".bright_white().bold());
    println!("{}", grade);
    println!("    Target:   {} ({})", report.target, report.ip);
    println!("    Date:     {}", report.date);
    println!("    Forms:    {}", report.forms_found);
    println!("    Findings: {}", report.vuln_count);

    for (i, reported) in report.findings.iter().enumerate() {
        let f = &reported.finding;
        println!(
            "      #{} {} [{}] → {} (payload: {})",
            i + 1,
            f.vuln_type.to_string().red(),
            f.severity,
            f.url,
            f.payload.as_deref().unwrap_or("-")
        );
    }

    if !report.headers.checked {
        println!("    Headers:  {}", "not checked (page unreachable)".dimmed());
    } else if report.headers.missing.is_empty() {
        println!("    Headers:  {}", "all present".green());
    } else {
        println!("    Headers:  missing {}", report.headers.missing.join(", ").yellow());
    }

    if report.ports.is_empty() {
        println!("    Ports:    none open");
    } else {
        for p in &report.ports {
            println!(
                "    Port {:<5} {} [{}] {}",
                p.port,
                p.info.service,
                p.info.risk,
                p.info.remediation.dimmed()
            );
        }
    }
}
