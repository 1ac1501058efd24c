use std::sync::Arc;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use cyberscan_core::{Finding, ScanEventSink};

/// Progress sink backed by a terminal spinner. Log lines and findings are
/// printed above the spinner so they are not overwritten by the next tick.
pub struct SpinnerSink {
    pb: ProgressBar,
}

impl SpinnerSink {
    pub fn start(target: &str) -> Arc<Self> {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁"]);
        pb.set_style(style);
        pb.set_message(format!("Resolving {}", target));
        pb.enable_steady_tick(Duration::from_millis(100));
        Arc::new(Self { pb })
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ScanEventSink for SpinnerSink {
    fn on_log(&self, level: &str, message: &str) {
        let line = match level {
            "success" => message.green().to_string(),
            "error" => message.red().to_string(),
            "warn" => message.yellow().to_string(),
            _ => message.to_string(),
        };
        self.pb.println(line);
    }

    fn on_finding(&self, finding: &Finding) {
        self.pb.println(format!(
            "{} {} [{}] → {}",
            "[+]".green().bold(),
            finding.vuln_type.to_string().red().bold(),
            finding.severity,
            finding.url
        ));
    }

    fn on_progress(&self, phase: &str, current: usize, total: usize) {
        if total > 0 {
            self.pb.set_message(format!("{} ({}/{})", phase, current, total));
        } else {
            self.pb.set_message(phase.to_string());
        }
    }
}
