//! Report types produced by a scan.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one plugin invocation produced.
///
/// Findings are the unit of meaning: ordered, human-readable issue messages
/// with no structured severity. Notices carry the informational skips the
/// pipeline is required to report ("file not found", "online tests
/// disabled") so that "nothing to check" stays distinct from "checked and
/// clean".
#[derive(Debug, Clone, Default, Serialize)]
pub struct PluginReport {
    pub findings: Vec<String>,
    pub notices: Vec<String>,
}

impl PluginReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finding(&mut self, message: impl Into<String>) {
        self.findings.push(message.into());
    }

    pub fn notice(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }
}

/// Outcome of one plugin against one package.
///
/// A plugin whose OS gate fails is skipped by the driver without its scan
/// ever being invoked; that is reported distinctly from a completed scan
/// with zero findings.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PluginOutcome {
    Skipped { reason: String },
    Completed(PluginReport),
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginResult {
    pub plugin: String,
    pub description: String,
    pub outcome: PluginOutcome,
}

/// Aggregated results of one scan invocation.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub package_path: PathBuf,
    pub is_android: bool,
    pub is_ios: bool,
    pub manifest_path: String,
    pub scan_time: DateTime<Utc>,
    pub results: Vec<PluginResult>,
}

impl ScanReport {
    pub fn total_findings(&self) -> usize {
        self.results
            .iter()
            .map(|r| match &r.outcome {
                PluginOutcome::Completed(report) => report.findings.len(),
                PluginOutcome::Skipped { .. } => 0,
            })
            .sum()
    }
}
