//! Detection of incorrect SSL configuration in the Adobe Mobile SDK.
//!
//! The SDK reads its settings from an `ADBMobileConfig.json` file embedded
//! in the package. On Android the file usually sits in the assets folder but
//! can be placed elsewhere; on iOS it can be anywhere. Files not named in
//! the standard fashion are not searched for.
//!
//! Every located file is parsed as JSON and validated against the rule set
//! in `data/adobe_mobile_sdk_schema.json`; each violated constraint becomes
//! one finding carrying the rule's title verbatim.

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::archive::PackageArchive;
use crate::model::PluginReport;
use crate::plugin::{Plugin, ScanContext};
use crate::schema::RuleSet;

static CONFIG_FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"assets/ADBMobileConfig\.json|ADBMobileConfig\.json|.*/ADBMobileConfig\.json")
        .unwrap()
});

const RULE_SET_JSON: &str = include_str!("../../data/adobe_mobile_sdk_schema.json");

pub struct AdobeMobileSdkPlugin {
    rules: RuleSet,
}

impl AdobeMobileSdkPlugin {
    /// Builds the plugin with a freshly parsed rule set.
    pub fn new() -> Self {
        Self {
            rules: RuleSet::parse(RULE_SET_JSON).expect("embedded rule set is valid JSON"),
        }
    }

    fn locate(archive: &PackageArchive) -> Vec<String> {
        archive.find_matching(&CONFIG_FILE_PATTERN, false)
    }

    /// `None` on malformed JSON; the caller reports the file and continues.
    fn parse(data: &[u8]) -> Option<Value> {
        serde_json::from_slice(data).ok()
    }
}

impl Default for AdobeMobileSdkPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for AdobeMobileSdkPlugin {
    fn name(&self) -> &'static str {
        "AdobeMobileSdk"
    }

    fn description(&self) -> &'static str {
        "Detection of incorrect SSL configuration in the Adobe Mobile SDK"
    }

    fn supports_android(&self) -> bool {
        true
    }

    fn supports_ios(&self) -> bool {
        true
    }

    async fn scan(&self, ctx: &ScanContext<'_>) -> Result<PluginReport> {
        let mut report = PluginReport::new();

        let paths = Self::locate(&ctx.package.archive);
        if paths.is_empty() {
            report.notice("Cannot find the \"ADBMobileConfig.json\" file, skipping");
            return Ok(report);
        }
        report.notice(format!("Found {} configuration file(s)", paths.len()));

        for path in &paths {
            report.notice(format!("Scanning \"{path}\""));
            let data = match ctx.package.archive.read_entry(path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::debug!(path, error = %e, "configuration file not readable");
                    report.notice(format!(
                        "Unable to read configuration file - will skip. File: {path}"
                    ));
                    continue;
                }
            };
            let Some(document) = Self::parse(&data) else {
                report.notice(format!(
                    "Unable to parse configuration file - will skip. File: {path}"
                ));
                continue;
            };
            for violation in self.rules.validate(&document) {
                report.finding(violation.message());
            }
        }

        Ok(report)
    }
}
