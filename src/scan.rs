//! The scan driver.
//!
//! One package per invocation: open the archive, classify it once, then run
//! every registered plugin to completion in order. The only fatal errors
//! are a file that is not an archive and a package that matches neither
//! platform; everything below that surfaces as notices inside the report.

use std::path::Path;

use chrono::Utc;

use crate::archive::PackageArchive;
use crate::config::Config;
use crate::error::Error;
use crate::model::{PluginOutcome, PluginReport, PluginResult, ScanReport};
use crate::package::Package;
use crate::plugin::{active_plugins, ScanContext};

/// Opens, classifies, and scans the package at `path` with every registered
/// plugin whose OS gate passes.
///
/// # Errors
///
/// Returns [`Error::NotAnArchive`] when the file cannot be opened as a ZIP
/// container and [`Error::UnrecognizedPackage`] when it is neither an
/// Android nor an iOS package.
pub async fn scan_package(path: &Path, config: &Config, online: bool) -> Result<ScanReport, Error> {
    let archive = PackageArchive::open(path)?;
    let package = Package::classify(archive)?;
    let ctx = ScanContext {
        package: &package,
        online,
    };

    let mut results = Vec::new();
    for plugin in active_plugins(config) {
        let outcome = if plugin.is_os_supported(&package) {
            tracing::info!(plugin = plugin.name(), "scanning");
            match plugin.scan(&ctx).await {
                Ok(report) => PluginOutcome::Completed(report),
                Err(e) => {
                    // Plugins handle their own per-item problems; an Err
                    // here is unexpected but must not abort the other
                    // plugins.
                    tracing::warn!(plugin = plugin.name(), error = %e, "plugin failed");
                    let mut report = PluginReport::new();
                    report.notice(format!("Plugin failed: {e}"));
                    PluginOutcome::Completed(report)
                }
            }
        } else {
            tracing::info!(plugin = plugin.name(), "platform not supported, skipping");
            PluginOutcome::Skipped {
                reason: "platform is not supported by this plugin".to_owned(),
            }
        };
        results.push(PluginResult {
            plugin: plugin.name().to_owned(),
            description: plugin.description().to_owned(),
            outcome,
        });
    }

    Ok(ScanReport {
        package_path: path.to_path_buf(),
        is_android: package.is_android,
        is_ios: package.is_ios,
        manifest_path: package.manifest_path.clone(),
        scan_time: Utc::now(),
        results,
    })
}
