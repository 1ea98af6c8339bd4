//! CLI rendering of scan results and the plugin list.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::model::{PluginOutcome, ScanReport};
use crate::plugin::Plugin;

#[derive(Tabled)]
struct PluginRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Description")]
    description: &'static str,
    #[tabled(rename = "Android")]
    android: &'static str,
    #[tabled(rename = "iOS")]
    ios: &'static str,
    #[tabled(rename = "Online")]
    online: &'static str,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Plugin")]
    plugin: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Findings")]
    findings: String,
}

pub fn print_report(report: &ScanReport) {
    let platform = if report.is_android {
        "Android"
    } else if report.is_ios {
        "iOS"
    } else {
        "unclassified"
    };

    println!();
    println!(
        "Identified as an {} application via a manifest located at: {}",
        platform, report.manifest_path
    );

    for result in &report.results {
        println!();
        println!("Scanning with the \"{}\" plugin", result.plugin);
        match &result.outcome {
            PluginOutcome::Skipped { reason } => {
                println!("-- Skipped: {reason}");
            }
            PluginOutcome::Completed(plugin_report) => {
                for notice in &plugin_report.notices {
                    println!("-- {notice}");
                }
                for finding in &plugin_report.findings {
                    println!("-- ISSUE: {finding}");
                }
            }
        }
    }

    let rows: Vec<SummaryRow> = report
        .results
        .iter()
        .map(|result| match &result.outcome {
            PluginOutcome::Skipped { .. } => SummaryRow {
                plugin: result.plugin.clone(),
                status: "skipped".to_owned(),
                findings: "-".to_owned(),
            },
            PluginOutcome::Completed(plugin_report) => SummaryRow {
                plugin: result.plugin.clone(),
                status: "completed".to_owned(),
                findings: plugin_report.findings.len().to_string(),
            },
        })
        .collect();

    println!();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!();
    println!(
        "Scan completed at: {} with {} finding(s)",
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC"),
        report.total_findings()
    );
}

pub fn print_plugin_list(plugins: &[Box<dyn Plugin>]) {
    println!("Total active plugins: {}", plugins.len());
    println!();

    let rows: Vec<PluginRow> = plugins
        .iter()
        .map(|plugin| PluginRow {
            name: plugin.name(),
            description: plugin.description(),
            android: yes_no(plugin.supports_android()),
            ios: yes_no(plugin.supports_ios()),
            online: yes_no(plugin.supports_online()),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
