//! Detection of insecure Firebase databases and GCP storage buckets.
//!
//! The Firebase project identifier ships inside the compiled resource table
//! (`resources.arsc`) as the `firebase_database_url` string resource. The
//! table is scanned for the `<name>.firebaseio.com` host pattern in both
//! string-pool encodings rather than fully parsed, since binary-format
//! parsing is out of scope for this scanner.
//!
//! From the identifier exactly two candidate endpoints are derived and, when
//! online testing is enabled, probed read-only:
//!
//! - `GET https://<name>.firebaseio.com/.json`
//! - `HEAD https://storage.googleapis.com/<name>.appspot.com`
//!
//! Only an HTTP 200 counts as exposed. Redirects are deliberately not
//! followed so a probe never reports on an unintended host; every other
//! status, transport error, or timeout is a normal "not exposed" outcome.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::redirect::Policy;
use reqwest::{Client, Method, StatusCode};

use crate::config::ProbeConfig;
use crate::model::PluginReport;
use crate::plugin::{Plugin, ScanContext};

/// Entry holding the compiled string resources of an APK.
const RESOURCE_TABLE: &str = "resources.arsc";

const HOST_PATTERN: &str = r"([0-9A-Za-z-]+)\.firebaseio\.com";

static HOST_BYTES: LazyLock<regex::bytes::Regex> =
    LazyLock::new(|| regex::bytes::Regex::new(HOST_PATTERN).unwrap());
static HOST_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(HOST_PATTERN).unwrap());

pub struct FirebasePlugin {
    probe: ProbeConfig,
}

impl FirebasePlugin {
    pub fn new(probe: ProbeConfig) -> Self {
        Self { probe }
    }

    /// Pulls the Firebase project identifier out of raw resource-table
    /// bytes. Tries a byte-level match first (UTF-8 string pools), then a
    /// UTF-16LE decoding pass.
    fn extract_identifier(data: &[u8]) -> Option<String> {
        if let Some(captures) = HOST_BYTES.captures(data) {
            return Some(String::from_utf8_lossy(&captures[1]).into_owned());
        }
        let wide: String = data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .map(|unit| char::from_u32(u32::from(unit)).unwrap_or('\u{fffd}'))
            .collect();
        HOST_TEXT
            .captures(&wide)
            .map(|captures| captures[1].to_owned())
    }

    fn database_url(name: &str) -> String {
        format!("https://{name}.firebaseio.com/.json")
    }

    fn bucket_url(name: &str) -> String {
        format!("https://storage.googleapis.com/{name}.appspot.com")
    }

    fn client(&self) -> Result<Client> {
        Ok(Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(self.probe.timeout_secs))
            .build()?)
    }

    /// The finding for an openly readable database, or `None` when the
    /// endpoint is not exposed.
    async fn check_database(client: &Client, url: &str, retries: u32) -> Option<String> {
        probe_ok(client, Method::GET, url, retries)
            .await
            .then(|| format!("Unprotected Firebase DB found - {url}"))
    }

    /// The finding for an openly listable storage bucket, or `None` when the
    /// endpoint is not exposed.
    async fn check_bucket(client: &Client, url: &str, retries: u32) -> Option<String> {
        probe_ok(client, Method::HEAD, url, retries)
            .await
            .then(|| format!("Unprotected bucket found - {url}"))
    }
}

/// One read probe. Only a completed request with status 200 counts; a
/// request that completes with any other status is final, while transport
/// failures are retried up to `retries` extra attempts and then treated as
/// not exposed.
async fn probe_ok(client: &Client, method: Method, url: &str, retries: u32) -> bool {
    for attempt in 0..=retries {
        match client.request(method.clone(), url).send().await {
            Ok(response) => return response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!(url, attempt, error = %e, "probe request failed");
            }
        }
    }
    false
}

#[async_trait]
impl Plugin for FirebasePlugin {
    fn name(&self) -> &'static str {
        "Firebase"
    }

    fn description(&self) -> &'static str {
        "Detection of insecure Firebase databases and GCP storage buckets"
    }

    fn supports_android(&self) -> bool {
        true
    }

    fn supports_ios(&self) -> bool {
        false
    }

    fn supports_online(&self) -> bool {
        true
    }

    async fn scan(&self, ctx: &ScanContext<'_>) -> Result<PluginReport> {
        let mut report = PluginReport::new();

        let data = match ctx.package.archive.read_entry(RESOURCE_TABLE) {
            Ok(data) => data,
            Err(_) => {
                report.notice("Cannot find the resource table (resources.arsc), skipping");
                return Ok(report);
            }
        };
        let Some(name) = Self::extract_identifier(&data) else {
            report.notice("No Firebase database identifier found in the resource table, skipping");
            return Ok(report);
        };
        let db_url = Self::database_url(&name);
        let bucket_url = Self::bucket_url(&name);
        report.notice(format!(
            "Found Firebase database identifier \"{name}\", bucket name: {name}.appspot.com"
        ));

        if !self.is_online_testing_supported(ctx) {
            report.notice("Online tests are disabled, skipping network checks");
            return Ok(report);
        }

        let client = self.client()?;
        if let Some(finding) = Self::check_database(&client, &db_url, self.probe.retries).await {
            report.finding(finding);
        }
        if let Some(finding) = Self::check_bucket(&client, &bucket_url, self.probe.retries).await {
            report.finding(finding);
        }

        if report.findings.is_empty() {
            report.notice("No exposed Firebase endpoints found");
        }

        Ok(report)
    }
}
