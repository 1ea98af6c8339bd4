//! The check-plugin contract and registry.
//!
//! Every check is a [`Plugin`]: static capability flags plus one async
//! `scan` operation producing a [`PluginReport`]. Two gates control
//! execution:
//!
//! - the OS gate ([`Plugin::is_os_supported`]) is evaluated by the driver;
//!   a plugin that does not support the package's platform is skipped
//!   entirely and its `scan` is never called;
//! - the online gate ([`Plugin::is_online_testing_supported`]) is evaluated
//!   *inside* plugins that probe the network; with the gate closed a plugin
//!   still runs its offline checks and reports the skipped network checks
//!   explicitly.
//!
//! The registry is a static, explicit list assembled in
//! [`active_plugins`]; there is no discovery mechanism. A plugin that
//! supports neither platform must never be added to it.

mod adobe_mobile_sdk;
mod firebase;
mod weak_key;

pub use adobe_mobile_sdk::AdobeMobileSdkPlugin;
pub use firebase::FirebasePlugin;
pub use weak_key::WeakKeyPlugin;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::model::PluginReport;
use crate::package::Package;

/// Per-scan context handed to every plugin. Read-only for the duration of
/// the scan.
pub struct ScanContext<'a> {
    pub package: &'a Package,
    /// Whether the user opted into online tests for this scan.
    pub online: bool,
}

/// A self-contained check unit gated by platform and online-support flags.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Whether scanning of Android packages is supported.
    fn supports_android(&self) -> bool;

    /// Whether scanning of iOS packages is supported.
    fn supports_ios(&self) -> bool;

    /// Whether the plugin performs online tests.
    fn supports_online(&self) -> bool {
        false
    }

    /// True when the plugin supports at least one of the package's
    /// platforms. Checked by the driver before `scan` is invoked.
    fn is_os_supported(&self, package: &Package) -> bool {
        (package.is_android && self.supports_android())
            || (package.is_ios && self.supports_ios())
    }

    /// True when this scan run may hit the network: the user opted in and
    /// the plugin supports online tests.
    fn is_online_testing_supported(&self, ctx: &ScanContext<'_>) -> bool {
        ctx.online && self.supports_online()
    }

    /// Runs the check against the package in `ctx`.
    ///
    /// Per-item problems (unreadable entries, unparseable files) are
    /// reported as notices in the returned report, not as errors; an `Err`
    /// from a plugin means something genuinely unexpected happened.
    async fn scan(&self, ctx: &ScanContext<'_>) -> Result<PluginReport>;
}

/// All registered plugins, constructed once per scan invocation with their
/// configuration passed in.
pub fn active_plugins(config: &Config) -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(AdobeMobileSdkPlugin::new()),
        Box::new(WeakKeyPlugin::new()),
        Box::new(FirebasePlugin::new(config.probe.clone())),
    ]
}
