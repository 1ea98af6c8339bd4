//! mobscan - static analysis for Android and iOS application packages.
//!
//! The scanner focuses on security issues living outside compiled source:
//! plaintext configuration files, insecure remote endpoints, weak signing
//! keys, and exposed cloud backends. A package is opened once as a ZIP
//! container, classified by its platform manifest, and handed to a static
//! registry of check plugins, each gated by platform and online-test
//! support.
//!
//! # Example
//!
//! ```no_run
//! use mobscan::{scan_package, Config};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mobscan::Error> {
//!     let config = Config::default();
//!     let report = scan_package(Path::new("app.apk"), &config, false).await?;
//!     println!("{} finding(s)", report.total_findings());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cert;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod package;
pub mod plugin;
pub mod scan;
pub mod schema;

#[cfg(test)]
pub(crate) mod testutil;

pub use archive::PackageArchive;
pub use config::{Config, ProbeConfig};
pub use error::Error;
pub use model::{PluginOutcome, PluginReport, PluginResult, ScanReport};
pub use package::Package;
pub use plugin::{active_plugins, Plugin, ScanContext};
pub use scan::scan_package;
