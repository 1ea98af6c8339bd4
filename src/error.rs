//! Error types for the scanning pipeline.
//!
//! Only two conditions are fatal to a scan: a file that cannot be opened as
//! a package archive, and a package that cannot be classified as Android or
//! iOS. Everything else is handled locally by the component that hit it and
//! surfaces as an informational notice in the scan report.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The file is missing, not a valid ZIP container, or uses a container
    /// feature the reader does not support.
    #[error("unable to open {} as an APK or IPA archive", path.display())]
    NotAnArchive { path: PathBuf },

    /// An entry path was requested that does not exist in the archive.
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    /// Neither the Android nor the iOS manifest probe succeeded.
    #[error("unable to identify the file as an Android or iOS application")]
    UnrecognizedPackage,

    /// An X.509 certificate could not be parsed from a signature block.
    #[error("unable to parse certificate: {0}")]
    Certificate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}
