//! Package classification.
//!
//! A package is classified by probing for a platform-specific manifest:
//! Android packages carry `AndroidManifest.xml` at the archive root, iOS
//! packages carry `Payload/<name>.app/Info.plist` with a set of required
//! bundle keys. Android is tried first; a package matching neither is
//! rejected with [`Error::UnrecognizedPackage`].

use std::io::Cursor;
use std::sync::LazyLock;

use regex::Regex;

use crate::archive::PackageArchive;
use crate::error::Error;

/// Name of the Android manifest file, at the archive root.
pub const ANDROID_MANIFEST: &str = "AndroidManifest.xml";

/// IPA files have a `Payload/<something>.app` directory with the property
/// list in it.
static IOS_MANIFEST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Payload/[^/]+\.app/Info\.plist").unwrap());

/// Bundle keys that must be present for the plist to count as an iOS
/// manifest. Value emptiness is not checked, only key presence.
const IOS_REQUIRED_KEYS: [&str; 3] = [
    "CFBundleDisplayName",
    "CFBundleIdentifier",
    "CFBundleShortVersionString",
];

/// An opened package together with its classification.
///
/// Created once per scan invocation and immutable afterwards; plugins only
/// ever hold a shared reference to it.
#[derive(Debug)]
pub struct Package {
    pub archive: PackageArchive,
    pub is_android: bool,
    pub is_ios: bool,
    /// Path of the manifest entry that drove classification. Empty when the
    /// package was built with [`Package::with_flags`].
    pub manifest_path: String,
}

impl Package {
    /// Classifies an opened archive as an Android or iOS package.
    ///
    /// Android is tried first, then iOS; at most one flag ends up set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnrecognizedPackage`] when neither manifest probe
    /// succeeds. The driver treats this as fatal.
    pub fn classify(archive: PackageArchive) -> Result<Self, Error> {
        if let Some(path) = android_manifest(&archive) {
            tracing::info!(manifest = %path, "identified as an Android application");
            return Ok(Self {
                archive,
                is_android: true,
                is_ios: false,
                manifest_path: path,
            });
        }
        if let Some(path) = ios_manifest(&archive) {
            tracing::info!(manifest = %path, "identified as an iOS application");
            return Ok(Self {
                archive,
                is_android: false,
                is_ios: true,
                manifest_path: path,
            });
        }
        Err(Error::UnrecognizedPackage)
    }

    /// Builds a package with explicit classification flags, bypassing
    /// detection. Used when a caller needs a package treated as a specific
    /// platform combination, e.g. in gating tests.
    pub fn with_flags(archive: PackageArchive, is_android: bool, is_ios: bool) -> Self {
        Self {
            archive,
            is_android,
            is_ios,
            manifest_path: String::new(),
        }
    }
}

/// Checks for an Android manifest: an entry named exactly
/// `AndroidManifest.xml` at the root, with a size greater than zero bytes.
/// An empty entry is treated as absent, which guards against directory-only
/// ZIP entries.
pub fn android_manifest(archive: &PackageArchive) -> Option<String> {
    match archive.entry_size(ANDROID_MANIFEST) {
        Some(size) if size > 0 => Some(ANDROID_MANIFEST.to_owned()),
        _ => None,
    }
}

/// Checks for an iOS manifest: the first `Payload/<name>.app/Info.plist`
/// entry, parsed as a property list, with all required bundle keys present.
/// A plist that fails to parse means the probe fails, not the scan.
pub fn ios_manifest(archive: &PackageArchive) -> Option<String> {
    let paths = archive.find_matching(&IOS_MANIFEST_PATTERN, true);
    let path = paths.into_iter().next()?;
    let data = archive.read_entry(&path).ok()?;
    let value = plist::Value::from_reader(Cursor::new(data)).ok()?;
    let dict = value.as_dictionary()?;
    IOS_REQUIRED_KEYS
        .iter()
        .all(|key| dict.get(key).is_some())
        .then_some(path)
}
