//! Shared fixtures for module tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::PackageArchive;
use crate::package::Package;

/// Builds an in-memory archive with the given entries, in order.
pub(crate) fn archive_with(entries: &[(&str, &[u8])]) -> PackageArchive {
    PackageArchive::from_reader(zip_bytes(entries)).unwrap()
}

/// Raw ZIP bytes for the given entries, as a seekable cursor.
pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap()
}

/// A package with explicit classification flags, bypassing detection.
pub(crate) fn package_with_flags(
    entries: &[(&str, &[u8])],
    is_android: bool,
    is_ios: bool,
) -> Package {
    Package::with_flags(archive_with(entries), is_android, is_ios)
}

/// A minimal XML property list with the given top-level string keys.
pub(crate) fn plist_with_keys(keys: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for key in keys {
        body.push_str(&format!("<key>{key}</key>\n<string>value</string>\n"));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
         \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
         <plist version=\"1.0\">\n<dict>\n{body}</dict>\n</plist>\n"
    )
    .into_bytes()
}
