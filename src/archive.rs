//! Archive access for package files.
//!
//! Both APK and IPA packages are ZIP containers. [`PackageArchive`] wraps the
//! opened container and exposes the operations the rest of the pipeline
//! needs: listing entry paths, pattern search, and raw entry reads.
//!
//! Entries are addressed by path string; paths are unique within an archive
//! and are listed in the archive's native central-directory order. Consumers
//! that need a different order must sort explicitly.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use regex::Regex;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::Error;

/// Object-safe reader bound so files and in-memory buffers can share one
/// archive type.
trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekRead for T {}

struct BoxedReader(Box<dyn SeekRead>);

impl Read for BoxedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl Seek for BoxedReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.0.seek(pos)
    }
}

/// An opened package archive.
///
/// The ZIP cursor needs mutable access for entry reads, so it lives behind a
/// mutex. The scan itself is strictly sequential; the lock only lets the
/// driver hand one read-only handle to every plugin.
pub struct PackageArchive {
    inner: Mutex<ZipArchive<BoxedReader>>,
}

impl std::fmt::Debug for PackageArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageArchive").finish_non_exhaustive()
    }
}

impl PackageArchive {
    /// Opens the file at `path` as a package archive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAnArchive`] when the file is missing, is not a
    /// valid ZIP container, or uses a container feature the reader cannot
    /// handle.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "cannot open file");
            Error::NotAnArchive {
                path: path.to_path_buf(),
            }
        })?;
        Self::from_reader(file).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "not a valid archive");
            Error::NotAnArchive {
                path: path.to_path_buf(),
            }
        })
    }

    /// Opens an archive from any seekable reader, e.g. an in-memory buffer.
    pub fn from_reader(reader: impl Read + Seek + Send + 'static) -> Result<Self, Error> {
        let archive = ZipArchive::new(BoxedReader(Box::new(reader)))?;
        Ok(Self {
            inner: Mutex::new(archive),
        })
    }

    /// All entry paths, in the archive's native directory order.
    pub fn list_paths(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        (0..inner.len())
            .filter_map(|i| inner.name_for_index(i))
            .map(str::to_owned)
            .collect()
    }

    /// Returns the matched text of every entry path that matches `pattern`
    /// anchored at the start of the path, in directory order.
    ///
    /// These are prefix-match semantics: the match must begin at the first
    /// byte of the entry path, and the returned string is the matched
    /// portion, which may be shorter than the full path. With
    /// `stop_after_first` the remaining entries are not scanned and at most
    /// one match is returned.
    pub fn find_matching(&self, pattern: &Regex, stop_after_first: bool) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let mut paths = Vec::new();
        for i in 0..inner.len() {
            let Some(name) = inner.name_for_index(i) else {
                continue;
            };
            if let Some(m) = pattern.find(name) {
                if m.start() == 0 {
                    paths.push(m.as_str().to_owned());
                    if stop_after_first {
                        break;
                    }
                }
            }
        }
        paths
    }

    /// Reads the raw bytes of one entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] when no entry has exactly this path.
    pub fn read_entry(&self, path: &str) -> Result<Vec<u8>, Error> {
        let mut inner = self.inner.lock().unwrap();
        let mut entry = inner.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => Error::EntryNotFound(path.to_owned()),
            other => Error::Zip(other),
        })?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Uncompressed size of an entry, or `None` when the path does not exist.
    pub fn entry_size(&self, path: &str) -> Option<u64> {
        let mut inner = self.inner.lock().unwrap();
        inner.by_name(path).ok().map(|entry| entry.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::archive_with;
    use std::io::Cursor;

    #[test]
    fn open_rejects_missing_file() {
        let err = PackageArchive::open(Path::new("no/such/file.apk")).unwrap_err();
        assert!(matches!(err, Error::NotAnArchive { .. }));
    }

    #[test]
    fn open_rejects_non_zip_data() {
        let err = PackageArchive::from_reader(Cursor::new(b"foobar data".to_vec())).unwrap_err();
        assert!(matches!(err, Error::Zip(_)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.apk");
        std::fs::write(&path, b"not a zip").unwrap();
        let err = PackageArchive::open(&path).unwrap_err();
        assert!(matches!(err, Error::NotAnArchive { .. }));
    }

    #[test]
    fn list_paths_keeps_directory_order() {
        let archive = archive_with(&[
            ("b.txt", b"b"),
            ("a/a.txt", b"a"),
            ("c.txt", b"c"),
        ]);
        assert_eq!(archive.list_paths(), vec!["b.txt", "a/a.txt", "c.txt"]);
    }

    #[test]
    fn find_matching_is_prefix_anchored() {
        let archive = archive_with(&[
            ("test1.txt", b""),
            ("test/test2.doc", b""),
            ("test/test/test3.md", b""),
        ]);
        let pattern = Regex::new(r".*est/test.*\..*").unwrap();
        let paths = archive.find_matching(&pattern, false);
        assert_eq!(paths, vec!["test/test2.doc", "test/test/test3.md"]);
    }

    #[test]
    fn find_matching_rejects_mid_path_matches() {
        let archive = archive_with(&[("prefix-test.txt", b"")]);
        let pattern = Regex::new(r"test\.txt").unwrap();
        assert!(archive.find_matching(&pattern, false).is_empty());
    }

    #[test]
    fn find_matching_returns_matched_portion() {
        let archive = archive_with(&[("dir/config.json/readme.md", b"")]);
        let pattern = Regex::new(r".*/config\.json").unwrap();
        let paths = archive.find_matching(&pattern, false);
        assert_eq!(paths, vec!["dir/config.json"]);
    }

    #[test]
    fn find_matching_stops_after_first() {
        let archive = archive_with(&[("a.txt", b""), ("b.txt", b""), ("c.txt", b"")]);
        let pattern = Regex::new(r".*\.txt").unwrap();
        let paths = archive.find_matching(&pattern, true);
        assert_eq!(paths, vec!["a.txt"]);
    }

    #[test]
    fn read_entry_roundtrip() {
        let archive = archive_with(&[("data.bin", b"\x00\x01\x02payload")]);
        assert_eq!(archive.read_entry("data.bin").unwrap(), b"\x00\x01\x02payload");
    }

    #[test]
    fn read_entry_missing_path() {
        let archive = archive_with(&[("data.bin", b"x")]);
        let err = archive.read_entry("other.bin").unwrap_err();
        assert!(matches!(err, Error::EntryNotFound(path) if path == "other.bin"));
    }

    #[test]
    fn entry_size_reports_uncompressed_size() {
        let archive = archive_with(&[("empty", b""), ("full", b"12345")]);
        assert_eq!(archive.entry_size("empty"), Some(0));
        assert_eq!(archive.entry_size("full"), Some(5));
        assert_eq!(archive.entry_size("missing"), None);
    }
}
