//! Reads `.class` entries out of a single jar/zip archive on disk.
//!
//! Uses `zip::ZipArchive` but never extracts to disk - entries are read
//! into memory on demand and cached (component F needs random access,
//! not a one-shot unpack).

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use linkcheck_util::errors::LinkcheckError;
use zip::ZipArchive;

/// A single opened jar/zip, indexed by the internal class name
/// (`com/example/Foo`, no `.class` suffix) of each entry it contains.
pub struct Archive {
    path: PathBuf,
    archive: ZipArchive<File>,
    index: HashMap<String, usize>,
}

impl Archive {
    /// Opens `path` and indexes its `.class` entries. Non-class entries
    /// (resources, `META-INF/`, nested jars) are left in the archive but
    /// not indexed - component F only ever looks classes up by name.
    pub fn open(path: &Path) -> Result<Self, LinkcheckError> {
        let file = File::open(path).map_err(LinkcheckError::Io)?;
        let mut archive = ZipArchive::new(file).map_err(|e| LinkcheckError::Archive {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut index = HashMap::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| LinkcheckError::Archive {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            if let Some(class_name) = entry.name().strip_suffix(".class") {
                index.insert(class_name.to_string(), i);
            }
        }

        Ok(Self { path: path.to_path_buf(), archive, index })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Internal names of every class this archive contains.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn contains(&self, internal_name: &str) -> bool {
        self.index.contains_key(internal_name)
    }

    /// Reads one class entry's raw bytes, if present.
    pub fn read_class(&mut self, internal_name: &str) -> Result<Option<Vec<u8>>, LinkcheckError> {
        let Some(&index) = self.index.get(internal_name) else {
            return Ok(None);
        };
        let mut entry = self.archive.by_index(index).map_err(|e| LinkcheckError::Archive {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf).map_err(LinkcheckError::Io)?;
        Ok(Some(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_test_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn indexes_class_entries_by_internal_name() {
        let dir = tempfile::tempdir().unwrap();
        let jar_path = dir.path().join("a.jar");
        write_test_jar(&jar_path, &[("com/example/Foo.class", b"stub"), ("META-INF/MANIFEST.MF", b"x")]);

        let archive = Archive::open(&jar_path).unwrap();
        assert!(archive.contains("com/example/Foo"));
        assert!(!archive.contains("META-INF/MANIFEST"));
    }

    #[test]
    fn reads_back_entry_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let jar_path = dir.path().join("a.jar");
        write_test_jar(&jar_path, &[("com/example/Foo.class", b"hello")]);

        let mut archive = Archive::open(&jar_path).unwrap();
        let bytes = archive.read_class("com/example/Foo").unwrap().unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn missing_class_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let jar_path = dir.path().join("a.jar");
        write_test_jar(&jar_path, &[("com/example/Foo.class", b"hello")]);

        let mut archive = Archive::open(&jar_path).unwrap();
        assert!(archive.read_class("com/example/Bar").unwrap().is_none());
    }

    #[test]
    fn class_names_lists_every_class() {
        let dir = tempfile::tempdir().unwrap();
        let jar_path = dir.path().join("a.jar");
        write_test_jar(&jar_path, &[("a/A.class", b"1"), ("a/B.class", b"2")]);

        let archive = Archive::open(&jar_path).unwrap();
        let mut names: Vec<_> = archive.class_names().collect();
        names.sort();
        assert_eq!(names, vec!["a/A", "a/B"]);
    }
}
