//! Lazy, cached internal-class-name lookup over an ordered classpath.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;

use linkcheck_classfile::{parse_class_bytes, ClassFile};
use linkcheck_core::artifact::Artifact;
use linkcheck_util::errors::LinkcheckError;

use crate::archive::Archive;
use crate::builder::ClasspathEntry;

/// Prefixes of internal class names shipped by the JVM itself. These are
/// never found on the application classpath, so the repository treats a
/// match against this list as always-resolvable rather than attempting a
/// (nonexistent) lookup - this checker only verifies libraries, not the
/// runtime they sit on.
const SYSTEM_CLASS_PREFIXES: &[&str] =
    &["java/", "javax/", "jdk/", "sun/", "kotlin/"];

pub fn is_system_class(internal_name: &str) -> bool {
    SYSTEM_CLASS_PREFIXES.iter().any(|prefix| internal_name.starts_with(prefix))
}

/// One hit for an internal class name: which entry it came from, and its
/// parsed class file.
pub struct Hit {
    pub entry_index: usize,
    pub class_file: std::rc::Rc<ClassFile>,
}

/// The result of a [`ClassRepository::find_class`] lookup.
pub enum ClassLookup {
    Found(Hit),
    /// A class shipped with the JVM itself; never looked up on disk.
    System,
    NotFound,
}

enum CacheEntry {
    Parsed(std::rc::Rc<ClassFile>),
    Malformed,
    Absent,
}

/// Archives are opened lazily and held open across lookups up to
/// `max_open_archives`; past that bound, opening a new one closes
/// whichever open archive was least recently touched. This bounds the
/// number of live file handles, not the parsed-class-file cache below -
/// an evicted archive's already-cached classes stay served from `cache`
/// without reopening anything.
const DEFAULT_MAX_OPEN_ARCHIVES: usize = 32;

/// Parses on first lookup, caches thereafter. Resolution (`find_class`)
/// only ever walks the selected classpath, first-match-in-order. A second
/// pool of entries - archives the classpath builder did *not* select,
/// passed in via [`ClassRepository::with_shadow_candidates`] - is indexed
/// too but only consulted by `find_shadows`, which the cause attributor
/// uses to check whether an unselected artifact version would have
/// defined a missing symbol, even when the shadow never reached the
/// classpath at all.
pub struct ClassRepository {
    entries: Vec<ClasspathEntry>,
    classpath_len: usize,
    archives: RefCell<Vec<Option<Archive>>>,
    open_order: RefCell<VecDeque<usize>>,
    max_open_archives: usize,
    cache: RefCell<HashMap<(usize, String), CacheEntry>>,
}

impl ClassRepository {
    pub fn new(classpath: Vec<ClasspathEntry>) -> Self {
        Self::with_shadow_candidates(classpath, Vec::new())
    }

    pub fn with_shadow_candidates(classpath: Vec<ClasspathEntry>, shadow_candidates: Vec<ClasspathEntry>) -> Self {
        Self::with_shadow_candidates_and_limit(classpath, shadow_candidates, DEFAULT_MAX_OPEN_ARCHIVES)
    }

    /// Like [`Self::with_shadow_candidates`], but with an explicit cap on
    /// how many archives may be held open at once.
    pub fn with_shadow_candidates_and_limit(
        classpath: Vec<ClasspathEntry>,
        shadow_candidates: Vec<ClasspathEntry>,
        max_open_archives: usize,
    ) -> Self {
        let classpath_len = classpath.len();
        let mut entries = classpath;
        entries.extend(shadow_candidates);
        let archive_slots = entries.iter().map(|_| None).collect();
        Self {
            entries,
            classpath_len,
            archives: RefCell::new(archive_slots),
            open_order: RefCell::new(VecDeque::new()),
            max_open_archives,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn classpath(&self) -> &[ClasspathEntry] {
        &self.entries[..self.classpath_len]
    }

    /// First-match-in-classpath-order lookup, lazily parsing and caching.
    /// Never considers shadow candidates.
    pub fn find_class(&self, internal_name: &str) -> Result<ClassLookup, LinkcheckError> {
        if is_system_class(internal_name) {
            return Ok(ClassLookup::System);
        }

        for index in 0..self.classpath_len {
            match self.load(index, internal_name)? {
                CacheEntry::Parsed(class_file) => {
                    return Ok(ClassLookup::Found(Hit { entry_index: index, class_file }));
                }
                CacheEntry::Malformed => {
                    return Err(LinkcheckError::MalformedClassFile {
                        class_name: internal_name.to_string(),
                        message: format!("failed to parse in {}", self.entries[index].archive_path.display()),
                    });
                }
                CacheEntry::Absent => continue,
            }
        }
        Ok(ClassLookup::NotFound)
    }

    /// Every entry - classpath or shadow candidate - besides the one
    /// `find_class` would return, that also contains `internal_name`.
    pub fn find_shadows(&self, internal_name: &str) -> Result<Vec<Hit>, LinkcheckError> {
        let mut hits = Vec::new();
        let mut seen_selected = false;
        for index in 0..self.entries.len() {
            if let CacheEntry::Parsed(class_file) = self.load(index, internal_name)? {
                if index < self.classpath_len && !seen_selected {
                    seen_selected = true;
                    continue;
                }
                hits.push(Hit { entry_index: index, class_file });
            }
        }
        Ok(hits)
    }

    pub fn entry_path(&self, entry_index: usize) -> &Path {
        &self.entries[entry_index].archive_path
    }

    pub fn entry_artifact(&self, entry_index: usize) -> &Artifact {
        &self.entries[entry_index].artifact
    }

    fn load(&self, index: usize, internal_name: &str) -> Result<CacheEntry, LinkcheckError> {
        let key = (index, internal_name.to_string());
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(clone_cache_entry(cached));
        }

        self.ensure_archive_open(index)?;
        let mut archives = self.archives.borrow_mut();
        let archive = archives[index].as_mut().expect("just opened");

        let result = match archive.read_class(internal_name)? {
            None => CacheEntry::Absent,
            Some(bytes) => match parse_class_bytes(&bytes) {
                Ok(class_file) => CacheEntry::Parsed(std::rc::Rc::new(class_file)),
                Err(_) => CacheEntry::Malformed,
            },
        };

        let cloned = clone_cache_entry(&result);
        self.cache.borrow_mut().insert(key, result);
        Ok(cloned)
    }

    fn ensure_archive_open(&self, index: usize) -> Result<(), LinkcheckError> {
        if self.archives.borrow()[index].is_some() {
            self.touch(index);
            return Ok(());
        }
        self.evict_lru_if_full();
        let archive = Archive::open(&self.entries[index].archive_path)?;
        self.archives.borrow_mut()[index] = Some(archive);
        self.touch(index);
        Ok(())
    }

    fn touch(&self, index: usize) {
        let mut order = self.open_order.borrow_mut();
        order.retain(|&i| i != index);
        order.push_back(index);
    }

    fn evict_lru_if_full(&self) {
        if self.max_open_archives == 0 {
            return;
        }
        let mut order = self.open_order.borrow_mut();
        if order.len() >= self.max_open_archives {
            if let Some(lru) = order.pop_front() {
                self.archives.borrow_mut()[lru] = None;
            }
        }
    }
}

fn clone_cache_entry(entry: &CacheEntry) -> CacheEntry {
    match entry {
        CacheEntry::Parsed(rc) => CacheEntry::Parsed(std::rc::Rc::clone(rc)),
        CacheEntry::Malformed => CacheEntry::Malformed,
        CacheEntry::Absent => CacheEntry::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_classfile::testutil::ClassFileBuilder;
    use std::fs::File;
    use std::io::Write as _;
    use zip::write::SimpleFileOptions;

    fn write_jar(path: &std::path::Path, classes: &[(&str, Vec<u8>)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, bytes) in classes {
            writer.start_file(format!("{name}.class"), options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    fn entry(dir: &std::path::Path, jar_name: &str, classes: &[(&str, Vec<u8>)]) -> ClasspathEntry {
        let path = dir.join(jar_name);
        write_jar(&path, classes);
        ClasspathEntry { artifact: Artifact::new("g", jar_name, "1.0"), archive_path: path }
    }

    #[test]
    fn finds_class_in_first_matching_entry() {
        let dir = tempfile::tempdir().unwrap();
        let foo_bytes = ClassFileBuilder::new("a/Foo", "java/lang/Object").build();
        let classpath = vec![entry(dir.path(), "a.jar", &[("a/Foo", foo_bytes)])];

        let repo = ClassRepository::new(classpath);
        match repo.find_class("a/Foo").unwrap() {
            ClassLookup::Found(hit) => assert_eq!(hit.entry_index, 0),
            _ => panic!("expected a hit"),
        }
    }

    #[test]
    fn missing_class_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let classpath = vec![entry(dir.path(), "a.jar", &[])];
        let repo = ClassRepository::new(classpath);
        assert!(matches!(repo.find_class("a/Missing").unwrap(), ClassLookup::NotFound));
    }

    #[test]
    fn system_classes_never_hit_disk() {
        let repo = ClassRepository::new(vec![]);
        assert!(matches!(repo.find_class("java/lang/Object").unwrap(), ClassLookup::System));
    }

    #[test]
    fn shadowed_entries_are_recorded_in_classpath_order() {
        let dir = tempfile::tempdir().unwrap();
        let selected = ClassFileBuilder::new("a/Foo", "java/lang/Object").build();
        let shadow = ClassFileBuilder::new("a/Foo", "java/lang/Object").build();
        let classpath = vec![
            entry(dir.path(), "a.jar", &[("a/Foo", selected)]),
            entry(dir.path(), "b.jar", &[("a/Foo", shadow)]),
        ];

        let repo = ClassRepository::new(classpath);
        repo.find_class("a/Foo").unwrap();
        let shadows = repo.find_shadows("a/Foo").unwrap();
        assert_eq!(shadows.len(), 1);
        assert_eq!(shadows[0].entry_index, 1);
    }

    #[test]
    fn second_lookup_reuses_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let foo_bytes = ClassFileBuilder::new("a/Foo", "java/lang/Object").build();
        let classpath = vec![entry(dir.path(), "a.jar", &[("a/Foo", foo_bytes)])];

        let repo = ClassRepository::new(classpath);
        repo.find_class("a/Foo").unwrap();
        match repo.find_class("a/Foo").unwrap() {
            ClassLookup::Found(hit) => assert_eq!(hit.class_file.internal_name, "a/Foo"),
            _ => panic!("expected a hit"),
        }
    }

    #[test]
    fn shadow_candidates_never_affect_find_class_but_show_up_in_find_shadows() {
        let dir = tempfile::tempdir().unwrap();
        let selected = ClassFileBuilder::new("a/Foo", "java/lang/Object").build();
        let unselected = ClassFileBuilder::new("a/Foo", "java/lang/Object").with_method("m", "()V", 0x0001).build();
        let classpath = vec![entry(dir.path(), "a-1.0.jar", &[("a/Foo", selected)])];
        let shadow_candidates = vec![entry(dir.path(), "a-2.0.jar", &[("a/Foo", unselected)])];

        let repo = ClassRepository::with_shadow_candidates(classpath, shadow_candidates);
        match repo.find_class("a/Foo").unwrap() {
            ClassLookup::Found(hit) => assert_eq!(hit.entry_index, 0),
            _ => panic!("expected a hit"),
        }
        let shadows = repo.find_shadows("a/Foo").unwrap();
        assert_eq!(shadows.len(), 1);
        assert_eq!(shadows[0].entry_index, 1);
        assert_eq!(shadows[0].class_file.methods.len(), 1);
    }

    #[test]
    fn opening_past_the_limit_evicts_the_least_recently_used_archive() {
        let dir = tempfile::tempdir().unwrap();
        let a = ClassFileBuilder::new("a/Foo", "java/lang/Object").build();
        let b = ClassFileBuilder::new("b/Bar", "java/lang/Object").build();
        let c = ClassFileBuilder::new("c/Baz", "java/lang/Object").build();
        let classpath = vec![
            entry(dir.path(), "a.jar", &[("a/Foo", a)]),
            entry(dir.path(), "b.jar", &[("b/Bar", b)]),
            entry(dir.path(), "c.jar", &[("c/Baz", c)]),
        ];

        let repo = ClassRepository::with_shadow_candidates_and_limit(classpath, Vec::new(), 2);
        // Each entry is absent in the classes that precede it, so finding
        // "c/Baz" opens all three archives in classpath order.
        repo.find_class("c/Baz").unwrap();

        let archives = repo.archives.borrow();
        assert!(archives[0].is_none(), "entry 0 should have been evicted");
        assert!(archives[1].is_some());
        assert!(archives[2].is_some());
        drop(archives);

        // An evicted archive is simply reopened transparently on the next
        // lookup that needs it.
        match repo.find_class("a/Foo").unwrap() {
            ClassLookup::Found(hit) => assert_eq!(hit.entry_index, 0),
            _ => panic!("expected a hit"),
        }
    }
}
