//! Reduces a resolved dependency graph to an ordered classpath under
//! nearest-wins / first-declared version selection.

use std::collections::HashMap;
use std::path::PathBuf;

use linkcheck_core::artifact::{Artifact, ModuleKey};
use linkcheck_core::path::DependencyPath;

/// One candidate the resolver produced: an artifact, the path that reached
/// it, and the local archive file the (out-of-scope) fetcher downloaded for
/// it. Order matters - this is resolver emission order and drives the
/// first-encountered tie-break.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub artifact: Artifact,
    pub path: DependencyPath,
    pub archive_path: PathBuf,
}

/// A classpath slot: one artifact, paired with the archive backing it.
#[derive(Debug, Clone)]
pub struct ClasspathEntry {
    pub artifact: Artifact,
    pub archive_path: PathBuf,
}

/// A module-key collision the builder did not select onto the classpath.
/// Retained for [`crate::repository::ClassRepository::find_shadows`] and
/// cause attribution as a "shadow entry".
#[derive(Debug, Clone)]
pub struct UnselectedAlternative {
    pub module: ModuleKey,
    pub selected: Artifact,
    pub selected_path: DependencyPath,
    pub candidate: Artifact,
    pub candidate_path: DependencyPath,
    pub candidate_archive_path: PathBuf,
}

/// The builder's output: the ordered classpath plus enough bookkeeping for
/// the cause attributor to explain every shadowed module.
#[derive(Debug, Clone)]
pub struct ClassPathResult {
    pub classpath: Vec<ClasspathEntry>,
    selected_paths: HashMap<ModuleKey, DependencyPath>,
    pub unselected: Vec<UnselectedAlternative>,
}

impl ClassPathResult {
    /// The dependency path that caused `module`'s selected version to be
    /// on the classpath, if present.
    pub fn selected_path(&self, module: &ModuleKey) -> Option<&DependencyPath> {
        self.selected_paths.get(module)
    }

    /// All unselected alternatives recorded against `module`.
    pub fn unselected_for(&self, module: &ModuleKey) -> Vec<&UnselectedAlternative> {
        self.unselected.iter().filter(|u| &u.module == module).collect()
    }
}

/// Builds a [`ClassPathResult`] from resolver-ordered candidates.
///
/// For each candidate, in order: if no prior entry shares its module-key,
/// append it and remember the path as selected; otherwise record an
/// unselected alternative and move on. First-encountered wins ties -
/// matching resolver emission order.
pub fn build(candidates: Vec<Candidate>) -> ClassPathResult {
    let mut classpath = Vec::new();
    let mut selected_paths: HashMap<ModuleKey, DependencyPath> = HashMap::new();
    let mut unselected = Vec::new();

    for candidate in candidates {
        let module = candidate.artifact.module_key();
        if let Some(selected_path) = selected_paths.get(&module) {
            let selected_artifact = classpath
                .iter()
                .find(|e: &&ClasspathEntry| e.artifact.module_key() == module)
                .map(|e| e.artifact.clone())
                .expect("a selected_paths entry implies a classpath entry");
            unselected.push(UnselectedAlternative {
                module,
                selected: selected_artifact,
                selected_path: selected_path.clone(),
                candidate: candidate.artifact,
                candidate_path: candidate.path,
                candidate_archive_path: candidate.archive_path,
            });
            continue;
        }

        selected_paths.insert(module, candidate.path.clone());
        classpath.push(ClasspathEntry {
            artifact: candidate.artifact,
            archive_path: candidate.archive_path,
        });
    }

    ClassPathResult { classpath, selected_paths, unselected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_core::dependency::DependencyScope;
    use linkcheck_core::path::PathStep;

    fn candidate(coord: &str, depth_label: &str, archive: &str) -> Candidate {
        let artifact = Artifact::parse(coord).unwrap();
        let path = DependencyPath::new(vec![PathStep {
            artifact: Artifact::parse(depth_label).unwrap(),
            scope: DependencyScope::Compile,
            optional: false,
        }]);
        Candidate { artifact, path, archive_path: PathBuf::from(archive) }
    }

    #[test]
    fn first_candidate_for_a_module_is_selected() {
        let result = build(vec![candidate("g:a:1.0", "root:r:1.0", "a-1.0.jar")]);
        assert_eq!(result.classpath.len(), 1);
        assert!(result.unselected.is_empty());
    }

    #[test]
    fn second_candidate_for_same_module_becomes_unselected() {
        let result = build(vec![
            candidate("g:a:1.0", "root:r:1.0", "a-1.0.jar"),
            candidate("g:a:2.0", "root:r:1.0", "a-2.0.jar"),
        ]);
        assert_eq!(result.classpath.len(), 1);
        assert_eq!(result.classpath[0].artifact.version, "1.0");
        assert_eq!(result.unselected.len(), 1);
        assert_eq!(result.unselected[0].candidate.version, "2.0");
    }

    #[test]
    fn first_encountered_wins_on_equal_distance() {
        let result = build(vec![
            candidate("g:a:2.0", "root:r:1.0", "a-2.0.jar"),
            candidate("g:a:1.0", "root:r:1.0", "a-1.0.jar"),
        ]);
        assert_eq!(result.classpath[0].artifact.version, "2.0");
    }

    #[test]
    fn distinct_modules_both_selected() {
        let result = build(vec![
            candidate("g:a:1.0", "root:r:1.0", "a.jar"),
            candidate("g:b:1.0", "root:r:1.0", "b.jar"),
        ]);
        assert_eq!(result.classpath.len(), 2);
    }

    #[test]
    fn selected_path_is_queryable_by_module() {
        let result = build(vec![candidate("g:a:1.0", "root:r:1.0", "a.jar")]);
        let module = Artifact::parse("g:a:1.0").unwrap().module_key();
        assert!(result.selected_path(&module).is_some());
    }

    #[test]
    fn unselected_for_filters_by_module() {
        let result = build(vec![
            candidate("g:a:1.0", "root:r:1.0", "a1.jar"),
            candidate("g:a:2.0", "root:r:1.0", "a2.jar"),
            candidate("g:b:1.0", "root:r:1.0", "b.jar"),
        ]);
        let module = Artifact::parse("g:a:1.0").unwrap().module_key();
        assert_eq!(result.unselected_for(&module).len(), 1);
    }
}
