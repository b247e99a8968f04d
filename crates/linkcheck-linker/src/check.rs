//! Wires extraction, resolution, and cause attribution into the single
//! entry point the CLI collaborator calls: extract every outbound
//! reference from the selected classpath, resolve each one, and attribute
//! causes to what fails.

use std::collections::HashSet;

use linkcheck_classfile::extract_symbols;
use linkcheck_classpath::{Archive, ClassPathResult, ClassRepository, ClasspathEntry};
use linkcheck_core::dependency::Exclusion;
use linkcheck_util::errors::LinkcheckError;
use rayon::prelude::*;

use crate::attribute::attribute;
use crate::resolve::{resolve_reference, Resolution};

/// Bounds the worker pool used for the parallel class-parsing fan-out.
/// `None` uses rayon's default (CPU count). `max_open_archives` bounds how
/// many archive file handles the resolution-time [`ClassRepository`] holds
/// open at once; `None` uses its own default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckConfig {
    pub max_parsers: Option<usize>,
    pub max_open_archives: Option<usize>,
}

/// The result of a full run: every distinct linkage problem found, plus
/// the classpath result the problems were attributed against (callers
/// render the "problematic artifacts in the dependency tree" section from
/// the latter).
pub struct CheckReport {
    pub problems: HashSet<crate::problem::LinkageProblem>,
    pub classpath: ClassPathResult,
}

/// Runs the full check over an already-built classpath.
pub fn check(classpath_result: ClassPathResult, exclusions: &[Exclusion], config: CheckConfig) -> Result<CheckReport, LinkcheckError> {
    let references = match config.max_parsers {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| LinkcheckError::Generic { message: e.to_string() })?;
            pool.install(|| extract_all_references(&classpath_result.classpath))?
        }
        None => extract_all_references(&classpath_result.classpath)?,
    };

    let shadow_candidates: Vec<ClasspathEntry> = classpath_result
        .unselected
        .iter()
        .map(|u| ClasspathEntry { artifact: u.candidate.clone(), archive_path: u.candidate_archive_path.clone() })
        .collect();
    let repository = match config.max_open_archives {
        Some(n) => ClassRepository::with_shadow_candidates_and_limit(classpath_result.classpath.clone(), shadow_candidates, n),
        None => ClassRepository::with_shadow_candidates(classpath_result.classpath.clone(), shadow_candidates),
    };

    let mut problems = HashSet::new();
    for reference in &references {
        if let Resolution::Problem(problem) = resolve_reference(&repository, reference)? {
            problems.insert(attribute(*problem, &classpath_result, &repository, exclusions)?);
        }
    }

    Ok(CheckReport { problems, classpath: classpath_result })
}

/// One independent archive scan per classpath entry. `par_iter` bounds
/// concurrency to the ambient (or configured) rayon pool; each entry's
/// archive is opened and closed within its own task.
fn extract_all_references(classpath: &[ClasspathEntry]) -> Result<Vec<linkcheck_classfile::Reference>, LinkcheckError> {
    let per_entry: Vec<Result<Vec<linkcheck_classfile::Reference>, LinkcheckError>> = classpath
        .par_iter()
        .map(|entry| {
            let mut archive = Archive::open(&entry.archive_path)?;
            let names: Vec<String> = archive.class_names().map(str::to_string).collect();
            let mut refs = Vec::new();
            for name in names {
                let Some(bytes) = archive.read_class(&name)? else { continue };
                match extract_symbols(&bytes) {
                    Ok((_, extracted)) => refs.extend(extracted),
                    Err(LinkcheckError::MalformedClassFile { class_name, message }) => {
                        tracing::warn!(class = %class_name, %message, "skipping malformed class file");
                    }
                    Err(LinkcheckError::UnsupportedClassFileVersion { class_name, major }) => {
                        tracing::warn!(class = %class_name, major, "skipping class file with unsupported version");
                    }
                    Err(other) => return Err(other),
                }
            }
            Ok(refs)
        })
        .collect();

    let mut all = Vec::new();
    for refs in per_entry {
        all.extend(refs?);
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_classfile::testutil::ClassFileBuilder;
    use linkcheck_classpath::builder::{build, Candidate};
    use linkcheck_core::artifact::Artifact;
    use linkcheck_core::dependency::DependencyScope;
    use linkcheck_core::path::{DependencyPath, PathStep};

    fn jar(dir: &std::path::Path, name: &str, classes: &[(&str, Vec<u8>)]) -> std::path::PathBuf {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (class_name, bytes) in classes {
            use std::io::Write as _;
            writer.start_file(format!("{class_name}.class"), options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    fn path_for(coord: &str) -> DependencyPath {
        DependencyPath::new(vec![PathStep {
            artifact: Artifact::parse(coord).unwrap(),
            scope: DependencyScope::Compile,
            optional: false,
        }])
    }

    #[test]
    fn missing_method_yields_one_symbol_not_found_problem() {
        let dir = tempfile::tempdir().unwrap();
        let a = ClassFileBuilder::new("p/A", "java/lang/Object").with_method_ref("q/B", "foo", "(I)V").build();
        let b = ClassFileBuilder::new("q/B", "java/lang/Object").build();

        let a_path = jar(dir.path(), "a.jar", &[("p/A", a)]);
        let b_path = jar(dir.path(), "b.jar", &[("q/B", b)]);

        let candidates = vec![
            Candidate { artifact: Artifact::parse("g:a:1.0").unwrap(), path: path_for("g:root:1.0"), archive_path: a_path },
            Candidate { artifact: Artifact::parse("g:b:1.0").unwrap(), path: path_for("g:root:1.0"), archive_path: b_path },
        ];
        let classpath_result = build(candidates);

        let report = check(classpath_result, &[], CheckConfig::default()).unwrap();
        assert_eq!(report.problems.len(), 1);
        let problem = report.problems.iter().next().unwrap();
        assert_eq!(problem.kind, crate::problem::Kind::SymbolNotFound);
        assert_eq!(problem.source_class, "p/A");
        assert_eq!(problem.target_class.as_deref(), Some("q/B"));
    }

    #[test]
    fn class_not_found_yields_null_target() {
        let dir = tempfile::tempdir().unwrap();
        let a = ClassFileBuilder::new("p/A", "java/lang/Object").with_class_ref("q/B").build();
        let a_path = jar(dir.path(), "a.jar", &[("p/A", a)]);

        let candidates = vec![Candidate {
            artifact: Artifact::parse("g:a:1.0").unwrap(),
            path: path_for("g:root:1.0"),
            archive_path: a_path,
        }];
        let classpath_result = build(candidates);

        let report = check(classpath_result, &[], CheckConfig::default()).unwrap();
        assert_eq!(report.problems.len(), 1);
        let problem = report.problems.iter().next().unwrap();
        assert_eq!(problem.kind, crate::problem::Kind::ClassNotFound);
        assert!(problem.target_class.is_none());
    }

    #[test]
    fn clean_classpath_has_no_problems() {
        let dir = tempfile::tempdir().unwrap();
        let a = ClassFileBuilder::new("p/A", "java/lang/Object").with_method_ref("q/B", "foo", "(I)V").build();
        let b = ClassFileBuilder::new("q/B", "java/lang/Object").with_method("foo", "(I)V", 0x0001).build();

        let a_path = jar(dir.path(), "a.jar", &[("p/A", a)]);
        let b_path = jar(dir.path(), "b.jar", &[("q/B", b)]);

        let candidates = vec![
            Candidate { artifact: Artifact::parse("g:a:1.0").unwrap(), path: path_for("g:root:1.0"), archive_path: a_path },
            Candidate { artifact: Artifact::parse("g:b:1.0").unwrap(), path: path_for("g:root:1.0"), archive_path: b_path },
        ];
        let classpath_result = build(candidates);

        let report = check(classpath_result, &[], CheckConfig::default()).unwrap();
        assert!(report.problems.is_empty());
    }
}
