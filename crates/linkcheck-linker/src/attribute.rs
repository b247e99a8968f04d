//! Best-effort cause attribution for an unresolved reference. Never fatal:
//! a cause attributor failing to explain a problem leaves it `UnknownCause`
//! rather than erroring the whole run.

use linkcheck_classpath::{ClassPathResult, ClassRepository};
use linkcheck_core::dependency::Exclusion;
use linkcheck_util::errors::LinkcheckError;

use crate::problem::{Cause, Kind, LinkageProblem};

/// Fills in `problem.cause` by consulting the classpath builder's output
/// and the class repository's shadow index. Leaves an already-assigned
/// cause untouched.
pub fn attribute(
    mut problem: LinkageProblem,
    classpath: &ClassPathResult,
    repository: &ClassRepository,
    exclusions: &[Exclusion],
) -> Result<LinkageProblem, LinkcheckError> {
    if problem.cause != Cause::UnknownCause {
        return Ok(problem);
    }

    problem.cause = match problem.kind {
        Kind::SymbolNotFound | Kind::FieldNotFound => {
            dependency_conflict_cause(&problem, classpath, repository)?.unwrap_or(Cause::UnknownCause)
        }
        Kind::ClassNotFound => {
            let owner = problem.symbol.owner();
            if excluded_cause(owner, exclusions) {
                Cause::ExcludedArtifact
            } else {
                missing_artifact_cause(&problem, classpath, repository)?
            }
        }
        _ => Cause::UnknownCause,
    };

    Ok(problem)
}

fn dependency_conflict_cause(
    problem: &LinkageProblem,
    classpath: &ClassPathResult,
    repository: &ClassRepository,
) -> Result<Option<Cause>, LinkcheckError> {
    let owner = problem.symbol.owner();
    let shadows = repository.find_shadows(owner)?;

    let shadow_defines_symbol = shadows.iter().find(|hit| match &problem.symbol {
        linkcheck_classfile::Symbol::Method(m) => {
            hit.class_file.methods.iter().any(|mm| mm.name == m.name && mm.descriptor == m.descriptor)
        }
        linkcheck_classfile::Symbol::Field(f) => {
            hit.class_file.fields.iter().any(|ff| ff.name == f.name && ff.descriptor == f.descriptor)
        }
        linkcheck_classfile::Symbol::Class(_) => false,
    });

    let Some(shadow_hit) = shadow_defines_symbol else {
        return Ok(None);
    };

    let selected_artifact = match problem.target_class.as_deref() {
        Some(target) => {
            let module = repository
                .find_class(target)
                .ok()
                .and_then(|lookup| match lookup {
                    linkcheck_classpath::ClassLookup::Found(hit) => {
                        Some(repository.entry_artifact(hit.entry_index).clone())
                    }
                    _ => None,
                });
            module
        }
        None => None,
    };

    let Some(selected_artifact) = selected_artifact else {
        return Ok(None);
    };

    let module = selected_artifact.module_key();
    let selected_path = classpath.selected_path(&module).map(|p| p.render()).unwrap_or_default();

    let unselected_artifact = repository.entry_artifact(shadow_hit.entry_index).clone();
    let unselected_path = classpath
        .unselected_for(&module)
        .into_iter()
        .find(|alt| alt.candidate == unselected_artifact)
        .map(|alt| alt.candidate_path.render())
        .unwrap_or_default();

    Ok(Some(Cause::DependencyConflict {
        selected: selected_artifact.to_string(),
        selected_path,
        unselected: unselected_artifact.to_string(),
        unselected_path,
    }))
}

/// Heuristic: treats the missing class's package as a Maven group/artifact
/// guess and checks it against declared exclusion rules. Maven modules
/// don't have to mirror Java package names, so this only catches the
/// common case where they do; a miss falls through to
/// [`missing_artifact_cause`] rather than asserting `ExcludedArtifact`
/// incorrectly.
fn excluded_cause(owner_internal_name: &str, exclusions: &[Exclusion]) -> bool {
    let package = owner_internal_name.rsplit_once('/').map(|(pkg, _)| pkg).unwrap_or("");
    let group_guess = package.replace('/', ".");
    exclusions.iter().any(|e| e.matches(&group_guess, &group_guess))
}

/// Best-effort guess at which artifact should have provided the missing
/// class: the dependency path that brought in the referencing class
/// itself, since the real owner is a plausible sibling or transitive
/// dependency along that same path.
fn missing_artifact_cause(
    problem: &LinkageProblem,
    classpath: &ClassPathResult,
    repository: &ClassRepository,
) -> Result<Cause, LinkcheckError> {
    let source_artifact = match repository.find_class(&problem.source_class)? {
        linkcheck_classpath::ClassLookup::Found(hit) => Some(repository.entry_artifact(hit.entry_index).clone()),
        _ => None,
    };

    let expected_artifact = source_artifact
        .and_then(|artifact| classpath.selected_path(&artifact.module_key()).map(|p| p.render()));

    Ok(Cause::MissingArtifact { expected_artifact })
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_classfile::testutil::ClassFileBuilder;
    use linkcheck_classfile::{ClassSymbol, MethodSymbol, Symbol};
    use linkcheck_classpath::builder::{build, Candidate};
    use linkcheck_classpath::ClasspathEntry;
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
    fn dependency_conflict_detected_when_shadow_has_the_method() {
        let dir = tempfile::tempdir().unwrap();
        let x1 = ClassFileBuilder::new("q/B", "java/lang/Object").build();
        let x2 = ClassFileBuilder::new("q/B", "java/lang/Object").with_method("foo", "(I)V", 0x0001).build();

        let x1_path = jar(dir.path(), "x-1.0.jar", &[("q/B", x1)]);
        let x2_path = jar(dir.path(), "x-2.0.jar", &[("q/B", x2)]);

        let candidates = vec![
            Candidate { artifact: Artifact::parse("g:x:1.0").unwrap(), path: path_for("g:root:1.0"), archive_path: x1_path },
            Candidate { artifact: Artifact::parse("g:x:2.0").unwrap(), path: path_for("g:lib:1.0"), archive_path: x2_path },
        ];
        let classpath_result = build(candidates);

        let selected: Vec<ClasspathEntry> = classpath_result.classpath.clone();
        let shadow_archives: Vec<ClasspathEntry> = classpath_result
            .unselected
            .iter()
            .map(|u| ClasspathEntry { artifact: u.candidate.clone(), archive_path: u.candidate_archive_path.clone() })
            .collect();
        let repository = ClassRepository::with_shadow_candidates(selected, shadow_archives);

        let problem = LinkageProblem {
            kind: Kind::SymbolNotFound,
            symbol: Symbol::Method(MethodSymbol { owner: "q/B".to_string(), name: "foo".to_string(), descriptor: "(I)V".to_string(), interface: false }),
            source_class: "p/A".to_string(),
            target_class: Some("q/B".to_string()),
            cause: Cause::UnknownCause,
        };

        let attributed = attribute(problem, &classpath_result, &repository, &[]).unwrap();
        match attributed.cause {
            Cause::DependencyConflict { selected, unselected, .. } => {
                assert_eq!(selected, "g:x:1.0");
                assert_eq!(unselected, "g:x:2.0");
            }
            other => panic!("expected DependencyConflict, got {other:?}"),
        }
    }

    #[test]
    fn excluded_artifact_detected_from_matching_package_group() {
        let problem = LinkageProblem {
            kind: Kind::ClassNotFound,
            symbol: Symbol::Class(ClassSymbol { owner: "q/B".to_string(), via_super: false }),
            source_class: "p/A".to_string(),
            target_class: None,
            cause: Cause::UnknownCause,
        };
        let classpath_result = build(vec![]);
        let repository = ClassRepository::new(vec![]);
        let exclusions = vec![Exclusion { group: "q".to_string(), artifact: None }];

        let attributed = attribute(problem, &classpath_result, &repository, &exclusions).unwrap();
        assert_eq!(attributed.cause, Cause::ExcludedArtifact);
    }

    #[test]
    fn falls_back_to_missing_artifact_when_nothing_else_applies() {
        let problem = LinkageProblem {
            kind: Kind::ClassNotFound,
            symbol: Symbol::Class(ClassSymbol { owner: "q/B".to_string(), via_super: false }),
            source_class: "p/A".to_string(),
            target_class: None,
            cause: Cause::UnknownCause,
        };
        let classpath_result = build(vec![]);
        let repository = ClassRepository::new(vec![]);

        let attributed = attribute(problem, &classpath_result, &repository, &[]).unwrap();
        assert!(matches!(attributed.cause, Cause::MissingArtifact { .. }));
    }
}
