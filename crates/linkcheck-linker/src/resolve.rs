//! JVM-style resolution of one extracted reference against a
//! [`ClassRepository`].

use std::collections::VecDeque;

use linkcheck_classfile::reader::{FieldAccessFlags, MethodAccessFlags};
use linkcheck_classfile::{ClassFile, FieldSymbol, MethodSymbol, Reference, Symbol};
use linkcheck_classpath::{ClassLookup, ClassRepository};
use linkcheck_util::errors::LinkcheckError;

use crate::problem::{normalize_symbol, Cause, Kind, LinkageProblem};

/// The outcome of resolving one reference: either it binds, or it fails
/// with a [`LinkageProblem`] whose `cause` is left as [`Cause::UnknownCause`]
/// for the attributor (component H) to fill in.
pub enum Resolution {
    Resolved,
    Problem(Box<LinkageProblem>),
}

/// Resolves `reference` against `repo`. Never fails except on genuine
/// infrastructural errors (archive I/O, malformed class bytes) - linkage
/// problems are data, not errors.
pub fn resolve_reference(repo: &ClassRepository, reference: &Reference) -> Result<Resolution, LinkcheckError> {
    let symbol = normalize_symbol(reference.symbol.clone());
    let owner_name = symbol.owner();

    let owner = match repo.find_class(owner_name)? {
        ClassLookup::System => return Ok(Resolution::Resolved),
        ClassLookup::NotFound => {
            return Ok(Resolution::Problem(Box::new(LinkageProblem {
                kind: Kind::ClassNotFound,
                symbol,
                source_class: reference.source_class.clone(),
                target_class: None,
                cause: Cause::UnknownCause,
            })))
        }
        ClassLookup::Found(hit) => hit.class_file,
    };

    match &symbol {
        Symbol::Class(_) => Ok(Resolution::Resolved),
        Symbol::Method(method) => resolve_method(repo, reference, &symbol, &owner, method),
        Symbol::Field(field) => resolve_field(repo, reference, &symbol, &owner, field),
    }
}

fn resolve_method(
    repo: &ClassRepository,
    reference: &Reference,
    symbol: &Symbol,
    owner: &ClassFile,
    method: &MethodSymbol,
) -> Result<Resolution, LinkcheckError> {
    if method.interface != owner.is_interface() {
        return Ok(Resolution::Problem(Box::new(incompatible(symbol, reference, &owner.internal_name))));
    }

    let chain = if owner.is_interface() {
        interface_lookup_chain(repo, owner)?
    } else {
        class_lookup_chain(repo, owner)?
    };
    let chain = match chain {
        Ok(chain) => chain,
        Err(()) => return Ok(Resolution::Problem(Box::new(malformed(symbol, reference)))),
    };

    let found = chain.iter().find_map(|candidate| {
        candidate
            .methods
            .iter()
            .find(|m| m.name == method.name && m.descriptor == method.descriptor)
            .map(|m| (candidate, m))
    });

    let Some((defining_class, matched)) = found else {
        return Ok(Resolution::Problem(Box::new(LinkageProblem {
            kind: Kind::SymbolNotFound,
            symbol: symbol.clone(),
            source_class: reference.source_class.clone(),
            target_class: Some(owner.internal_name.clone()),
            cause: Cause::UnknownCause,
        })));
    };

    let source = repo.find_class(&reference.source_class)?;
    let source = match source {
        ClassLookup::Found(hit) => hit.class_file,
        _ => {
            return Ok(Resolution::Problem(Box::new(LinkageProblem {
                kind: Kind::SymbolNotFound,
                symbol: symbol.clone(),
                source_class: reference.source_class.clone(),
                target_class: Some(owner.internal_name.clone()),
                cause: Cause::UnknownCause,
            })))
        }
    };

    if !is_accessible(
        repo,
        defining_class,
        matched.access_flags.bits(),
        MethodAccessFlags::PUBLIC.bits(),
        MethodAccessFlags::PROTECTED.bits(),
        MethodAccessFlags::PRIVATE.bits(),
        &source,
    )? {
        return Ok(Resolution::Problem(Box::new(LinkageProblem {
            kind: Kind::InaccessibleMember,
            symbol: symbol.clone(),
            source_class: reference.source_class.clone(),
            target_class: Some(defining_class.internal_name.clone()),
            cause: Cause::UnknownCause,
        })));
    }

    if matched.access_flags.contains(MethodAccessFlags::ABSTRACT)
        && !source.is_abstract()
        && !overrides_through_hierarchy(repo, &source, &method.name, &method.descriptor)?
    {
        return Ok(Resolution::Problem(Box::new(LinkageProblem {
            kind: Kind::AbstractMethodNotImplemented,
            symbol: symbol.clone(),
            source_class: reference.source_class.clone(),
            target_class: Some(defining_class.internal_name.clone()),
            cause: Cause::UnknownCause,
        })));
    }

    Ok(Resolution::Resolved)
}

fn resolve_field(
    repo: &ClassRepository,
    reference: &Reference,
    symbol: &Symbol,
    owner: &ClassFile,
    field: &FieldSymbol,
) -> Result<Resolution, LinkcheckError> {
    let chain = match class_lookup_chain(repo, owner)? {
        Ok(chain) => chain,
        Err(()) => return Ok(Resolution::Problem(Box::new(malformed(symbol, reference)))),
    };

    let found = chain
        .iter()
        .find_map(|candidate| candidate.fields.iter().find(|f| f.name == field.name && f.descriptor == field.descriptor).map(|f| (candidate, f)));

    let Some((defining_class, matched)) = found else {
        return Ok(Resolution::Problem(Box::new(LinkageProblem {
            kind: Kind::FieldNotFound,
            symbol: symbol.clone(),
            source_class: reference.source_class.clone(),
            target_class: Some(owner.internal_name.clone()),
            cause: Cause::UnknownCause,
        })));
    };

    let source = match repo.find_class(&reference.source_class)? {
        ClassLookup::Found(hit) => hit.class_file,
        _ => {
            return Ok(Resolution::Problem(Box::new(LinkageProblem {
                kind: Kind::FieldNotFound,
                symbol: symbol.clone(),
                source_class: reference.source_class.clone(),
                target_class: Some(owner.internal_name.clone()),
                cause: Cause::UnknownCause,
            })))
        }
    };

    if !is_accessible(
        repo,
        defining_class,
        matched.access_flags.bits(),
        FieldAccessFlags::PUBLIC.bits(),
        FieldAccessFlags::PROTECTED.bits(),
        FieldAccessFlags::PRIVATE.bits(),
        &source,
    )? {
        return Ok(Resolution::Problem(Box::new(LinkageProblem {
            kind: Kind::InaccessibleMember,
            symbol: symbol.clone(),
            source_class: reference.source_class.clone(),
            target_class: Some(defining_class.internal_name.clone()),
            cause: Cause::UnknownCause,
        })));
    }

    Ok(Resolution::Resolved)
}

fn incompatible(symbol: &Symbol, reference: &Reference, owner_name: &str) -> LinkageProblem {
    LinkageProblem {
        kind: Kind::IncompatibleClassChange,
        symbol: symbol.clone(),
        source_class: reference.source_class.clone(),
        target_class: Some(owner_name.to_string()),
        cause: Cause::UnknownCause,
    }
}

fn malformed(symbol: &Symbol, reference: &Reference) -> LinkageProblem {
    LinkageProblem {
        kind: Kind::MalformedClassFile,
        symbol: symbol.clone(),
        source_class: reference.source_class.clone(),
        target_class: Some(symbol.owner().to_string()),
        cause: Cause::UnknownCause,
    }
}

/// class -> superclass chain -> interfaces (BFS), the JVM's non-interface
/// method/field lookup order. Returns `Err(())` (surfaced as
/// `MalformedClassFile`) if the super-class chain cycles.
fn class_lookup_chain(repo: &ClassRepository, owner: &ClassFile) -> Result<Result<Vec<ClassFile>, ()>, LinkcheckError> {
    let mut chain = Vec::new();
    let mut visited = std::collections::HashSet::new();
    let mut current = owner.clone();
    loop {
        if !visited.insert(current.internal_name.clone()) {
            return Ok(Err(()));
        }
        chain.push(current.clone());
        match &current.super_name {
            None => break,
            Some(super_name) => match repo.find_class(super_name)? {
                ClassLookup::Found(hit) => current = (*hit.class_file).clone(),
                ClassLookup::System | ClassLookup::NotFound => break,
            },
        }
    }

    // BFS over every interface reachable from any class in the chain.
    let mut queue: VecDeque<String> = chain.iter().flat_map(|c| c.interfaces.clone()).collect();
    let mut interface_visited = std::collections::HashSet::new();
    while let Some(name) = queue.pop_front() {
        if !interface_visited.insert(name.clone()) {
            continue;
        }
        if let ClassLookup::Found(hit) = repo.find_class(&name)? {
            for sup in &hit.class_file.interfaces {
                queue.push_back(sup.clone());
            }
            chain.push((*hit.class_file).clone());
        }
    }

    Ok(Ok(chain))
}

/// interface -> superinterfaces (BFS) -> `java/lang/Object`, the JVM's
/// interface method lookup order.
fn interface_lookup_chain(repo: &ClassRepository, owner: &ClassFile) -> Result<Result<Vec<ClassFile>, ()>, LinkcheckError> {
    let mut chain = vec![owner.clone()];
    let mut visited = std::collections::HashSet::new();
    visited.insert(owner.internal_name.clone());

    let mut queue: VecDeque<String> = owner.interfaces.clone().into();
    while let Some(name) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if let ClassLookup::Found(hit) = repo.find_class(&name)? {
            for sup in &hit.class_file.interfaces {
                queue.push_back(sup.clone());
            }
            chain.push((*hit.class_file).clone());
        }
    }

    Ok(Ok(chain))
}

/// Walks `source`'s own superclass chain looking for a concrete override
/// of `name`/`descriptor`, used by the abstract-method check.
fn overrides_through_hierarchy(
    repo: &ClassRepository,
    source: &ClassFile,
    name: &str,
    descriptor: &str,
) -> Result<bool, LinkcheckError> {
    let mut current = source.clone();
    let mut visited = std::collections::HashSet::new();
    loop {
        if !visited.insert(current.internal_name.clone()) {
            return Ok(false);
        }
        if current
            .methods
            .iter()
            .any(|m| m.name == name && m.descriptor == descriptor && !m.access_flags.contains(MethodAccessFlags::ABSTRACT))
        {
            return Ok(true);
        }
        match &current.super_name {
            None => return Ok(false),
            Some(super_name) => match repo.find_class(super_name)? {
                ClassLookup::Found(hit) => current = (*hit.class_file).clone(),
                _ => return Ok(false),
            },
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn is_accessible(
    repo: &ClassRepository,
    defining_class: &ClassFile,
    member_flags: u16,
    public: u16,
    protected: u16,
    private: u16,
    source: &ClassFile,
) -> Result<bool, LinkcheckError> {
    if member_flags & public != 0 {
        return Ok(true);
    }
    if member_flags & private != 0 {
        return Ok(source.internal_name == defining_class.internal_name);
    }
    let same_package = source.package() == defining_class.package();
    if member_flags & protected != 0 {
        return Ok(same_package || is_subclass_of(repo, source, defining_class)?);
    }
    // package-private
    Ok(same_package)
}

/// Walks `candidate`'s full superclass chain (and each ancestor's direct
/// interfaces) looking for `ancestor`, so protected access from a class two
/// or more levels below the declaring class is recognized correctly.
fn is_subclass_of(repo: &ClassRepository, candidate: &ClassFile, ancestor: &ClassFile) -> Result<bool, LinkcheckError> {
    let mut current = candidate.clone();
    let mut visited = std::collections::HashSet::new();
    loop {
        if !visited.insert(current.internal_name.clone()) {
            return Ok(false);
        }
        if current.super_name.as_deref() == Some(ancestor.internal_name.as_str())
            || current.interfaces.iter().any(|i| i == &ancestor.internal_name)
        {
            return Ok(true);
        }
        match &current.super_name {
            None => return Ok(false),
            Some(super_name) => match repo.find_class(super_name)? {
                ClassLookup::Found(hit) => current = (*hit.class_file).clone(),
                _ => return Ok(false),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_classfile::testutil::ClassFileBuilder;
    use linkcheck_classpath::ClasspathEntry;
    use linkcheck_core::artifact::Artifact;

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

    fn entry(dir: &std::path::Path, jar_name: &str, classes: &[(&str, Vec<u8>)]) -> ClasspathEntry {
        let path = jar(dir, jar_name, classes);
        ClasspathEntry { artifact: Artifact::new("g", jar_name, "1.0"), archive_path: path }
    }

    #[test]
    fn abstract_method_not_implemented_when_concrete_subclass_does_not_override() {
        let dir = tempfile::tempdir().unwrap();
        let base = ClassFileBuilder::new("p/Base", "java/lang/Object")
            .abstract_class()
            .with_method("foo", "()V", MethodAccessFlags::PUBLIC.bits() | MethodAccessFlags::ABSTRACT.bits())
            .build();
        let concrete = ClassFileBuilder::new("p/Concrete", "p/Base").with_method_ref("p/Concrete", "foo", "()V").build();

        let classpath = vec![
            entry(dir.path(), "base.jar", &[("p/Base", base)]),
            entry(dir.path(), "concrete.jar", &[("p/Concrete", concrete)]),
        ];
        let repo = ClassRepository::new(classpath);

        let reference = Reference {
            source_class: "p/Concrete".to_string(),
            symbol: Symbol::Method(MethodSymbol { owner: "p/Concrete".to_string(), name: "foo".to_string(), descriptor: "()V".to_string(), interface: false }),
        };

        match resolve_reference(&repo, &reference).unwrap() {
            Resolution::Problem(problem) => assert_eq!(problem.kind, Kind::AbstractMethodNotImplemented),
            Resolution::Resolved => panic!("expected a problem"),
        }
    }

    #[test]
    fn overriding_subclass_resolves_cleanly_despite_abstract_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = ClassFileBuilder::new("p/Base", "java/lang/Object")
            .abstract_class()
            .with_method("foo", "()V", MethodAccessFlags::PUBLIC.bits() | MethodAccessFlags::ABSTRACT.bits())
            .build();
        let concrete = ClassFileBuilder::new("p/Concrete", "p/Base")
            .with_method("foo", "()V", MethodAccessFlags::PUBLIC.bits())
            .with_method_ref("p/Concrete", "foo", "()V")
            .build();

        let classpath = vec![
            entry(dir.path(), "base.jar", &[("p/Base", base)]),
            entry(dir.path(), "concrete.jar", &[("p/Concrete", concrete)]),
        ];
        let repo = ClassRepository::new(classpath);

        let reference = Reference {
            source_class: "p/Concrete".to_string(),
            symbol: Symbol::Method(MethodSymbol { owner: "p/Concrete".to_string(), name: "foo".to_string(), descriptor: "()V".to_string(), interface: false }),
        };

        assert!(matches!(resolve_reference(&repo, &reference).unwrap(), Resolution::Resolved));
    }

    #[test]
    fn interface_reference_against_a_class_owner_is_incompatible_class_change() {
        let dir = tempfile::tempdir().unwrap();
        let not_interface = ClassFileBuilder::new("p/NotInterface", "java/lang/Object")
            .with_method("foo", "()V", MethodAccessFlags::PUBLIC.bits())
            .build();
        let classpath = vec![entry(dir.path(), "a.jar", &[("p/NotInterface", not_interface)])];
        let repo = ClassRepository::new(classpath);

        let reference = Reference {
            source_class: "p/Caller".to_string(),
            symbol: Symbol::Method(MethodSymbol {
                owner: "p/NotInterface".to_string(),
                name: "foo".to_string(),
                descriptor: "()V".to_string(),
                interface: true,
            }),
        };

        match resolve_reference(&repo, &reference).unwrap() {
            Resolution::Problem(problem) => assert_eq!(problem.kind, Kind::IncompatibleClassChange),
            Resolution::Resolved => panic!("expected a problem"),
        }
    }

    #[test]
    fn protected_field_from_unrelated_package_is_inaccessible() {
        let dir = tempfile::tempdir().unwrap();
        let owner = ClassFileBuilder::new("p/Owner", "java/lang/Object")
            .with_field("f", "I", FieldAccessFlags::PROTECTED.bits())
            .build();
        let caller = ClassFileBuilder::new("q/Caller", "java/lang/Object").build();

        let classpath = vec![
            entry(dir.path(), "owner.jar", &[("p/Owner", owner)]),
            entry(dir.path(), "caller.jar", &[("q/Caller", caller)]),
        ];
        let repo = ClassRepository::new(classpath);

        let reference = Reference {
            source_class: "q/Caller".to_string(),
            symbol: Symbol::Field(FieldSymbol { owner: "p/Owner".to_string(), name: "f".to_string(), descriptor: "I".to_string() }),
        };

        match resolve_reference(&repo, &reference).unwrap() {
            Resolution::Problem(problem) => assert_eq!(problem.kind, Kind::InaccessibleMember),
            Resolution::Resolved => panic!("expected a problem"),
        }
    }

    #[test]
    fn protected_member_reachable_through_two_levels_of_inheritance_is_accessible() {
        // Regression: `is_subclass_of` must walk the whole ancestor chain,
        // not just the candidate's direct superclass. pkg3/C reaches
        // pkg1/A's protected method only through pkg2/B.
        let dir = tempfile::tempdir().unwrap();
        let a = ClassFileBuilder::new("pkg1/A", "java/lang/Object")
            .with_method("bar", "()V", MethodAccessFlags::PROTECTED.bits())
            .build();
        let b = ClassFileBuilder::new("pkg2/B", "pkg1/A").build();
        let c = ClassFileBuilder::new("pkg3/C", "pkg2/B").with_method_ref("pkg3/C", "bar", "()V").build();

        let classpath = vec![
            entry(dir.path(), "a.jar", &[("pkg1/A", a)]),
            entry(dir.path(), "b.jar", &[("pkg2/B", b)]),
            entry(dir.path(), "c.jar", &[("pkg3/C", c)]),
        ];
        let repo = ClassRepository::new(classpath);

        let reference = Reference {
            source_class: "pkg3/C".to_string(),
            symbol: Symbol::Method(MethodSymbol { owner: "pkg3/C".to_string(), name: "bar".to_string(), descriptor: "()V".to_string(), interface: false }),
        };

        assert!(matches!(resolve_reference(&repo, &reference).unwrap(), Resolution::Resolved));
    }

    #[test]
    fn protected_member_one_level_removed_and_unrelated_package_is_inaccessible() {
        let dir = tempfile::tempdir().unwrap();
        let a = ClassFileBuilder::new("pkg1/A", "java/lang/Object")
            .with_method("bar", "()V", MethodAccessFlags::PROTECTED.bits())
            .build();
        let unrelated = ClassFileBuilder::new("pkg2/Unrelated", "java/lang/Object")
            .with_method_ref("pkg1/A", "bar", "()V")
            .build();

        let classpath = vec![
            entry(dir.path(), "a.jar", &[("pkg1/A", a)]),
            entry(dir.path(), "u.jar", &[("pkg2/Unrelated", unrelated)]),
        ];
        let repo = ClassRepository::new(classpath);

        let reference = Reference {
            source_class: "pkg2/Unrelated".to_string(),
            symbol: Symbol::Method(MethodSymbol { owner: "pkg1/A".to_string(), name: "bar".to_string(), descriptor: "()V".to_string(), interface: false }),
        };

        match resolve_reference(&repo, &reference).unwrap() {
            Resolution::Problem(problem) => assert_eq!(problem.kind, Kind::InaccessibleMember),
            Resolution::Resolved => panic!("expected a problem"),
        }
    }
}
