//! The linkage-problem data model: a tagged union with a shared record
//! prefix. Equality and grouping only ever consider
//! `(symbol, source_class, target_class)` - cause and kind-specific
//! payloads are informational, not identity.

use linkcheck_classfile::Symbol;

/// Why the classpath builder's selection left the reference unresolved
/// or misresolved, when attributable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause {
    /// The owner class isn't reachable anywhere in the resolved graph.
    /// `expected_artifact` is a best-effort guess from sibling paths.
    MissingArtifact { expected_artifact: Option<String> },
    /// The owner would have been reachable, but only through an edge an
    /// exclusion rule cut.
    ExcludedArtifact,
    /// A shadowed classpath entry declares the symbol; the selected one
    /// doesn't.
    DependencyConflict { selected: String, selected_path: String, unselected: String, unselected_path: String },
    /// Attribution could not determine a cause; never fatal.
    UnknownCause,
}

/// The specific way a reference failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// The symbol's owner class is absent from the classpath entirely.
    ClassNotFound,
    /// The owner class exists but does not declare the method.
    SymbolNotFound,
    /// The owner class exists but does not declare the field.
    FieldNotFound,
    /// A match existed but was not accessible from the source class.
    InaccessibleMember,
    /// Reference tagged `interface?` disagreed with the owner's actual
    /// class/interface-ness, or a field's static/instance kind mismatched.
    IncompatibleClassChange,
    /// The resolved method is abstract, the source class is concrete, and
    /// nothing in its hierarchy overrides it.
    AbstractMethodNotImplemented,
    /// A super-class chain looped back on itself.
    MalformedClassFile,
}

/// One linkage problem: a reference that would fail to bind at runtime.
///
/// Equality/hash only look at `(symbol, source_class, target_class)` -
/// two problems differing only in `cause` or in super-vs-ordinary symbol
/// tagging (already normalized away before this type is built, see
/// [`linkcheck_classfile::ClassSymbol::via_super`]) are the same problem.
#[derive(Debug, Clone)]
pub struct LinkageProblem {
    pub kind: Kind,
    pub symbol: Symbol,
    pub source_class: String,
    /// Null (`None`) iff `kind == ClassNotFound`.
    pub target_class: Option<String>,
    pub cause: Cause,
}

impl LinkageProblem {
    fn identity(&self) -> (&Symbol, &str, Option<&str>) {
        (&self.symbol, self.source_class.as_str(), self.target_class.as_deref())
    }
}

impl PartialEq for LinkageProblem {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for LinkageProblem {}

impl std::hash::Hash for LinkageProblem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Collapses a `ClassSymbol`'s super-declaration marker before a problem is
/// built from it, so a problem raised against a super-reference and one
/// raised against an ordinary reference to the same class deduplicate.
/// Method/field symbols pass through unchanged - only class references
/// carry the marker.
pub fn normalize_symbol(symbol: Symbol) -> Symbol {
    match symbol {
        Symbol::Class(c) => Symbol::Class(linkcheck_classfile::ClassSymbol { owner: c.owner, via_super: false }),
        other => other,
    }
}

impl LinkageProblem {
    /// Human-readable message, a pure function of tag and payload.
    pub fn message(&self) -> String {
        let symbol_desc = describe_symbol(&self.symbol);
        match self.kind {
            Kind::ClassNotFound => format!("class not found: {symbol_desc}"),
            Kind::SymbolNotFound => format!("method not found: {symbol_desc}"),
            Kind::FieldNotFound => format!("field not found: {symbol_desc}"),
            Kind::InaccessibleMember => format!("inaccessible: {symbol_desc}"),
            Kind::IncompatibleClassChange => format!("incompatible class change: {symbol_desc}"),
            Kind::AbstractMethodNotImplemented => format!("abstract method not implemented: {symbol_desc}"),
            Kind::MalformedClassFile => format!("malformed class file encountered resolving {symbol_desc}"),
        }
    }
}

fn describe_symbol(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Class(c) => c.owner.clone(),
        Symbol::Method(m) => format!("{}#{}{}", m.owner, m.name, m.descriptor),
        Symbol::Field(f) => format!("{}#{}:{}", f.owner, f.name, f.descriptor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_classfile::ClassSymbol;

    fn problem(via_super: bool, cause: Cause) -> LinkageProblem {
        LinkageProblem {
            kind: Kind::ClassNotFound,
            symbol: Symbol::Class(ClassSymbol { owner: "q/B".to_string(), via_super }),
            source_class: "p/A".to_string(),
            target_class: None,
            cause,
        }
    }

    #[test]
    fn equality_ignores_cause() {
        let a = problem(false, Cause::UnknownCause);
        let b = problem(false, Cause::ExcludedArtifact);
        assert_eq!(a, b);
    }

    #[test]
    fn normalize_symbol_collapses_via_super() {
        let symbol = Symbol::Class(ClassSymbol { owner: "q/B".to_string(), via_super: true });
        match normalize_symbol(symbol) {
            Symbol::Class(c) => assert!(!c.via_super),
            _ => panic!("expected a class symbol"),
        }
    }

    #[test]
    fn message_names_the_owner_for_class_not_found() {
        let p = problem(false, Cause::UnknownCause);
        assert!(p.message().contains("q/B"));
    }
}
