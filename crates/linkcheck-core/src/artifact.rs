//! Artifact coordinates: the unit of identity for every resolved, cached,
//! and reported entry in the classpath.

use std::cmp::Ordering;
use std::fmt;

/// A Maven-style artifact coordinate: `group:name:version[:classifier][:extension]`.
///
/// Two artifacts are "module-equal" when their [`module_key`](Artifact::module_key)
/// matches (group, name, classifier, and extension alike), regardless of
/// version — this is what the dependency resolver's nearest-wins conflict
/// detection and the classpath builder's dedup both key on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    pub group: String,
    pub name: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

/// Identifies a module (an artifact's group, name, classifier, and
/// extension) independent of version. Two dependency instances are the
/// same module only when all four of these match — `foo:bar:1.0` and
/// `foo:bar:1.0:sources` are distinct modules, as are a `.jar` and a
/// `.pom`-typed dependency on the same group:name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey {
    pub group: String,
    pub name: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl Artifact {
    /// Construct an artifact with the default `jar` extension and no classifier.
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            classifier: None,
            extension: "jar".to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The module this artifact belongs to, ignoring version.
    pub fn module_key(&self) -> ModuleKey {
        ModuleKey {
            group: self.group.clone(),
            name: self.name.clone(),
            classifier: self.classifier.clone(),
            extension: self.extension.clone(),
        }
    }

    /// Parse `group:name:version`, `group:name:classifier:version`, or
    /// `group:name:version:classifier` — the shorthand forms a manifest may
    /// declare a dependency with. Ambiguity between the 4-field forms is
    /// resolved by treating the field immediately before the last as the
    /// classifier only when the last field parses as a plausible version
    /// (starts with a digit); this matches how Maven shorthand coordinates
    /// are conventionally written (`group:artifact:version:classifier`).
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.len() {
            3 => Some(Self::new(parts[0], parts[1], parts[2])),
            4 => {
                let looks_like_version = |p: &str| p.chars().next().is_some_and(|c| c.is_ascii_digit());
                if looks_like_version(parts[2]) {
                    // group:name:version:classifier
                    Some(Self::new(parts[0], parts[1], parts[2]).with_classifier(parts[3]))
                } else {
                    // group:name:classifier:version
                    Some(Self::new(parts[0], parts[1], parts[3]).with_classifier(parts[2]))
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classifier {
            Some(c) => write!(f, "{}:{}:{}:{}", self.group, self.name, c, self.version),
            None => write!(f, "{}:{}:{}", self.group, self.name, self.version),
        }
    }
}

impl PartialOrd for Artifact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Artifact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.module_key()
            .cmp(&other.module_key())
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.classifier.cmp(&other.classifier))
    }
}
