//! Dependency paths: the blame record for why an archive is on the
//! classpath at all.

use crate::artifact::Artifact;
use crate::dependency::DependencyScope;

/// One hop in a [`DependencyPath`]: the artifact reached plus the scope and
/// optional-flag declared on the edge that reached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub artifact: Artifact,
    pub scope: DependencyScope,
    pub optional: bool,
}

/// A non-empty ordered sequence of artifacts from a root to a leaf.
/// Immutable once built; paths are never mutated after resolution, only
/// compared and displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPath {
    steps: Vec<PathStep>,
}

impl DependencyPath {
    /// Builds a path from a non-empty step list. Panics on an empty list:
    /// an empty dependency path cannot occur from a real resolution (every
    /// node is reached through at least one edge from a root).
    pub fn new(steps: Vec<PathStep>) -> Self {
        assert!(!steps.is_empty(), "a dependency path must have at least one step");
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// The artifact this path terminates at.
    pub fn leaf(&self) -> &Artifact {
        &self.steps.last().expect("non-empty by construction").artifact
    }

    /// Number of hops from the root; used as the nearest-wins distance.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Appends one more hop, returning the extended path.
    pub fn extended(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Renders as `root -> mid -> leaf` using `group:name:version`.
    pub fn render(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.artifact.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
