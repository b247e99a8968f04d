use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::dependency::{Dependency, Exclusion};

/// The parsed representation of a `Linkcheck.toml` file: the root artifact
/// set to check, the repositories to resolve it against, and the run's
/// resource limits and classpath overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: ProjectMetadata,

    /// Root artifacts to resolve and check (typically a BOM's members, or
    /// a project's own declared dependencies).
    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,

    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,

    /// Global exclusion rules applied to every resolved edge, in addition
    /// to any per-dependency exclusions.
    #[serde(default)]
    pub exclude: Vec<Exclusion>,

    #[serde(default)]
    pub classpath: ClasspathConfig,

    #[serde(default)]
    pub limits: Option<ManifestLimits>,
}

/// Project identity from the `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A Maven repository reference, either a URL string or a detailed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

impl RepositoryEntry {
    pub fn url(&self) -> &str {
        match self {
            RepositoryEntry::Url(u) => u,
            RepositoryEntry::Detailed { url, .. } => url,
        }
    }
}

/// Extra local classpath entries not reachable through dependency resolution
/// (e.g. a project's own compiled output, or JARs fetched out-of-band).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClasspathConfig {
    #[serde(default)]
    pub extra: Vec<PathBuf>,
}

/// Per-manifest override of the global resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestLimits {
    #[serde(default, rename = "max-parsers")]
    pub max_parsers: Option<u32>,
    #[serde(default, rename = "max-open-archives")]
    pub max_open_archives: Option<u32>,
}

impl Manifest {
    /// Load and parse a `Linkcheck.toml` file from the given path.
    ///
    /// Before parsing, `${env:VAR}` references in the manifest content are
    /// resolved using `.linkcheck.env` (if present alongside `Linkcheck.toml`)
    /// and process environment variables — used for repository credentials
    /// that should not be committed to the manifest itself.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            linkcheck_util::errors::LinkcheckError::Manifest {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;

        let dir = path.parent().unwrap_or(Path::new("."));
        let env_vars =
            crate::properties::load_env_file(&dir.join(".linkcheck.env")).unwrap_or_default();
        let resolved = crate::properties::interpolate(&content, &env_vars);

        let manifest = Self::parse_toml(&resolved)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse a `Linkcheck.toml` from a string (no interpolation).
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            linkcheck_util::errors::LinkcheckError::Manifest {
                message: format!("Failed to parse Linkcheck.toml: {e}"),
            }
            .into()
        })
    }

    /// Validate semantic constraints that TOML deserialization cannot enforce.
    pub fn validate(&self) -> miette::Result<()> {
        use linkcheck_util::errors::LinkcheckError;
        let err = |msg: String| -> miette::Report { LinkcheckError::Manifest { message: msg }.into() };

        if self.project.name.is_empty() {
            return Err(err("project.name must not be empty".into()));
        }
        if !self
            .project
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(err(format!(
                "project.name '{}' contains invalid characters (allowed: alphanumeric, '-', '_')",
                self.project.name
            )));
        }

        if let Some(ref version) = self.project.version {
            if semver::Version::parse(version).is_err() {
                return Err(err(format!(
                    "project.version '{}' is not valid semver (expected e.g. 1.0.0)",
                    version
                )));
            }
        }

        for repo in self.repositories.values() {
            let url = repo.url();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(err(format!(
                    "repository URL '{}' must start with http:// or https://",
                    url
                )));
            }
        }

        Ok(())
    }
}
