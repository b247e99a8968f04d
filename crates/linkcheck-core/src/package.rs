use std::path::PathBuf;

use crate::manifest::Manifest;

/// A resolved linkcheck project: one `Linkcheck.toml` manifest plus the
/// directory it was loaded from.
#[derive(Debug, Clone)]
pub struct Project {
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    pub root_dir: PathBuf,
}

impl Project {
    /// Load a project from its `Linkcheck.toml` path.
    pub fn load(manifest_path: PathBuf) -> miette::Result<Self> {
        let manifest = Manifest::from_path(&manifest_path)?;
        let root_dir = manifest_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            manifest,
            manifest_path,
            root_dir,
        })
    }

    /// Returns the project name from the manifest.
    pub fn name(&self) -> &str {
        &self.manifest.project.name
    }

    /// Returns the project version from the manifest, if declared.
    pub fn version(&self) -> Option<&str> {
        self.manifest.project.version.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_reads_manifest_and_root_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("Linkcheck.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "[project]\nname = \"demo\"\nversion = \"1.0.0\"\n").unwrap();

        let project = Project::load(path.clone()).unwrap();
        assert_eq!(project.name(), "demo");
        assert_eq!(project.version(), Some("1.0.0"));
        assert_eq!(project.root_dir, tmp.path());
    }
}
