use serde::{Deserialize, Serialize};

/// A dependency specification in `Linkcheck.toml`.
///
/// Supports both shorthand (`"group:artifact:version"`) and detailed forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Short(String),
    Detailed(DetailedDependency),
}

/// A dependency with explicit group, artifact, version, and optional metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedDependency {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default)]
    pub scope: Option<DependencyScope>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub classifier: Option<String>,
}

/// A transitive dependency to exclude, as a `(from, to)` rule: `to` may
/// contain `*` glob wildcards in its group or artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exclusion {
    pub group: String,
    #[serde(default)]
    pub artifact: Option<String>,
}

impl Exclusion {
    /// Whether this exclusion rule matches the given module coordinates.
    /// `*` in either field matches any value.
    pub fn matches(&self, group: &str, artifact: &str) -> bool {
        let group_matches = self.group == "*" || self.group == group;
        let artifact_matches = match &self.artifact {
            None => true,
            Some(a) => a == "*" || a == artifact,
        };
        group_matches && artifact_matches
    }
}

/// Maven-compatible dependency scope, including a processor-only scope a
/// manifest may declare for annotation-processor artifacts that never
/// reach the runtime classpath.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    #[default]
    Compile,
    Runtime,
    Provided,
    Test,
    Processor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_wildcard_group_matches_any() {
        let ex = Exclusion {
            group: "*".to_string(),
            artifact: Some("commons-logging".to_string()),
        };
        assert!(ex.matches("org.apache", "commons-logging"));
        assert!(!ex.matches("org.apache", "other"));
    }

    #[test]
    fn exclusion_wildcard_artifact_matches_any_in_group() {
        let ex = Exclusion {
            group: "org.apache".to_string(),
            artifact: None,
        };
        assert!(ex.matches("org.apache", "anything"));
        assert!(!ex.matches("com.example", "anything"));
    }

    #[test]
    fn exclusion_exact_match() {
        let ex = Exclusion {
            group: "org.apache".to_string(),
            artifact: Some("commons-logging".to_string()),
        };
        assert!(ex.matches("org.apache", "commons-logging"));
        assert!(!ex.matches("org.apache", "commons-io"));
    }
}
