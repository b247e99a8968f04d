//! Core dependency resolution algorithm: nearest-wins BFS, scope propagation,
//! and exclusion-rule suppression over a Maven POM graph.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use linkcheck_core::artifact::{Artifact, ModuleKey};
use linkcheck_core::dependency::{Dependency, DependencyScope, Exclusion};
use linkcheck_core::manifest::Manifest;
use linkcheck_core::path::{DependencyPath, PathStep};
use linkcheck_maven::cache::LocalCache;
use linkcheck_maven::pom::Pom;
use linkcheck_maven::repository::MavenRepository;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::conflict::{ConflictReport, VersionConflict};
use crate::graph::{DepEdge, DependencyGraph, ResolvedNode};

const MAX_CONCURRENT_FETCHES: usize = 8;

/// The output of dependency resolution.
pub struct ResolutionResult {
    /// Every resolved artifact paired with the path that reached it, in
    /// resolver emission order — exactly the shape [`linkcheck_classpath::builder::build`]
    /// consumes once each candidate's archive has been fetched.
    pub candidates: Vec<(Artifact, DependencyPath)>,
    pub graph: DependencyGraph,
    pub conflicts: ConflictReport,
    /// All versions requested for each module during resolution. Modules
    /// with more than one entry were requested at multiple versions.
    pub version_requests: HashMap<ModuleKey, HashSet<String>>,
}

/// Entry in the BFS queue.
struct QueueEntry {
    artifact: Artifact,
    scope: DependencyScope,
    path: DependencyPath,
    parent_key: Option<ModuleKey>,
    exclusions: Vec<Exclusion>,
}

/// Resolve all root dependencies declared in a manifest.
///
/// Uses BFS with Maven's "nearest wins" strategy; ties at equal depth keep
/// whichever candidate was encountered first.
pub async fn resolve(
    manifest: &Manifest,
    repos: &[MavenRepository],
    cache: &LocalCache,
    client: &Client,
) -> miette::Result<ResolutionResult> {
    let mut graph = DependencyGraph::new();
    let mut conflicts = ConflictReport::new();

    let root = graph.add_node(ResolvedNode {
        group: "project".to_string(),
        artifact: manifest.project.name.clone(),
        version: manifest.project.version.clone().unwrap_or_default(),
        scope: "compile".to_string(),
    });
    graph.set_root(root);

    let mut direct: Vec<(Artifact, DependencyScope, Vec<Exclusion>)> = Vec::new();
    for dep in manifest.dependencies.values() {
        let Some(artifact) = resolve_dep_coordinate(dep) else {
            continue;
        };
        let (scope, mut exclusions) = match dep {
            Dependency::Short(_) => (DependencyScope::Compile, Vec::new()),
            Dependency::Detailed(d) => (d.scope.unwrap_or(DependencyScope::Compile), d.exclusions.clone()),
        };
        exclusions.extend(manifest.exclude.iter().cloned());
        direct.push((artifact, scope, exclusions));
    }

    let mut queue: VecDeque<QueueEntry> = VecDeque::new();
    let mut resolved: HashMap<ModuleKey, (String, usize)> = HashMap::new();
    let mut version_requests: HashMap<ModuleKey, HashSet<String>> = HashMap::new();
    let mut pom_cache: HashMap<String, Pom> = HashMap::new();

    let direct_keys: HashSet<ModuleKey> = direct.iter().map(|(a, ..)| a.module_key()).collect();

    for (artifact, scope, exclusions) in direct {
        let step = PathStep { artifact: artifact.clone(), scope, optional: false };
        queue.push_back(QueueEntry {
            artifact,
            scope,
            path: DependencyPath::new(vec![step]),
            parent_key: None,
            exclusions,
        });
    }

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));
    let mut candidates: Vec<(Artifact, DependencyPath)> = Vec::new();

    while !queue.is_empty() {
        let current_depth = queue.front().map(|e| e.path.depth()).unwrap_or(0);
        let mut level: Vec<QueueEntry> = Vec::new();
        while queue.front().is_some_and(|e| e.path.depth() == current_depth) {
            level.push(queue.pop_front().unwrap());
        }

        let coords_to_fetch: Vec<(String, String, String)> = level
            .iter()
            .map(|e| (e.artifact.group.clone(), e.artifact.name.clone(), e.artifact.version.clone()))
            .filter(|(g, a, v)| !pom_cache.contains_key(&format!("{g}:{a}:{v}")))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        if !coords_to_fetch.is_empty() {
            let mut join_set = JoinSet::new();
            for (group, artifact, version) in coords_to_fetch {
                let client = client.clone();
                let repos = repos.to_vec();
                let cache_root = cache.root().to_path_buf();
                let sem = semaphore.clone();
                join_set.spawn(async move {
                    let _permit = sem.acquire().await;
                    let local_cache = LocalCache::new(&cache_root);
                    let result =
                        fetch_pom_from_repos(&client, &repos, &local_cache, &group, &artifact, &version)
                            .await;
                    (format!("{group}:{artifact}:{version}"), result)
                });
            }
            while let Some(result) = join_set.join_next().await {
                if let Ok((coord_key, Ok(Some(pom)))) = result {
                    pom_cache.insert(coord_key, pom);
                }
            }
        }

        for entry in level {
            let module = entry.artifact.module_key();

            version_requests.entry(module.clone()).or_default().insert(entry.artifact.version.clone());

            if let Some((existing_ver, existing_depth)) = resolved.get(&module) {
                if *existing_depth <= entry.path.depth() {
                    if *existing_ver != entry.artifact.version {
                        conflicts.add(VersionConflict {
                            group: module.group.clone(),
                            artifact: module.name.clone(),
                            requested: entry.artifact.version.clone(),
                            resolved: existing_ver.clone(),
                            reason: format!(
                                "nearest wins (depth {} vs {})",
                                existing_depth,
                                entry.path.depth()
                            ),
                        });
                    }
                    continue;
                }
            }

            resolved.insert(module.clone(), (entry.artifact.version.clone(), entry.path.depth()));

            let node = graph.add_node(ResolvedNode {
                group: module.group.clone(),
                artifact: module.name.clone(),
                version: entry.artifact.version.clone(),
                scope: scope_label(entry.scope).to_string(),
            });
            let parent_idx = entry
                .parent_key
                .as_ref()
                .and_then(|k| graph.find(&format!("{}:{}", k.group, k.name)))
                .unwrap_or(root);
            graph.add_edge(
                parent_idx,
                node,
                DepEdge { scope: scope_label(entry.scope).to_string(), optional: false },
            );

            candidates.push((entry.artifact.clone(), entry.path.clone()));

            let coord_key = format!("{}:{}:{}", entry.artifact.group, entry.artifact.name, entry.artifact.version);
            let Some(mut pom) = pom_cache.get(&coord_key).cloned() else {
                continue;
            };
            pom.resolve_properties();

            for dep in &pom.dependencies {
                if dep.optional {
                    continue;
                }
                let dep_scope = dep.scope.as_deref().unwrap_or("compile");
                if dep_scope == "test" || dep_scope == "provided" || dep_scope == "system" {
                    continue;
                }

                if entry.exclusions.iter().any(|e| e.matches(&dep.group_id, &dep.artifact_id)) {
                    continue;
                }

                let version = dep
                    .version
                    .clone()
                    .or_else(|| pom.managed_version(&dep.group_id, &dep.artifact_id).map(str::to_string))
                    .unwrap_or_default();
                if version.is_empty() {
                    continue;
                }

                let mut probe_artifact = Artifact::new(dep.group_id.clone(), dep.artifact_id.clone(), version.clone());
                if let Some(ref classifier) = dep.classifier {
                    probe_artifact = probe_artifact.with_classifier(classifier.clone());
                }
                if let Some(ref extension) = dep.type_ {
                    probe_artifact = probe_artifact.with_extension(extension.clone());
                }
                let child_module = probe_artifact.module_key();
                let version = if direct_keys.contains(&child_module) {
                    // A direct dependency's manifest-declared version always wins
                    // over whatever a transitive POM requests.
                    resolved.get(&child_module).map(|(v, _)| v.clone()).unwrap_or(version)
                } else {
                    version
                };

                let child_scope = propagate_scope(entry.scope, pom_scope_to_scope(dep_scope));

                let mut child_exclusions = entry.exclusions.clone();
                for excl in &dep.exclusions {
                    child_exclusions.push(Exclusion {
                        group: excl.group_id.clone(),
                        artifact: excl.artifact_id.clone(),
                    });
                }

                let mut child_artifact = probe_artifact;
                child_artifact.version = version;
                let step = PathStep { artifact: child_artifact.clone(), scope: child_scope, optional: false };
                queue.push_back(QueueEntry {
                    artifact: child_artifact,
                    scope: child_scope,
                    path: entry.path.extended(step),
                    parent_key: Some(module.clone()),
                    exclusions: child_exclusions,
                });
            }
        }
    }

    Ok(ResolutionResult { candidates, graph, conflicts, version_requests })
}

/// Resolve a `Dependency` enum to an `Artifact` coordinate.
fn resolve_dep_coordinate(dep: &Dependency) -> Option<Artifact> {
    match dep {
        Dependency::Short(s) => Artifact::parse(s),
        Dependency::Detailed(d) => {
            let mut artifact = Artifact::new(d.group.clone(), d.artifact.clone(), d.version.clone());
            if let Some(ref classifier) = d.classifier {
                artifact = artifact.with_classifier(classifier.clone());
            }
            Some(artifact)
        }
    }
}

/// Map a POM's raw scope string onto our `DependencyScope`.
fn pom_scope_to_scope(pom_scope: &str) -> DependencyScope {
    match pom_scope {
        "runtime" => DependencyScope::Runtime,
        "provided" => DependencyScope::Provided,
        "test" => DependencyScope::Test,
        _ => DependencyScope::Compile,
    }
}

fn scope_label(scope: DependencyScope) -> &'static str {
    match scope {
        DependencyScope::Compile => "compile",
        DependencyScope::Runtime => "runtime",
        DependencyScope::Provided => "provided",
        DependencyScope::Test => "test",
        DependencyScope::Processor => "processor",
    }
}

/// Fetch a POM from the first repository that has it.
async fn fetch_pom_from_repos(
    client: &Client,
    repos: &[MavenRepository],
    cache: &LocalCache,
    group: &str,
    artifact: &str,
    version: &str,
) -> miette::Result<Option<Pom>> {
    if let Some(pom) = cache.get_pom(group, artifact, version) {
        return Ok(Some(pom));
    }

    for repo in repos {
        match cache
            .fetch_pom(client, repo, group, artifact, version)
            .await?
        {
            Some(pom) => return Ok(Some(pom)),
            None => continue,
        }
    }

    Ok(None)
}

/// Maven scope propagation rules: the stricter of parent and child scope wins.
fn propagate_scope(parent_scope: DependencyScope, dep_scope: DependencyScope) -> DependencyScope {
    use DependencyScope::*;
    match (parent_scope, dep_scope) {
        (Test, _) | (_, Test) => Test,
        (Processor, _) | (_, Processor) => Processor,
        (Provided, _) | (_, Provided) => Provided,
        (Runtime, _) | (_, Runtime) => Runtime,
        (Compile, Compile) => Compile,
    }
}

/// Build the list of repositories from a manifest, always including Maven Central.
pub fn build_repos(manifest: &Manifest) -> Vec<MavenRepository> {
    let mut repos = Vec::new();
    for (name, entry) in &manifest.repositories {
        repos.push(MavenRepository::from_entry(name, entry));
    }
    if repos.is_empty() || !repos.iter().any(|r| r.url.contains("repo.maven.apache.org")) {
        repos.push(MavenRepository::maven_central());
    }
    repos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_propagation() {
        use DependencyScope::*;
        assert_eq!(propagate_scope(Compile, Compile), Compile);
        assert_eq!(propagate_scope(Compile, Runtime), Runtime);
        assert_eq!(propagate_scope(Runtime, Compile), Runtime);
        assert_eq!(propagate_scope(Test, Compile), Test);
        assert_eq!(propagate_scope(Compile, Provided), Provided);
    }

    #[test]
    fn resolve_short_dep() {
        let dep = Dependency::Short("org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0".to_string());
        let coord = resolve_dep_coordinate(&dep).unwrap();
        assert_eq!(coord.group, "org.jetbrains.kotlinx");
        assert_eq!(coord.name, "kotlinx-coroutines-core");
        assert_eq!(coord.version, "1.8.0");
    }

    #[test]
    fn build_repos_includes_central() {
        let manifest = Manifest::parse_toml(
            r#"
            [project]
            name = "test"
            version = "0.1.0"
            "#,
        )
        .unwrap();
        let repos = build_repos(&manifest);
        assert!(!repos.is_empty());
        assert!(repos.iter().any(|r| r.url.contains("maven.apache.org")));
    }
}
