//! Operation: display the dependency tree resolved from `Linkcheck.toml`.

use std::path::Path;

use linkcheck_core::manifest::Manifest;
use linkcheck_maven::cache::LocalCache;
use linkcheck_maven::download;
use linkcheck_resolver::resolver;

/// Options for `linkcheck tree`.
#[derive(Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the path to a specific module (`group:name`).
    pub why: Option<String>,
    /// Show only modules requested at more than one version.
    pub duplicates: bool,
    /// Show version conflicts resolved by nearest-wins.
    pub conflicts: bool,
    /// Show licenses from POM metadata.
    pub licenses: bool,
    /// Show inverted tree (dependents instead of dependencies).
    pub inverted: bool,
}

/// Display the dependency tree for the project.
pub async fn tree(project_root: &Path, opts: &TreeOptions) -> miette::Result<()> {
    let manifest_path = project_root.join("Linkcheck.toml");
    let manifest = Manifest::from_path(&manifest_path)?;
    let repos = resolver::build_repos(&manifest);
    let cache = LocalCache::new(project_root);
    let client = download::build_client()?;

    let result = resolver::resolve(&manifest, &repos, &cache, &client).await?;

    if let Some(ref target) = opts.why {
        if let Some(path) = result.graph.find_path(target) {
            println!("Path to {target}:");
            for (i, node) in path.iter().enumerate() {
                let indent = "  ".repeat(i);
                println!("{indent}{node}");
            }
        } else {
            println!("Module '{target}' not found in the graph.");
        }
        return Ok(());
    }

    if opts.conflicts {
        if result.conflicts.is_empty() {
            println!("No version conflicts.");
        } else {
            print!("{}", result.conflicts);
        }
        return Ok(());
    }

    if opts.licenses {
        for (artifact, _path) in &result.candidates {
            let pom = cache.get_pom(&artifact.group, &artifact.name, &artifact.version);
            let license = pom
                .and_then(|p| p.licenses.first().and_then(|l| l.name.clone()))
                .unwrap_or_else(|| "Unknown".to_string());
            println!("{artifact} — {license}");
        }
        return Ok(());
    }

    if opts.duplicates {
        let mut found = false;
        for (key, versions) in &result.version_requests {
            if versions.len() > 1 {
                let resolved_ver = result
                    .graph
                    .find(&format!("{}:{}", key.group, key.name))
                    .map(|idx| result.graph.node(idx).version.as_str())
                    .unwrap_or("?");
                let mut vers: Vec<&str> = versions.iter().map(|s| s.as_str()).collect();
                vers.sort();
                println!("{}:{} (resolved {resolved_ver}) — requested: {}", key.group, key.name, vers.join(", "));
                found = true;
            }
        }
        if !found {
            println!("No duplicate version requests.");
        }
        return Ok(());
    }

    if opts.inverted {
        let inverted_output = result.graph.print_full_inverted_tree();
        if inverted_output.is_empty() {
            println!("No dependencies.");
        } else {
            print!("{inverted_output}");
        }
        return Ok(());
    }

    let tree_output = result.graph.print_tree(opts.depth);
    print!("{tree_output}");

    Ok(())
}
