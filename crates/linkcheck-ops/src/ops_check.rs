//! Operation: run the full pipeline — load the manifest, resolve the
//! dependency graph, fetch archives, build the classpath, and check
//! linkage against it.

use std::path::Path;

use linkcheck_classpath::builder::build;
use linkcheck_core::config::GlobalConfig;
use linkcheck_core::manifest::Manifest;
use linkcheck_linker::{check, CheckConfig, CheckReport};
use linkcheck_maven::cache::LocalCache;
use linkcheck_maven::download;
use linkcheck_resolver::resolver;
use linkcheck_util::progress;

/// Load `Linkcheck.toml`, resolve + fetch + build the classpath, and run
/// the linkage checker over it.
pub async fn run(project_root: &Path, max_parsers: Option<usize>) -> miette::Result<CheckReport> {
    let manifest_path = project_root.join("Linkcheck.toml");
    let manifest = Manifest::from_path(&manifest_path)?;
    progress::status("Checking", &format!("{} against its resolved classpath", manifest.project.name));

    let global_config = GlobalConfig::load()?;

    let repos = resolver::build_repos(&manifest);
    let cache = LocalCache::new(project_root);
    let client = download::build_client()?;

    let resolution = resolver::resolve(&manifest, &repos, &cache, &client).await?;
    if !resolution.conflicts.is_empty() {
        progress::status_warn("Warning", &format!("{} version conflict(s) resolved by nearest-wins", resolution.conflicts.len()));
    }

    let sp = progress::spinner("Fetching archives...");
    let candidates = crate::ops_fetch::fetch_all(resolution.candidates, &repos, &cache, &client).await?;
    sp.finish_and_clear();

    let mut classpath_result = build(candidates);
    classpath_result.classpath.extend(manifest.classpath.extra.iter().cloned().map(|path| {
        linkcheck_classpath::ClasspathEntry {
            artifact: linkcheck_core::artifact::Artifact::new("local", path.display().to_string(), "0"),
            archive_path: path,
        }
    }));

    let manifest_limits = manifest.limits.as_ref();
    let config = CheckConfig {
        max_parsers: max_parsers.or_else(|| manifest_limits.and_then(|l| l.max_parsers).map(|n| n as usize)),
        max_open_archives: Some(
            manifest_limits
                .and_then(|l| l.max_open_archives)
                .unwrap_or(global_config.limits.max_open_archives) as usize,
        ),
    };
    let report = check(classpath_result, &manifest.exclude, config).map_err(miette::Report::from)?;

    Ok(report)
}
