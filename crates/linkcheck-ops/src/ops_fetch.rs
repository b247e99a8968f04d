//! Operation: download (or reuse from cache) the archive backing every
//! resolved candidate, turning the resolver's `(Artifact, DependencyPath)`
//! pairs into the archive-bearing [`Candidate`]s the classpath builder
//! consumes. This is the external "artifact download" collaborator spec.md
//! §1/§6 names as out of core scope — the core itself never fetches bytes.

use std::collections::HashMap;
use std::sync::Arc;

use linkcheck_classpath::builder::Candidate;
use linkcheck_core::artifact::Artifact;
use linkcheck_core::path::DependencyPath;
use linkcheck_maven::cache::LocalCache;
use linkcheck_maven::repository::MavenRepository;
use linkcheck_util::errors::LinkcheckError;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const MAX_CONCURRENT_DOWNLOADS: usize = 8;

/// Downloads every candidate's JAR, in parallel, bounded by a semaphore —
/// the same shape the resolver uses for POM prefetching.
pub async fn fetch_all(
    candidates: Vec<(Artifact, DependencyPath)>,
    repos: &[MavenRepository],
    cache: &LocalCache,
    client: &Client,
) -> miette::Result<Vec<Candidate>> {
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_DOWNLOADS));
    let mut join_set = JoinSet::new();

    for (index, (artifact, path)) in candidates.into_iter().enumerate() {
        let client = client.clone();
        let repos = repos.to_vec();
        let cache = cache.clone();
        let sem = semaphore.clone();
        join_set.spawn(async move {
            let _permit = sem.acquire().await;
            let archive_path = fetch_one(&client, &repos, &cache, &artifact).await;
            (index, artifact, path, archive_path)
        });
    }

    let mut by_index: HashMap<usize, Candidate> = HashMap::new();
    while let Some(joined) = join_set.join_next().await {
        let (index, artifact, path, archive_path) = joined
            .map_err(|e| LinkcheckError::Generic { message: format!("fetch task panicked: {e}") })?;
        let archive_path = archive_path?;
        by_index.insert(index, Candidate { artifact, path, archive_path });
    }

    let mut ordered: Vec<(usize, Candidate)> = by_index.into_iter().collect();
    ordered.sort_by_key(|(index, _)| *index);
    Ok(ordered.into_iter().map(|(_, c)| c).collect())
}

async fn fetch_one(
    client: &Client,
    repos: &[MavenRepository],
    cache: &LocalCache,
    artifact: &Artifact,
) -> miette::Result<std::path::PathBuf> {
    if let Some(path) = cache.get_jar(&artifact.group, &artifact.name, &artifact.version, artifact.classifier.as_deref()) {
        return Ok(path);
    }

    for repo in repos {
        let url = repo.jar_url(&artifact.group, &artifact.name, &artifact.version, artifact.classifier.as_deref());
        let label = format!("{artifact}");
        if let Some(bytes) = linkcheck_maven::download::download_artifact(client, repo, &url, &label).await? {
            return cache.put_jar(&artifact.group, &artifact.name, &artifact.version, artifact.classifier.as_deref(), &bytes);
        }
    }

    Err(LinkcheckError::ResolutionFailed {
        message: format!("no repository provided an archive for {artifact}"),
    }
    .into())
}
