//! Listing load pipeline: cache check, one listing fetch, filter and
//! sort, parallel README enrichment, cache write-back.

use anyhow::Result;
use chrono::Duration;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::ProjectCache;
use crate::enrich;
use crate::github::types::Project;
use crate::github::ProjectSource;

/// Where a served listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// Fetched from the network this load.
    Fresh,
    /// Cache record younger than the TTL; no network touched.
    CacheFresh,
    /// Cache record older than the TTL, served because the network
    /// fetch failed.
    CacheStale,
}

impl DataOrigin {
    pub fn label(self) -> &'static str {
        match self {
            DataOrigin::Fresh => "live",
            DataOrigin::CacheFresh => "cached",
            DataOrigin::CacheStale => "stale cache",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub projects: Vec<Project>,
    pub origin: DataOrigin,
    /// Set when the outcome is degraded (stale fallback), for the UI
    /// to surface.
    pub warning: Option<String>,
}

/// One account's load pipeline. Borrows the source and cache so tests
/// can hand in stubs and temp dirs.
pub struct Loader<'a> {
    source: &'a dyn ProjectSource,
    cache: &'a ProjectCache,
    key: String,
    limit: usize,
    ttl: Duration,
    enrich: bool,
}

impl<'a> Loader<'a> {
    pub fn new(
        source: &'a dyn ProjectSource,
        cache: &'a ProjectCache,
        key: impl Into<String>,
        limit: usize,
        ttl: Duration,
        enrich: bool,
    ) -> Self {
        Self {
            source,
            cache,
            key: key.into(),
            limit,
            ttl,
            enrich,
        }
    }

    /// Produces the listing to show. Within the TTL the cache answers
    /// alone; past it we refetch, falling back to the stale record if
    /// the network lets us down. No cache and no network is the one
    /// hard failure. `force` skips the freshness check but not the
    /// fallback.
    pub async fn load(&self, force: bool) -> Result<LoadOutcome> {
        let cached = self.cache.get(&self.key);

        if !force {
            if let Some(record) = &cached {
                if record.is_within(self.ttl) {
                    debug!(
                        key = %self.key,
                        age_s = record.age().num_seconds(),
                        "serving listing from fresh cache"
                    );
                    return Ok(LoadOutcome {
                        projects: record.projects.clone(),
                        origin: DataOrigin::CacheFresh,
                        warning: None,
                    });
                }
            }
        }

        let records = match self.source.fetch_listing().await {
            Ok(records) => records,
            Err(e) => {
                if let Some(record) = cached {
                    let warning = format!("listing fetch failed ({:#}); showing cached data", e);
                    warn!(key = %self.key, error = %e, "listing fetch failed, serving stale cache");
                    return Ok(LoadOutcome {
                        projects: record.projects,
                        origin: DataOrigin::CacheStale,
                        warning: Some(warning),
                    });
                }
                return Err(e.context("listing fetch failed with no cached copy to fall back on"));
            }
        };

        let fetched = records.len();
        let mut projects: Vec<Project> = records
            .into_iter()
            .filter(|r| !r.fork && !r.archived)
            .map(Project::from)
            .collect();
        projects.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at));
        projects.truncate(self.limit);
        info!(
            key = %self.key,
            fetched,
            shown = projects.len(),
            "listing fetched"
        );

        if self.enrich {
            projects = self.enrich_all(projects).await;
        }

        if let Err(e) = self.cache.put(&self.key, &projects) {
            warn!(key = %self.key, error = %e, "cache write failed, continuing without");
        }

        Ok(LoadOutcome {
            projects,
            origin: DataOrigin::Fresh,
            warning: None,
        })
    }

    /// Fetches every README concurrently. Failures are per-project:
    /// a repo whose README cannot be fetched keeps its defaults, and
    /// input order is preserved.
    async fn enrich_all(&self, projects: Vec<Project>) -> Vec<Project> {
        join_all(projects.into_iter().map(|project| async move {
            match self.source.fetch_readme(&project.name).await {
                Ok(Some(markdown)) => enrich::apply_readme(project, &markdown),
                Ok(None) => {
                    debug!(repo = %project.name, "no readme, keeping defaults");
                    project
                }
                Err(e) => {
                    warn!(repo = %project.name, error = %e, "readme fetch failed, keeping defaults");
                    project
                }
            }
        }))
        .await
    }
}
