//! Integration tests for the listing load pipeline, run against a
//! stubbed source and a temp-dir cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Duration;
use tempfile::TempDir;

use repo_gallery::cache::ProjectCache;
use repo_gallery::fetch::{DataOrigin, Loader};
use repo_gallery::github::types::{RepoRecord, DEFAULT_ARCHITECTURE};
use repo_gallery::github::ProjectSource;

fn ttl() -> Duration {
    Duration::minutes(15)
}

#[derive(Default)]
struct StubSource {
    /// `None` simulates a listing endpoint failure.
    listing: Option<Vec<RepoRecord>>,
    readmes: HashMap<String, String>,
    failing_readmes: Vec<String>,
    listing_calls: AtomicUsize,
    readme_calls: AtomicUsize,
}

#[async_trait]
impl ProjectSource for StubSource {
    async fn fetch_listing(&self) -> Result<Vec<RepoRecord>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        match &self.listing {
            Some(records) => Ok(records.clone()),
            None => bail!("listing endpoint unavailable"),
        }
    }

    async fn fetch_readme(&self, name: &str) -> Result<Option<String>> {
        self.readme_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_readmes.iter().any(|n| n == name) {
            bail!("readme endpoint unavailable");
        }
        Ok(self.readmes.get(name).cloned())
    }
}

fn record(id: u64, name: &str, pushed: &str, fork: bool, archived: bool) -> RepoRecord {
    RepoRecord {
        id,
        name: name.to_string(),
        full_name: format!("octocat/{}", name),
        description: Some(format!("{} description", name)),
        language: Some("Rust".to_string()),
        homepage: None,
        html_url: format!("https://github.com/octocat/{}", name),
        pushed_at: Some(pushed.parse().unwrap()),
        fork,
        archived,
        topics: Vec::new(),
    }
}

#[tokio::test]
async fn test_first_load_fetches_filters_and_sorts() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let source = StubSource {
        listing: Some(vec![
            record(1, "a", "2024-01-01T00:00:00Z", false, false),
            record(2, "b", "2024-06-01T00:00:00Z", true, false),
            record(3, "c", "2024-03-01T00:00:00Z", false, false),
        ]),
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), false);

    let outcome = loader.load(false).await.unwrap();

    assert_eq!(outcome.origin, DataOrigin::Fresh);
    assert!(outcome.warning.is_none());
    let names: Vec<_> = outcome.projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a"], "fork dropped, rest newest-first");
}

#[tokio::test]
async fn test_archived_repos_are_dropped_too() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let source = StubSource {
        listing: Some(vec![
            record(1, "kept", "2024-01-01T00:00:00Z", false, false),
            record(2, "old", "2024-06-01T00:00:00Z", false, true),
        ]),
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), false);

    let outcome = loader.load(false).await.unwrap();
    let names: Vec<_> = outcome.projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["kept"]);
}

#[tokio::test]
async fn test_limit_applies_after_sorting() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let source = StubSource {
        listing: Some(vec![
            record(1, "oldest", "2023-01-01T00:00:00Z", false, false),
            record(2, "newest", "2024-06-01T00:00:00Z", false, false),
            record(3, "middle", "2024-01-01T00:00:00Z", false, false),
        ]),
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 2, ttl(), false);

    let outcome = loader.load(false).await.unwrap();
    let names: Vec<_> = outcome.projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["newest", "middle"]);
}

#[tokio::test]
async fn test_sort_keeps_listing_order_on_equal_timestamps() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let source = StubSource {
        listing: Some(vec![
            record(1, "first", "2024-01-01T00:00:00Z", false, false),
            record(2, "second", "2024-01-01T00:00:00Z", false, false),
        ]),
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), false);

    let outcome = loader.load(false).await.unwrap();
    let names: Vec<_> = outcome.projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[tokio::test]
async fn test_fresh_cache_answers_without_network() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let source = StubSource {
        listing: Some(vec![record(1, "a", "2024-01-01T00:00:00Z", false, false)]),
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), true);

    // First load populates the cache over the network.
    let first = loader.load(false).await.unwrap();
    assert_eq!(first.origin, DataOrigin::Fresh);
    assert_eq!(source.listing_calls.load(Ordering::SeqCst), 1);
    let readme_calls_after_first = source.readme_calls.load(Ordering::SeqCst);

    // Second load must be answered by the cache alone.
    let second = loader.load(false).await.unwrap();
    assert_eq!(second.origin, DataOrigin::CacheFresh);
    assert_eq!(second.projects, first.projects);
    assert_eq!(source.listing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.readme_calls.load(Ordering::SeqCst), readme_calls_after_first);
}

#[tokio::test]
async fn test_force_bypasses_fresh_cache() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let source = StubSource {
        listing: Some(vec![record(1, "a", "2024-01-01T00:00:00Z", false, false)]),
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), false);

    loader.load(false).await.unwrap();
    let outcome = loader.load(true).await.unwrap();

    assert_eq!(outcome.origin, DataOrigin::Fresh);
    assert_eq!(source.listing_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stale_cache_served_when_fetch_fails() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());

    // Populate, then backdate the record past the TTL.
    let seed = StubSource {
        listing: Some(vec![record(1, "survivor", "2024-01-01T00:00:00Z", false, false)]),
        ..Default::default()
    };
    let loader = Loader::new(&seed, &cache, "octocat", 100, ttl(), false);
    let seeded = loader.load(false).await.unwrap();
    cache
        .put_at("octocat", &seeded.projects, chrono::Utc::now() - Duration::minutes(60))
        .unwrap();

    let dead = StubSource::default();
    let loader = Loader::new(&dead, &cache, "octocat", 100, ttl(), false);
    let outcome = loader.load(false).await.unwrap();

    assert_eq!(outcome.origin, DataOrigin::CacheStale);
    assert!(outcome.warning.is_some(), "stale serving must carry a warning");
    assert_eq!(outcome.projects[0].name, "survivor");
}

#[tokio::test]
async fn test_fetch_failure_without_cache_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let dead = StubSource::default();
    let loader = Loader::new(&dead, &cache, "octocat", 100, ttl(), false);

    let err = loader.load(false).await.unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("no cached copy"), "got: {}", chain);
}

#[tokio::test]
async fn test_enrichment_failures_stay_per_project() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let mut readmes = HashMap::new();
    readmes.insert(
        "alpha".to_string(),
        "## Problem\n\nState gets lost.\n\n## Architecture\n\nOne binary, one task.\n".to_string(),
    );
    let source = StubSource {
        listing: Some(vec![
            record(1, "alpha", "2024-03-01T00:00:00Z", false, false),
            record(2, "beta", "2024-02-01T00:00:00Z", false, false),
            record(3, "gamma", "2024-01-01T00:00:00Z", false, false),
        ]),
        readmes,
        failing_readmes: vec!["beta".to_string()],
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), true);

    let outcome = loader.load(false).await.unwrap();

    assert_eq!(source.readme_calls.load(Ordering::SeqCst), 3);
    let names: Vec<_> = outcome.projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"], "order survives enrichment");

    let alpha = &outcome.projects[0];
    assert_eq!(alpha.enrichment.problem, "State gets lost.");
    assert_eq!(alpha.enrichment.architecture, "One binary, one task.");
    assert!(alpha.readme.is_some());

    // beta's fetch failed, gamma had no README; both keep defaults.
    assert_eq!(outcome.projects[1].enrichment.problem, "beta description");
    assert_eq!(outcome.projects[1].enrichment.architecture, DEFAULT_ARCHITECTURE);
    assert!(outcome.projects[2].readme.is_none());
}

#[tokio::test]
async fn test_enrichment_disabled_skips_readme_traffic() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let source = StubSource {
        listing: Some(vec![record(1, "a", "2024-01-01T00:00:00Z", false, false)]),
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), false);

    loader.load(false).await.unwrap();
    assert_eq!(source.readme_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_long_readme_section_truncates_to_150_chars() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let mut readmes = HashMap::new();
    readmes.insert(
        "verbose".to_string(),
        format!("## Problem\n\n{}\n", "p".repeat(200)),
    );
    let source = StubSource {
        listing: Some(vec![record(1, "verbose", "2024-01-01T00:00:00Z", false, false)]),
        readmes,
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), true);

    let outcome = loader.load(false).await.unwrap();
    let problem = &outcome.projects[0].enrichment.problem;
    assert_eq!(problem.chars().count(), 150);
    assert!(problem.ends_with('\u{2026}'));
}

#[tokio::test]
async fn test_write_back_preserves_enrichment_across_processes() {
    let tmp = TempDir::new().unwrap();
    let cache = ProjectCache::new(tmp.path());
    let mut readmes = HashMap::new();
    readmes.insert(
        "alpha".to_string(),
        "## Impact\n\nCut load times in half.\n".to_string(),
    );
    let source = StubSource {
        listing: Some(vec![record(1, "alpha", "2024-03-01T00:00:00Z", false, false)]),
        readmes,
        ..Default::default()
    };
    let loader = Loader::new(&source, &cache, "octocat", 100, ttl(), true);
    let outcome = loader.load(false).await.unwrap();

    // A fresh store handle sees the same processed record on disk.
    let reopened = ProjectCache::new(tmp.path());
    let record = reopened.get("octocat").expect("write-back record");
    assert_eq!(record.projects, outcome.projects);
    assert_eq!(record.projects[0].enrichment.impact, "Cut load times in half.");
}
