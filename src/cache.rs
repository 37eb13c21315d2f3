//! Durable listing cache, one JSON file per account under the cache
//! directory.
//!
//! The store is deliberately dumb: it records when a listing was
//! written and answers age questions, but it never expires anything
//! itself. Freshness policy lives in [`crate::fetch`], which also
//! decides when a stale record is still worth serving. Any record we
//! cannot read back (missing, unreadable, corrupt, or written by an
//! older schema) is treated as absent so a bad cache can only cost a
//! refetch, never a crash.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::github::types::Project;

/// Bump this whenever `Project` or the record layout changes; old
/// records then read as absent and get refetched.
const CACHE_SCHEMA_VERSION: u32 = 3;

/// One cached listing: the processed projects plus when they were
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedListing {
    version: u32,
    pub stored_at: DateTime<Utc>,
    pub projects: Vec<Project>,
}

impl CachedListing {
    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }

    pub fn is_within(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

pub struct ProjectCache {
    dir: PathBuf,
}

impl ProjectCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Reads the record for `key`, failing open: every read problem
    /// maps to `None`.
    pub fn get(&self, key: &str) -> Option<CachedListing> {
        let path = self.record_path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache record unreadable, treating as absent");
                return None;
            }
        };
        let record: CachedListing = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache record corrupt, treating as absent");
                return None;
            }
        };
        if record.version != CACHE_SCHEMA_VERSION {
            debug!(
                path = %path.display(),
                found = record.version,
                expected = CACHE_SCHEMA_VERSION,
                "cache record from another schema version, treating as absent"
            );
            return None;
        }
        Some(record)
    }

    /// Writes a record stamped with the current time, replacing any
    /// existing record for `key`.
    pub fn put(&self, key: &str, projects: &[Project]) -> Result<()> {
        self.put_at(key, projects, Utc::now())
    }

    /// Same as [`put`](Self::put) with an explicit timestamp, so tests
    /// can backdate records.
    pub fn put_at(&self, key: &str, projects: &[Project], stored_at: DateTime<Utc>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create cache dir {}", self.dir.display()))?;
        let record = CachedListing {
            version: CACHE_SCHEMA_VERSION,
            stored_at,
            projects: projects.to_vec(),
        };
        let json = serde_json::to_string_pretty(&record).context("failed to encode cache record")?;
        let path = self.record_path(key);
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write cache record {}", path.display()))?;
        debug!(path = %path.display(), count = projects.len(), "cache record written");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
