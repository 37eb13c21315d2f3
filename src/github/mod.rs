pub mod rest;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::RepoRecord;

/// Where the gallery gets its repository data. The REST client is the
/// real implementation; tests substitute stubs.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// One listing request for the account's public repositories,
    /// provider-sorted by recency.
    async fn fetch_listing(&self) -> Result<Vec<RepoRecord>>;

    /// Raw README text for one repository. `Ok(None)` means the repo
    /// has no README; `Err` is a transport or protocol failure.
    async fn fetch_readme(&self, name: &str) -> Result<Option<String>>;
}
