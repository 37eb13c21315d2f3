use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use super::types::RepoRecord;
use super::ProjectSource;

/// Listing page size. We take a single page and never paginate.
const PAGE_SIZE: usize = 100;

/// Unauthenticated GitHub REST v3 client. GitHub rejects requests
/// without a User-Agent, so the builder pins one.
pub struct GithubClient {
    client: Client,
    base_url: String,
    username: String,
}

impl GithubClient {
    pub fn new(username: &str, base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("repo-gallery/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
        }
    }
}

#[async_trait]
impl ProjectSource for GithubClient {
    async fn fetch_listing(&self) -> Result<Vec<RepoRecord>> {
        let url = format!(
            "{}/users/{}/repos?sort=updated&per_page={}",
            self.base_url, self.username, PAGE_SIZE
        );
        debug!(%url, "fetching repository listing");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET repository listing failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("GET repository listing failed ({}): {}", status, body);
        }
        resp.json::<Vec<RepoRecord>>()
            .await
            .context("failed to parse repository listing")
    }

    async fn fetch_readme(&self, name: &str) -> Result<Option<String>> {
        let url = format!("{}/repos/{}/{}/readme", self.base_url, self.username, name);
        let resp = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github.v3.raw")
            .send()
            .await
            .with_context(|| format!("GET readme for {} failed", name))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(repo = name, "no readme");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("GET readme for {} failed ({}): {}", name, status, body);
        }
        let text = resp
            .text()
            .await
            .with_context(|| format!("failed to read readme body for {}", name))?;
        Ok(Some(text))
    }
}
