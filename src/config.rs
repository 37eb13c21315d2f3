use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration, read from `config.toml` in the working
/// directory. Every section is optional; missing fields fall back to
/// the defaults below so the binary runs with no config file at all.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    /// Account whose public repositories are shown. A CLI argument
    /// overrides this.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_s")]
    pub request_timeout_s: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GalleryConfig {
    /// Upper bound on rendered projects after filtering.
    #[serde(default = "default_repo_limit")]
    pub repo_limit: usize,
    /// Cache records older than this are refetched.
    #[serde(default = "default_cache_ttl_mins")]
    pub cache_ttl_mins: u64,
    /// Set false to skip the per-repo README pass entirely.
    #[serde(default = "default_enrich")]
    pub enrich: bool,
    /// Delay between consecutive card reveals.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CacheConfig {
    /// Override for the cache directory. Defaults to the platform
    /// cache dir (e.g. `~/.cache/repo-gallery`).
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout_s() -> u64 {
    10
}

fn default_repo_limit() -> usize {
    100
}

fn default_cache_ttl_mins() -> u64 {
    15
}

fn default_enrich() -> bool {
    true
}

fn default_stagger_ms() -> u64 {
    150
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            username: None,
            api_base: default_api_base(),
            request_timeout_s: default_request_timeout_s(),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            repo_limit: default_repo_limit(),
            cache_ttl_mins: default_cache_ttl_mins(),
            enrich: default_enrich(),
            stagger_ms: default_stagger_ms(),
        }
    }
}

impl CacheConfig {
    pub fn resolve_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => dirs_next::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("repo-gallery"),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file. A missing file is not an
    /// error; a file that exists but fails to parse is.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Picks the account to browse: CLI argument wins over the config
    /// file. Errors when neither is present.
    pub fn resolve_username(&self, cli_override: Option<String>) -> Result<String> {
        if let Some(name) = cli_override {
            return Ok(name);
        }
        match &self.github.username {
            Some(name) if !name.trim().is_empty() => Ok(name.clone()),
            _ => bail!("no GitHub username given; pass one as an argument or set github.username in config.toml"),
        }
    }
}
