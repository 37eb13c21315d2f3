use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROBLEM: &str = "Solving complex digital challenges.";
pub const DEFAULT_ARCHITECTURE: &str = "Modern Full-Stack Architecture.";
pub const DEFAULT_IMPACT: &str = "High-performance reliable systems.";
pub const DEFAULT_TAGS: &[&str] = &["software", "development"];

/// GitHub `GET /users/{user}/repos` response item, trimmed to the
/// fields we read. `pushed_at` is null for repos with no commits.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoRecord {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// A repository as the gallery shows it. Serialized into cache
/// records, so field changes need a `CACHE_SCHEMA_VERSION` bump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    /// Deployed URL, when one is configured. Empty strings from the
    /// API are normalized to `None`.
    pub homepage: Option<String>,
    pub source_url: String,
    pub pushed_at: DateTime<Utc>,
    pub enrichment: Enrichment,
    /// Full README text, once something has fetched it.
    #[serde(default)]
    pub readme: Option<String>,
}

/// The three narrative fields shown on cards and in the preview
/// modal, plus tags. Populated from the README where possible,
/// otherwise from the defaults above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub problem: String,
    pub architecture: String,
    pub impact: String,
    pub tags: Vec<String>,
}

impl Enrichment {
    pub fn defaults(description: Option<&str>, topics: &[String]) -> Self {
        Self {
            problem: description
                .filter(|d| !d.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_PROBLEM.to_string()),
            architecture: DEFAULT_ARCHITECTURE.to_string(),
            impact: DEFAULT_IMPACT.to_string(),
            tags: if topics.is_empty() {
                DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
            } else {
                topics.to_vec()
            },
        }
    }

    /// True when no README section replaced the stock impact line.
    pub fn impact_is_default(&self) -> bool {
        self.impact == DEFAULT_IMPACT
    }
}

impl Project {
    /// StackBlitz source-view URL, always available.
    pub fn sandbox_url(&self) -> String {
        format!(
            "https://stackblitz.com/github/{}?embed=1&theme=light&hideNavigation=1",
            self.full_name
        )
    }

    pub fn live_url(&self) -> Option<&str> {
        self.homepage.as_deref()
    }
}

impl From<RepoRecord> for Project {
    fn from(record: RepoRecord) -> Self {
        let enrichment = Enrichment::defaults(record.description.as_deref(), &record.topics);
        Self {
            id: record.id,
            name: record.name,
            full_name: record.full_name,
            description: record.description,
            language: record.language,
            homepage: record.homepage.filter(|h| !h.trim().is_empty()),
            source_url: record.html_url,
            pushed_at: record.pushed_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
            enrichment,
            readme: None,
        }
    }
}
