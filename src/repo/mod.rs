// src/repo/mod.rs
// Uniform adapter interface over source-control providers

mod azure;
mod bitbucket;
mod github;

pub use azure::AzureDevOpsAdapter;
pub use bitbucket::BitbucketAdapter;
pub use github::GitHubAdapter;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported source-control providers.
///
/// This is the single point of provider dispatch; everything downstream of
/// `adapter_for` is provider-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    AzureDevOps,
    Bitbucket,
    Other,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(Self::GitHub),
            "azure" | "azuredevops" | "azure_devops" => Some(Self::AzureDevOps),
            "bitbucket" => Some(Self::Bitbucket),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Guess the provider from a repository URL host
    pub fn infer_from_url(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("github.com") {
            Self::GitHub
        } else if url.contains("dev.azure.com") || url.contains("visualstudio.com") {
            Self::AzureDevOps
        } else if url.contains("bitbucket.org") {
            Self::Bitbucket
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => write!(f, "github"),
            Self::AzureDevOps => write!(f, "azuredevops"),
            Self::Bitbucket => write!(f, "bitbucket"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One repository attached to a project/channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: String,
    pub provider: ProviderKind,
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Name of the environment variable holding the credential for this
    /// repository. The value itself is resolved at call time and never
    /// stored, serialized, or logged.
    #[serde(default)]
    pub credential_env: Option<String>,
    /// Hosting-platform hint used to gate AI augmentation (e.g. "wordpress")
    #[serde(default)]
    pub site_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

impl RepositoryConfig {
    /// Resolve the credential for this repository, falling back to the
    /// provider-wide environment variable. Empty values count as absent.
    pub fn resolve_credential(&self) -> Option<String> {
        let var = self.credential_env.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::GitHub => "GITHUB_TOKEN",
                ProviderKind::AzureDevOps => "AZURE_DEVOPS_TOKEN",
                ProviderKind::Bitbucket => "BITBUCKET_TOKEN",
                ProviderKind::Other => "",
            }
            .to_string()
        });
        if var.is_empty() {
            return None;
        }
        std::env::var(&var).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Type of change applied to one file in a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    Modify,
    Delete,
}

/// One file touched by a commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub change_type: ChangeType,
    pub additions: u32,
    pub deletions: u32,
}

/// A commit as returned by an adapter. Produced fresh per call; investigations
/// always recompute from live data, never from persisted commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Abbreviated sha (8 chars)
    pub sha: String,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub files: Vec<FileChange>,
}

/// Best-effort repository metadata; any field may be absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryStats {
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub open_issues: Option<u64>,
    pub default_branch: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Uniform commit-history interface, implemented once per provider.
///
/// Contract: a missing credential yields an empty result, not an error; a
/// malformed repository URL yields `ScoutError::InvalidRepoUrl`; network and
/// API failures surface as `ScoutError` values the orchestrator converts to
/// per-repository status, never fatal errors.
#[async_trait]
pub trait RepoAdapter: Send + Sync {
    /// Recent commits on `branch` within `window_days`, newest first, capped
    /// at `limit`.
    async fn list_recent_commits(
        &self,
        url: &str,
        branch: &str,
        window_days: u32,
        limit: usize,
    ) -> Result<Vec<Commit>>;

    /// Best-effort repository statistics; may return `RepositoryStats::default()`.
    async fn repository_stats(&self, url: &str, branch: &str) -> Result<RepositoryStats>;
}

/// Construct the adapter for a provider kind. The sole provider dispatch
/// point in the crate.
pub fn adapter_for(
    kind: ProviderKind,
    http: &reqwest::Client,
    credential: Option<String>,
) -> Box<dyn RepoAdapter> {
    match kind {
        ProviderKind::GitHub => Box::new(GitHubAdapter::new(http.clone(), credential)),
        ProviderKind::AzureDevOps => Box::new(AzureDevOpsAdapter::new(http.clone(), credential)),
        ProviderKind::Bitbucket => Box::new(BitbucketAdapter::new(http.clone(), credential)),
        ProviderKind::Other => Box::new(UnsupportedAdapter),
    }
}

/// Placeholder for provider kinds with no REST integration
struct UnsupportedAdapter;

#[async_trait]
impl RepoAdapter for UnsupportedAdapter {
    async fn list_recent_commits(
        &self,
        _url: &str,
        _branch: &str,
        _window_days: u32,
        _limit: usize,
    ) -> Result<Vec<Commit>> {
        Err(crate::error::ScoutError::Provider(
            "provider kind not yet supported".to_string(),
        ))
    }

    async fn repository_stats(&self, _url: &str, _branch: &str) -> Result<RepositoryStats> {
        Ok(RepositoryStats::default())
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

pub(crate) fn short_sha(sha: &str) -> String {
    sha.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_roundtrip() {
        assert_eq!(ProviderKind::parse("github"), Some(ProviderKind::GitHub));
        assert_eq!(ProviderKind::parse("AZURE"), Some(ProviderKind::AzureDevOps));
        assert_eq!(ProviderKind::parse("bitbucket"), Some(ProviderKind::Bitbucket));
        assert_eq!(ProviderKind::parse("svn"), None);
        assert_eq!(ProviderKind::GitHub.to_string(), "github");
    }

    #[test]
    fn test_repository_config_default_branch() {
        let json = r#"{"name":"web","provider":"github","url":"https://github.com/acme/web"}"#;
        let cfg: RepositoryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.branch, "main");
        assert!(cfg.credential_env.is_none());
    }

    #[test]
    fn test_parse_timestamp_fallback() {
        let ts = parse_timestamp("2024-06-01T12:00:00Z");
        assert_eq!(ts.timezone(), Utc);
        // Garbage input degrades to the epoch rather than failing
        assert_eq!(parse_timestamp("garbage"), DateTime::<Utc>::default());
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(short_sha("0123456789abcdef"), "01234567");
        assert_eq!(short_sha("abc"), "abc");
    }

    #[tokio::test]
    async fn test_unsupported_adapter_errors() {
        let adapter = UnsupportedAdapter;
        let err = adapter
            .list_recent_commits("https://example.com/repo", "main", 7, 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not yet supported"));
    }
}
