// src/repo/github.rs
// GitHub REST v3 adapter

use super::{parse_timestamp, short_sha, ChangeType, Commit, FileChange, RepoAdapter, RepositoryStats};
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

const API_BASE: &str = "https://api.github.com";

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https://github\.com/|git@github\.com:)([^/]+)/([^/]+?)(?:\.git)?/?$")
            .expect("github url pattern is valid")
    })
}

/// Extract `(owner, repo)` from a GitHub URL, https or ssh form
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    url_pattern()
        .captures(url.trim())
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .ok_or_else(|| ScoutError::InvalidRepoUrl(url.to_string()))
}

pub struct GitHubAdapter {
    http: reqwest::Client,
    token: Option<String>,
}

impl GitHubAdapter {
    pub fn new(http: reqwest::Client, token: Option<String>) -> Self {
        Self { http, token }
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Fetch per-file changes for one commit. Best-effort: any failure means
    /// the commit is scored on its message alone.
    async fn fetch_files(&self, owner: &str, repo: &str, sha: &str) -> Vec<FileChange> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/commits/{sha}");
        let response = match self.authorized(self.http.get(&url)).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(sha, error = %e, "Skipping file details for commit");
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            return Vec::new();
        }
        let detail: GhCommitDetail = match response.json().await {
            Ok(d) => d,
            Err(_) => return Vec::new(),
        };
        detail
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|f| FileChange {
                path: f.filename,
                change_type: match f.status.as_str() {
                    "added" => ChangeType::Add,
                    "removed" => ChangeType::Delete,
                    _ => ChangeType::Modify,
                },
                additions: f.additions,
                deletions: f.deletions,
            })
            .collect()
    }
}

#[async_trait]
impl RepoAdapter for GitHubAdapter {
    async fn list_recent_commits(
        &self,
        url: &str,
        branch: &str,
        window_days: u32,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        let (owner, repo) = parse_repo_url(url)?;
        if self.token.is_none() {
            debug!(%owner, %repo, "No GitHub credential configured, returning empty result");
            return Ok(Vec::new());
        }

        let since = (Utc::now() - Duration::days(window_days as i64)).to_rfc3339();
        let per_page = limit.to_string();
        let list_url = format!("{API_BASE}/repos/{owner}/{repo}/commits");
        let response = self
            .authorized(self.http.get(&list_url).query(&[
                ("sha", branch),
                ("since", since.as_str()),
                ("per_page", per_page.as_str()),
            ]))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%owner, %repo, %status, "GitHub commit listing failed");
            return Err(ScoutError::Provider(format!(
                "GitHub returned {status} for {owner}/{repo}: {body}"
            )));
        }

        let entries: Vec<GhCommitEntry> = response.json().await?;
        let mut commits = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().take(limit) {
            let files = self.fetch_files(&owner, &repo, &entry.sha).await;
            commits.push(Commit {
                sha: short_sha(&entry.sha),
                message: entry.commit.message,
                author: entry.commit.author.as_ref().map(|a| a.name.clone()).unwrap_or_default(),
                timestamp: entry
                    .commit
                    .author
                    .as_ref()
                    .map(|a| parse_timestamp(&a.date))
                    .unwrap_or_default(),
                url: entry.html_url.unwrap_or_default(),
                files,
            });
        }
        Ok(commits)
    }

    async fn repository_stats(&self, url: &str, _branch: &str) -> Result<RepositoryStats> {
        let (owner, repo) = parse_repo_url(url)?;
        if self.token.is_none() {
            return Ok(RepositoryStats::default());
        }

        let response = self
            .authorized(self.http.get(format!("{API_BASE}/repos/{owner}/{repo}")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(RepositoryStats::default());
        }

        let info: GhRepoInfo = response.json().await?;
        Ok(RepositoryStats {
            name: Some(info.name),
            description: info.description,
            language: info.language,
            stars: Some(info.stargazers_count),
            forks: Some(info.forks_count),
            open_issues: Some(info.open_issues_count),
            default_branch: Some(info.default_branch),
            last_updated: info.updated_at.as_deref().map(parse_timestamp),
        })
    }
}

#[derive(Deserialize)]
struct GhCommitEntry {
    sha: String,
    html_url: Option<String>,
    commit: GhCommitBody,
}

#[derive(Deserialize)]
struct GhCommitBody {
    message: String,
    author: Option<GhAuthor>,
}

#[derive(Deserialize)]
struct GhAuthor {
    name: String,
    date: String,
}

#[derive(Deserialize)]
struct GhCommitDetail {
    files: Option<Vec<GhFile>>,
}

#[derive(Deserialize)]
struct GhFile {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u32,
    #[serde(default)]
    deletions: u32,
}

#[derive(Deserialize)]
struct GhRepoInfo {
    name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    default_branch: String,
    updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let (owner, repo) = parse_repo_url("https://github.com/acme/storefront").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "storefront");
    }

    #[test]
    fn test_parse_url_with_git_suffix_and_slash() {
        let (_, repo) = parse_repo_url("https://github.com/acme/storefront.git/").unwrap();
        assert_eq!(repo, "storefront");
    }

    #[test]
    fn test_parse_ssh_url() {
        let (owner, repo) = parse_repo_url("git@github.com:acme/storefront.git").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "storefront");
    }

    #[test]
    fn test_malformed_url_is_invalid_repo_url() {
        let err = parse_repo_url("https://gitlab.com/acme/storefront").unwrap_err();
        assert!(matches!(err, ScoutError::InvalidRepoUrl(_)));
    }

    #[tokio::test]
    async fn test_missing_credential_yields_empty_result() {
        let adapter = GitHubAdapter::new(reqwest::Client::new(), None);
        let commits = adapter
            .list_recent_commits("https://github.com/acme/storefront", "main", 7, 10)
            .await
            .unwrap();
        assert!(commits.is_empty());
    }
}
