// src/repo/bitbucket.rs
// Bitbucket Cloud API 2.0 adapter

use super::{parse_timestamp, short_sha, ChangeType, Commit, FileChange, RepoAdapter, RepositoryStats};
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

const API_BASE: &str = "https://api.bitbucket.org/2.0";

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https://bitbucket\.org/([^/]+)/([^/]+?)(?:\.git)?/?$")
            .expect("bitbucket url pattern is valid")
    })
}

/// Extract `(workspace, repo_slug)` from a Bitbucket URL
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    url_pattern()
        .captures(url.trim())
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .ok_or_else(|| ScoutError::InvalidRepoUrl(url.to_string()))
}

pub struct BitbucketAdapter {
    http: reqwest::Client,
    token: Option<String>,
}

impl BitbucketAdapter {
    pub fn new(http: reqwest::Client, token: Option<String>) -> Self {
        Self { http, token }
    }

    /// Per-file diffstat for one commit, best-effort
    async fn fetch_diffstat(
        &self,
        workspace: &str,
        slug: &str,
        hash: &str,
        token: &str,
    ) -> Vec<FileChange> {
        let url = format!("{API_BASE}/repositories/{workspace}/{slug}/diffstat/{hash}");
        let response = match self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("pagelen", "50")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(hash, error = %e, "Skipping diffstat for commit");
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            return Vec::new();
        }
        let body: BbPage<BbDiffstat> = match response.json().await {
            Ok(b) => b,
            Err(_) => return Vec::new(),
        };
        body.values
            .into_iter()
            .filter_map(|d| {
                let path = d
                    .new
                    .map(|p| p.path)
                    .or(d.old.map(|p| p.path))?;
                Some(FileChange {
                    path,
                    change_type: match d.status.as_str() {
                        "added" => ChangeType::Add,
                        "removed" => ChangeType::Delete,
                        _ => ChangeType::Modify,
                    },
                    additions: d.lines_added,
                    deletions: d.lines_removed,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RepoAdapter for BitbucketAdapter {
    async fn list_recent_commits(
        &self,
        url: &str,
        branch: &str,
        window_days: u32,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        let (workspace, slug) = parse_repo_url(url)?;
        let token = match &self.token {
            Some(t) => t.clone(),
            None => {
                debug!(%workspace, %slug, "No Bitbucket credential configured, returning empty result");
                return Ok(Vec::new());
            }
        };

        let list_url = format!("{API_BASE}/repositories/{workspace}/{slug}/commits/{branch}");
        let response = self
            .http
            .get(&list_url)
            .bearer_auth(&token)
            .query(&[("pagelen", &limit.to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%workspace, %slug, %status, "Bitbucket commit listing failed");
            return Err(ScoutError::Provider(format!(
                "Bitbucket returned {status} for {workspace}/{slug}"
            )));
        }

        // The commits endpoint has no date filter; apply the window here
        let cutoff = Utc::now() - Duration::days(window_days as i64);
        let body: BbPage<BbCommit> = response.json().await?;
        let mut commits = Vec::new();
        for entry in body.values.into_iter().take(limit) {
            let timestamp = parse_timestamp(&entry.date);
            if timestamp < cutoff {
                continue;
            }
            let files = self
                .fetch_diffstat(&workspace, &slug, &entry.hash, &token)
                .await;
            commits.push(Commit {
                sha: short_sha(&entry.hash),
                message: entry.message,
                author: entry
                    .author
                    .and_then(|a| a.user.map(|u| u.display_name).or(Some(a.raw)))
                    .unwrap_or_default(),
                timestamp,
                url: entry
                    .links
                    .and_then(|l| l.html)
                    .map(|h| h.href)
                    .unwrap_or_default(),
                files,
            });
        }
        Ok(commits)
    }

    async fn repository_stats(&self, url: &str, _branch: &str) -> Result<RepositoryStats> {
        let (workspace, slug) = parse_repo_url(url)?;
        let token = match &self.token {
            Some(t) => t,
            None => return Ok(RepositoryStats::default()),
        };

        let response = self
            .http
            .get(format!("{API_BASE}/repositories/{workspace}/{slug}"))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(RepositoryStats::default());
        }

        let info: BbRepoInfo = response.json().await?;
        Ok(RepositoryStats {
            name: Some(info.name),
            description: info.description,
            language: info.language,
            default_branch: info.mainbranch.map(|b| b.name),
            last_updated: info.updated_on.as_deref().map(parse_timestamp),
            ..Default::default()
        })
    }
}

#[derive(Deserialize)]
struct BbPage<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
}

#[derive(Deserialize)]
struct BbCommit {
    hash: String,
    message: String,
    date: String,
    author: Option<BbAuthor>,
    links: Option<BbLinks>,
}

#[derive(Deserialize)]
struct BbAuthor {
    raw: String,
    user: Option<BbUser>,
}

#[derive(Deserialize)]
struct BbUser {
    display_name: String,
}

#[derive(Deserialize)]
struct BbLinks {
    html: Option<BbHref>,
}

#[derive(Deserialize)]
struct BbHref {
    href: String,
}

#[derive(Deserialize)]
struct BbDiffstat {
    status: String,
    #[serde(default)]
    lines_added: u32,
    #[serde(default)]
    lines_removed: u32,
    new: Option<BbPath>,
    old: Option<BbPath>,
}

#[derive(Deserialize)]
struct BbPath {
    path: String,
}

#[derive(Deserialize)]
struct BbRepoInfo {
    name: String,
    description: Option<String>,
    language: Option<String>,
    mainbranch: Option<BbBranch>,
    updated_on: Option<String>,
}

#[derive(Deserialize)]
struct BbBranch {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bitbucket_url() {
        let (workspace, slug) = parse_repo_url("https://bitbucket.org/acme/storefront").unwrap();
        assert_eq!(workspace, "acme");
        assert_eq!(slug, "storefront");
    }

    #[test]
    fn test_parse_bitbucket_url_with_git_suffix() {
        let (_, slug) = parse_repo_url("https://bitbucket.org/acme/storefront.git").unwrap();
        assert_eq!(slug, "storefront");
    }

    #[test]
    fn test_malformed_url_is_invalid_repo_url() {
        let err = parse_repo_url("https://github.com/acme/storefront").unwrap_err();
        assert!(matches!(err, ScoutError::InvalidRepoUrl(_)));
    }

    #[tokio::test]
    async fn test_missing_credential_yields_empty_result() {
        let adapter = BitbucketAdapter::new(reqwest::Client::new(), None);
        let commits = adapter
            .list_recent_commits("https://bitbucket.org/acme/storefront", "main", 7, 10)
            .await
            .unwrap();
        assert!(commits.is_empty());
    }
}
