// src/repo/azure.rs
// Azure DevOps REST adapter (API version 6.0)

use super::{parse_timestamp, short_sha, ChangeType, Commit, FileChange, RepoAdapter, RepositoryStats};
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

const API_VERSION: &str = "6.0";
const BASE_URL: &str = "https://dev.azure.com";

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Angle brackets appear when URLs are pasted from chat clients
    RE.get_or_init(|| {
        Regex::new(r"^<?https://dev\.azure\.com/([^/]+)/([^/]+)/_git/([^/>]+)>?$")
            .expect("azure url pattern is valid")
    })
}

/// Extract `(organization, project, repository)` from an Azure DevOps URL
pub fn parse_repo_url(url: &str) -> Result<(String, String, String)> {
    url_pattern()
        .captures(url.trim())
        .map(|caps| (caps[1].to_string(), caps[2].to_string(), caps[3].to_string()))
        .ok_or_else(|| ScoutError::InvalidRepoUrl(url.to_string()))
}

pub struct AzureDevOpsAdapter {
    http: reqwest::Client,
    token: Option<String>,
}

impl AzureDevOpsAdapter {
    pub fn new(http: reqwest::Client, token: Option<String>) -> Self {
        Self { http, token }
    }

    /// Fetch the file changes for one commit. Azure does not expose line
    /// counts through this endpoint, so additions/deletions are zero.
    async fn fetch_changes(
        &self,
        org: &str,
        project: &str,
        repo: &str,
        commit_id: &str,
        token: &str,
    ) -> Vec<FileChange> {
        let url = format!(
            "{BASE_URL}/{org}/{project}/_apis/git/repositories/{repo}/commits/{commit_id}/changes"
        );
        let response = match self
            .http
            .get(&url)
            .basic_auth("", Some(token))
            .query(&[("api-version", API_VERSION)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(commit_id, error = %e, "Skipping file details for commit");
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            return Vec::new();
        }
        let body: AzChanges = match response.json().await {
            Ok(b) => b,
            Err(_) => return Vec::new(),
        };
        body.changes
            .into_iter()
            .filter(|c| !c.item.is_folder)
            .map(|c| FileChange {
                path: c.item.path,
                change_type: match c.change_type.as_str() {
                    "add" => ChangeType::Add,
                    "delete" => ChangeType::Delete,
                    _ => ChangeType::Modify,
                },
                additions: 0,
                deletions: 0,
            })
            .collect()
    }
}

#[async_trait]
impl RepoAdapter for AzureDevOpsAdapter {
    async fn list_recent_commits(
        &self,
        url: &str,
        branch: &str,
        window_days: u32,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        let (org, project, repo) = parse_repo_url(url)?;
        let token = match &self.token {
            Some(t) => t.clone(),
            None => {
                debug!(%org, %repo, "No Azure DevOps credential configured, returning empty result");
                return Ok(Vec::new());
            }
        };

        let from_date = (Utc::now() - Duration::days(window_days as i64)).to_rfc3339();
        let top = limit.to_string();
        let list_url =
            format!("{BASE_URL}/{org}/{project}/_apis/git/repositories/{repo}/commits");
        let response = self
            .http
            .get(&list_url)
            .basic_auth("", Some(&token))
            .query(&[
                ("api-version", API_VERSION),
                ("searchCriteria.$top", top.as_str()),
                ("searchCriteria.itemVersion.version", branch),
                ("searchCriteria.fromDate", from_date.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%org, %repo, %status, "Azure DevOps commit listing failed");
            return Err(ScoutError::Provider(format!(
                "Azure DevOps returned {status} for {org}/{project}/{repo}"
            )));
        }

        let body: AzCommitList = response.json().await?;
        let mut commits = Vec::with_capacity(body.value.len());
        for entry in body.value.into_iter().take(limit) {
            let files = self
                .fetch_changes(&org, &project, &repo, &entry.commit_id, &token)
                .await;
            commits.push(Commit {
                sha: short_sha(&entry.commit_id),
                message: entry.comment,
                author: entry.author.name,
                timestamp: parse_timestamp(&entry.author.date),
                url: format!(
                    "{BASE_URL}/{org}/{project}/_git/{repo}/commit/{}",
                    entry.commit_id
                ),
                files,
            });
        }
        Ok(commits)
    }

    async fn repository_stats(&self, url: &str, _branch: &str) -> Result<RepositoryStats> {
        let (org, project, repo) = parse_repo_url(url)?;
        let token = match &self.token {
            Some(t) => t,
            None => return Ok(RepositoryStats::default()),
        };

        let info_url = format!("{BASE_URL}/{org}/{project}/_apis/git/repositories/{repo}");
        let response = self
            .http
            .get(&info_url)
            .basic_auth("", Some(token))
            .query(&[("api-version", API_VERSION)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(RepositoryStats::default());
        }

        let info: AzRepoInfo = response.json().await?;
        Ok(RepositoryStats {
            name: Some(info.name),
            default_branch: info
                .default_branch
                .map(|b| b.trim_start_matches("refs/heads/").to_string()),
            ..Default::default()
        })
    }
}

#[derive(Deserialize)]
struct AzCommitList {
    #[serde(default)]
    value: Vec<AzCommitEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzCommitEntry {
    commit_id: String,
    comment: String,
    author: AzAuthor,
}

#[derive(Deserialize)]
struct AzAuthor {
    name: String,
    date: String,
}

#[derive(Deserialize)]
struct AzChanges {
    #[serde(default)]
    changes: Vec<AzChange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzChange {
    item: AzItem,
    change_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzItem {
    path: String,
    #[serde(default)]
    is_folder: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzRepoInfo {
    name: String,
    default_branch: Option<String>,
}
