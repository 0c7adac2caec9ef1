// src/investigate/mod.rs
// Investigation pipeline: classify a report, pull recent commits from every
// configured repository in parallel, score them, and assemble findings.

mod recommend;

pub use recommend::heuristic_recommendations;

use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::{is_recognized_site_type, AiAnalyzer, AnalysisKind};
use crate::classify::{classify, filter_relevant, IssueClassification};
use crate::config::Tunables;
use crate::impact::{aggregate, RepoImpact, ScoredCommit};
use crate::repo::{adapter_for, Commit, RepoAdapter, RepositoryConfig};
use crate::report::BugReport;

/// Keywords folded into every investigation regardless of issue category
const GENERIC_BUG_KEYWORDS: &[&str] = &[
    "fix", "bug", "error", "issue", "problem", "broken", "crash", "fail",
];

/// Outcome of fetching and scoring one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Analyzed,
    Error,
    Pending,
}

/// Per-repository slice of an investigation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoAnalysis {
    pub repo_name: String,
    pub repo_url: String,
    pub status: AnalysisStatus,
    /// Populated only when `status` is `Error`
    pub error: Option<String>,
    pub impact: RepoImpact,
    /// Raw commits in fetch order, newest first
    pub commits: Vec<Commit>,
}

/// Complete result of one investigation run. Always rebuilt from live data,
/// never cached or persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationResult {
    pub report_id: String,
    pub classification: IssueClassification,
    pub repos: Vec<RepoAnalysis>,
    /// First N commits per repository, in repository-config order
    pub recent_changes: Vec<ScoredCommit>,
    /// High-tier commits across all repositories, in repository-config order
    pub potential_causes: Vec<ScoredCommit>,
    /// Union of changed file paths across all repositories, sorted
    pub affected_components: Vec<String>,
    pub findings: Vec<String>,
    pub focused_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub focused_recommendations: Vec<String>,
    /// Present when AI augmentation ran (live or degraded)
    pub ai_analysis: Option<String>,
    /// Named risk levels from the augmentation, empty when it did not run
    pub risk_assessment: Vec<(String, String)>,
    pub ai_degraded: bool,
}

/// Runs investigations against a set of repositories.
pub struct Investigator {
    http: reqwest::Client,
    tunables: Tunables,
    ai: Option<AiAnalyzer>,
}

impl Investigator {
    pub fn new(http: reqwest::Client, tunables: Tunables) -> Self {
        Self {
            http,
            tunables,
            ai: None,
        }
    }

    pub fn with_ai(mut self, ai: AiAnalyzer) -> Self {
        self.ai = Some(ai);
        self
    }

    /// Investigate using the real provider adapters.
    pub async fn investigate(
        &self,
        report: &BugReport,
        repos: &[RepositoryConfig],
    ) -> InvestigationResult {
        let http = self.http.clone();
        self.investigate_with(report, repos, move |repo| {
            adapter_for(repo.provider, &http, repo.resolve_credential())
        })
        .await
    }

    /// Investigate with a caller-supplied adapter factory. The factory runs
    /// once per repository; tests inject stubs here.
    pub async fn investigate_with<F>(
        &self,
        report: &BugReport,
        repos: &[RepositoryConfig],
        make_adapter: F,
    ) -> InvestigationResult
    where
        F: Fn(&RepositoryConfig) -> Box<dyn RepoAdapter>,
    {
        let text = report.full_text();
        let classification = classify(&text);
        info!(
            report_id = %report.report_id,
            primary = %classification.primary_issue,
            repos = repos.len(),
            "Starting investigation"
        );

        let keywords = build_keyword_set(&classification);

        let fetches = repos.iter().map(|repo| {
            let adapter = make_adapter(repo);
            self.fetch_repo(repo, adapter, &keywords)
        });
        // join_all preserves input order, so results line up with repos
        let repo_analyses: Vec<RepoAnalysis> = join_all(fetches).await;

        let (recent_changes, potential_causes, affected_components) =
            merge_analyses(&repo_analyses, self.tunables.recent_per_repo);

        let findings = build_findings(&classification, &repo_analyses, &potential_causes);

        let mut recommendations = Vec::new();
        let mut ai_analysis = None;
        let mut risk_assessment = Vec::new();
        let mut ai_degraded = false;

        if let Some(ai) = &self.ai {
            if let Some(site_type) = recognized_site_type(repos) {
                let kind = AnalysisKind::for_issue(classification.primary_issue);
                let top: Vec<ScoredCommit> =
                    potential_causes.iter().take(5).cloned().collect();
                let assessment = ai.analyze(report, &top, &site_type, kind).await;
                ai_degraded = assessment.degraded;
                ai_analysis = Some(assessment.analysis);
                recommendations = assessment.recommendations;
                risk_assessment = assessment.risk_assessment;
            } else {
                debug!("No repository carries a recognized site type, skipping AI augmentation");
            }
        }

        if recommendations.is_empty() {
            recommendations = heuristic_recommendations(&text, &classification);
        }

        let focused_findings = filter_relevant(&findings, &classification.focused_keywords);
        let focused_recommendations =
            filter_relevant(&recommendations, &classification.focused_keywords);

        InvestigationResult {
            report_id: report.report_id.clone(),
            classification,
            repos: repo_analyses,
            recent_changes,
            potential_causes,
            affected_components,
            findings,
            focused_findings,
            recommendations,
            focused_recommendations,
            ai_analysis,
            risk_assessment,
            ai_degraded,
        }
    }

    /// Fetch and score one repository. Every failure, including timeout,
    /// collapses to an `Error` status for that repository alone.
    async fn fetch_repo(
        &self,
        repo: &RepositoryConfig,
        adapter: Box<dyn RepoAdapter>,
        keywords: &[String],
    ) -> RepoAnalysis {
        let timeout = Duration::from_secs(self.tunables.call_timeout_secs);
        let fetch = adapter.list_recent_commits(
            &repo.url,
            &repo.branch,
            self.tunables.window_days,
            self.tunables.commit_limit,
        );

        let outcome = match tokio::time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(crate::error::ScoutError::Provider(format!(
                "timed out after {}s",
                self.tunables.call_timeout_secs
            ))),
        };

        match outcome {
            Ok(commits) => {
                let impact = aggregate(&commits, keywords, &self.tunables);
                debug!(
                    repo = %repo.name,
                    commits = commits.len(),
                    high = impact.high.len(),
                    "Repository analyzed"
                );
                RepoAnalysis {
                    repo_name: repo.name.clone(),
                    repo_url: repo.url.clone(),
                    status: AnalysisStatus::Analyzed,
                    error: None,
                    impact,
                    commits,
                }
            }
            Err(e) => {
                warn!(repo = %repo.name, error = %e, "Repository analysis failed");
                RepoAnalysis {
                    repo_name: repo.name.clone(),
                    repo_url: repo.url.clone(),
                    status: AnalysisStatus::Error,
                    error: Some(e.to_string()),
                    impact: RepoImpact::default(),
                    commits: Vec::new(),
                }
            }
        }
    }
}

/// Focused keywords for the primary issue plus the generic bug vocabulary,
/// deduplicated, focused terms first.
fn build_keyword_set(classification: &IssueClassification) -> Vec<String> {
    let mut keywords = classification.focused_keywords.clone();
    for kw in GENERIC_BUG_KEYWORDS {
        if !keywords.iter().any(|k| k == kw) {
            keywords.push(kw.to_string());
        }
    }
    keywords
}

fn recognized_site_type(repos: &[RepositoryConfig]) -> Option<String> {
    repos.iter().find_map(|r| {
        r.site_type
            .as_deref()
            .filter(|s| is_recognized_site_type(s))
            .map(|s| s.to_lowercase())
    })
}

/// Merge per-repository results in config order.
fn merge_analyses(
    analyses: &[RepoAnalysis],
    recent_per_repo: usize,
) -> (Vec<ScoredCommit>, Vec<ScoredCommit>, Vec<String>) {
    let mut recent = Vec::new();
    let mut causes = Vec::new();
    let mut components = std::collections::BTreeSet::new();

    for analysis in analyses {
        let mut scored: Vec<&ScoredCommit> = analysis
            .impact
            .high
            .iter()
            .chain(analysis.impact.medium.iter())
            .chain(analysis.impact.low.iter())
            .collect();
        // restore fetch order (newest first) for the recent-changes slice
        scored.sort_by(|a, b| b.commit.timestamp.cmp(&a.commit.timestamp));
        recent.extend(scored.into_iter().take(recent_per_repo).cloned());

        causes.extend(analysis.impact.high.iter().cloned());
        components.extend(analysis.impact.affected_files.iter().cloned());
    }

    (recent, causes, components.into_iter().collect())
}

/// Human-readable findings assembled from the classification and scored data.
fn build_findings(
    classification: &IssueClassification,
    analyses: &[RepoAnalysis],
    potential_causes: &[ScoredCommit],
) -> Vec<String> {
    let mut findings = Vec::new();

    findings.push(format!(
        "Issue classified as {} (confidence {:.0}%)",
        classification.primary_issue,
        classification.confidence * 100.0
    ));

    for area in &classification.analysis_areas {
        findings.push(format!("Suggested analysis area: {}", area));
    }

    let analyzed = analyses
        .iter()
        .filter(|a| a.status == AnalysisStatus::Analyzed)
        .count();
    let failed = analyses.len() - analyzed;
    if failed > 0 {
        findings.push(format!(
            "{} of {} repositories could not be analyzed",
            failed,
            analyses.len()
        ));
    }

    for cause in potential_causes {
        let matched = if cause.score.keyword_matches.is_empty() {
            String::new()
        } else {
            format!(" (keywords: {})", cause.score.keyword_matches.join(", "))
        };
        findings.push(format!(
            "High-impact commit {} by {}: {}{}",
            cause.commit.sha,
            cause.commit.author,
            first_line(&cause.commit.message),
            matched
        ));
    }

    if potential_causes.is_empty() && analyzed > 0 {
        findings.push(
            "No recent commits scored as likely causes; the issue may predate the \
             investigation window"
                .to_string(),
        );
    }

    findings
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

/// Render an investigation result as the user-facing markdown summary.
pub fn summary_markdown(result: &InvestigationResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "**Investigation: {}**\n\n**Primary issue:** {} ({:.0}% confidence)\n",
        result.report_id,
        result.classification.primary_issue,
        result.classification.confidence * 100.0
    ));

    if !result.classification.related_issues.is_empty() {
        let related: Vec<String> = result
            .classification
            .related_issues
            .iter()
            .map(|k| k.to_string())
            .collect();
        out.push_str(&format!("**Related areas:** {}\n", related.join(", ")));
    }

    out.push_str("\n**Repositories:**\n");
    for repo in &result.repos {
        match repo.status {
            AnalysisStatus::Analyzed => out.push_str(&format!(
                "- {}: {} commits, {} high impact\n",
                repo.repo_name,
                repo.commits.len(),
                repo.impact.high.len()
            )),
            AnalysisStatus::Error => out.push_str(&format!(
                "- {}: failed: {}\n",
                repo.repo_name,
                repo.error.as_deref().unwrap_or("unknown error")
            )),
            AnalysisStatus::Pending => {
                out.push_str(&format!("- {}: pending\n", repo.repo_name))
            }
        }
    }

    if !result.potential_causes.is_empty() {
        out.push_str("\n**Potential causes:**\n");
        for cause in &result.potential_causes {
            out.push_str(&format!(
                "- `{}` {} ({})\n",
                cause.commit.sha,
                first_line(&cause.commit.message),
                cause.commit.author
            ));
        }
    }

    let findings = if result.focused_findings.is_empty() {
        &result.findings
    } else {
        &result.focused_findings
    };
    out.push_str("\n**Findings:**\n");
    for finding in findings {
        out.push_str(&format!("- {}\n", finding));
    }

    let recs = if result.focused_recommendations.is_empty() {
        &result.recommendations
    } else {
        &result.focused_recommendations
    };
    out.push_str("\n**Recommendations:**\n");
    for rec in recs {
        out.push_str(&format!("- {}\n", rec));
    }

    if let Some(analysis) = &result.ai_analysis {
        out.push_str("\n**AI analysis");
        if result.ai_degraded {
            out.push_str(" (degraded)");
        }
        out.push_str(":**\n");
        out.push_str(analysis);
        out.push('\n');
    }

    if !result.risk_assessment.is_empty() {
        out.push_str("\n**Risk assessment:**\n");
        for (name, level) in &result.risk_assessment {
            out.push_str(&format!("- {}: {}\n", name, level));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    #[test]
    fn test_keyword_set_includes_generic_vocabulary() {
        let classification = classify("checkout page is slow");
        let keywords = build_keyword_set(&classification);
        assert!(keywords.iter().any(|k| k == "fix"));
        assert!(keywords.iter().any(|k| k == "bug"));
        // focused keywords come first
        assert_eq!(keywords[0], classification.focused_keywords[0]);
    }

    #[test]
    fn test_keyword_set_deduplicates() {
        let classification = classify("random unmatched text");
        let keywords = build_keyword_set(&classification);
        let mut seen = std::collections::HashSet::new();
        for kw in &keywords {
            assert!(seen.insert(kw.clone()), "duplicate keyword {}", kw);
        }
    }

    #[test]
    fn test_findings_note_failed_repos() {
        let classification = classify("site is slow");
        let analyses = vec![
            RepoAnalysis {
                repo_name: "frontend".to_string(),
                repo_url: "https://github.com/acme/frontend".to_string(),
                status: AnalysisStatus::Analyzed,
                error: None,
                impact: RepoImpact::default(),
                commits: Vec::new(),
            },
            RepoAnalysis {
                repo_name: "backend".to_string(),
                repo_url: "https://github.com/acme/backend".to_string(),
                status: AnalysisStatus::Error,
                error: Some("timed out after 10s".to_string()),
                impact: RepoImpact::default(),
                commits: Vec::new(),
            },
        ];
        let findings = build_findings(&classification, &analyses, &[]);
        assert!(findings
            .iter()
            .any(|f| f.contains("1 of 2 repositories")));
        assert!(findings.iter().any(|f| f.contains("predate")));
    }

    #[test]
    fn test_summary_renders_risk_assessment() {
        let assessment = crate::ai::fallback_assessment(AnalysisKind::Performance);
        assert!(!assessment.risk_assessment.is_empty());

        let result = InvestigationResult {
            report_id: "BUG-2026-004".to_string(),
            classification: classify("pages load very slowly"),
            repos: Vec::new(),
            recent_changes: Vec::new(),
            potential_causes: Vec::new(),
            affected_components: Vec::new(),
            findings: Vec::new(),
            focused_findings: Vec::new(),
            recommendations: assessment.recommendations.clone(),
            focused_recommendations: Vec::new(),
            ai_analysis: Some(assessment.analysis.clone()),
            risk_assessment: assessment.risk_assessment.clone(),
            ai_degraded: assessment.degraded,
        };

        let md = summary_markdown(&result);
        assert!(md.contains("**Risk assessment:**"));
        for (name, level) in &assessment.risk_assessment {
            assert!(md.contains(name.as_str()), "missing risk entry {}", name);
            assert!(md.contains(level.as_str()));
        }
        assert!(md.contains("(degraded)"));
    }
}
