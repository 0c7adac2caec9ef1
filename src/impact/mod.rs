// src/impact/mod.rs
// Commit impact scoring against a bug keyword set
//
// Pure functions only: identical inputs always produce identical scores, and
// a commit with no file-change data degrades to message-only matching.

use crate::config::Tunables;
use crate::repo::{ChangeType, Commit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Coarse relevance bucket for a scored commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactTier {
    High,
    Medium,
    Low,
}

/// Relevance of one commit to the investigated keyword set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactScore {
    /// Distinct keywords found in the commit message, in keyword-set order
    pub keyword_matches: Vec<String>,
    pub file_impact_score: u32,
    pub impact_score: u32,
    pub tier: ImpactTier,
}

/// A commit together with its impact score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCommit {
    pub commit: Commit,
    pub score: ImpactScore,
}

/// Per-repository aggregation of scored commits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoImpact {
    pub high: Vec<ScoredCommit>,
    pub medium: Vec<ScoredCommit>,
    pub low: Vec<ScoredCommit>,
    /// Union of changed paths across all commits, sorted
    pub affected_files: Vec<String>,
    /// Sum of file-change counts across all commits
    pub total_changes: usize,
}

impl RepoImpact {
    pub fn commit_count(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }
}

/// File extension classes that each add one point when represented in a commit
const FRONTEND_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".css", ".scss"];
const BACKEND_EXTENSIONS: &[&str] = &[".php", ".py", ".java", ".rb"];
const TEMPLATE_EXTENSIONS: &[&str] = &[".html", ".htm", ".xml"];

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| path.ends_with(ext))
}

/// Score a single commit against the keyword set.
///
/// `keyword_matches` counts distinct keywords appearing case-insensitively in
/// the message. File impact adds +1 per represented file class (frontend /
/// backend / template, once per class), +2 per filename containing a keyword,
/// and +2 per deleted file. Tier thresholds come from `Tunables`.
pub fn score_commit(commit: &Commit, keywords: &[String], tunables: &Tunables) -> ImpactScore {
    let message = commit.message.to_lowercase();
    let keyword_matches: Vec<String> = keywords
        .iter()
        .filter(|kw| message.contains(kw.to_lowercase().as_str()))
        .cloned()
        .collect();

    let mut file_impact_score = 0u32;
    let mut seen_frontend = false;
    let mut seen_backend = false;
    let mut seen_template = false;

    for file in &commit.files {
        let path = file.path.to_lowercase();

        if !seen_frontend && has_extension(&path, FRONTEND_EXTENSIONS) {
            file_impact_score += 1;
            seen_frontend = true;
        }
        if !seen_backend && has_extension(&path, BACKEND_EXTENSIONS) {
            file_impact_score += 1;
            seen_backend = true;
        }
        if !seen_template && has_extension(&path, TEMPLATE_EXTENSIONS) {
            file_impact_score += 1;
            seen_template = true;
        }

        if keywords.iter().any(|kw| path.contains(kw.to_lowercase().as_str())) {
            file_impact_score += 2;
        }

        if file.change_type == ChangeType::Delete {
            file_impact_score += 2;
        }
    }

    let impact_score = keyword_matches.len() as u32 + file_impact_score;
    let tier = if impact_score >= tunables.high_threshold {
        ImpactTier::High
    } else if impact_score >= tunables.medium_threshold {
        ImpactTier::Medium
    } else {
        ImpactTier::Low
    };

    ImpactScore {
        keyword_matches,
        file_impact_score,
        impact_score,
        tier,
    }
}

/// Score every commit and partition into tier buckets, preserving commit order
/// inside each bucket.
pub fn aggregate(commits: &[Commit], keywords: &[String], tunables: &Tunables) -> RepoImpact {
    let mut impact = RepoImpact::default();
    let mut affected = BTreeSet::new();

    for commit in commits {
        let score = score_commit(commit, keywords, tunables);

        for file in &commit.files {
            affected.insert(file.path.clone());
        }
        impact.total_changes += commit.files.len();

        let scored = ScoredCommit {
            commit: commit.clone(),
            score,
        };
        match scored.score.tier {
            ImpactTier::High => impact.high.push(scored),
            ImpactTier::Medium => impact.medium.push(scored),
            ImpactTier::Low => impact.low.push(scored),
        }
    }

    impact.affected_files = affected.into_iter().collect();
    impact
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::FileChange;
    use chrono::Utc;

    fn commit(message: &str, files: Vec<FileChange>) -> Commit {
        Commit {
            sha: "abc12345".to_string(),
            message: message.to_string(),
            author: "dev".to_string(),
            timestamp: Utc::now(),
            url: String::new(),
            files,
        }
    }

    fn change(path: &str, change_type: ChangeType) -> FileChange {
        FileChange {
            path: path.to_string(),
            change_type,
            additions: 1,
            deletions: 0,
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_message_only_scoring_when_no_files() {
        let c = commit("fix mobile layout bug", vec![]);
        let score = score_commit(&c, &kw(&["mobile", "layout", "cache"]), &Tunables::default());
        assert_eq!(score.keyword_matches, vec!["mobile", "layout"]);
        assert_eq!(score.file_impact_score, 0);
        assert_eq!(score.impact_score, 2);
        assert_eq!(score.tier, ImpactTier::Medium);
    }

    #[test]
    fn test_file_class_counted_once_per_commit() {
        let c = commit(
            "update styles",
            vec![
                change("a.css", ChangeType::Modify),
                change("b.scss", ChangeType::Modify),
                change("index.php", ChangeType::Modify),
            ],
        );
        let score = score_commit(&c, &kw(&["cache"]), &Tunables::default());
        // frontend once + backend once, despite two frontend files
        assert_eq!(score.file_impact_score, 2);
    }

    #[test]
    fn test_keyword_in_filename_and_delete_bonus() {
        let c = commit(
            "cleanup",
            vec![change("src/cache-manager.py", ChangeType::Delete)],
        );
        let score = score_commit(&c, &kw(&["cache"]), &Tunables::default());
        // backend class (+1) + keyword filename (+2) + delete (+2)
        assert_eq!(score.file_impact_score, 5);
        assert_eq!(score.tier, ImpactTier::High);
    }

    #[test]
    fn test_score_monotone_in_keywords_and_deletes() {
        let tunables = Tunables::default();
        let base = commit("fix slow query", vec![change("db.py", ChangeType::Modify)]);
        let base_score = score_commit(&base, &kw(&["slow"]), &tunables).impact_score;

        // Adding a matching keyword never decreases the score
        let more_kw = score_commit(&base, &kw(&["slow", "query"]), &tunables).impact_score;
        assert!(more_kw >= base_score);

        // Adding a deleted file never decreases the score
        let mut with_delete = base.clone();
        with_delete.files.push(change("old.py", ChangeType::Delete));
        let del_score = score_commit(&with_delete, &kw(&["slow"]), &tunables).impact_score;
        assert!(del_score >= base_score);
    }

    #[test]
    fn test_aggregate_buckets_and_affected_files() {
        let tunables = Tunables::default();
        let commits = vec![
            commit("chore: bump version", vec![]),
            commit(
                "fix cache invalidation on mobile",
                vec![change("cache.js", ChangeType::Delete)],
            ),
        ];
        let impact = aggregate(&commits, &kw(&["cache", "mobile"]), &tunables);
        assert_eq!(impact.commit_count(), 2);
        assert_eq!(impact.low.len(), 1);
        assert_eq!(impact.high.len(), 1);
        assert_eq!(impact.affected_files, vec!["cache.js".to_string()]);
        assert_eq!(impact.total_changes, 1);
    }

    #[test]
    fn test_zero_commits_yield_empty_buckets() {
        let impact = aggregate(&[], &kw(&["cache"]), &Tunables::default());
        assert_eq!(impact.commit_count(), 0);
        assert!(impact.affected_files.is_empty());
        assert_eq!(impact.total_changes, 0);
    }
}
