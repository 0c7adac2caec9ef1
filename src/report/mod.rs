// src/report/mod.rs
// Bug report record types, priority heuristic, and display formatting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a stored bug report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    New,
    InProgress,
    Resolved,
    Closed,
}

impl ReportStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(Self::New),
            "in_progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report priority, inferred from the report text at save time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized bug report as stored by the report store.
///
/// `report_id` is unique and immutable once assigned, format `BUG-<year>-<seq>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugReport {
    pub report_id: String,
    pub reporter: String,
    pub channel_id: Option<String>,
    pub summary: String,
    pub pages: String,
    pub steps: String,
    pub components: Option<String>,
    pub status: ReportStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BugReport {
    /// Full report text used by classification and priority heuristics
    pub fn full_text(&self) -> String {
        let mut text = format!("{} {}", self.summary, self.steps);
        if let Some(components) = &self.components {
            text.push(' ');
            text.push_str(components);
        }
        text.to_lowercase()
    }

    /// Render the report as the user-facing markdown block
    pub fn format_markdown(&self) -> String {
        format!(
            "**Bug Report {}**\n\n\
             **Summary:**\n{}\n\n\
             **Affected Pages:**\n{}\n\n\
             **Steps to Reproduce:**\n{}\n\n\
             **Templates/Components:**\n{}\n\n\
             **Priority:** {}",
            self.report_id,
            self.summary,
            self.pages,
            self.steps,
            self.components.as_deref().unwrap_or("N/A"),
            self.priority,
        )
    }
}

/// Partially assembled report held by an intake session.
///
/// Summary, pages and steps must all be present before the draft is
/// considered complete; components is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftReport {
    pub summary: Option<String>,
    pub pages: Option<String>,
    pub steps: Option<String>,
    pub components: Option<String>,
}

impl DraftReport {
    /// All required fields present?
    pub fn is_complete(&self) -> bool {
        self.summary.is_some() && self.pages.is_some() && self.steps.is_some()
    }

    /// Fill any blank field from `other`, never overwriting a filled one
    pub fn fill_missing(&mut self, other: &DraftReport) {
        if self.summary.is_none() {
            self.summary = other.summary.clone();
        }
        if self.pages.is_none() {
            self.pages = other.pages.clone();
        }
        if self.steps.is_none() {
            self.steps = other.steps.clone();
        }
        if self.components.is_none() {
            self.components = other.components.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.pages.is_none()
            && self.steps.is_none()
            && self.components.is_none()
    }
}

/// Keywords that push a report to high priority at save time
const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "critical", "urgent", "broken", "down", "error", "crash", "security",
];

/// Keywords that push a report to medium priority at save time
const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &["slow", "performance", "issue", "problem", "bug"];

/// Infer a priority from the draft's combined text
pub fn determine_priority(draft: &DraftReport) -> Priority {
    let text = [
        draft.summary.as_deref(),
        draft.pages.as_deref(),
        draft.steps.as_deref(),
        draft.components.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    if HIGH_PRIORITY_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        Priority::High
    } else if MEDIUM_PRIORITY_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(summary: &str) -> DraftReport {
        DraftReport {
            summary: Some(summary.to_string()),
            pages: Some("https://example.com".to_string()),
            steps: Some("open the page".to_string()),
            components: None,
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for s in ["new", "in_progress", "resolved", "closed"] {
            assert_eq!(ReportStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(ReportStatus::parse("bogus").is_none());
    }

    #[test]
    fn test_priority_high_on_crash() {
        assert_eq!(determine_priority(&draft("site crash on checkout")), Priority::High);
    }

    #[test]
    fn test_priority_medium_on_slow() {
        assert_eq!(determine_priority(&draft("page is slow")), Priority::Medium);
    }

    #[test]
    fn test_priority_low_otherwise() {
        assert_eq!(determine_priority(&draft("typo in footer")), Priority::Low);
    }

    #[test]
    fn test_draft_completeness() {
        let mut d = DraftReport::default();
        assert!(!d.is_complete());
        d.summary = Some("s".into());
        d.pages = Some("p".into());
        assert!(!d.is_complete());
        d.steps = Some("st".into());
        assert!(d.is_complete());
    }

    #[test]
    fn test_fill_missing_never_overwrites() {
        let mut d = DraftReport {
            summary: Some("original".into()),
            ..Default::default()
        };
        let extracted = DraftReport {
            summary: Some("replacement".into()),
            pages: Some("https://x.com".into()),
            ..Default::default()
        };
        d.fill_missing(&extracted);
        assert_eq!(d.summary.as_deref(), Some("original"));
        assert_eq!(d.pages.as_deref(), Some("https://x.com"));
    }
}
