// src/classify/mod.rs
// Keyword-based issue classification and relevance filtering
//
// Classification is deliberately shallow: substring matching against static
// keyword tables, no real NLU. The tie-break order between equally scored
// categories is the declaration order of ISSUE_ORDER and is part of the
// observable contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of issue categories a report can classify into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Performance,
    Mobile,
    Security,
    Functionality,
    UiUx,
    Compatibility,
    Database,
    Caching,
    Loading,
    Responsive,
}

/// Tie-break ordering: the first category in this list reaching the maximum
/// score becomes the primary issue.
pub const ISSUE_ORDER: [IssueKind; 10] = [
    IssueKind::Performance,
    IssueKind::Mobile,
    IssueKind::Security,
    IssueKind::Functionality,
    IssueKind::UiUx,
    IssueKind::Compatibility,
    IssueKind::Database,
    IssueKind::Caching,
    IssueKind::Loading,
    IssueKind::Responsive,
];

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Mobile => "mobile",
            Self::Security => "security",
            Self::Functionality => "functionality",
            Self::UiUx => "ui_ux",
            Self::Compatibility => "compatibility",
            Self::Database => "database",
            Self::Caching => "caching",
            Self::Loading => "loading",
            Self::Responsive => "responsive",
        }
    }

    /// Keywords whose presence in report text votes for this category
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Performance => &[
                "slow", "performance", "speed", "loading", "load time", "slowdown", "lag",
                "delay", "timeout", "core web vitals", "lighthouse", "page speed",
                "optimization", "bottleneck",
            ],
            Self::Mobile => &[
                "mobile", "phone", "tablet", "responsive", "viewport", "mobile device",
                "mobile browser", "touch", "swipe", "mobile load", "mobile performance",
                "mobile slow",
            ],
            Self::Security => &[
                "security", "vulnerability", "hack", "breach", "malware", "virus", "attack",
                "unauthorized", "permission", "access", "login", "password", "authentication",
            ],
            Self::Functionality => &[
                "broken", "not working", "error", "crash", "bug", "issue", "fails",
                "doesn't work", "broken link", "404", "500 error", "white screen",
                "blank page",
            ],
            Self::UiUx => &[
                "design", "layout", "appearance", "looks", "visual", "styling", "css",
                "frontend", "user interface", "ui", "user experience", "ux", "design issue",
            ],
            Self::Compatibility => &[
                "browser", "chrome", "firefox", "safari", "edge", "compatibility",
                "works in", "doesn't work in", "version", "update", "upgrade",
            ],
            Self::Database => &[
                "database", "query", "sql", "mysql", "postgresql", "data", "content",
                "posts", "pages", "admin", "backend", "server", "api",
            ],
            Self::Caching => &[
                "cache", "caching", "cdn", "static", "assets", "images", "files",
                "resources", "minification",
            ],
            Self::Loading => &[
                "loading", "load", "load time", "page load", "initial load", "first load",
                "subsequent load", "loading speed", "load performance",
            ],
            Self::Responsive => &[
                "responsive", "responsive design", "breakpoint", "media query",
                "mobile first", "adaptive", "flexible", "fluid", "grid",
            ],
        }
    }

    /// Analysis areas investigated downstream for this category
    pub fn analysis_areas(&self) -> &'static [&'static str] {
        match self {
            Self::Performance => &[
                "performance_analysis", "database_queries", "caching_analysis",
                "asset_optimization", "server_response_times",
            ],
            Self::Mobile => &[
                "mobile_responsiveness", "viewport_analysis", "touch_interactions",
                "mobile_performance", "responsive_design",
            ],
            Self::Security => &[
                "security_vulnerabilities", "authentication_issues", "permission_checks",
                "input_validation", "secure_coding",
            ],
            Self::Functionality => &[
                "code_errors", "logic_issues", "api_endpoints", "database_connections",
                "error_handling",
            ],
            Self::UiUx => &[
                "css_analysis", "layout_issues", "design_consistency", "user_interface",
                "frontend_performance",
            ],
            Self::Compatibility => &[
                "browser_compatibility", "version_specific_issues", "cross_platform_testing",
                "feature_detection",
            ],
            Self::Database => &[
                "database_queries", "data_integrity", "connection_issues",
                "query_optimization",
            ],
            Self::Caching => &[
                "cache_configuration", "cache_invalidation", "static_asset_caching",
                "cdn_analysis",
            ],
            Self::Loading => &[
                "page_load_optimization", "resource_loading", "critical_rendering_path",
                "lazy_loading",
            ],
            Self::Responsive => &[
                "responsive_design", "media_queries", "breakpoint_analysis", "mobile_layout",
            ],
        }
    }

    /// Focused keywords used downstream to filter findings and recommendations
    pub fn focused_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Performance => &[
                "query_posts", "get_posts", "wp_query", "database", "cache", "optimization",
                "performance", "slow", "speed", "loading", "assets", "images", "scripts",
                "css", "minification",
            ],
            Self::Mobile => &[
                "mobile", "responsive", "viewport", "media query", "breakpoint", "touch",
                "swipe", "mobile device", "mobile browser", "height", "width", "layout",
                "cards", "mobile load",
            ],
            Self::Security => &[
                "eval", "exec", "system", "sql injection", "xss", "csrf", "authentication",
                "authorization", "permission", "input validation", "sanitization", "escaping",
            ],
            Self::Functionality => &[
                "error", "exception", "crash", "broken", "not working", "fails", "bug",
                "issue", "404", "500", "white screen",
            ],
            Self::UiUx => &[
                "css", "styling", "layout", "design", "appearance", "frontend",
                "user interface", "visual", "looks",
            ],
            Self::Compatibility => &[
                "browser", "chrome", "firefox", "safari", "edge", "version",
                "compatibility", "works in", "doesn't work in",
            ],
            Self::Database => &[
                "database", "query", "sql", "mysql", "connection", "data", "content",
                "posts", "pages", "admin",
            ],
            Self::Caching => &[
                "cache", "caching", "cdn", "static", "assets", "minification",
                "compression", "cache invalidation",
            ],
            Self::Loading => &[
                "loading", "load time", "page load", "initial load", "first load",
                "subsequent load", "loading speed",
            ],
            Self::Responsive => &[
                "responsive", "media query", "breakpoint", "mobile first", "adaptive",
                "flexible", "fluid", "grid", "viewport",
            ],
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a report's text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueClassification {
    pub primary_issue: IssueKind,
    /// Keyword matches over the primary category's table size, in [0, 1]
    pub confidence: f64,
    pub analysis_areas: Vec<String>,
    pub focused_keywords: Vec<String>,
    /// Every category with at least one keyword match (primary included)
    pub related_issues: Vec<IssueKind>,
}

fn category_score(text: &str, kind: IssueKind) -> usize {
    kind.keywords().iter().filter(|kw| text.contains(*kw)).count()
}

/// Classify report text into a primary issue category.
///
/// Deterministic: identical text always yields the identical classification.
/// Falls back to Functionality when nothing matches.
pub fn classify(text: &str) -> IssueClassification {
    let text = text.to_lowercase();

    let scores: Vec<(IssueKind, usize)> = ISSUE_ORDER
        .iter()
        .map(|&kind| (kind, category_score(&text, kind)))
        .collect();

    let max_score = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    let primary_issue = if max_score == 0 {
        IssueKind::Functionality
    } else {
        // First category reaching the max score wins the tie-break
        scores
            .iter()
            .find(|(_, s)| *s == max_score)
            .map(|(k, _)| *k)
            .unwrap_or(IssueKind::Functionality)
    };

    let table_len = primary_issue.keywords().len();
    let matches = category_score(&text, primary_issue);
    let confidence = if table_len == 0 {
        0.0
    } else {
        (matches as f64 / table_len as f64).clamp(0.0, 1.0)
    };

    let related_issues = scores
        .iter()
        .filter(|(_, s)| *s > 0)
        .map(|(k, _)| *k)
        .collect();

    IssueClassification {
        primary_issue,
        confidence,
        analysis_areas: primary_issue
            .analysis_areas()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        focused_keywords: primary_issue
            .focused_keywords()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        related_issues,
    }
}

/// Retain only items containing at least one focused keyword (case-insensitive
/// substring), truncated to the first 5 matches in original order.
pub fn filter_relevant(items: &[String], focused_keywords: &[String]) -> Vec<String> {
    const MAX_RELEVANT: usize = 5;
    items
        .iter()
        .filter(|item| {
            let lower = item.to_lowercase();
            focused_keywords.iter().any(|kw| lower.contains(kw.as_str()))
        })
        .take(MAX_RELEVANT)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_deterministic() {
        let text = "checkout page is slow on mobile";
        let a = classify(text);
        let b = classify(text);
        assert_eq!(a.primary_issue, b.primary_issue);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.related_issues, b.related_issues);
    }

    #[test]
    fn test_classify_mobile_performance_scenario() {
        // Report: {summary: "Mobile page loads slowly", steps: "open on phone"}
        let c = classify("Mobile page loads slowly open on phone");
        assert!(c.related_issues.contains(&IssueKind::Mobile));
        assert!(c.related_issues.contains(&IssueKind::Performance));
        assert!(c.confidence > 0.0);
        assert!(matches!(
            c.primary_issue,
            IssueKind::Mobile | IssueKind::Performance
        ));
    }

    #[test]
    fn test_classify_no_matches_falls_back_to_functionality() {
        let c = classify("zzz qqq xyzzy");
        assert_eq!(c.primary_issue, IssueKind::Functionality);
        assert_eq!(c.confidence, 0.0);
        assert!(c.related_issues.is_empty());
    }

    #[test]
    fn test_classify_tie_break_uses_fixed_order() {
        // "cache" votes once for Caching; "grid" votes once for Responsive.
        // Caching precedes Responsive in ISSUE_ORDER, so it wins the tie.
        let c = classify("cache grid");
        assert_eq!(c.primary_issue, IssueKind::Caching);
    }

    #[test]
    fn test_classify_security() {
        let c = classify("unauthorized login attempt, possible security breach");
        assert_eq!(c.primary_issue, IssueKind::Security);
        assert!(c.confidence > 0.0);
        assert!(!c.focused_keywords.is_empty());
        assert!(!c.analysis_areas.is_empty());
    }

    #[test]
    fn test_filter_relevant_keeps_matches_in_order() {
        let keywords: Vec<String> = vec!["cache".into(), "css".into()];
        let items: Vec<String> = vec![
            "Enable page caching".into(),
            "Rotate credentials".into(),
            "Minify CSS bundles".into(),
        ];
        let filtered = filter_relevant(&items, &keywords);
        assert_eq!(filtered, vec![
            "Enable page caching".to_string(),
            "Minify CSS bundles".to_string(),
        ]);
    }

    #[test]
    fn test_filter_relevant_truncates_to_five() {
        let keywords: Vec<String> = vec!["cache".into()];
        let items: Vec<String> = (0..8).map(|i| format!("cache tip {i}")).collect();
        let filtered = filter_relevant(&items, &keywords);
        assert_eq!(filtered.len(), 5);
        assert_eq!(filtered[0], "cache tip 0");
    }
}
