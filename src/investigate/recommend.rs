// src/investigate/recommend.rs
// Heuristic recommendations generated when no AI augmentation ran

use crate::classify::{IssueClassification, IssueKind};

/// Generic best-practice suggestions appended to every heuristic set
const GENERIC_RECOMMENDATIONS: &[&str] = &[
    "Review the commits listed under potential causes and test each change in isolation",
    "Check server and application logs around the time the issue was first reported",
    "Verify the issue reproduces in a clean environment before changing code",
];

/// Static keyword rules producing targeted recommendations from the report
/// text combined with the classified primary issue.
pub fn heuristic_recommendations(
    report_text: &str,
    classification: &IssueClassification,
) -> Vec<String> {
    let text = report_text.to_lowercase();
    let mut recommendations = Vec::new();

    if text.contains("mobile") && (text.contains("slow") || text.contains("performance")) {
        recommendations.push(
            "Profile the page on a real mobile device; prioritize image compression and \
             deferred JavaScript for mobile load paths"
                .to_string(),
        );
        recommendations.push(
            "Audit responsive breakpoints and viewport settings for layout thrash on \
             small screens"
                .to_string(),
        );
    }

    match classification.primary_issue {
        IssueKind::Performance | IssueKind::Loading => {
            recommendations.push(
                "Enable page caching and measure database query times on the slow pages"
                    .to_string(),
            );
            recommendations.push(
                "Minify and bundle CSS and JavaScript assets; serve images in modern formats"
                    .to_string(),
            );
        }
        IssueKind::Mobile | IssueKind::Responsive => {
            recommendations.push(
                "Test the affected pages across common mobile viewports and check recent \
                 CSS media query changes"
                    .to_string(),
            );
        }
        IssueKind::Security => {
            recommendations.push(
                "Rotate exposed credentials, update outdated components, and review recent \
                 commits touching authentication code"
                    .to_string(),
            );
        }
        IssueKind::Database => {
            recommendations.push(
                "Inspect slow query logs and verify indexes on the tables behind the \
                 affected pages"
                    .to_string(),
            );
        }
        IssueKind::Caching => {
            recommendations.push(
                "Purge the cache and CDN, then verify cache invalidation rules cover the \
                 affected assets"
                    .to_string(),
            );
        }
        IssueKind::UiUx => {
            recommendations.push(
                "Diff recent styling changes against the previous release and check the \
                 browser console for CSS or JavaScript errors"
                    .to_string(),
            );
        }
        IssueKind::Compatibility => {
            recommendations.push(
                "Reproduce across the major browsers and compare against the versions \
                 named in the report"
                    .to_string(),
            );
        }
        IssueKind::Functionality => {
            recommendations.push(
                "Walk the reproduction steps with debug logging enabled and bisect the \
                 recent commits touching the failing path"
                    .to_string(),
            );
        }
    }

    recommendations.extend(GENERIC_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    #[test]
    fn test_mobile_performance_rule_fires() {
        let classification = classify("mobile pages are slow");
        let recs = heuristic_recommendations("mobile pages are slow", &classification);
        assert!(recs.iter().any(|r| r.contains("mobile")));
        assert!(recs.len() > GENERIC_RECOMMENDATIONS.len());
    }

    #[test]
    fn test_generic_suggestions_always_present() {
        let classification = classify("xyzzy");
        let recs = heuristic_recommendations("xyzzy", &classification);
        for generic in GENERIC_RECOMMENDATIONS {
            assert!(recs.iter().any(|r| r == generic));
        }
    }
}
