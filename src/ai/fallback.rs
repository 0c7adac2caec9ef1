// src/ai/fallback.rs
// Static fallback payloads used when the AI capability is unavailable

use super::{AiAssessment, AnalysisKind};

/// Canned assessment keyed by analysis kind. Returned whenever the AI call
/// fails for any reason (quota, timeout, non-2xx, malformed response) so the
/// investigation always carries an augmentation section when one was
/// requested.
pub fn fallback_assessment(kind: AnalysisKind) -> AiAssessment {
    let (analysis, recommendations) = match kind {
        AnalysisKind::SiteCore => (
            "Core analysis: check platform version compatibility, review \
             configuration files, and verify database connectivity. Recent \
             commits may indicate updates that could affect site behavior.",
            vec![
                "Verify the platform version is up to date",
                "Check configuration files for performance settings",
                "Review rewrite/caching rules",
                "Monitor database performance",
            ],
        ),
        AnalysisKind::Theme => (
            "Theme analysis: review theme files for custom CSS conflicts, \
             JavaScript errors, and mobile responsiveness issues. Check \
             template hierarchy and customizer settings.",
            vec![
                "Test the theme on mobile devices",
                "Review custom CSS for conflicts",
                "Check the JavaScript console for errors",
                "Verify theme compatibility with the platform version",
            ],
        ),
        AnalysisKind::Performance => (
            "Performance analysis: focus on Core Web Vitals (LCP, FID, CLS), \
             database optimization, asset loading, and mobile performance. \
             Check for large images and unoptimized resources.",
            vec![
                "Optimize images and use WebP format",
                "Implement caching strategies",
                "Minimize CSS and JavaScript files",
                "Use a CDN for static assets",
            ],
        ),
        AnalysisKind::Security => (
            "Security analysis: check file permissions, look for outdated \
             components, scan for malicious code, and verify authentication \
             configurations.",
            vec![
                "Update the platform core, themes, and plugins",
                "Review file permissions (755 for directories, 644 for files)",
                "Implement strong authentication",
                "Run regular security scans",
            ],
        ),
    };

    AiAssessment {
        analysis: analysis.to_string(),
        recommendations: recommendations.into_iter().map(String::from).collect(),
        risk_assessment: vec![
            (
                "Security Risk".to_string(),
                "Medium - Review security analysis for specific issues".to_string(),
            ),
            (
                "Performance Risk".to_string(),
                "High - Performance issues may be present in recent changes".to_string(),
            ),
            (
                "Stability Risk".to_string(),
                "Medium - Recent changes may affect stability".to_string(),
            ),
            (
                "Maintenance Risk".to_string(),
                "Low - Standard maintenance required".to_string(),
            ),
        ],
        degraded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_fallback_content() {
        for kind in [
            AnalysisKind::SiteCore,
            AnalysisKind::Theme,
            AnalysisKind::Performance,
            AnalysisKind::Security,
        ] {
            let assessment = fallback_assessment(kind);
            assert!(!assessment.analysis.is_empty());
            assert!(!assessment.recommendations.is_empty());
            assert!(assessment.degraded);
        }
    }
}
