// src/ai/mod.rs
// Optional AI augmentation over an OpenAI-compatible chat completions API
//
// Failure discipline: every failure mode (quota, timeout, non-2xx, malformed
// body) degrades to the static fallback payload. `analyze` is infallible by
// construction so the orchestrator never has to handle an AI error.

mod fallback;

pub use fallback::fallback_assessment;

use crate::classify::IssueKind;
use crate::error::{Result, ScoutError};
use crate::impact::ScoredCommit;
use crate::report::BugReport;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use tracing::{debug, info, warn};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Hosting platforms the augmentation path knows how to reason about
const RECOGNIZED_SITE_TYPES: &[&str] = &[
    "wordpress", "react", "vue", "laravel", "django", "rails", "nextjs", "nuxt",
];

pub fn is_recognized_site_type(site_type: &str) -> bool {
    RECOGNIZED_SITE_TYPES.contains(&site_type.to_lowercase().as_str())
}

/// Which analysis the prompt (and any fallback) is focused on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    SiteCore,
    Theme,
    Performance,
    Security,
}

impl AnalysisKind {
    /// Pick the analysis focus from the classified issue
    pub fn for_issue(issue: IssueKind) -> Self {
        match issue {
            IssueKind::Performance | IssueKind::Loading | IssueKind::Caching
            | IssueKind::Database => Self::Performance,
            IssueKind::Security => Self::Security,
            IssueKind::Mobile | IssueKind::Responsive | IssueKind::UiUx => Self::Theme,
            IssueKind::Functionality | IssueKind::Compatibility => Self::SiteCore,
        }
    }

    fn focus_text(&self) -> &'static str {
        match self {
            Self::SiteCore => {
                "platform version compatibility, configuration problems, and \
                 recently changed core files"
            }
            Self::Theme => {
                "theme/template changes, CSS conflicts, JavaScript errors, and \
                 mobile responsiveness"
            }
            Self::Performance => {
                "database queries, asset loading, caching, Core Web Vitals, and \
                 mobile performance"
            }
            Self::Security => {
                "known vulnerabilities, outdated components, authentication \
                 weaknesses, and injection risks"
            }
        }
    }
}

/// Parsed result of one augmentation call (or its fallback)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAssessment {
    pub analysis: String,
    pub recommendations: Vec<String>,
    pub risk_assessment: Vec<(String, String)>,
    /// True when the static fallback was substituted for a live response
    pub degraded: bool,
}

/// Client for the external AI-analysis capability
pub struct AiAnalyzer {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AiAnalyzer {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Run the augmentation for a report. Never fails: any error path
    /// substitutes the canned fallback for the analysis kind.
    pub async fn analyze(
        &self,
        report: &BugReport,
        top_commits: &[ScoredCommit],
        site_type: &str,
        kind: AnalysisKind,
    ) -> AiAssessment {
        let prompt = build_prompt(report, top_commits, site_type, kind);
        match self.call(&prompt, kind).await {
            Ok(content) => parse_assessment(&content),
            Err(e) => {
                warn!(error = %e, ?kind, "AI augmentation failed, using static fallback");
                fallback_assessment(kind)
            }
        }
    }

    async fn call(&self, prompt: &str, kind: AnalysisKind) -> Result<String> {
        let request_id = Uuid::new_v4().to_string();
        debug!(request_id, model = %self.model, ?kind, "Sending AI analysis request");

        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert bug investigator for web platforms. \
                                Provide detailed, technical, actionable analysis. \
                                Respond in JSON with keys 'analysis' (string), \
                                'recommendations' (array of strings), and \
                                'risk_assessment' (object of risk name to level).",
                },
                {"role": "user", "content": prompt},
            ],
            "max_tokens": 2000,
            "temperature": 0.3,
        });

        let response = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ScoutError::Llm("quota exceeded".to_string()));
        }
        if !status.is_success() {
            return Err(ScoutError::Llm(format!("API call failed: {status}")));
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ScoutError::Llm("response contained no choices".to_string()))?;

        info!(request_id, "AI analysis response received");
        Ok(content)
    }
}

fn build_prompt(
    report: &BugReport,
    top_commits: &[ScoredCommit],
    site_type: &str,
    kind: AnalysisKind,
) -> String {
    let commit_lines: Vec<String> = top_commits
        .iter()
        .take(5)
        .map(|sc| format!("- {} {}", sc.commit.sha, sc.commit.message.lines().next().unwrap_or("")))
        .collect();

    format!(
        "Analyze this bug report for a {site_type} site, focusing on {}.\n\n\
         Bug Report: {}\n\
         Steps to Reproduce: {}\n\
         Affected Pages: {}\n\n\
         Recent Commits:\n{}\n\n\
         Provide specific analysis and potential solutions.",
        kind.focus_text(),
        report.summary,
        report.steps,
        report.pages,
        commit_lines.join("\n"),
    )
}

/// Parse the model's reply, accepting either the requested JSON shape or
/// free text (which becomes the analysis body).
fn parse_assessment(content: &str) -> AiAssessment {
    #[derive(Deserialize)]
    struct Parsed {
        #[serde(default)]
        analysis: String,
        #[serde(default)]
        recommendations: Vec<String>,
        #[serde(default)]
        risk_assessment: serde_json::Map<String, serde_json::Value>,
    }

    match serde_json::from_str::<Parsed>(content) {
        Ok(parsed) => AiAssessment {
            analysis: parsed.analysis,
            recommendations: parsed.recommendations,
            risk_assessment: parsed
                .risk_assessment
                .into_iter()
                .map(|(k, v)| (k, v.as_str().unwrap_or_default().to_string()))
                .collect(),
            degraded: false,
        },
        Err(_) => AiAssessment {
            analysis: content.to_string(),
            recommendations: Vec::new(),
            risk_assessment: Vec::new(),
            degraded: false,
        },
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_site_types() {
        assert!(is_recognized_site_type("wordpress"));
        assert!(is_recognized_site_type("React"));
        assert!(!is_recognized_site_type("mainframe"));
    }

    #[test]
    fn test_analysis_kind_for_issue() {
        assert_eq!(
            AnalysisKind::for_issue(IssueKind::Performance),
            AnalysisKind::Performance
        );
        assert_eq!(AnalysisKind::for_issue(IssueKind::Mobile), AnalysisKind::Theme);
        assert_eq!(
            AnalysisKind::for_issue(IssueKind::Security),
            AnalysisKind::Security
        );
        assert_eq!(
            AnalysisKind::for_issue(IssueKind::Functionality),
            AnalysisKind::SiteCore
        );
    }

    #[test]
    fn test_parse_structured_assessment() {
        let content = r#"{"analysis":"looks like a css regression","recommendations":["revert commit"],"risk_assessment":{"Stability Risk":"Low"}}"#;
        let parsed = parse_assessment(content);
        assert_eq!(parsed.analysis, "looks like a css regression");
        assert_eq!(parsed.recommendations, vec!["revert commit".to_string()]);
        assert_eq!(
            parsed.risk_assessment,
            vec![("Stability Risk".to_string(), "Low".to_string())]
        );
        assert!(!parsed.degraded);
    }

    #[test]
    fn test_parse_free_text_assessment() {
        let parsed = parse_assessment("probably the cache layer");
        assert_eq!(parsed.analysis, "probably the cache layer");
        assert!(parsed.recommendations.is_empty());
    }
}
