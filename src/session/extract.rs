// src/session/extract.rs
// Free-form field extraction from a single message
//
// A pure, idempotent function of the input text: labeled-line patterns first,
// then URL detection, then line-shape heuristics. The session layer decides
// which extracted fields to keep (it never overwrites already-filled ones).

use crate::report::DraftReport;
use regex::Regex;
use std::sync::OnceLock;

fn label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(summary|pages?|urls?|steps?(?:\s+to\s+reproduce)?|repro|components?|templates?)\s*[:\-]\s*(.+)$",
        )
        .expect("label pattern is valid")
    })
}

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s>\)]+").expect("url pattern is valid"))
}

fn numbered_step_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+[.)]\s+\S").expect("step pattern is valid"))
}

/// Scan free-form text for report fields.
///
/// Returns a candidate field map; empty when nothing recognizable was found.
pub fn extract_fields(text: &str) -> DraftReport {
    let mut draft = DraftReport::default();
    let mut step_lines: Vec<String> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = label_pattern().captures(line) {
            let label = caps[1].to_lowercase();
            let value = caps[2].trim().to_string();
            if value.is_empty() {
                continue;
            }
            if label.starts_with("summary") {
                draft.summary.get_or_insert(value);
            } else if label.starts_with("page") || label.starts_with("url") {
                draft.pages.get_or_insert(value);
            } else if label.starts_with("step") || label == "repro" {
                draft.steps.get_or_insert(value);
            } else if label.starts_with("component") || label.starts_with("template") {
                draft.components.get_or_insert(value);
            }
            continue;
        }

        // Numbered lines read like reproduction steps
        if numbered_step_pattern().is_match(line) {
            step_lines.push(line.trim().to_string());
            continue;
        }

        // A bare line mentioning reproduction is a steps candidate
        let lower = line.to_lowercase();
        if draft.steps.is_none() && lower.contains("reproduce") && !line.trim().is_empty() {
            draft.steps = Some(line.trim().to_string());
        }
    }

    // Unlabeled URLs become the pages field
    if draft.pages.is_none() {
        let urls: Vec<&str> = url_pattern().find_iter(text).map(|m| m.as_str()).collect();
        if !urls.is_empty() {
            draft.pages = Some(urls.join(" "));
        }
    }

    if draft.steps.is_none() && !step_lines.is_empty() {
        draft.steps = Some(step_lines.join("\n"));
    }

    draft
}
