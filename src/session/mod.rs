// src/session/mod.rs
// Per-user conversational intake state machine

pub mod extract;

use crate::report::DraftReport;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// Control phrases that unconditionally discard an active session
const CANCEL_PHRASES: &[&str] = &["cancel", "exit", "quit", "stop", "nevermind"];

/// Ordered intake steps. Components is optional; a session may complete from
/// any step once summary, pages and steps are all present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStep {
    AwaitingSummary,
    AwaitingPages,
    AwaitingSteps,
    AwaitingComponents,
    Complete,
}

impl IntakeStep {
    fn next(self) -> Self {
        match self {
            Self::AwaitingSummary => Self::AwaitingPages,
            Self::AwaitingPages => Self::AwaitingSteps,
            Self::AwaitingSteps => Self::AwaitingComponents,
            Self::AwaitingComponents | Self::Complete => Self::Complete,
        }
    }

    /// Question asked when this step becomes current
    fn prompt(self) -> &'static str {
        match self {
            Self::AwaitingSummary => "What's a *brief summary* of the issue?",
            Self::AwaitingPages => "Which *page(s)* are affected? (Please paste full URLs)",
            Self::AwaitingSteps => "How can we *reproduce* the issue?",
            Self::AwaitingComponents => {
                "Are there any *templates or components* involved? _(Optional, say 'none' to skip)_"
            }
            Self::Complete => "",
        }
    }

    /// Reminder sent when the user gives empty input at this step
    fn reminder(self) -> String {
        let missing = match self {
            Self::AwaitingSummary => "a brief summary of the issue",
            Self::AwaitingPages => "the affected page URLs",
            Self::AwaitingSteps => "the steps to reproduce the issue",
            Self::AwaitingComponents => "any templates or components involved (or 'none')",
            Self::Complete => "nothing",
        };
        format!("I'm still waiting for {missing}. Please send it when ready.")
    }
}

/// In-progress intake state for one user
#[derive(Debug, Clone)]
struct IntakeSession {
    channel_id: Option<String>,
    draft: DraftReport,
    step: IntakeStep,
}

impl IntakeSession {
    fn new(channel_id: Option<String>) -> Self {
        Self {
            channel_id,
            draft: DraftReport::default(),
            step: IntakeStep::AwaitingSummary,
        }
    }

    /// Advance past any step whose field is already filled
    fn advance_to_missing(&mut self) {
        loop {
            let filled = match self.step {
                IntakeStep::AwaitingSummary => self.draft.summary.is_some(),
                IntakeStep::AwaitingPages => self.draft.pages.is_some(),
                IntakeStep::AwaitingSteps => self.draft.steps.is_some(),
                IntakeStep::AwaitingComponents => self.draft.components.is_some(),
                IntakeStep::Complete => return,
            };
            if !filled {
                return;
            }
            self.step = self.step.next();
        }
    }
}

/// Reply produced by one conversational turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionReply {
    /// Ask the next question (or repeat the current one)
    Prompt(String),
    /// The report draft is complete; the session has been removed
    Completed {
        draft: DraftReport,
        channel_id: Option<String>,
    },
    /// The session was cancelled (`had_session` is false when there was none)
    Cancelled { had_session: bool },
}

/// Per-user session store.
///
/// The map mutex is held for the duration of a turn's in-memory mutation,
/// which contains no await points, so check-then-act sequences on one user's
/// entry are atomic with respect to concurrent turns.
#[derive(Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<String, IntakeSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of in-progress sessions
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Whether `user_id` has an active session
    pub fn has_session(&self, user_id: &str) -> bool {
        self.lock().contains_key(user_id)
    }

    /// Current step of a user's session, if any
    pub fn current_step(&self, user_id: &str) -> Option<IntakeStep> {
        self.lock().get(user_id).map(|s| s.step)
    }

    /// Explicitly discard a user's session
    pub fn cancel(&self, user_id: &str) -> bool {
        let removed = self.lock().remove(user_id).is_some();
        if removed {
            info!(user_id, "Intake session cancelled");
        }
        removed
    }

    /// Process one conversational turn for `user_id`.
    pub fn handle_message(
        &self,
        user_id: &str,
        channel_id: Option<&str>,
        text: &str,
    ) -> SessionReply {
        let text = text.trim();

        if CANCEL_PHRASES.contains(&text.to_lowercase().as_str()) {
            let had_session = self.cancel(user_id);
            return SessionReply::Cancelled { had_session };
        }

        let mut sessions = self.lock();
        let is_new = !sessions.contains_key(user_id);
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| IntakeSession::new(channel_id.map(|c| c.to_string())));

        if is_new {
            debug!(user_id, "Started intake session");
        }

        // Empty input never advances state; repeat the current question
        if text.is_empty() {
            return SessionReply::Prompt(session.step.reminder());
        }

        // Free-form path: fill any blank fields the text labels explicitly,
        // then re-evaluate completeness; a complete draft finishes the
        // session immediately, skipping any remaining steps.
        let extracted = extract::extract_fields(text);
        if !extracted.is_empty() {
            session.draft.fill_missing(&extracted);
            if session.draft.is_complete() {
                session.step = IntakeStep::Complete;
            } else {
                session.advance_to_missing();
            }
        } else {
            // Sequential path: the whole message answers the current question
            match session.step {
                IntakeStep::AwaitingSummary => session.draft.summary = Some(text.to_string()),
                IntakeStep::AwaitingPages => session.draft.pages = Some(text.to_string()),
                IntakeStep::AwaitingSteps => session.draft.steps = Some(text.to_string()),
                IntakeStep::AwaitingComponents => {
                    if !matches!(text.to_lowercase().as_str(), "none" | "n/a" | "no" | "skip") {
                        session.draft.components = Some(text.to_string());
                    }
                    session.step = IntakeStep::Complete;
                }
                // Defensive: a message in an unrecognized state is a no-op
                IntakeStep::Complete => {}
            }
            if session.step != IntakeStep::Complete {
                session.step = session.step.next();
                session.advance_to_missing();
            }
        }

        if session.step == IntakeStep::Complete && session.draft.is_complete() {
            let done = sessions
                .remove(user_id)
                .unwrap_or_else(|| IntakeSession::new(None));
            info!(user_id, "Intake session completed");
            return SessionReply::Completed {
                draft: done.draft,
                channel_id: done.channel_id,
            };
        }

        SessionReply::Prompt(session.step.prompt().to_string())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, IntakeSession>> {
        // A poisoned lock means a panic mid-turn; the map contents are still
        // structurally valid, so continue rather than propagate the poison.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
