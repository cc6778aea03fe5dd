/// Submission Gate - Admission State Machine
///
/// ```text
///   NoCode ──edit──▶ Untested ──record_run──▶ Tested(r) ──admit+persist──▶ Submitted
///     ▲                 ▲  ▲                     │                            │
///     │                 │  └────────edit─────────┘                            │
///     │                 └──────────────────────edit───────────────────────────┘
///     └── reassign / select_language (from any state)
/// ```
///
/// The gate owns the editor's current source, so a verdict can only ever be
/// attached to, and admitted for, the exact code it was produced from.

use crate::error::GateError;
use codepanel_common::types::{Language, RunResult};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    NoCode,
    Untested,
    Tested { run: RunResult, source: String },
    Submitted { submission_id: Uuid },
}

impl GateState {
    pub fn name(&self) -> &'static str {
        match self {
            GateState::NoCode => "no_code",
            GateState::Untested => "untested",
            GateState::Tested { .. } => "tested",
            GateState::Submitted { .. } => "submitted",
        }
    }
}

/// Serializable view of the gate for API consumers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateView {
    pub state: &'static str,
    pub question_id: Option<String>,
    pub language: Language,
    pub code: String,
    pub last_run: Option<RunResult>,
}

#[derive(Debug, Clone)]
pub struct SubmissionGate {
    question_id: Option<String>,
    language: Language,
    source: String,
    state: GateState,
}

impl SubmissionGate {
    pub fn new(question_id: Option<String>, language: Language, starter: &str) -> Self {
        Self {
            question_id,
            language,
            source: starter.to_string(),
            state: GateState::NoCode,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn question_id(&self) -> Option<&str> {
        self.question_id.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Most recent run attached to the current source, if any
    pub fn last_run(&self) -> Option<&RunResult> {
        match &self.state {
            GateState::Tested { run, .. } => Some(run),
            _ => None,
        }
    }

    /// Candidate changed the editor content
    ///
    /// Any actual change invalidates a previous verdict or submission.
    pub fn edit(&mut self, source: &str) {
        if source == self.source {
            return;
        }
        self.source = source.to_string();
        self.state = GateState::Untested;
    }

    /// Attach a completed run to the current source
    ///
    /// Rejected with `StaleVerdict` when the run was produced for other code,
    /// another language, or another problem than the one now in the editor.
    pub fn record_run(&mut self, run: RunResult, tested_source: &str) -> Result<(), GateError> {
        let same_problem = self.question_id.as_deref() == Some(run.question_id.as_str());
        if tested_source != self.source || run.language != self.language || !same_problem {
            return Err(GateError::StaleVerdict);
        }

        self.state = GateState::Tested {
            run,
            source: tested_source.to_string(),
        };
        Ok(())
    }

    /// Check whether `submitted_source` may be persisted
    ///
    /// Returns the run to snapshot into the submission. Does not change
    /// state; call `mark_submitted` once persistence succeeded.
    pub fn admit(&self, submitted_source: &str) -> Result<&RunResult, GateError> {
        match &self.state {
            GateState::NoCode | GateState::Untested | GateState::Submitted { .. } => {
                Err(GateError::MissingRun)
            }
            GateState::Tested { run, source } => {
                if source != submitted_source || source != &self.source {
                    return Err(GateError::StaleVerdict);
                }
                if !run.all_passed {
                    return Err(GateError::TestsNotPassing);
                }
                Ok(run)
            }
        }
    }

    pub fn mark_submitted(&mut self, submission_id: Uuid) {
        self.state = GateState::Submitted { submission_id };
    }

    /// Interviewer assigned another problem: start over
    pub fn reassign(&mut self, question_id: Option<String>, starter: &str) {
        self.question_id = question_id;
        self.source = starter.to_string();
        self.state = GateState::NoCode;
    }

    /// Candidate switched language: editor resets to that language's starter code
    pub fn select_language(&mut self, language: Language, starter: &str) {
        self.language = language;
        self.source = starter.to_string();
        self.state = GateState::NoCode;
    }

    pub fn view(&self) -> GateView {
        GateView {
            state: self.state.name(),
            question_id: self.question_id.clone(),
            language: self.language,
            code: self.source.clone(),
            last_run: self.last_run().cloned(),
        }
    }
}
