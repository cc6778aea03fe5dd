// Error taxonomy for the validation engine.
// Display strings are shown to candidates and interviewers verbatim.

use codepanel_common::types::Language;
use thiserror::Error;

/// Failure of one example's remote execution.
/// Always absorbed into that example's verdict, never escalated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("request to execution service failed: {0}")]
    Network(String),

    #[error("execution service returned HTTP {status}")]
    Status { status: u16 },

    #[error("execution service returned no run result")]
    MissingPayload,

    #[error("execution timed out after {0}ms")]
    TimedOut(u64),

    #[error("{0}")]
    Harness(#[from] HarnessError),

    #[error("language {0} is not configured for execution")]
    LanguageNotConfigured(Language),

    #[error("source exceeds maximum size of {0} bytes")]
    SourceTooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("cannot translate argument `{0}` for java")]
    UnsupportedArgument(String),

    #[error("unbalanced brackets in example input `{0}`")]
    Unbalanced(String),
}

/// Admission rejections from the submission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Please run tests before submitting")]
    MissingRun,

    #[error("All tests must pass before submitting")]
    TestsNotPassing,

    #[error("Your code changed since the last test run. Run the tests again before submitting")]
    StaleVerdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("stored record is malformed: {0}")]
    Malformed(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.kind() == redis::ErrorKind::TypeError {
            StoreError::Malformed(e.to_string())
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}

/// Outcome of a rejected UI action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("No question has been assigned to this interview yet")]
    NoAssignment,

    #[error("Unknown question '{0}'")]
    UnknownProblem(String),

    #[error("{} is not available for this question", .0.display_name())]
    UnsupportedLanguage(Language),

    #[error("Please write your solution before testing or submitting")]
    EmptySolution,

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("A newer test run replaced this one")]
    Superseded,

    #[error("Failed to submit solution: {0}")]
    Persistence(String),

    #[error("Failed to load interview state: {0}")]
    Store(#[from] StoreError),

    #[error("Only the interviewer can assign questions")]
    Forbidden,
}

impl CoreError {
    /// Machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NoAssignment => "NO_ASSIGNMENT",
            CoreError::UnknownProblem(_) => "UNKNOWN_PROBLEM",
            CoreError::UnsupportedLanguage(_) => "UNSUPPORTED_LANGUAGE",
            CoreError::EmptySolution => "EMPTY_SOLUTION",
            CoreError::Gate(GateError::MissingRun) => "MISSING_RUN",
            CoreError::Gate(GateError::TestsNotPassing) => "TESTS_NOT_PASSING",
            CoreError::Gate(GateError::StaleVerdict) => "STALE_VERDICT",
            CoreError::Superseded => "SUPERSEDED",
            CoreError::Persistence(_) => "PERSISTENCE_FAILURE",
            CoreError::Store(_) => "STORE_UNAVAILABLE",
            CoreError::Forbidden => "FORBIDDEN",
        }
    }
}
