use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Languages a candidate can write a solution in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Java,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::JavaScript, Language::Python, Language::Java];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
        }
    }

    /// Human-readable name shown in the language picker
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Java => "Java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::JavaScript),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            other => Err(format!(
                "Unknown language '{}' (valid options: javascript, python, java)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A worked input/output pair, used both for display and as a test case.
///
/// `input` is the literal argument list handed to the entry point
/// (e.g. `[2,7,11,15],9`), `output` the JSON rendering of the expected
/// return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// How the test harness reaches into candidate code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Harness {
    /// Function (or method) invoked with each example's arguments
    pub entry_point: String,
    /// Class holding the entry point in Java solutions
    #[serde(default = "default_java_class")]
    pub java_class: String,
}

fn default_java_class() -> String {
    "Solution".to_string()
}

/// Coding problem definition. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub examples: Vec<Example>,
    pub starter_code: BTreeMap<Language, String>,
    pub harness: Harness,
}

impl Problem {
    pub fn starter_code(&self, language: Language) -> Option<&str> {
        self.starter_code.get(&language).map(String::as_str)
    }

    pub fn supports(&self, language: Language) -> bool {
        self.starter_code.contains_key(&language)
    }
}

/// Pass/fail determination for one example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleVerdict {
    pub example_index: usize,
    pub test_name: String,
    pub passed: bool,
    pub expected_output: String,
    pub actual_output: String,
}

/// Notification class derived from a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunSummary {
    AllPassed,
    Partial,
    NonePassed,
}

impl RunSummary {
    pub fn message(&self) -> &'static str {
        match self {
            RunSummary::AllPassed => "All tests passed!",
            RunSummary::Partial => "Some tests passed, but not all.",
            RunSummary::NonePassed => "All tests failed. Please fix your solution.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunSummary::AllPassed => "all_passed",
            RunSummary::Partial => "partial",
            RunSummary::NonePassed => "none_passed",
        }
    }
}

/// Aggregate of every example verdict for one execution pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: Uuid,
    pub question_id: String,
    pub language: Language,
    pub test_results: Vec<ExampleVerdict>,
    pub all_passed: bool,
    pub any_passed: bool,
    pub passed_count: usize,
    pub total: usize,
    pub summary: RunSummary,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Passed,
}

/// Persisted, append-only record of an admitted solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub session_id: String,
    pub question_id: String,
    pub code: String,
    pub language: Language,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub test_results: Vec<ExampleVerdict>,
}
