/// Example Evaluator - Language-Agnostic Verdict Logic
///
/// **Core Responsibility:**
/// Compare raw execution outputs against expected outputs and derive a
/// pass/fail verdict per example.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP
/// - Knows nothing about language runtimes
/// - Knows nothing about sessions or submissions
/// - Pure function: (execution outcomes, expected outputs) → verdicts
///
/// **Verdict Rules:**
/// - stdout present: passed iff normalized stdout == normalized expected
/// - only stderr: failed, actual = "Error: <stderr>"
/// - transport failure: failed, actual = "Error: <detail>"
/// - nothing at all: failed, actual = "Execution failed"
///
/// **Normalization Rules:**
/// - Every whitespace character is removed, anywhere in the string
/// - Case sensitivity: YES (exact match required)
///
/// **Aggregation:**
/// - all_passed: every example passed
/// - any_passed: at least one example passed
/// - One verdict per example, in example order, always

use crate::engine::RawExecution;
use crate::error::ExecutionError;
use chrono::Utc;
use codepanel_common::types::{
    Example, ExampleVerdict, Language, Problem, RunResult, RunSummary,
};
use tracing::debug;
use uuid::Uuid;

const EXECUTION_FAILED: &str = "Execution failed";

/// Normalize output string for comparison
///
/// Removes every whitespace character so `[0, 1]` and `[0,1]` compare equal.
pub fn normalize_output(output: &str) -> String {
    output.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Display name of an example, 1-based
pub fn test_name(example_index: usize) -> String {
    format!("Example {}", example_index + 1)
}

/// Evaluate a single example execution outcome
pub fn evaluate_example(
    example_index: usize,
    example: &Example,
    outcome: &Result<RawExecution, ExecutionError>,
) -> ExampleVerdict {
    let expected_output = example.output.trim().to_string();

    let (passed, actual_output) = match outcome {
        Ok(RawExecution {
            stdout: Some(stdout),
            ..
        }) => {
            let actual = stdout.trim().to_string();
            (normalize_output(&actual) == normalize_output(&expected_output), actual)
        }
        Ok(RawExecution {
            stdout: None,
            stderr: Some(stderr),
            ..
        }) => (false, format!("Error: {}", stderr.trim())),
        Ok(_) => (false, EXECUTION_FAILED.to_string()),
        Err(e) => (false, format!("Error: {}", e)),
    };

    ExampleVerdict {
        example_index,
        test_name: test_name(example_index),
        passed,
        expected_output,
        actual_output,
    }
}

/// Aggregate per-example verdicts into a run result
pub fn aggregate_results(
    question_id: &str,
    language: Language,
    test_results: Vec<ExampleVerdict>,
) -> RunResult {
    let total = test_results.len();
    let passed_count = test_results.iter().filter(|v| v.passed).count();
    let all_passed = total > 0 && passed_count == total;
    let any_passed = passed_count > 0;

    let summary = if all_passed {
        RunSummary::AllPassed
    } else if any_passed {
        RunSummary::Partial
    } else {
        RunSummary::NonePassed
    };

    RunResult {
        run_id: Uuid::new_v4(),
        question_id: question_id.to_string(),
        language,
        test_results,
        all_passed,
        any_passed,
        passed_count,
        total,
        summary,
        completed_at: Utc::now(),
    }
}

/// Evaluate every example of `problem` and produce the run result
///
/// Outcomes are matched to examples by position. A missing outcome counts
/// as a failed execution, so the result always has one verdict per example.
pub fn evaluate(
    problem: &Problem,
    language: Language,
    outcomes: &[Result<RawExecution, ExecutionError>],
) -> RunResult {
    let missing: Result<RawExecution, ExecutionError> = Ok(RawExecution::default());

    let verdicts: Vec<ExampleVerdict> = problem
        .examples
        .iter()
        .enumerate()
        .map(|(idx, example)| {
            let outcome = outcomes.get(idx).unwrap_or(&missing);
            let verdict = evaluate_example(idx, example, outcome);
            debug!(
                question_id = %problem.id,
                example_index = idx,
                passed = verdict.passed,
                "Example evaluated"
            );
            verdict
        })
        .collect();

    aggregate_results(&problem.id, language, verdicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProblemCatalog;

    fn make_example(output: &str) -> Example {
        Example {
            input: "input".to_string(),
            output: output.to_string(),
            explanation: None,
        }
    }

    fn stdout(s: &str) -> Result<RawExecution, ExecutionError> {
        Ok(RawExecution {
            stdout: Some(s.to_string()),
            stderr: None,
            exit_code: Some(0),
        })
    }

    fn stderr(s: &str) -> Result<RawExecution, ExecutionError> {
        Ok(RawExecution {
            stdout: None,
            stderr: Some(s.to_string()),
            exit_code: Some(1),
        })
    }

    fn two_sum_single_example() -> Problem {
        let mut problem = ProblemCatalog::builtin().get("two-sum").unwrap().clone();
        problem.examples.truncate(1);
        problem
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("[1, 2]"), normalize_output("[1,2]"));
        assert_eq!(normalize_output("  hello  "), "hello");
        assert_eq!(normalize_output("a\tb\r\nc d"), "abcd");
        assert_eq!(normalize_output(""), "");
        assert_eq!(normalize_output(" \n "), "");
    }

    #[test]
    fn test_evaluate_example_whitespace_insensitive_match() {
        let verdict = evaluate_example(0, &make_example("[0,1]"), &stdout("[0, 1]\n"));

        assert!(verdict.passed);
        assert_eq!(verdict.test_name, "Example 1");
        assert_eq!(verdict.actual_output, "[0, 1]");
        assert_eq!(verdict.expected_output, "[0,1]");
    }

    #[test]
    fn test_evaluate_example_mismatch() {
        let verdict = evaluate_example(0, &make_example("[0,1]"), &stdout("[1,0]"));

        assert!(!verdict.passed);
        assert_eq!(verdict.actual_output, "[1,0]");
        assert_eq!(verdict.expected_output, "[0,1]");
    }

    #[test]
    fn test_case_sensitivity() {
        let verdict = evaluate_example(0, &make_example("Hello"), &stdout("hello"));
        assert!(!verdict.passed);
    }

    #[test]
    fn test_stderr_only_is_error() {
        let verdict = evaluate_example(2, &make_example("true"), &stderr("SyntaxError"));

        assert!(!verdict.passed);
        assert_eq!(verdict.actual_output, "Error: SyntaxError");
        assert_eq!(verdict.test_name, "Example 3");
    }

    #[test]
    fn test_blank_output_matches_blank_expectation() {
        let verdict = evaluate_example(0, &make_example(""), &stdout("  \n"));

        assert!(verdict.passed);
        assert_eq!(verdict.actual_output, "");

        let verdict = evaluate_example(0, &make_example("[]"), &stdout("\n"));
        assert!(!verdict.passed);
    }

    #[test]
    fn test_nothing_returned_is_execution_failed() {
        let verdict = evaluate_example(0, &make_example("1"), &Ok(RawExecution::default()));

        assert!(!verdict.passed);
        assert_eq!(verdict.actual_output, "Execution failed");
    }

    #[test]
    fn test_transport_failure_is_captured() {
        let outcome = Err(ExecutionError::Status { status: 502 });
        let verdict = evaluate_example(0, &make_example("1"), &outcome);

        assert!(!verdict.passed);
        assert_eq!(verdict.actual_output, "Error: execution service returned HTTP 502");
    }

    #[test]
    fn test_timeout_is_like_stderr_failure() {
        let outcome = Err(ExecutionError::TimedOut(10_000));
        let verdict = evaluate_example(0, &make_example("1"), &outcome);

        assert!(!verdict.passed);
        assert!(verdict.actual_output.starts_with("Error: "));
    }

    #[test]
    fn test_two_sum_scenarios() {
        let problem = two_sum_single_example();

        let good = evaluate(&problem, Language::Python, &[stdout("[0, 1]")]);
        assert!(good.all_passed);
        assert_eq!(good.summary, RunSummary::AllPassed);

        let bad = evaluate(&problem, Language::Python, &[stdout("[1,0]")]);
        assert!(!bad.all_passed);
        assert!(!bad.any_passed);
        assert_eq!(bad.test_results[0].actual_output, "[1,0]");
        assert_eq!(bad.test_results[0].expected_output, "[0,1]");
        assert_eq!(bad.summary, RunSummary::NonePassed);
    }

    #[test]
    fn test_partial_pass() {
        let problem = ProblemCatalog::builtin().get("two-sum").unwrap().clone();
        let outcomes = vec![stdout("[0,1]"), stderr("SyntaxError"), stdout("[0,1]")];

        let result = evaluate(&problem, Language::JavaScript, &outcomes);

        assert_eq!(result.total, 3);
        assert_eq!(result.passed_count, 2);
        assert!(!result.all_passed);
        assert!(result.any_passed);
        assert_eq!(result.summary, RunSummary::Partial);
        assert_eq!(result.test_results[1].actual_output, "Error: SyntaxError");
    }

    #[test]
    fn test_short_outcomes_never_shorten_result() {
        let problem = ProblemCatalog::builtin().get("two-sum").unwrap().clone();

        let result = evaluate(&problem, Language::Java, &[stdout("[0,1]")]);

        assert_eq!(result.test_results.len(), problem.examples.len());
        for (idx, verdict) in result.test_results.iter().enumerate() {
            assert_eq!(verdict.example_index, idx);
        }
        assert_eq!(result.test_results[2].actual_output, "Execution failed");
    }

    #[test]
    fn test_empty_verdict_list_is_not_all_passed() {
        let result = aggregate_results("q", Language::Python, Vec::new());
        assert!(!result.all_passed);
        assert_eq!(result.summary, RunSummary::NonePassed);
    }

    #[test]
    fn test_identical_outcomes_identical_verdicts() {
        let problem = ProblemCatalog::builtin().get("palindrome-number").unwrap().clone();
        let outcomes = vec![stdout("true"), stdout("false"), stdout("true")];

        let first = evaluate(&problem, Language::Python, &outcomes);
        let second = evaluate(&problem, Language::Python, &outcomes);

        assert_eq!(first.test_results, second.test_results);
        assert_ne!(first.run_id, second.run_id);
    }
}
