/// Verdict Engine - High-Level Run Orchestration
///
/// **Responsibility:**
/// Produce a `RunResult` for "run every example of a problem against this
/// source in this language".
///
/// **Architecture:**
/// 1. Reject empty or unmodified starter code locally (no network)
/// 2. Build one harnessed program per example (harness.rs)
/// 3. Fan out through the execution engine (engine.rs)
/// 4. Derive verdicts from raw outputs (evaluator.rs)
///
/// This module is the glue layer - it knows nothing about:
/// - How code executes (engine's job)
/// - How verdicts are derived (evaluator's job)
/// - Whether a run may be submitted (gate's job)

use crate::engine::{execute_all, ExecutionEngine, ExecutionRequest, RawExecution};
use crate::error::{CoreError, ExecutionError};
use crate::evaluator;
use crate::harness;
use codepanel_common::types::{Language, Problem, RunResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

#[derive(Clone)]
pub struct VerdictEngine {
    engine: Arc<dyn ExecutionEngine>,
    timeout: Duration,
    max_parallel: usize,
}

impl VerdictEngine {
    pub fn new(engine: Arc<dyn ExecutionEngine>, timeout: Duration, max_parallel: usize) -> Self {
        Self {
            engine,
            timeout,
            max_parallel,
        }
    }

    /// Local precondition: the candidate must have written something
    pub fn check_solution(
        problem: &Problem,
        language: Language,
        source: &str,
    ) -> Result<(), CoreError> {
        let starter = problem
            .starter_code(language)
            .ok_or(CoreError::UnsupportedLanguage(language))?;

        let trimmed = source.trim();
        if trimmed.is_empty() || trimmed == starter.trim() {
            return Err(CoreError::EmptySolution);
        }
        Ok(())
    }

    /// Run every example and return one verdict per example, in order
    ///
    /// Per-example failures (transport, timeout, harness) are captured in
    /// that example's verdict; only the local precondition fails the run.
    #[instrument(skip(self, problem, language, source), fields(question_id = %problem.id, language = %language))]
    pub async fn run(
        &self,
        problem: &Problem,
        language: Language,
        source: &str,
    ) -> Result<RunResult, CoreError> {
        Self::check_solution(problem, language, source)?;

        let start = Instant::now();

        // Step 1: Build programs; a harness failure only affects its example
        let mut requests = Vec::with_capacity(problem.examples.len());
        let mut outcomes: Vec<Option<Result<RawExecution, ExecutionError>>> =
            vec![None; problem.examples.len()];
        for (idx, example) in problem.examples.iter().enumerate() {
            match harness::build_program(problem, language, source, example) {
                Ok(program) => requests.push(ExecutionRequest {
                    language,
                    source: program,
                    example_index: idx,
                }),
                Err(e) => outcomes[idx] = Some(Err(ExecutionError::from(e))),
            }
        }

        // Step 2: Execute concurrently, reassembled by example index
        let indices: Vec<usize> = requests.iter().map(|r| r.example_index).collect();
        let executed = execute_all(
            Arc::clone(&self.engine),
            requests,
            self.timeout,
            self.max_parallel,
        )
        .await;
        for (idx, outcome) in indices.into_iter().zip(executed) {
            outcomes[idx] = Some(outcome);
        }

        let outcomes: Vec<Result<RawExecution, ExecutionError>> = outcomes
            .into_iter()
            .map(|o| o.unwrap_or_else(|| Ok(RawExecution::default())))
            .collect();

        // Step 3: Evaluate outputs
        let result = evaluator::evaluate(problem, language, &outcomes);

        info!(
            run_id = %result.run_id,
            passed = result.passed_count,
            total = result.total,
            summary = result.summary.as_str(),
            execution_ms = start.elapsed().as_millis() as u64,
            "Run completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::ProblemCatalog;
    use async_trait::async_trait;
    use codepanel_common::types::RunSummary;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Engine whose responses are keyed on a marker inside the program
    ///
    /// Each rule maps a substring of the program to a canned outcome; the
    /// first matching rule wins, unmatched programs produce no output.
    #[derive(Default)]
    pub(crate) struct ScriptedEngine {
        pub rules: Mutex<Vec<(String, Result<RawExecution, ExecutionError>)>>,
        pub delay_ms: Mutex<HashMap<String, u64>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedEngine {
        pub fn respond(self, marker: &str, outcome: Result<RawExecution, ExecutionError>) -> Self {
            self.rules.lock().unwrap().push((marker.to_string(), outcome));
            self
        }

        pub fn delay(self, marker: &str, ms: u64) -> Self {
            self.delay_ms.lock().unwrap().insert(marker.to_string(), ms);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn stdout(s: &str) -> Result<RawExecution, ExecutionError> {
        Ok(RawExecution {
            stdout: Some(s.to_string()),
            stderr: None,
            exit_code: Some(0),
        })
    }

    pub(crate) fn stderr(s: &str) -> Result<RawExecution, ExecutionError> {
        Ok(RawExecution {
            stdout: None,
            stderr: Some(s.to_string()),
            exit_code: Some(1),
        })
    }

    #[async_trait]
    impl ExecutionEngine for ScriptedEngine {
        async fn execute(&self, request: &ExecutionRequest) -> Result<RawExecution, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let delay = self
                .delay_ms
                .lock()
                .unwrap()
                .iter()
                .find(|(marker, _)| request.source.contains(marker.as_str()))
                .map(|(_, ms)| *ms);
            if let Some(ms) = delay {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }

            let rules = self.rules.lock().unwrap();
            rules
                .iter()
                .find(|(marker, _)| request.source.contains(marker.as_str()))
                .map(|(_, outcome)| outcome.clone())
                .unwrap_or_else(|| Ok(RawExecution::default()))
        }
    }

    fn verdict_engine(engine: ScriptedEngine) -> (VerdictEngine, Arc<ScriptedEngine>) {
        let engine = Arc::new(engine);
        let dyn_engine: Arc<dyn ExecutionEngine> = engine.clone();
        (VerdictEngine::new(dyn_engine, Duration::from_secs(1), 4), engine)
    }

    fn two_sum() -> Problem {
        ProblemCatalog::builtin().get("two-sum").unwrap().clone()
    }

    #[tokio::test]
    async fn test_starter_code_rejected_before_any_call() {
        let (verdicts, engine) = verdict_engine(ScriptedEngine::default());
        let problem = two_sum();
        let starter = format!("  {}\n\n", problem.starter_code(Language::Python).unwrap());

        let err = verdicts.run(&problem, Language::Python, &starter).await.unwrap_err();

        assert_eq!(err, CoreError::EmptySolution);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_source_rejected() {
        let (verdicts, engine) = verdict_engine(ScriptedEngine::default());

        let err = verdicts.run(&two_sum(), Language::JavaScript, " \n\t").await.unwrap_err();

        assert_eq!(err, CoreError::EmptySolution);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_one_call_per_example_in_order() {
        let engine = ScriptedEngine::default()
            .respond("twoSum([2,7,11,15],9)", stdout("[0, 1]"))
            .respond("twoSum([3,2,4],6)", stderr("SyntaxError"))
            .respond("twoSum([3,3],6)", stdout("[1,0]"))
            .delay("twoSum([2,7,11,15],9)", 80);
        let (verdicts, engine) = verdict_engine(engine);

        let result = verdicts
            .run(&two_sum(), Language::Python, "def twoSum(nums, target):\n    return [0, 1]")
            .await
            .unwrap();

        assert_eq!(engine.call_count(), 3);
        assert_eq!(result.test_results.len(), 3);
        assert!(result.test_results[0].passed);
        assert_eq!(result.test_results[1].actual_output, "Error: SyntaxError");
        assert_eq!(result.test_results[2].actual_output, "[1,0]");
        assert!(!result.all_passed);
        assert!(result.any_passed);
        assert_eq!(result.summary, RunSummary::Partial);
    }

    #[tokio::test]
    async fn test_harness_failure_is_scoped_to_its_example() {
        let mut problem = two_sum();
        problem.examples[1].input = "[[1,2],[3]],3".to_string();
        let engine = ScriptedEngine::default().respond("new Solution()", stdout("[0, 1]"));
        let (verdicts, engine) = verdict_engine(engine);
        let source = "class Solution {\n    public int[] twoSum(int[] nums, int target) { return new int[]{0, 1}; }\n}";

        let result = verdicts.run(&problem, Language::Java, source).await.unwrap();

        assert_eq!(engine.call_count(), 2);
        assert_eq!(result.test_results.len(), 3);
        assert!(result.test_results[0].passed);
        assert!(!result.test_results[1].passed);
        assert!(result.test_results[1].actual_output.starts_with("Error: cannot translate"));
        assert!(result.test_results[2].passed);
    }

    #[tokio::test]
    async fn test_unsupported_language_for_problem() {
        let mut problem = two_sum();
        problem.starter_code.remove(&Language::Java);
        let (verdicts, _) = verdict_engine(ScriptedEngine::default());

        let err = verdicts.run(&problem, Language::Java, "class Solution {}").await.unwrap_err();

        assert_eq!(err, CoreError::UnsupportedLanguage(Language::Java));
    }
}
