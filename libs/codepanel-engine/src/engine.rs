/// Execution Engine - Gateway to the Remote Code Runner
///
/// **Core Responsibility:**
/// Send one program to an external sandboxed execution service and return
/// raw stdout/stderr/exit status.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to reach the execution service
/// - Engine does NOT know expected outputs
/// - Engine does NOT evaluate correctness
/// - Engine returns raw outputs for the Evaluator to judge
///
/// **Failure Policy:**
/// Network failures, non-2xx responses, missing payloads and timeouts are
/// returned as `ExecutionError` for that one request. Sibling requests are
/// never affected.

use crate::config::LanguageConfigManager;
use crate::error::ExecutionError;
use async_trait::async_trait;
use codepanel_common::types::Language;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Safety limit so pathological editor content never leaves the process
const MAX_SOURCE_CODE_BYTES: usize = 512 * 1024;

/// One example's program, ready to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub language: Language,
    pub source: String,
    pub example_index: usize,
}

/// Raw output of one execution; empty streams are reported as `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExecution {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_code: Option<i32>,
}

/// Swappable execution backend
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<RawExecution, ExecutionError>;
}

#[derive(Debug, Serialize)]
struct PistonFile<'a> {
    name: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct PistonRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<PistonFile<'a>>,
}

#[derive(Debug, Default, Deserialize)]
struct PistonStage {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct PistonResponse {
    #[serde(default)]
    run: Option<PistonStage>,
    #[serde(default)]
    compile: Option<PistonStage>,
}

// Whitespace is real program output; only "" means the stream was silent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl PistonResponse {
    fn into_raw(self) -> Result<RawExecution, ExecutionError> {
        // A failed compile stage never produces a run worth comparing
        if let Some(compile) = self.compile {
            if compile.code.is_some_and(|code| code != 0) {
                let stderr = non_empty(compile.stderr).or_else(|| non_empty(compile.output));
                return Ok(RawExecution {
                    stdout: None,
                    stderr,
                    exit_code: compile.code,
                });
            }
        }

        let run = self.run.ok_or(ExecutionError::MissingPayload)?;
        Ok(RawExecution {
            stdout: non_empty(run.output),
            stderr: non_empty(run.stderr),
            exit_code: run.code,
        })
    }
}

/// Execution engine backed by a Piston-compatible HTTP API
///
/// Request: `{language, version, files: [{name, content}]}`
/// Response: `{run: {output?, stderr?, code?}, compile?: {...}}`
#[derive(Debug, Clone)]
pub struct PistonEngine {
    client: reqwest::Client,
    endpoint: String,
    languages: LanguageConfigManager,
}

impl PistonEngine {
    pub fn new(
        endpoint: impl Into<String>,
        languages: LanguageConfigManager,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("codepanel/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            languages,
        })
    }
}

#[async_trait]
impl ExecutionEngine for PistonEngine {
    async fn execute(&self, request: &ExecutionRequest) -> Result<RawExecution, ExecutionError> {
        // GUARDRAIL: Validate input size
        if request.source.len() > MAX_SOURCE_CODE_BYTES {
            return Err(ExecutionError::SourceTooLarge(MAX_SOURCE_CODE_BYTES));
        }

        let config = self
            .languages
            .get_config(request.language)
            .map_err(|_| ExecutionError::LanguageNotConfigured(request.language))?;

        let body = PistonRequest {
            language: &config.runtime,
            version: &config.version,
            files: vec![PistonFile {
                name: &config.file_name,
                content: &request.source,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExecutionError::Network("request timed out".to_string())
                } else {
                    ExecutionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExecutionError::Status {
                status: status.as_u16(),
            });
        }

        let payload: PistonResponse = response
            .json()
            .await
            .map_err(|_| ExecutionError::MissingPayload)?;

        payload.into_raw()
    }
}

/// Execute every request, at most `max_parallel` at a time
///
/// This function:
/// 1. Wraps each request in its own timeout
/// 2. Runs requests concurrently (bounded)
/// 3. Returns outcomes in request order, regardless of completion order
///
/// One outcome per request, always.
pub async fn execute_all(
    engine: Arc<dyn ExecutionEngine>,
    requests: Vec<ExecutionRequest>,
    timeout: Duration,
    max_parallel: usize,
) -> Vec<Result<RawExecution, ExecutionError>> {
    let timeout_ms = timeout.as_millis() as u64;

    stream::iter(requests)
        .map(|request| {
            let engine = Arc::clone(&engine);
            async move {
                let start = Instant::now();
                let outcome = match tokio::time::timeout(timeout, engine.execute(&request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ExecutionError::TimedOut(timeout_ms)),
                };

                match &outcome {
                    Ok(raw) => debug!(
                        example_index = request.example_index,
                        language = %request.language,
                        exit_code = ?raw.exit_code,
                        execution_ms = start.elapsed().as_millis() as u64,
                        "Example executed"
                    ),
                    Err(e) => warn!(
                        example_index = request.example_index,
                        language = %request.language,
                        error = %e,
                        "Example execution failed"
                    ),
                }
                outcome
            }
        })
        .buffered(max_parallel.max(1))
        .collect()
        .await
}
