// Prometheus metrics for test runs and submissions

use codepanel_common::types::RunResult;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

lazy_static! {
    pub static ref TEST_RUNS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "codepanel_test_runs_total",
        "Test runs by outcome (summary class or rejection code)",
        &["outcome"]
    )
    .expect("metric definition is valid");
    pub static ref EXAMPLE_VERDICTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "codepanel_example_verdicts_total",
        "Per-example verdicts by language",
        &["language", "verdict"]
    )
    .expect("metric definition is valid");
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "codepanel_submissions_total",
        "Submission attempts by outcome (admitted or rejection code)",
        &["outcome"]
    )
    .expect("metric definition is valid");
    pub static ref RUN_DURATION_SECONDS: Histogram = register_histogram!(
        "codepanel_run_duration_seconds",
        "Wall time of a full test run across all examples",
        vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0]
    )
    .expect("metric definition is valid");
}

pub fn record_run(run: &RunResult, seconds: f64) {
    TEST_RUNS_TOTAL
        .with_label_values(&[run.summary.as_str()])
        .inc();
    RUN_DURATION_SECONDS.observe(seconds);

    for verdict in &run.test_results {
        let outcome = if verdict.passed { "passed" } else { "failed" };
        EXAMPLE_VERDICTS_TOTAL
            .with_label_values(&[run.language.as_str(), outcome])
            .inc();
    }
}

pub fn record_run_rejected(code: &str) {
    TEST_RUNS_TOTAL.with_label_values(&[code]).inc();
}

pub fn record_submission(outcome: &str) {
    SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Render every registered metric in the text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
