// HTTP route handlers for the Codepanel API

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use codepanel_common::types::{Difficulty, Language, Problem};
use codepanel_engine::error::CoreError;
use codepanel_engine::session::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::metrics;
use crate::AppState;

pub const ROLE_HEADER: &str = "x-interview-role";

/// Result of a UI action: success flag plus a reason fit for direct display
#[derive(Debug, Serialize)]
pub struct ActionResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ActionResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    /// Machine-readable, e.g. `MISSING_RUN`
    pub code: &'static str,
    pub message: String,
}

/// A rejected action, rendered with its HTTP status
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::UnknownProblem(_) => StatusCode::NOT_FOUND,
        CoreError::UnsupportedLanguage(_) | CoreError::EmptySolution => StatusCode::BAD_REQUEST,
        CoreError::NoAssignment | CoreError::Gate(_) | CoreError::Superseded => {
            StatusCode::CONFLICT
        }
        CoreError::Forbidden => StatusCode::FORBIDDEN,
        CoreError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CoreError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "Action failed");
        }

        let body = ErrorBody {
            success: false,
            code: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    /// Preselected in the interviewer's picker
    pub is_default: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageOption {
    pub name: Language,
    pub display_name: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectQuestionRequest {
    pub question_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectLanguageRequest {
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct EditCodeRequest {
    pub code: String,
}

/// Body of run/submit; `code` is the editor content as the client sees it
#[derive(Debug, Default, Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    pub code: Option<String>,
}

fn role_from(headers: &HeaderMap) -> Role {
    let is_interviewer = headers
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("interviewer"))
        .unwrap_or(false);

    if is_interviewer {
        Role::Interviewer
    } else {
        Role::Candidate
    }
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_export() -> Response {
    match metrics::render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

/// GET /languages
pub async fn list_languages(State(state): State<Arc<AppState>>) -> Json<Vec<LanguageOption>> {
    Json(
        state
            .languages
            .list_languages()
            .into_iter()
            .map(|l| LanguageOption {
                name: l,
                display_name: l.display_name(),
            })
            .collect(),
    )
}

/// GET /problems
pub async fn list_problems(State(state): State<Arc<AppState>>) -> Json<Vec<ProblemSummary>> {
    let catalog = state.sessions.catalog();
    let default_id = &catalog.default_problem().id;

    Json(
        catalog
            .problems()
            .iter()
            .map(|p| ProblemSummary {
                id: p.id.clone(),
                title: p.title.clone(),
                difficulty: p.difficulty,
                is_default: &p.id == default_id,
            })
            .collect(),
    )
}

/// GET /problems/{id}
pub async fn get_problem(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
) -> Result<Json<Problem>, ApiError> {
    state
        .sessions
        .catalog()
        .get(&question_id)
        .cloned()
        .map(Json)
        .ok_or(ApiError(CoreError::UnknownProblem(question_id)))
}

/// GET /sessions/{id} - Snapshot of the session's editor and gate
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.sessions.view(&session_id).await?))
}

/// GET /sessions/{id}/question
pub async fn active_problem(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.sessions.active_problem(&session_id).await?))
}

/// PUT /sessions/{id}/question - Interviewer assigns a question
pub async fn select_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SelectQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = role_from(&headers);
    let problem = state
        .sessions
        .select_question(&session_id, &payload.question_id, role)
        .await?;

    let message = format!("Question \"{}\" assigned", problem.title);
    Ok(ActionResponse::ok(message, problem))
}

/// PUT /sessions/{id}/language
pub async fn select_language(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<SelectLanguageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.languages.is_enabled(payload.language) {
        return Err(ApiError(CoreError::UnsupportedLanguage(payload.language)));
    }

    let view = state
        .sessions
        .select_language(&session_id, payload.language)
        .await?;

    let message = format!("Switched to {}", payload.language.display_name());
    Ok(ActionResponse::ok(message, view))
}

/// PUT /sessions/{id}/code
pub async fn edit_code(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<EditCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.sessions.edit_code(&session_id, &payload.code).await?;
    Ok(ActionResponse::ok("Code updated", view))
}

/// POST /sessions/{id}/run - Run every example against the editor code
pub async fn run_tests(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<CodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();

    match state
        .sessions
        .run_tests(&session_id, payload.code.as_deref())
        .await
    {
        Ok(run) => {
            metrics::record_run(&run, start.elapsed().as_secs_f64());
            info!(
                session_id = %session_id,
                run_id = %run.run_id,
                summary = run.summary.as_str(),
                "Test run returned"
            );
            Ok(ActionResponse::ok(run.summary.message(), run))
        }
        Err(e) => {
            metrics::record_run_rejected(e.code());
            warn!(session_id = %session_id, code = e.code(), "Test run rejected");
            Err(e.into())
        }
    }
}

/// POST /sessions/{id}/submit
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<CodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state
        .sessions
        .submit(&session_id, payload.code.as_deref())
        .await
    {
        Ok(submission) => {
            metrics::record_submission("admitted");
            Ok(ActionResponse::ok("Solution submitted successfully!", submission))
        }
        Err(e) => {
            metrics::record_submission(e.code());
            warn!(session_id = %session_id, code = e.code(), "Submission rejected");
            Err(e.into())
        }
    }
}

/// GET /sessions/{id}/submissions - Interviewer's view, oldest first
pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.sessions.submissions(&session_id).await?))
}
