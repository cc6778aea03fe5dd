use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_export))
        .route("/languages", get(handlers::list_languages))
        .route("/problems", get(handlers::list_problems))
        .route("/problems/:id", get(handlers::get_problem))
        .route("/sessions/:id", get(handlers::get_session))
        .route(
            "/sessions/:id/question",
            get(handlers::active_problem).put(handlers::select_question),
        )
        .route("/sessions/:id/language", put(handlers::select_language))
        .route("/sessions/:id/code", put(handlers::edit_code))
        .route("/sessions/:id/run", post(handlers::run_tests))
        .route("/sessions/:id/submit", post(handlers::submit))
        .route("/sessions/:id/submissions", get(handlers::list_submissions))
}
