mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use axum::Router;
use codepanel_common::config::AppConfig;
use codepanel_engine::catalog::ProblemCatalog;
use codepanel_engine::config::LanguageConfigManager;
use codepanel_engine::engine::PistonEngine;
use codepanel_engine::executor::VerdictEngine;
use codepanel_engine::session::SessionManager;
use codepanel_engine::store::{AssignmentStore, MemoryStore, RedisStore, SubmissionStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct AppState {
    pub sessions: SessionManager,
    pub languages: LanguageConfigManager,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new().merge(routes::routes()).with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Codepanel API booting...");

    let config = AppConfig::from_env();

    // Load language configurations
    let languages = LanguageConfigManager::load_or_default(Path::new(&config.languages_path))
        .with_context(|| format!("Failed to load language config from {}", config.languages_path))?;
    info!("Loaded language configurations for: {:?}", languages.list_languages());

    let catalog = match &config.problems_path {
        Some(path) => ProblemCatalog::load(Path::new(path))
            .with_context(|| format!("Failed to load problem catalog from {}", path))?,
        None => ProblemCatalog::builtin(),
    };
    info!(problems = catalog.problems().len(), "Problem catalog ready");

    // Stores: Redis when configured, process memory otherwise
    let (assignments, submissions): (Arc<dyn AssignmentStore>, Arc<dyn SubmissionStore>) =
        match &config.redis_url {
            Some(url) => {
                let store = Arc::new(
                    RedisStore::connect(url)
                        .await
                        .with_context(|| format!("Failed to connect to Redis at {}", url))?,
                );
                info!("Connected to Redis: {}", url);
                (
                    store.clone() as Arc<dyn AssignmentStore>,
                    store as Arc<dyn SubmissionStore>,
                )
            }
            None => {
                warn!("REDIS_URL not set, assignments and submissions are kept in memory");
                let store = Arc::new(MemoryStore::new());
                (
                    store.clone() as Arc<dyn AssignmentStore>,
                    store as Arc<dyn SubmissionStore>,
                )
            }
        };

    let timeout = Duration::from_millis(config.execution_timeout_ms);
    let engine = PistonEngine::new(config.piston_url.clone(), languages.clone(), timeout)
        .context("Failed to build execution client")?;
    info!(
        endpoint = %config.piston_url,
        timeout_ms = config.execution_timeout_ms,
        max_parallel = config.max_parallel_examples,
        "Execution gateway configured"
    );

    let verdicts = VerdictEngine::new(Arc::new(engine), timeout, config.max_parallel_examples);
    let state = Arc::new(AppState {
        sessions: SessionManager::new(Arc::new(catalog), verdicts, assignments, submissions),
        languages,
    });

    // Drop editor state of interviews nobody touched for a while
    let sweeper = Arc::clone(&state);
    let max_idle = Duration::from_secs(config.session_idle_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.sessions.evict_idle(max_idle).await;
        }
    });
    info!(idle_secs = config.session_idle_secs, "Idle session sweeper started");

    // Start server
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("API shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Received shutdown signal, finishing in-flight requests...");
}
