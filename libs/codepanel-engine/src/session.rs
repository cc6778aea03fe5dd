/// Interview Sessions - UI Boundary of the Validation Engine
///
/// **Responsibility:**
/// Own each interview's live coding state and expose the only mutating
/// entry points: select question, select language, edit code, run tests,
/// submit.
///
/// **Ownership:**
/// - A session exclusively owns its gate (editor source + verdict state)
/// - At most one run is live per session; starting a run supersedes any
///   in-flight one, whose result is then discarded
/// - Sessions exist only once something mutated them; idle ones are
///   evicted by `evict_idle`, after which the next action starts over
///   from the stored assignment
/// - Assignment and submissions live in external stores keyed by session id
///
/// **Consistency:**
/// - The assignment is re-read before every action; a changed assignment
///   resets the gate before anything else happens
/// - A run is applied only if it is still the latest started run and the
///   editor still holds the tested code
/// - Submission persistence happens while the session is locked, so one
///   submit action writes at most once

use crate::catalog::ProblemCatalog;
use crate::error::CoreError;
use crate::executor::VerdictEngine;
use crate::gate::{GateView, SubmissionGate};
use crate::store::{AssignmentStore, SubmissionStore};
use chrono::Utc;
use codepanel_common::types::{Language, Problem, RunResult, Submission, SubmissionStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Who is calling; identity itself is resolved elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Interviewer,
    Candidate,
}

#[derive(Debug)]
struct InterviewSession {
    gate: SubmissionGate,
    /// Incremented every time a run starts
    run_generation: u64,
}

struct SessionEntry {
    session: Arc<Mutex<InterviewSession>>,
    last_touched: Instant,
}

pub struct SessionManager {
    catalog: Arc<ProblemCatalog>,
    verdicts: VerdictEngine,
    assignments: Arc<dyn AssignmentStore>,
    submissions: Arc<dyn SubmissionStore>,
    default_language: Language,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionManager {
    pub fn new(
        catalog: Arc<ProblemCatalog>,
        verdicts: VerdictEngine,
        assignments: Arc<dyn AssignmentStore>,
        submissions: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            catalog,
            verdicts,
            assignments,
            submissions,
            default_language: Language::JavaScript,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &ProblemCatalog {
        &self.catalog
    }

    /// Live session for a mutating action, created on first use
    async fn session(&self, session_id: &str) -> Arc<Mutex<InterviewSession>> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                session: Arc::new(Mutex::new(InterviewSession {
                    gate: SubmissionGate::new(None, self.default_language, ""),
                    run_generation: 0,
                })),
                last_touched: Instant::now(),
            });
        entry.last_touched = Instant::now();
        Arc::clone(&entry.session)
    }

    async fn existing_session(&self, session_id: &str) -> Option<Arc<Mutex<InterviewSession>>> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|entry| Arc::clone(&entry.session))
    }

    /// Drop sessions untouched for `max_idle`
    ///
    /// A session still referenced elsewhere (a run in flight, an action
    /// waiting on its lock) is kept. Returns the number of evicted sessions.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_touched.elapsed() < max_idle || Arc::strong_count(&entry.session) > 1
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    fn problem(&self, question_id: &str) -> Result<&Problem, CoreError> {
        self.catalog
            .get(question_id)
            .ok_or_else(|| CoreError::UnknownProblem(question_id.to_string()))
    }

    fn starter_for(&self, question_id: Option<&str>, language: Language) -> String {
        question_id
            .and_then(|id| self.catalog.get(id))
            .and_then(|p| p.starter_code(language))
            .unwrap_or_default()
            .to_string()
    }

    /// Bring the gate in line with the externally stored assignment
    async fn sync_assignment(
        &self,
        session_id: &str,
        session: &mut InterviewSession,
    ) -> Result<(), CoreError> {
        let assigned = self.assignments.get_assignment(session_id).await?;
        if assigned.as_deref() != session.gate.question_id() {
            info!(
                session_id,
                previous = ?session.gate.question_id(),
                assigned = ?assigned,
                "Assignment changed, resetting session"
            );
            let starter = self.starter_for(assigned.as_deref(), session.gate.language());
            session.gate.reassign(assigned, &starter);
            session.run_generation += 1;
        }
        Ok(())
    }

    /// The problem currently assigned to the session, if any
    pub async fn active_problem(&self, session_id: &str) -> Result<Option<Problem>, CoreError> {
        match self.assignments.get_assignment(session_id).await? {
            Some(question_id) => Ok(Some(self.problem(&question_id)?.clone())),
            None => Ok(None),
        }
    }

    /// Interviewer assigns a question, replacing any previous assignment
    ///
    /// The editor always resets, even when the same question is assigned again.
    #[instrument(skip(self))]
    pub async fn select_question(
        &self,
        session_id: &str,
        question_id: &str,
        role: Role,
    ) -> Result<Problem, CoreError> {
        if role != Role::Interviewer {
            return Err(CoreError::Forbidden);
        }
        let problem = self.problem(question_id)?.clone();

        let session = self.session(session_id).await;
        let mut session = session.lock().await;

        self.assignments.set_assignment(session_id, question_id).await?;
        let starter = self.starter_for(Some(question_id), session.gate.language());
        session.gate.reassign(Some(question_id.to_string()), &starter);
        session.run_generation += 1;

        info!(session_id, question_id, title = %problem.title, "Question assigned");
        Ok(problem)
    }

    /// Candidate switches language; the editor resets to that starter code
    #[instrument(skip(self))]
    pub async fn select_language(
        &self,
        session_id: &str,
        language: Language,
    ) -> Result<GateView, CoreError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;
        self.sync_assignment(session_id, &mut session).await?;

        if let Some(question_id) = session.gate.question_id() {
            if !self.problem(question_id)?.supports(language) {
                return Err(CoreError::UnsupportedLanguage(language));
            }
        }

        let starter = self.starter_for(session.gate.question_id(), language);
        session.gate.select_language(language, &starter);
        Ok(session.gate.view())
    }

    /// Candidate edited the code
    pub async fn edit_code(&self, session_id: &str, code: &str) -> Result<GateView, CoreError> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;
        self.sync_assignment(session_id, &mut session).await?;

        session.gate.edit(code);
        Ok(session.gate.view())
    }

    /// Snapshot of the session; never creates one
    pub async fn view(&self, session_id: &str) -> Result<GateView, CoreError> {
        match self.existing_session(session_id).await {
            Some(session) => {
                let mut session = session.lock().await;
                self.sync_assignment(session_id, &mut session).await?;
                Ok(session.gate.view())
            }
            None => {
                let assigned = self.assignments.get_assignment(session_id).await?;
                let starter = self.starter_for(assigned.as_deref(), self.default_language);
                Ok(SubmissionGate::new(assigned, self.default_language, &starter).view())
            }
        }
    }

    /// Run every example of the assigned problem against the editor code
    ///
    /// `code`, when given, is applied as an edit first. The session lock is
    /// not held while examples execute; the result is applied only if no
    /// newer run started and the editor still holds the tested code.
    #[instrument(skip(self, code))]
    pub async fn run_tests(
        &self,
        session_id: &str,
        code: Option<&str>,
    ) -> Result<RunResult, CoreError> {
        let session = self.session(session_id).await;

        // Phase 1: snapshot what is being tested and claim the run slot
        let (generation, problem, language, source) = {
            let mut guard = session.lock().await;
            self.sync_assignment(session_id, &mut guard).await?;

            if let Some(code) = code {
                guard.gate.edit(code);
            }

            let question_id = guard.gate.question_id().ok_or(CoreError::NoAssignment)?;
            let problem = self.problem(question_id)?.clone();
            let language = guard.gate.language();
            let source = guard.gate.source().to_string();
            VerdictEngine::check_solution(&problem, language, &source)?;

            guard.run_generation += 1;
            (guard.run_generation, problem, language, source)
        };

        // Phase 2: execute without holding the session
        let run = self.verdicts.run(&problem, language, &source).await?;

        // Phase 3: apply only the latest run
        let mut guard = session.lock().await;
        if guard.run_generation != generation {
            warn!(session_id, generation, latest = guard.run_generation, "Discarding superseded run");
            return Err(CoreError::Superseded);
        }
        if let Err(e) = guard.gate.record_run(run.clone(), &source) {
            warn!(session_id, run_id = %run.run_id, "Discarding run for code that changed meanwhile");
            return Err(e.into());
        }

        info!(
            session_id,
            question_id = %run.question_id,
            passed = run.passed_count,
            total = run.total,
            "Run recorded"
        );
        Ok(run)
    }

    /// Persist the editor code as a submission, if the gate admits it
    ///
    /// `code`, when given, is the code the caller believes it is submitting;
    /// any drift from the tested code is rejected as stale.
    #[instrument(skip(self, code))]
    pub async fn submit(&self, session_id: &str, code: Option<&str>) -> Result<Submission, CoreError> {
        let session = self.session(session_id).await;
        let mut guard = session.lock().await;
        self.sync_assignment(session_id, &mut guard).await?;

        let question_id = guard
            .gate
            .question_id()
            .ok_or(CoreError::NoAssignment)?
            .to_string();
        let problem = self.problem(&question_id)?;
        let language = guard.gate.language();
        let submitted = code.unwrap_or(guard.gate.source()).to_string();
        VerdictEngine::check_solution(problem, language, &submitted)?;

        let run = guard.gate.admit(&submitted)?;
        let submission = Submission {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            question_id,
            code: submitted,
            language,
            submitted_at: Utc::now(),
            status: SubmissionStatus::Passed,
            test_results: run.test_results.clone(),
        };

        if let Err(e) = self.submissions.append_submission(&submission).await {
            error!(session_id, error = %e, "Failed to persist submission");
            return Err(CoreError::Persistence(e.to_string()));
        }

        guard.gate.mark_submitted(submission.id);
        info!(
            session_id,
            submission_id = %submission.id,
            question_id = %submission.question_id,
            language = %submission.language,
            "Solution submitted"
        );
        Ok(submission)
    }

    pub async fn submissions(&self, session_id: &str) -> Result<Vec<Submission>, CoreError> {
        Ok(self.submissions.list_submissions(session_id).await?)
    }
}
