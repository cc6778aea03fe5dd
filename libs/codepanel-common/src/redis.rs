use crate::types::Submission;
use redis::{AsyncCommands, RedisResult};

/// Redis key semantics for interview session records
/// Keeps API and CLI readers in agreement on where a session's
/// assignment and submissions live

pub const ASSIGNMENT_PREFIX: &str = "codepanel:assignment";
pub const SUBMISSIONS_PREFIX: &str = "codepanel:submissions";

/// Key holding the question id assigned to a session
pub fn assignment_key(session_id: &str) -> String {
    format!("{}:{}", ASSIGNMENT_PREFIX, session_id)
}

/// Key holding the ordered submission list of a session
pub fn submissions_key(session_id: &str) -> String {
    format!("{}:{}", SUBMISSIONS_PREFIX, session_id)
}

fn serialization_error(e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::TypeError, "serialization error", e.to_string()))
}

/// Read the assigned question id, if any
pub async fn get_assignment(
    conn: &mut redis::aio::ConnectionManager,
    session_id: &str,
) -> RedisResult<Option<String>> {
    conn.get(assignment_key(session_id)).await
}

/// Overwrite the assignment; a session has at most one
pub async fn set_assignment(
    conn: &mut redis::aio::ConnectionManager,
    session_id: &str,
    question_id: &str,
) -> RedisResult<()> {
    conn.set(assignment_key(session_id), question_id).await
}

/// Append a submission to the session list
/// Uses RPUSH so LRANGE returns submissions in admission order
pub async fn append_submission(
    conn: &mut redis::aio::ConnectionManager,
    submission: &Submission,
) -> RedisResult<()> {
    let key = submissions_key(&submission.session_id);
    let payload = serde_json::to_string(submission).map_err(serialization_error)?;

    let _: () = conn.rpush(&key, payload).await?;
    Ok(())
}

/// List every submission of a session, oldest first
pub async fn list_submissions(
    conn: &mut redis::aio::ConnectionManager,
    session_id: &str,
) -> RedisResult<Vec<Submission>> {
    let payloads: Vec<String> = conn.lrange(submissions_key(session_id), 0, -1).await?;

    payloads
        .iter()
        .map(|data| {
            serde_json::from_str(data).map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "deserialization error",
                    e.to_string(),
                ))
            })
        })
        .collect()
}
