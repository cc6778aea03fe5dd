// Assignment and submission stores.
// Both are externally owned records keyed by session id; this module only
// defines the read/write contract and two backends for it.

use crate::error::StoreError;
use async_trait::async_trait;
use codepanel_common::redis as keys;
use codepanel_common::types::Submission;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn get_assignment(&self, session_id: &str) -> Result<Option<String>, StoreError>;

    async fn set_assignment(&self, session_id: &str, question_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn append_submission(&self, submission: &Submission) -> Result<(), StoreError>;

    /// Oldest first
    async fn list_submissions(&self, session_id: &str) -> Result<Vec<Submission>, StoreError>;
}

/// Process-local store, used when no Redis is configured and in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    assignments: RwLock<HashMap<String, String>>,
    submissions: RwLock<HashMap<String, Vec<Submission>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn get_assignment(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.assignments.read().await.get(session_id).cloned())
    }

    async fn set_assignment(&self, session_id: &str, question_id: &str) -> Result<(), StoreError> {
        self.assignments
            .write()
            .await
            .insert(session_id.to_string(), question_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn append_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        self.submissions
            .write()
            .await
            .entry(submission.session_id.clone())
            .or_default()
            .push(submission.clone());
        Ok(())
    }

    async fn list_submissions(&self, session_id: &str) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .submissions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Redis-backed store; see `codepanel_common::redis` for the key layout
#[derive(Clone)]
pub struct RedisStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl AssignmentStore for RedisStore {
    async fn get_assignment(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(keys::get_assignment(&mut conn, session_id).await?)
    }

    async fn set_assignment(&self, session_id: &str, question_id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        Ok(keys::set_assignment(&mut conn, session_id, question_id).await?)
    }
}

#[async_trait]
impl SubmissionStore for RedisStore {
    async fn append_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        Ok(keys::append_submission(&mut conn, submission).await?)
    }

    async fn list_submissions(&self, session_id: &str) -> Result<Vec<Submission>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(keys::list_submissions(&mut conn, session_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use codepanel_common::types::{Language, SubmissionStatus};
    use uuid::Uuid;

    fn submission(session_id: &str, code: &str) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            question_id: "two-sum".to_string(),
            code: code.to_string(),
            language: Language::Python,
            submitted_at: Utc::now(),
            status: SubmissionStatus::Passed,
            test_results: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_memory_assignment_overwrite() {
        let store = MemoryStore::new();
        assert_eq!(store.get_assignment("s1").await.unwrap(), None);

        store.set_assignment("s1", "two-sum").await.unwrap();
        store.set_assignment("s1", "reverse-string").await.unwrap();

        assert_eq!(
            store.get_assignment("s1").await.unwrap().as_deref(),
            Some("reverse-string")
        );
        assert_eq!(store.get_assignment("s2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_submissions_keep_order_per_session() {
        let store = MemoryStore::new();
        store.append_submission(&submission("s1", "first")).await.unwrap();
        store.append_submission(&submission("s2", "other")).await.unwrap();
        store.append_submission(&submission("s1", "second")).await.unwrap();

        let listed = store.list_submissions("s1").await.unwrap();

        let codes: Vec<&str> = listed.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["first", "second"]);
        assert!(store.list_submissions("none").await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_store_round_trip() {
        let store = RedisStore::connect("redis://127.0.0.1:6379").await.unwrap();
        let session_id = format!("test-{}", Uuid::new_v4());

        store.set_assignment(&session_id, "two-sum").await.unwrap();
        let first = submission(&session_id, "first");
        store.append_submission(&first).await.unwrap();

        assert_eq!(
            store.get_assignment(&session_id).await.unwrap().as_deref(),
            Some("two-sum")
        );
        assert_eq!(store.list_submissions(&session_id).await.unwrap(), vec![first]);
    }
}
