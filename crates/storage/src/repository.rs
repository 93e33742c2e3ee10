use async_trait::async_trait;
use lesson_core::model::{
    LearnerId, LearnerProgress, QuestionAttempt, QuestionId, QuestionProgress,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Append-only answer history, scoped per learner.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append one attempt to the learner's history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(
        &self,
        learner: &LearnerId,
        attempt: &QuestionAttempt,
    ) -> Result<(), StorageError>;

    /// All attempts of a learner, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be read.
    async fn attempts(&self, learner: &LearnerId) -> Result<Vec<QuestionAttempt>, StorageError>;
}

/// Per-question mastery state, scoped per learner.
#[async_trait]
pub trait QuestionProgressRepository: Send + Sync {
    /// Fetch progress for one question, `None` if never attempted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_progress(
        &self,
        learner: &LearnerId,
        question_id: &QuestionId,
    ) -> Result<Option<QuestionProgress>, StorageError>;

    /// Fetch progress for several questions, in request order.
    ///
    /// Questions without stored progress are skipped rather than reported.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_progress_many(
        &self,
        learner: &LearnerId,
        question_ids: &[QuestionId],
    ) -> Result<Vec<QuestionProgress>, StorageError>;

    /// Every stored progress record of a learner, ordered by question id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn all_progress(&self, learner: &LearnerId) -> Result<Vec<QuestionProgress>, StorageError>;

    /// Insert or replace the progress record for `progress.question_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(
        &self,
        learner: &LearnerId,
        progress: &QuestionProgress,
    ) -> Result<(), StorageError>;
}

/// Persist an attempt together with the progress it produced.
#[async_trait]
pub trait ReviewPersistence: Send + Sync {
    /// Append `attempt` and upsert `progress` as one unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt and progress refer to
    /// different questions, or other storage errors. Nothing is written on error.
    async fn record_attempt(
        &self,
        learner: &LearnerId,
        attempt: &QuestionAttempt,
        progress: &QuestionProgress,
    ) -> Result<(), StorageError>;
}

/// Gamification state (XP, streak, hearts, badges), one record per learner.
#[async_trait]
pub trait LearnerProgressRepository: Send + Sync {
    /// Fetch the learner's record, `None` if they never completed a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn get_learner_progress(
        &self,
        learner: &LearnerId,
    ) -> Result<Option<LearnerProgress>, StorageError>;

    /// Insert or replace the learner's record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_learner_progress(
        &self,
        learner: &LearnerId,
        progress: &LearnerProgress,
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

#[derive(Debug, Default)]
struct LearnerBucket {
    attempts: Vec<QuestionAttempt>,
    progress: HashMap<QuestionId, QuestionProgress>,
    learner: Option<LearnerProgress>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    learners: Arc<Mutex<HashMap<LearnerId, LearnerBucket>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            learners: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<LearnerId, LearnerBucket>>, StorageError> {
        self.learners
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(
        &self,
        learner: &LearnerId,
        attempt: &QuestionAttempt,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .entry(learner.clone())
            .or_default()
            .attempts
            .push(attempt.clone());
        Ok(())
    }

    async fn attempts(&self, learner: &LearnerId) -> Result<Vec<QuestionAttempt>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .get(learner)
            .map(|bucket| bucket.attempts.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl QuestionProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        learner: &LearnerId,
        question_id: &QuestionId,
    ) -> Result<Option<QuestionProgress>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .get(learner)
            .and_then(|bucket| bucket.progress.get(question_id))
            .cloned())
    }

    async fn get_progress_many(
        &self,
        learner: &LearnerId,
        question_ids: &[QuestionId],
    ) -> Result<Vec<QuestionProgress>, StorageError> {
        let guard = self.lock()?;
        let Some(bucket) = guard.get(learner) else {
            return Ok(Vec::new());
        };
        Ok(question_ids
            .iter()
            .filter_map(|id| bucket.progress.get(id).cloned())
            .collect())
    }

    async fn all_progress(&self, learner: &LearnerId) -> Result<Vec<QuestionProgress>, StorageError> {
        let guard = self.lock()?;
        let mut all: Vec<QuestionProgress> = guard
            .get(learner)
            .map(|bucket| bucket.progress.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        Ok(all)
    }

    async fn upsert_progress(
        &self,
        learner: &LearnerId,
        progress: &QuestionProgress,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .entry(learner.clone())
            .or_default()
            .progress
            .insert(progress.question_id.clone(), progress.clone());
        Ok(())
    }
}

#[async_trait]
impl ReviewPersistence for InMemoryRepository {
    async fn record_attempt(
        &self,
        learner: &LearnerId,
        attempt: &QuestionAttempt,
        progress: &QuestionProgress,
    ) -> Result<(), StorageError> {
        if attempt.question_id != progress.question_id {
            return Err(StorageError::Conflict);
        }

        // Single guard so both writes land together.
        let mut guard = self.lock()?;
        let bucket = guard.entry(learner.clone()).or_default();
        bucket.attempts.push(attempt.clone());
        bucket
            .progress
            .insert(progress.question_id.clone(), progress.clone());
        Ok(())
    }
}

#[async_trait]
impl LearnerProgressRepository for InMemoryRepository {
    async fn get_learner_progress(
        &self,
        learner: &LearnerId,
    ) -> Result<Option<LearnerProgress>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.get(learner).and_then(|bucket| bucket.learner.clone()))
    }

    async fn upsert_learner_progress(
        &self,
        learner: &LearnerId,
        progress: &LearnerProgress,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.entry(learner.clone()).or_default().learner = Some(progress.clone());
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn AttemptRepository>,
    pub progress: Arc<dyn QuestionProgressRepository>,
    pub reviews: Arc<dyn ReviewPersistence>,
    pub learners: Arc<dyn LearnerProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn QuestionProgressRepository> = Arc::new(repo.clone());
        let reviews: Arc<dyn ReviewPersistence> = Arc::new(repo.clone());
        let learners: Arc<dyn LearnerProgressRepository> = Arc::new(repo);
        Self {
            attempts,
            progress,
            reviews,
            learners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{AttemptInput, SkillId};
    use lesson_core::scheduler::Scheduler;
    use lesson_core::time::fixed_now;

    fn learner(id: &str) -> LearnerId {
        LearnerId::new(id)
    }

    fn answered(question: &str, correct: bool) -> (QuestionAttempt, QuestionProgress) {
        let scheduler = Scheduler::new();
        let mut progress = scheduler.unseen_progress(QuestionId::new(question), SkillId::new("s"));
        let attempt = scheduler.apply_attempt(
            &mut progress,
            AttemptInput::new(question, "s", correct, 500),
            fixed_now(),
        );
        (attempt, progress)
    }

    #[tokio::test]
    async fn round_trips_question_progress() {
        let repo = InMemoryRepository::new();
        let (_, progress) = answered("q1", true);

        repo.upsert_progress(&learner("a"), &progress).await.unwrap();

        let fetched = repo
            .get_progress(&learner("a"), &QuestionId::new("q1"))
            .await
            .unwrap();
        assert_eq!(fetched, Some(progress));
    }

    #[tokio::test]
    async fn learners_are_isolated() {
        let repo = InMemoryRepository::new();
        let (attempt, progress) = answered("q1", false);
        repo.record_attempt(&learner("a"), &attempt, &progress)
            .await
            .unwrap();

        assert_eq!(repo.attempts(&learner("a")).await.unwrap().len(), 1);
        assert!(repo.attempts(&learner("b")).await.unwrap().is_empty());
        assert!(
            repo.get_progress(&learner("b"), &QuestionId::new("q1"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn get_many_follows_request_order_and_skips_missing() {
        let repo = InMemoryRepository::new();
        for q in ["q1", "q2", "q3"] {
            let (_, progress) = answered(q, true);
            repo.upsert_progress(&learner("a"), &progress).await.unwrap();
        }

        let ids = [
            QuestionId::new("q3"),
            QuestionId::new("missing"),
            QuestionId::new("q1"),
        ];
        let found = repo.get_progress_many(&learner("a"), &ids).await.unwrap();
        let order: Vec<&str> = found.iter().map(|p| p.question_id.as_str()).collect();
        assert_eq!(order, ["q3", "q1"]);

        let all = repo.all_progress(&learner("a")).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].question_id, QuestionId::new("q1"));
    }

    #[tokio::test]
    async fn record_attempt_rejects_mismatched_question() {
        let repo = InMemoryRepository::new();
        let (attempt, _) = answered("q1", true);
        let (_, other) = answered("q2", true);

        let err = repo
            .record_attempt(&learner("a"), &attempt, &other)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert!(repo.attempts(&learner("a")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_handles_share_state() {
        let storage = Storage::in_memory();
        let (attempt, _) = answered("q1", true);
        storage
            .attempts
            .append_attempt(&learner("a"), &attempt)
            .await
            .unwrap();

        let progress = LearnerProgress {
            xp: 40,
            ..LearnerProgress::default()
        };
        storage
            .learners
            .upsert_learner_progress(&learner("a"), &progress)
            .await
            .unwrap();

        assert_eq!(storage.attempts.attempts(&learner("a")).await.unwrap(), vec![attempt]);
        assert_eq!(
            storage.learners.get_learner_progress(&learner("a")).await.unwrap(),
            Some(progress)
        );
    }
}
