use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use lesson_core::{
    analytics::{WeakSkillPolicy, build_analytics},
    model::{
        AttemptInput, AvailableQuestion, LearnerId, QuestionId, QuestionProgress, ReviewSummary,
        SkillId,
    },
    queue::QueuePolicy,
    scheduler::Scheduler,
    time::Clock,
};
use storage::repository::{
    AttemptRepository, QuestionProgressRepository, ReviewPersistence, Storage,
};

pub use crate::error::ReviewServiceError;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Records answer attempts and builds the prioritized review summary.
///
/// Learner state lives entirely in the injected repositories; the service
/// holds no per-learner data, so one instance serves every learner.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    scheduler: Scheduler,
    weak_skills: WeakSkillPolicy,
    queue: QueuePolicy,
    attempts: Arc<dyn AttemptRepository>,
    progress: Arc<dyn QuestionProgressRepository>,
    reviews: Arc<dyn ReviewPersistence>,
}

impl ReviewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        attempts: Arc<dyn AttemptRepository>,
        progress: Arc<dyn QuestionProgressRepository>,
        reviews: Arc<dyn ReviewPersistence>,
    ) -> Self {
        Self {
            clock,
            scheduler: Scheduler::new(),
            weak_skills: WeakSkillPolicy::default(),
            queue: QueuePolicy::default(),
            attempts,
            progress,
            reviews,
        }
    }

    /// Build a service over every repository of a `Storage` aggregate.
    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.attempts),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.reviews),
        )
    }

    /// Replace the interval ladder scheduler.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replace the weak-skill and queue classification policies.
    #[must_use]
    pub fn with_policies(mut self, weak_skills: WeakSkillPolicy, queue: QueuePolicy) -> Self {
        self.weak_skills = weak_skills;
        self.queue = queue;
        self
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Record an answer at the service clock's current time.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged if reading or persisting fails.
    pub async fn record_attempt(
        &self,
        learner: &LearnerId,
        input: AttemptInput,
    ) -> Result<QuestionProgress, ReviewServiceError> {
        self.record_attempt_at(learner, input, self.now()).await
    }

    /// Record an answer and return the updated progress for its question.
    ///
    /// - Reads stored progress, or starts from the unseen default.
    /// - Advances or resets the interval ladder depending on the outcome.
    /// - Appends the attempt and upserts the progress together; nothing is
    ///   reported as recorded until both writes succeed.
    ///
    /// Concurrent attempts on the same question race on read-modify-write;
    /// the last write wins.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged if reading or persisting fails.
    pub async fn record_attempt_at(
        &self,
        learner: &LearnerId,
        input: AttemptInput,
        now: DateTime<Utc>,
    ) -> Result<QuestionProgress, ReviewServiceError> {
        let mut progress = match self.progress.get_progress(learner, &input.question_id).await? {
            Some(existing) => existing,
            None => self
                .scheduler
                .unseen_progress(input.question_id.clone(), input.skill_id.clone()),
        };

        let attempt = self.scheduler.apply_attempt(&mut progress, input, now);
        self.reviews
            .record_attempt(learner, &attempt, &progress)
            .await?;

        tracing::debug!(
            learner = %learner,
            question = %progress.question_id,
            correct = attempt.correct,
            streak = progress.correct_streak,
            interval_days = progress.interval_days,
            "Recorded question attempt"
        );

        Ok(progress)
    }

    /// Build the review summary at the service clock's current time.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged if reading fails.
    pub async fn build_review_summary(
        &self,
        learner: &LearnerId,
        available: &[AvailableQuestion],
    ) -> Result<ReviewSummary, ReviewServiceError> {
        self.build_review_summary_at(learner, available, self.now())
            .await
    }

    /// Combine analytics, weak skills and per-question progress into the review queue.
    ///
    /// `available` is the caller's list of questions the learner may see; one
    /// queue item is produced per entry, sorted by descending priority with
    /// ties kept in the order given. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns storage errors unchanged if reading fails.
    pub async fn build_review_summary_at(
        &self,
        learner: &LearnerId,
        available: &[AvailableQuestion],
        now: DateTime<Utc>,
    ) -> Result<ReviewSummary, ReviewServiceError> {
        let history = self.attempts.attempts(learner).await?;
        let analytics = build_analytics(&history);
        let weak_skills = self.weak_skills.weak_skills(&analytics);
        let weak_set: HashSet<SkillId> = weak_skills.iter().cloned().collect();

        let question_progress = self.progress_for(learner, available).await?;
        let queue = self.queue.build_queue(&question_progress, now, &weak_set);

        tracing::debug!(
            learner = %learner,
            available = available.len(),
            attempts = history.len(),
            weak_skills = weak_skills.len(),
            top_priority = queue.first().map_or(0, |item| item.priority),
            "Built review summary"
        );

        Ok(ReviewSummary {
            queue,
            weak_skills,
            analytics,
            question_progress,
        })
    }

    /// Stored or default progress for each available question, in input order.
    async fn progress_for(
        &self,
        learner: &LearnerId,
        available: &[AvailableQuestion],
    ) -> Result<Vec<QuestionProgress>, ReviewServiceError> {
        let ids: Vec<QuestionId> = available.iter().map(|q| q.question_id.clone()).collect();
        let stored: HashMap<QuestionId, QuestionProgress> = self
            .progress
            .get_progress_many(learner, &ids)
            .await?
            .into_iter()
            .map(|p| (p.question_id.clone(), p))
            .collect();

        Ok(available
            .iter()
            .map(|q| match stored.get(&q.question_id) {
                Some(existing) => existing.clone(),
                None => self
                    .scheduler
                    .unseen_progress(q.question_id.clone(), q.skill_id.clone()),
            })
            .collect())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
