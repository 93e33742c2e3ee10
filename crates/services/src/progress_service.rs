use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use lesson_core::{
    Clock,
    model::{LearnerId, LearnerProgress, LessonCompletion},
    progression::{apply_lesson_completion, xp_to_next_level},
};
use storage::repository::LearnerProgressRepository;

use crate::error::ProgressServiceError;

/// Learner progress plus the XP still needed for the next level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgressView {
    pub progress: LearnerProgress,
    pub xp_to_next_level: u32,
}

impl LearnerProgressView {
    fn new(progress: LearnerProgress) -> Self {
        let xp_to_next_level = xp_to_next_level(progress.xp);
        Self {
            progress,
            xp_to_next_level,
        }
    }
}

/// Outcome of a finished lesson after it has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletionResult {
    pub progress: LearnerProgress,
    pub xp_to_next_level: u32,
    pub level_up: bool,
}

/// Tracks XP, levels, daily streaks, hearts and badges per learner.
#[derive(Clone)]
pub struct LearnerProgressService {
    clock: Clock,
    learners: Arc<dyn LearnerProgressRepository>,
}

impl LearnerProgressService {
    #[must_use]
    pub fn new(clock: Clock, learners: Arc<dyn LearnerProgressRepository>) -> Self {
        Self { clock, learners }
    }

    /// Stored progress, or the starting state for a learner with none yet.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the record cannot be read.
    pub async fn current(
        &self,
        learner: &LearnerId,
    ) -> Result<LearnerProgressView, ProgressServiceError> {
        let progress = self
            .learners
            .get_learner_progress(learner)
            .await?
            .unwrap_or_default();
        Ok(LearnerProgressView::new(progress))
    }

    /// Apply a finished lesson at the service clock's current time.
    ///
    /// # Errors
    ///
    /// Returns storage errors if reading or persisting fails.
    pub async fn complete_lesson(
        &self,
        learner: &LearnerId,
        completion: &LessonCompletion,
    ) -> Result<LessonCompletionResult, ProgressServiceError> {
        self.complete_lesson_at(learner, completion, self.clock.now())
            .await
    }

    /// Apply a finished lesson and persist the new learner state.
    ///
    /// # Errors
    ///
    /// Returns storage errors if reading or persisting fails.
    pub async fn complete_lesson_at(
        &self,
        learner: &LearnerId,
        completion: &LessonCompletion,
        now: DateTime<Utc>,
    ) -> Result<LessonCompletionResult, ProgressServiceError> {
        let current = self
            .learners
            .get_learner_progress(learner)
            .await?
            .unwrap_or_default();

        let outcome = apply_lesson_completion(&current, completion, now);
        self.learners
            .upsert_learner_progress(learner, &outcome.progress)
            .await?;

        if outcome.level_up {
            tracing::info!(
                learner = %learner,
                level = outcome.progress.level,
                "Learner leveled up"
            );
        }
        tracing::debug!(
            learner = %learner,
            xp = outcome.progress.xp,
            streak = outcome.progress.streak_count,
            "Lesson completed"
        );

        Ok(LessonCompletionResult {
            xp_to_next_level: xp_to_next_level(outcome.progress.xp),
            level_up: outcome.level_up,
            progress: outcome.progress,
        })
    }
}
