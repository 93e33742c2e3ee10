use lesson_core::model::{LearnerId, LearnerProgress};

use super::{
    SqliteRepository,
    mapping::{badges_to_json, map_learner_row},
};
use crate::repository::{LearnerProgressRepository, StorageError};

#[async_trait::async_trait]
impl LearnerProgressRepository for SqliteRepository {
    async fn get_learner_progress(
        &self,
        learner: &LearnerId,
    ) -> Result<Option<LearnerProgress>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT xp, level, streak_count, last_active_date, hearts, badges
                FROM learner_progress
                WHERE learner_id = ?1
            ",
        )
        .bind(learner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_learner_row).transpose()
    }

    async fn upsert_learner_progress(
        &self,
        learner: &LearnerId,
        progress: &LearnerProgress,
    ) -> Result<(), StorageError> {
        let badges = badges_to_json(&progress.badges)?;

        sqlx::query(
            r"
                INSERT INTO learner_progress (
                    learner_id, xp, level, streak_count, last_active_date, hearts, badges
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(learner_id) DO UPDATE SET
                    xp = excluded.xp,
                    level = excluded.level,
                    streak_count = excluded.streak_count,
                    last_active_date = excluded.last_active_date,
                    hearts = excluded.hearts,
                    badges = excluded.badges
            ",
        )
        .bind(learner.as_str())
        .bind(i64::from(progress.xp))
        .bind(i64::from(progress.level))
        .bind(i64::from(progress.streak_count))
        .bind(progress.last_active_date)
        .bind(i64::from(progress.hearts))
        .bind(badges)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
