use lesson_core::model::{LearnerId, QuestionAttempt, QuestionProgress};
use sqlx::{Sqlite, Transaction};

use super::{
    SqliteRepository,
    mapping::{map_attempt_row, u64_to_i64},
    progress_repo::upsert_progress_query,
};
use crate::repository::{AttemptRepository, ReviewPersistence, StorageError};

async fn insert_attempt<'e, E>(
    executor: E,
    learner: &LearnerId,
    attempt: &QuestionAttempt,
) -> Result<(), StorageError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let time_ms = u64_to_i64("time_to_complete_ms", attempt.time_to_complete_ms)?;

    sqlx::query(
        r"
            INSERT INTO question_attempts (
                learner_id, question_id, skill_id, correct, time_to_complete_ms, attempted_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
    )
    .bind(learner.as_str())
    .bind(attempt.question_id.as_str())
    .bind(attempt.skill_id.as_str())
    .bind(attempt.correct)
    .bind(time_ms)
    .bind(attempt.attempted_at)
    .execute(executor)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    Ok(())
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(
        &self,
        learner: &LearnerId,
        attempt: &QuestionAttempt,
    ) -> Result<(), StorageError> {
        insert_attempt(&self.pool, learner, attempt).await
    }

    async fn attempts(&self, learner: &LearnerId) -> Result<Vec<QuestionAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id, skill_id, correct, time_to_complete_ms, attempted_at
                FROM question_attempts
                WHERE learner_id = ?1
                ORDER BY attempted_at ASC, id ASC
            ",
        )
        .bind(learner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl ReviewPersistence for SqliteRepository {
    async fn record_attempt(
        &self,
        learner: &LearnerId,
        attempt: &QuestionAttempt,
        progress: &QuestionProgress,
    ) -> Result<(), StorageError> {
        if attempt.question_id != progress.question_id {
            return Err(StorageError::Conflict);
        }

        let mut tx: Transaction<'_, Sqlite> = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        insert_attempt(&mut *tx, learner, attempt).await?;

        upsert_progress_query(learner, progress)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
