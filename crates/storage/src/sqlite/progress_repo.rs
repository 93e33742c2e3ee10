use std::collections::HashMap;

use lesson_core::model::{LearnerId, QuestionId, QuestionProgress};
use sqlx::sqlite::SqliteArguments;
use sqlx::{QueryBuilder, Sqlite, query::Query};

use super::{SqliteRepository, mapping::map_progress_row};
use crate::repository::{QuestionProgressRepository, StorageError};

/// Ids bound per `IN (...)` query, well under `SQLite`'s host parameter limit.
const ID_BATCH_SIZE: usize = 500;

const PROGRESS_COLUMNS: &str = r"
    question_id, skill_id, last_seen_at, correct_count, incorrect_count,
    correct_streak, last_correct_at, last_incorrect_at, interval_days, next_review_at
";

/// Upsert statement shared by the plain upsert and the attempt transaction.
pub(super) fn upsert_progress_query<'q>(
    learner: &'q LearnerId,
    progress: &'q QuestionProgress,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    sqlx::query(
        r"
        INSERT INTO question_progress (
            learner_id, question_id, skill_id, last_seen_at, correct_count,
            incorrect_count, correct_streak, last_correct_at, last_incorrect_at,
            interval_days, next_review_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(learner_id, question_id) DO UPDATE SET
            skill_id = excluded.skill_id,
            last_seen_at = excluded.last_seen_at,
            correct_count = excluded.correct_count,
            incorrect_count = excluded.incorrect_count,
            correct_streak = excluded.correct_streak,
            last_correct_at = excluded.last_correct_at,
            last_incorrect_at = excluded.last_incorrect_at,
            interval_days = excluded.interval_days,
            next_review_at = excluded.next_review_at
        ",
    )
    .bind(learner.as_str())
    .bind(progress.question_id.as_str())
    .bind(progress.skill_id.as_str())
    .bind(progress.last_seen_at)
    .bind(i64::from(progress.correct_count))
    .bind(i64::from(progress.incorrect_count))
    .bind(i64::from(progress.correct_streak))
    .bind(progress.last_correct_at)
    .bind(progress.last_incorrect_at)
    .bind(i64::from(progress.interval_days))
    .bind(progress.next_review_at)
}

#[async_trait::async_trait]
impl QuestionProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        learner: &LearnerId,
        question_id: &QuestionId,
    ) -> Result<Option<QuestionProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM question_progress WHERE learner_id = ?1 AND question_id = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(learner.as_str())
            .bind(question_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn get_progress_many(
        &self,
        learner: &LearnerId,
        question_ids: &[QuestionId],
    ) -> Result<Vec<QuestionProgress>, StorageError> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id = HashMap::with_capacity(question_ids.len());
        for batch in question_ids.chunks(ID_BATCH_SIZE) {
            let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT ");
            qb.push(PROGRESS_COLUMNS);
            qb.push(" FROM question_progress WHERE learner_id = ");
            qb.push_bind(learner.as_str());
            qb.push(" AND question_id IN (");
            let mut ids = qb.separated(", ");
            for id in batch {
                ids.push_bind(id.as_str());
            }
            ids.push_unseparated(")");

            let rows = qb
                .build()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;

            for row in rows {
                let progress = map_progress_row(&row)?;
                by_id.insert(progress.question_id.clone(), progress);
            }
        }

        Ok(question_ids
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect())
    }

    async fn all_progress(&self, learner: &LearnerId) -> Result<Vec<QuestionProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM question_progress WHERE learner_id = ?1 ORDER BY question_id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(learner.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn upsert_progress(
        &self,
        learner: &LearnerId,
        progress: &QuestionProgress,
    ) -> Result<(), StorageError> {
        upsert_progress_query(learner, progress)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
