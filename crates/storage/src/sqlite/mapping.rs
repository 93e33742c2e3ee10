use chrono::{DateTime, NaiveDate, Utc};
use lesson_core::model::{LearnerProgress, QuestionAttempt, QuestionId, QuestionProgress, SkillId};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuestionAttempt, StorageError> {
    let time_ms: i64 = row.try_get("time_to_complete_ms").map_err(ser)?;
    let time_to_complete_ms = u64::try_from(time_ms)
        .map_err(|_| StorageError::Serialization(format!("invalid time_to_complete_ms: {time_ms}")))?;

    Ok(QuestionAttempt {
        question_id: QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?),
        skill_id: SkillId::new(row.try_get::<String, _>("skill_id").map_err(ser)?),
        correct: row.try_get("correct").map_err(ser)?,
        time_to_complete_ms,
        attempted_at: row.try_get("attempted_at").map_err(ser)?,
    })
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuestionProgress, StorageError> {
    let count = |field: &'static str| -> Result<u32, StorageError> {
        i64_to_u32(field, row.try_get::<i64, _>(field).map_err(ser)?)
    };
    let instant = |field: &'static str| -> Result<Option<DateTime<Utc>>, StorageError> {
        row.try_get(field).map_err(ser)
    };

    Ok(QuestionProgress {
        question_id: QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?),
        skill_id: SkillId::new(row.try_get::<String, _>("skill_id").map_err(ser)?),
        last_seen_at: instant("last_seen_at")?,
        correct_count: count("correct_count")?,
        incorrect_count: count("incorrect_count")?,
        correct_streak: count("correct_streak")?,
        last_correct_at: instant("last_correct_at")?,
        last_incorrect_at: instant("last_incorrect_at")?,
        interval_days: count("interval_days")?,
        next_review_at: instant("next_review_at")?,
    })
}

pub(crate) fn map_learner_row(row: &sqlx::sqlite::SqliteRow) -> Result<LearnerProgress, StorageError> {
    let badges_json: String = row.try_get("badges").map_err(ser)?;
    let badges: Vec<String> = serde_json::from_str(&badges_json).map_err(ser)?;
    let last_active_date: Option<NaiveDate> = row.try_get("last_active_date").map_err(ser)?;

    Ok(LearnerProgress {
        xp: i64_to_u32("xp", row.try_get("xp").map_err(ser)?)?,
        level: i64_to_u32("level", row.try_get("level").map_err(ser)?)?,
        streak_count: i64_to_u32("streak_count", row.try_get("streak_count").map_err(ser)?)?,
        last_active_date,
        hearts: i64_to_u32("hearts", row.try_get("hearts").map_err(ser)?)?,
        badges,
    })
}

pub(crate) fn badges_to_json(badges: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(badges).map_err(ser)
}
