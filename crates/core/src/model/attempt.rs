use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, SkillId};

/// A validated answer submission that has not been timestamped yet.
///
/// `time_to_complete_ms` is already clamped to a non-negative value by the
/// request boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptInput {
    pub question_id: QuestionId,
    pub skill_id: SkillId,
    pub correct: bool,
    pub time_to_complete_ms: u64,
}

impl AttemptInput {
    #[must_use]
    pub fn new(
        question_id: impl Into<QuestionId>,
        skill_id: impl Into<SkillId>,
        correct: bool,
        time_to_complete_ms: u64,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            skill_id: skill_id.into(),
            correct,
            time_to_complete_ms,
        }
    }

    /// Stamp the submission, producing the immutable history entry.
    #[must_use]
    pub fn at(self, attempted_at: DateTime<Utc>) -> QuestionAttempt {
        QuestionAttempt {
            question_id: self.question_id,
            skill_id: self.skill_id,
            correct: self.correct,
            time_to_complete_ms: self.time_to_complete_ms,
            attempted_at,
        }
    }
}

/// Record of a single answer submission. Append-only; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAttempt {
    pub question_id: QuestionId,
    pub skill_id: SkillId,
    pub correct: bool,
    pub time_to_complete_ms: u64,
    pub attempted_at: DateTime<Utc>,
}
