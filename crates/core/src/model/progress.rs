use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, SkillId};

/// Mastery state for one question of one learner.
///
/// Created lazily with [`QuestionProgress::unseen`] and only advanced by
/// [`crate::scheduler::Scheduler::apply_attempt`]. Counters never decrease;
/// `correct_count + incorrect_count` equals the number of recorded attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionProgress {
    pub question_id: QuestionId,
    pub skill_id: SkillId,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub correct_streak: u32,
    pub last_correct_at: Option<DateTime<Utc>>,
    pub last_incorrect_at: Option<DateTime<Utc>>,
    pub interval_days: u32,
    pub next_review_at: Option<DateTime<Utc>>,
}

impl QuestionProgress {
    /// Default state for a question the learner has never answered.
    #[must_use]
    pub fn unseen(question_id: QuestionId, skill_id: SkillId, interval_days: u32) -> Self {
        Self {
            question_id,
            skill_id,
            last_seen_at: None,
            correct_count: 0,
            incorrect_count: 0,
            correct_streak: 0,
            last_correct_at: None,
            last_incorrect_at: None,
            interval_days,
            next_review_at: None,
        }
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.last_seen_at.is_none()
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.correct_count.saturating_add(self.incorrect_count)
    }
}
