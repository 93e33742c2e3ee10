use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::model::ids::{QuestionId, SkillId};
use crate::model::progress::QuestionProgress;

//
// ─── ANALYTICS ─────────────────────────────────────────────────────────────────
//

/// Accuracy and timing for one skill, derived from attempt history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAccuracy {
    pub skill_id: SkillId,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub accuracy: f64,
    pub average_time_ms: u64,
}

/// Per-skill and pooled accuracy statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAnalytics {
    pub accuracy_by_skill: Vec<SkillAccuracy>,
    pub overall_accuracy: f64,
    pub average_time_ms: u64,
}

//
// ─── QUEUE REASONS ─────────────────────────────────────────────────────────────
//

/// Base classification of a queue item, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewReason {
    /// Never attempted.
    New,
    /// Answered incorrectly within the lookback window.
    MissedRecently,
    /// Review day has arrived.
    Due,
    /// Nothing urgent.
    Scheduled,
}

impl ReviewReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewReason::New => "new",
            ReviewReason::MissedRecently => "missed recently",
            ReviewReason::Due => "due",
            ReviewReason::Scheduled => "scheduled",
        }
    }
}

/// Base reason plus the weak-skill flag; renders as the human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueReason {
    pub base: ReviewReason,
    pub weak_skill: bool,
}

impl fmt::Display for QueueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.base, self.weak_skill) {
            (ReviewReason::Scheduled, true) => f.write_str("weak skill"),
            (base, true) => write!(f, "{} + weak skill", base.as_str()),
            (base, false) => f.write_str(base.as_str()),
        }
    }
}

impl Serialize for QueueReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

//
// ─── QUEUE ─────────────────────────────────────────────────────────────────────
//

/// A question the caller makes available for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableQuestion {
    pub question_id: QuestionId,
    pub skill_id: SkillId,
}

impl AvailableQuestion {
    #[must_use]
    pub fn new(question_id: impl Into<QuestionId>, skill_id: impl Into<SkillId>) -> Self {
        Self {
            question_id: question_id.into(),
            skill_id: skill_id.into(),
        }
    }
}

/// One prioritized entry of the review queue. Higher priority is more urgent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueItem {
    pub question_id: QuestionId,
    pub skill_id: SkillId,
    pub priority: u32,
    pub reason: QueueReason,
    pub next_review_at: Option<DateTime<Utc>>,
}

/// Everything the review screen needs for one learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub queue: Vec<ReviewQueueItem>,
    pub weak_skills: Vec<SkillId>,
    pub analytics: ReviewAnalytics,
    pub question_progress: Vec<QuestionProgress>,
}
