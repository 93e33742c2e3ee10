use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashSet;

use crate::model::{QueueReason, QuestionProgress, ReviewQueueItem, ReviewReason, SkillId};
use crate::time::{calendar_day, days_between};

/// Calendar days an incorrect answer keeps a question flagged as missed.
pub const MISSED_LOOKBACK_DAYS: i64 = 7;

pub const PRIORITY_NEW: u32 = 100;
pub const PRIORITY_MISSED_RECENTLY: u32 = 90;
pub const PRIORITY_DUE: u32 = 80;
pub const PRIORITY_SCHEDULED: u32 = 0;
pub const WEAK_SKILL_BONUS: u32 = 10;

/// Classifies progress records into prioritized queue items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePolicy {
    pub missed_lookback_days: i64,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            missed_lookback_days: MISSED_LOOKBACK_DAYS,
        }
    }
}

impl QueuePolicy {
    /// Base classification, first match wins: new, missed recently, due, scheduled.
    ///
    /// Both the lookback and the due check compare calendar days, so a review
    /// scheduled for later today is already due.
    #[must_use]
    pub fn classify(&self, progress: &QuestionProgress, now: DateTime<Utc>) -> ReviewReason {
        if progress.is_new() {
            return ReviewReason::New;
        }

        let missed_recently = progress
            .last_incorrect_at
            .is_some_and(|at| days_between(at, now) <= self.missed_lookback_days);
        if missed_recently {
            return ReviewReason::MissedRecently;
        }

        let due = progress
            .next_review_at
            .is_some_and(|at| calendar_day(at) <= calendar_day(now));
        if due {
            return ReviewReason::Due;
        }

        ReviewReason::Scheduled
    }

    /// Build one queue item; a weak skill adds a fixed bonus on top of the base priority.
    #[must_use]
    pub fn build_item(
        &self,
        progress: &QuestionProgress,
        now: DateTime<Utc>,
        weak_skills: &HashSet<SkillId>,
    ) -> ReviewQueueItem {
        let base = self.classify(progress, now);
        let weak_skill = weak_skills.contains(&progress.skill_id);

        let mut priority = base_priority(base);
        if weak_skill {
            priority += WEAK_SKILL_BONUS;
        }

        ReviewQueueItem {
            question_id: progress.question_id.clone(),
            skill_id: progress.skill_id.clone(),
            priority,
            reason: QueueReason { base, weak_skill },
            next_review_at: progress.next_review_at,
        }
    }

    /// Queue items sorted by descending priority; ties keep input order.
    #[must_use]
    pub fn build_queue(
        &self,
        progress: &[QuestionProgress],
        now: DateTime<Utc>,
        weak_skills: &HashSet<SkillId>,
    ) -> Vec<ReviewQueueItem> {
        let mut queue: Vec<ReviewQueueItem> = progress
            .iter()
            .map(|p| self.build_item(p, now, weak_skills))
            .collect();
        // `sort_by_key` is stable.
        queue.sort_by_key(|item| Reverse(item.priority));
        queue
    }
}

fn base_priority(reason: ReviewReason) -> u32 {
    match reason {
        ReviewReason::New => PRIORITY_NEW,
        ReviewReason::MissedRecently => PRIORITY_MISSED_RECENTLY,
        ReviewReason::Due => PRIORITY_DUE,
        ReviewReason::Scheduled => PRIORITY_SCHEDULED,
    }
}
