use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AttemptInput, QuestionAttempt, QuestionId, QuestionProgress, SkillId};
use crate::time::add_days;

/// Spacing values used when no custom ladder is configured.
pub const DEFAULT_INTERVALS_DAYS: [u32; 5] = [1, 3, 7, 14, 30];

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("interval ladder must contain at least one rung")]
    EmptyLadder,
    #[error("interval ladder rungs must be positive, got 0 at index {index}")]
    ZeroRung { index: usize },
    #[error("interval ladder must be strictly ascending, {current} follows {previous}")]
    NotAscending { previous: u32, current: u32 },
}

//
// ─── INTERVAL LADDER ───────────────────────────────────────────────────────────
//

/// Strictly ascending sequence of review spacings, in days.
///
/// Each consecutive correct answer climbs one rung; the last rung repeats once
/// the streak outgrows the ladder. Any miss drops back to the first rung.
///
/// ```
/// # use lesson_core::scheduler::IntervalLadder;
/// let ladder = IntervalLadder::default();
/// assert_eq!(ladder.for_streak(1), 1);
/// assert_eq!(ladder.for_streak(2), 3);
/// assert_eq!(ladder.for_streak(40), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalLadder {
    rungs: Vec<u32>,
}

impl IntervalLadder {
    /// Build a custom ladder.
    ///
    /// # Errors
    ///
    /// - `EmptyLadder` if `rungs` is empty
    /// - `ZeroRung` if any rung is zero
    /// - `NotAscending` if rungs are not strictly increasing
    pub fn new(rungs: Vec<u32>) -> Result<Self, SchedulerError> {
        if rungs.is_empty() {
            return Err(SchedulerError::EmptyLadder);
        }
        if let Some(index) = rungs.iter().position(|&days| days == 0) {
            return Err(SchedulerError::ZeroRung { index });
        }
        for pair in rungs.windows(2) {
            if pair[1] <= pair[0] {
                return Err(SchedulerError::NotAscending {
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }
        Ok(Self { rungs })
    }

    #[must_use]
    pub fn rungs(&self) -> &[u32] {
        &self.rungs
    }

    /// Interval for a fresh or just-missed question.
    #[must_use]
    pub fn first(&self) -> u32 {
        self.rungs[0]
    }

    /// Interval after `streak` consecutive correct answers.
    ///
    /// A streak of zero maps to the first rung.
    #[must_use]
    pub fn for_streak(&self, streak: u32) -> u32 {
        let step = usize::try_from(streak.saturating_sub(1)).unwrap_or(usize::MAX);
        let index = step.min(self.rungs.len() - 1);
        self.rungs[index]
    }
}

impl Default for IntervalLadder {
    fn default() -> Self {
        Self {
            rungs: DEFAULT_INTERVALS_DAYS.to_vec(),
        }
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Ladder-based spaced-repetition scheduler.
///
/// Spacing grows monotonically on success and resets hard on failure; there is
/// no per-question difficulty factor.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    ladder: IntervalLadder,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ladder(ladder: IntervalLadder) -> Self {
        Self { ladder }
    }

    #[must_use]
    pub fn ladder(&self) -> &IntervalLadder {
        &self.ladder
    }

    /// Default state for a question that has no stored progress yet.
    #[must_use]
    pub fn unseen_progress(&self, question_id: QuestionId, skill_id: SkillId) -> QuestionProgress {
        QuestionProgress::unseen(question_id, skill_id, self.ladder.first())
    }

    /// Stamp `input` at `now` and fold it into `progress`.
    ///
    /// `progress` should be the stored state for the same question, or
    /// [`Scheduler::unseen_progress`] when none exists. The attempt's skill
    /// replaces the stored one so re-tagged questions follow their new skill.
    pub fn apply_attempt(
        &self,
        progress: &mut QuestionProgress,
        input: AttemptInput,
        now: DateTime<Utc>,
    ) -> QuestionAttempt {
        let correct = input.correct;

        if correct {
            progress.correct_streak = progress.correct_streak.saturating_add(1);
            progress.correct_count = progress.correct_count.saturating_add(1);
            progress.last_correct_at = Some(now);
            progress.interval_days = self.ladder.for_streak(progress.correct_streak);
        } else {
            progress.correct_streak = 0;
            progress.incorrect_count = progress.incorrect_count.saturating_add(1);
            progress.last_incorrect_at = Some(now);
            progress.interval_days = self.ladder.first();
        }

        progress.skill_id = input.skill_id.clone();
        progress.last_seen_at = Some(now);
        progress.next_review_at = Some(add_days(now, progress.interval_days));

        input.at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn fresh(scheduler: &Scheduler) -> QuestionProgress {
        scheduler.unseen_progress(QuestionId::new("q1"), SkillId::new("add"))
    }

    fn answer(correct: bool) -> AttemptInput {
        AttemptInput::new("q1", "add", correct, 1_000)
    }

    #[test]
    fn ladder_validation() {
        assert_eq!(IntervalLadder::new(vec![]), Err(SchedulerError::EmptyLadder));
        assert_eq!(
            IntervalLadder::new(vec![0, 2]),
            Err(SchedulerError::ZeroRung { index: 0 })
        );
        assert_eq!(
            IntervalLadder::new(vec![1, 3, 3]),
            Err(SchedulerError::NotAscending {
                previous: 3,
                current: 3
            })
        );
        assert_eq!(IntervalLadder::new(vec![2, 5]).unwrap().first(), 2);
    }

    #[test]
    fn first_correct_schedules_one_day_then_three() {
        let scheduler = Scheduler::new();
        let now = fixed_now();
        let mut progress = fresh(&scheduler);

        let attempt = scheduler.apply_attempt(&mut progress, answer(true), now);
        assert_eq!(attempt.attempted_at, now);
        assert_eq!(progress.correct_streak, 1);
        assert_eq!(progress.interval_days, 1);
        assert_eq!(progress.next_review_at, Some(now + Duration::days(1)));

        let later = now + Duration::days(1);
        scheduler.apply_attempt(&mut progress, answer(true), later);
        assert_eq!(progress.correct_streak, 2);
        assert_eq!(progress.interval_days, 3);
        assert_eq!(progress.next_review_at, Some(later + Duration::days(3)));
    }

    #[test]
    fn consecutive_correct_climbs_and_caps_at_last_rung() {
        let scheduler = Scheduler::new();
        let ladder = DEFAULT_INTERVALS_DAYS;
        let mut progress = fresh(&scheduler);

        for n in 1..=8_u32 {
            scheduler.apply_attempt(&mut progress, answer(true), fixed_now());
            let index = usize::try_from(n - 1).unwrap().min(ladder.len() - 1);
            assert_eq!(progress.interval_days, ladder[index], "streak {n}");
        }
    }

    #[test]
    fn miss_resets_interval_and_streak() {
        let scheduler = Scheduler::new();
        let now = fixed_now();
        let mut progress = fresh(&scheduler);

        for _ in 0..4 {
            scheduler.apply_attempt(&mut progress, answer(true), now);
        }
        assert_eq!(progress.interval_days, 14);
        let last_correct = progress.last_correct_at;

        let missed_at = now + Duration::hours(5);
        scheduler.apply_attempt(&mut progress, answer(false), missed_at);
        assert_eq!(progress.correct_streak, 0);
        assert_eq!(progress.interval_days, 1);
        assert_eq!(progress.last_incorrect_at, Some(missed_at));
        assert_eq!(progress.last_correct_at, last_correct);
        assert_eq!(progress.next_review_at, Some(missed_at + Duration::days(1)));
    }

    #[test]
    fn counts_track_every_attempt() {
        let scheduler = Scheduler::new();
        let mut progress = fresh(&scheduler);
        let outcomes = [true, false, true, true, false, false, true];

        for (n, correct) in outcomes.into_iter().enumerate() {
            scheduler.apply_attempt(&mut progress, answer(correct), fixed_now());
            assert_eq!(progress.attempt_count() as usize, n + 1);
            if !correct {
                assert_eq!(progress.interval_days, 1);
                assert_eq!(progress.correct_streak, 0);
            }
        }
        assert_eq!(progress.correct_count, 4);
        assert_eq!(progress.incorrect_count, 3);
    }

    #[test]
    fn attempt_skill_overrides_stored_skill() {
        let scheduler = Scheduler::new();
        let mut progress = fresh(&scheduler);
        scheduler.apply_attempt(
            &mut progress,
            AttemptInput::new("q1", "subtract", true, 0),
            fixed_now(),
        );
        assert_eq!(progress.skill_id, SkillId::new("subtract"));
    }

    #[test]
    fn custom_ladder_is_used() {
        let scheduler = Scheduler::with_ladder(IntervalLadder::new(vec![2, 4]).unwrap());
        let mut progress = fresh(&scheduler);
        assert_eq!(progress.interval_days, 2);
        for _ in 0..3 {
            scheduler.apply_attempt(&mut progress, answer(true), fixed_now());
        }
        assert_eq!(progress.interval_days, 4);
    }
}
