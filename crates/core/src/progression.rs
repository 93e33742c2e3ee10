use chrono::{DateTime, Utc};

use crate::model::{LearnerProgress, LessonCompletion, MAX_HEARTS};
use crate::time::calendar_day;

/// Minimum XP for each level; level `n` starts at `LEVEL_THRESHOLDS[n - 1]`.
pub const LEVEL_THRESHOLDS: [u32; 9] = [0, 100, 250, 450, 700, 1000, 1350, 1750, 2200];

/// Level reached with `xp` points.
#[must_use]
pub fn level_for_xp(xp: u32) -> u32 {
    let reached = LEVEL_THRESHOLDS
        .iter()
        .rposition(|&threshold| xp >= threshold)
        .unwrap_or(0);
    u32::try_from(reached + 1).unwrap_or(u32::MAX)
}

/// Points missing until the next level; zero once the last level is reached.
#[must_use]
pub fn xp_to_next_level(xp: u32) -> u32 {
    let level = usize::try_from(level_for_xp(xp)).unwrap_or(usize::MAX);
    let next = LEVEL_THRESHOLDS
        .get(level)
        .or_else(|| LEVEL_THRESHOLDS.last())
        .copied()
        .unwrap_or(0);
    next.saturating_sub(xp)
}

/// How a day of activity affects the daily streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// No previous activity.
    Start,
    /// Already active today.
    Same,
    /// Active yesterday.
    Increment,
    /// Gap of more than one day.
    Reset,
}

#[must_use]
pub fn streak_update(progress: &LearnerProgress, now: DateTime<Utc>) -> StreakUpdate {
    let Some(last_active) = progress.last_active_date else {
        return StreakUpdate::Start;
    };

    match calendar_day(now).signed_duration_since(last_active).num_days() {
        0 => StreakUpdate::Same,
        1 => StreakUpdate::Increment,
        _ => StreakUpdate::Reset,
    }
}

/// Result of applying a finished lesson to a learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonOutcome {
    pub progress: LearnerProgress,
    pub level_up: bool,
}

/// Award XP, hearts and badges for a completed lesson and advance the daily streak.
#[must_use]
pub fn apply_lesson_completion(
    progress: &LearnerProgress,
    completion: &LessonCompletion,
    now: DateTime<Utc>,
) -> LessonOutcome {
    let streak_count = match streak_update(progress, now) {
        StreakUpdate::Same => progress.streak_count,
        StreakUpdate::Increment => progress.streak_count.saturating_add(1),
        StreakUpdate::Start | StreakUpdate::Reset => 1,
    };

    let hearts = progress
        .hearts
        .saturating_add_signed(completion.hearts_change)
        .min(MAX_HEARTS);

    let xp = progress.xp.saturating_add(completion.xp_earned);
    let level = level_for_xp(xp);

    let mut badges = progress.badges.clone();
    for badge in &completion.badges_earned {
        if !badges.contains(badge) {
            badges.push(badge.clone());
        }
    }

    LessonOutcome {
        level_up: level > progress.level,
        progress: LearnerProgress {
            xp,
            level,
            streak_count,
            last_active_date: Some(calendar_day(now)),
            hearts,
            badges,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn completion(xp_earned: u32) -> LessonCompletion {
        LessonCompletion {
            xp_earned,
            ..LessonCompletion::default()
        }
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(2199), 8);
        assert_eq!(level_for_xp(5000), 9);
    }

    #[test]
    fn xp_to_next_level_bottoms_out_at_max_level() {
        assert_eq!(xp_to_next_level(0), 100);
        assert_eq!(xp_to_next_level(120), 130);
        assert_eq!(xp_to_next_level(2200), 0);
        assert_eq!(xp_to_next_level(9000), 0);
    }

    #[test]
    fn first_lesson_starts_streak_and_levels_up() {
        let now = fixed_now();
        let outcome = apply_lesson_completion(&LearnerProgress::default(), &completion(150), now);
        assert!(outcome.level_up);
        assert_eq!(outcome.progress.level, 2);
        assert_eq!(outcome.progress.streak_count, 1);
        assert_eq!(outcome.progress.last_active_date, Some(now.date_naive()));
    }

    #[test]
    fn streak_counts_calendar_days() {
        let now = fixed_now();
        let first = apply_lesson_completion(&LearnerProgress::default(), &completion(10), now).progress;

        let same_day = apply_lesson_completion(&first, &completion(10), now + Duration::minutes(10));
        assert_eq!(same_day.progress.streak_count, 1);

        // 22:13 -> 01:13 crosses midnight.
        let next_day = apply_lesson_completion(&first, &completion(10), now + Duration::hours(3));
        assert_eq!(next_day.progress.streak_count, 2);
        assert!(!next_day.level_up);

        let gap = apply_lesson_completion(&next_day.progress, &completion(10), now + Duration::days(4));
        assert_eq!(gap.progress.streak_count, 1);
    }

    #[test]
    fn hearts_are_clamped_and_badges_deduplicated() {
        let now = fixed_now();
        let start = LearnerProgress {
            badges: vec!["first-lesson".into()],
            ..LearnerProgress::default()
        };

        let lost = apply_lesson_completion(
            &start,
            &LessonCompletion {
                xp_earned: 0,
                hearts_change: -9,
                badges_earned: vec!["first-lesson".into(), "perfect".into()],
            },
            now,
        );
        assert_eq!(lost.progress.hearts, 0);
        assert_eq!(lost.progress.badges, vec!["first-lesson", "perfect"]);

        let gained = apply_lesson_completion(
            &lost.progress,
            &LessonCompletion {
                hearts_change: 12,
                ..LessonCompletion::default()
            },
            now,
        );
        assert_eq!(gained.progress.hearts, MAX_HEARTS);
    }
}
