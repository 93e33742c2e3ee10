use std::collections::HashMap;

use crate::model::{QuestionAttempt, ReviewAnalytics, SkillAccuracy, SkillId};

/// Accuracy below which a skill counts as weak.
pub const WEAK_SKILL_THRESHOLD: f64 = 0.7;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: u32,
    correct: u32,
    time_ms: u64,
}

impl Tally {
    fn add(&mut self, attempt: &QuestionAttempt) {
        self.total = self.total.saturating_add(1);
        if attempt.correct {
            self.correct = self.correct.saturating_add(1);
        }
        self.time_ms = self.time_ms.saturating_add(attempt.time_to_complete_ms);
    }

    fn accuracy(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total)
    }

    /// Mean time, rounded half up.
    fn average_time_ms(self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        let total = u64::from(self.total);
        self.time_ms.saturating_add(total / 2) / total
    }
}

/// Fold attempt history into per-skill and pooled statistics.
///
/// Skills appear in the order they were first attempted. Overall figures pool
/// every attempt rather than averaging the per-skill values.
#[must_use]
pub fn build_analytics(attempts: &[QuestionAttempt]) -> ReviewAnalytics {
    let mut order: Vec<&SkillId> = Vec::new();
    let mut by_skill: HashMap<&SkillId, Tally> = HashMap::new();
    let mut overall = Tally::default();

    for attempt in attempts {
        by_skill
            .entry(&attempt.skill_id)
            .or_insert_with(|| {
                order.push(&attempt.skill_id);
                Tally::default()
            })
            .add(attempt);
        overall.add(attempt);
    }

    let accuracy_by_skill = order
        .into_iter()
        .map(|skill_id| {
            let tally = by_skill.get(skill_id).copied().unwrap_or_default();
            SkillAccuracy {
                skill_id: skill_id.clone(),
                total_attempts: tally.total,
                correct_attempts: tally.correct,
                accuracy: tally.accuracy(),
                average_time_ms: tally.average_time_ms(),
            }
        })
        .collect();

    ReviewAnalytics {
        accuracy_by_skill,
        overall_accuracy: overall.accuracy(),
        average_time_ms: overall.average_time_ms(),
    }
}

//
// ─── WEAK SKILLS ───────────────────────────────────────────────────────────────
//

/// Decides which skills need reinforcement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeakSkillPolicy {
    pub threshold: f64,
}

impl Default for WeakSkillPolicy {
    fn default() -> Self {
        Self {
            threshold: WEAK_SKILL_THRESHOLD,
        }
    }
}

impl WeakSkillPolicy {
    #[must_use]
    pub fn is_weak(&self, skill: &SkillAccuracy) -> bool {
        skill.total_attempts == 0 || skill.accuracy < self.threshold
    }

    /// Weak skills, weakest first. Equal accuracies keep analytics order.
    #[must_use]
    pub fn weak_skills(&self, analytics: &ReviewAnalytics) -> Vec<SkillId> {
        let mut weak: Vec<&SkillAccuracy> = analytics
            .accuracy_by_skill
            .iter()
            .filter(|skill| self.is_weak(skill))
            .collect();
        weak.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
        weak.into_iter().map(|skill| skill.skill_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttemptInput;
    use crate::time::fixed_now;

    fn attempts(skill: &str, total: usize, correct: usize, time_ms: u64) -> Vec<QuestionAttempt> {
        (0..total)
            .map(|n| {
                AttemptInput::new(format!("{skill}-{n}"), skill, n < correct, time_ms).at(fixed_now())
            })
            .collect()
    }

    #[test]
    fn empty_history_yields_zeroes() {
        let analytics = build_analytics(&[]);
        assert!(analytics.accuracy_by_skill.is_empty());
        assert_eq!(analytics.overall_accuracy, 0.0);
        assert_eq!(analytics.average_time_ms, 0);
    }

    #[test]
    fn groups_by_skill_in_first_seen_order() {
        let mut history = attempts("fractions", 4, 3, 1_000);
        history.extend(attempts("decimals", 2, 0, 3_000));
        history.extend(attempts("fractions", 1, 1, 1_000));

        let analytics = build_analytics(&history);
        let skills: Vec<&str> = analytics
            .accuracy_by_skill
            .iter()
            .map(|s| s.skill_id.as_str())
            .collect();
        assert_eq!(skills, ["fractions", "decimals"]);

        let fractions = &analytics.accuracy_by_skill[0];
        assert_eq!(fractions.total_attempts, 5);
        assert_eq!(fractions.correct_attempts, 4);
        assert!((fractions.accuracy - 0.8).abs() < f64::EPSILON);
        assert_eq!(fractions.average_time_ms, 1_000);

        let decimals = &analytics.accuracy_by_skill[1];
        assert_eq!(decimals.accuracy, 0.0);
        assert_eq!(decimals.average_time_ms, 3_000);
    }

    #[test]
    fn overall_figures_pool_attempts() {
        // 9 of 10 correct at 100ms plus 0 of 2 at 700ms: pooled, not skill-averaged.
        let mut history = attempts("a", 10, 9, 100);
        history.extend(attempts("b", 2, 0, 700));

        let analytics = build_analytics(&history);
        assert!((analytics.overall_accuracy - 0.75).abs() < f64::EPSILON);
        assert_eq!(analytics.average_time_ms, 200);
    }

    #[test]
    fn average_time_rounds_half_up() {
        let mut history = attempts("a", 1, 1, 1);
        history.extend(attempts("a", 1, 1, 2));
        assert_eq!(build_analytics(&history).average_time_ms, 2);
    }

    #[test]
    fn low_accuracy_skill_is_weak() {
        let mut history = attempts("weak", 10, 3, 0);
        history.extend(attempts("strong", 10, 9, 0));
        history.extend(attempts("borderline", 10, 7, 0));

        let analytics = build_analytics(&history);
        let weak = WeakSkillPolicy::default().weak_skills(&analytics);
        assert_eq!(weak, vec![SkillId::new("weak")]);
    }

    #[test]
    fn weak_skills_are_ordered_weakest_first() {
        let mut history = attempts("mid", 10, 5, 0);
        history.extend(attempts("worst", 10, 1, 0));
        history.extend(attempts("also-mid", 10, 5, 0));

        let weak = WeakSkillPolicy::default().weak_skills(&build_analytics(&history));
        let ids: Vec<&str> = weak.iter().map(SkillId::as_str).collect();
        assert_eq!(ids, ["worst", "mid", "also-mid"]);
    }

    #[test]
    fn skill_without_attempts_is_weak() {
        let skill = SkillAccuracy {
            skill_id: SkillId::new("fresh"),
            total_attempts: 0,
            correct_attempts: 0,
            accuracy: 0.0,
            average_time_ms: 0,
        };
        assert!(WeakSkillPolicy { threshold: 0.0 }.is_weak(&skill));
    }
}
