use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Hearts a learner starts with and can never exceed.
pub const MAX_HEARTS: u32 = 5;

/// Gamification state of a learner: XP, level, daily streak, hearts and badges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgress {
    pub xp: u32,
    pub level: u32,
    pub streak_count: u32,
    pub last_active_date: Option<NaiveDate>,
    pub hearts: u32,
    pub badges: Vec<String>,
}

impl Default for LearnerProgress {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            streak_count: 0,
            last_active_date: None,
            hearts: MAX_HEARTS,
            badges: Vec::new(),
        }
    }
}

/// Rewards reported when a lesson is finished.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LessonCompletion {
    pub xp_earned: u32,
    pub hearts_change: i32,
    pub badges_earned: Vec<String>,
}
