mod attempt;
mod ids;
mod learner;
mod progress;
mod review;

pub use ids::{LearnerId, QuestionId, SkillId};

pub use attempt::{AttemptInput, QuestionAttempt};
pub use learner::{LearnerProgress, LessonCompletion, MAX_HEARTS};
pub use progress::QuestionProgress;
pub use review::{
    AvailableQuestion, QueueReason, ReviewAnalytics, ReviewQueueItem, ReviewReason, ReviewSummary,
    SkillAccuracy,
};
