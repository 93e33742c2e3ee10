use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_service::LearnerProgressService;
use crate::review_service::ReviewService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    review: Arc<ReviewService>,
    learner_progress: Arc<LearnerProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over process-local in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let review = Arc::new(ReviewService::from_storage(clock, storage));
        let learner_progress = Arc::new(LearnerProgressService::new(
            clock,
            Arc::clone(&storage.learners),
        ));
        Self {
            review,
            learner_progress,
        }
    }

    #[must_use]
    pub fn review(&self) -> Arc<ReviewService> {
        Arc::clone(&self.review)
    }

    #[must_use]
    pub fn learner_progress(&self) -> Arc<LearnerProgressService> {
        Arc::clone(&self.learner_progress)
    }
}
