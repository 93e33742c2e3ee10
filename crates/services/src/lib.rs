#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_service;
pub mod requests;
pub mod review_service;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProgressServiceError, RequestError, ReviewServiceError};
pub use progress_service::{LearnerProgressService, LearnerProgressView, LessonCompletionResult};
pub use review_service::ReviewService;
