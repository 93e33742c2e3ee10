#![forbid(unsafe_code)]

pub mod analytics;
pub mod model;
pub mod progression;
pub mod queue;
pub mod scheduler;
pub mod time;

pub use time::Clock;
