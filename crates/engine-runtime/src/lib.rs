pub mod dispatch;
pub mod error;
pub mod executor;
pub mod reaper;
pub mod scheduler;
