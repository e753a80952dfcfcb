pub mod batch;
pub mod error;
pub mod post_filter;
pub mod upsert;
