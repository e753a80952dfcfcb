pub mod client;
pub mod normalize;
pub mod query;
pub mod search;
