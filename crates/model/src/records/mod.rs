pub mod outcome;
pub mod page;
pub mod record;
