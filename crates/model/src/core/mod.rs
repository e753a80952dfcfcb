pub mod identifiers;
pub mod resource;
