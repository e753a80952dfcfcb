pub mod error;
pub mod graphql;
pub mod transport;
