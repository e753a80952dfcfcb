pub mod connectors;
pub mod error;
pub mod progress;
pub mod settings;
pub mod state;
