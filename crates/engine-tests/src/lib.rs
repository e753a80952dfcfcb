//! End-to-end exercises of the import engine against a scripted source API.

pub mod utils;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
