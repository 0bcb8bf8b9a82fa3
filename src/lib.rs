pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod ops;
pub mod slack;

#[cfg(test)]
mod testing;

pub use error::{Result, SlackMigrateError};
