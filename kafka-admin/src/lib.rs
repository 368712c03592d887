//! Lifecycle management of Kafka topics.
//!
//! The [`Manager`] deletes batches of topics, treating topics which are already gone as deleted,
//! and reports the topics which failed as one combined error.

mod admin;
mod config;
mod error;
mod kafka;
mod manager;

pub use admin::*;
pub use config::*;
pub use error::*;
pub use kafka::*;
pub use manager::*;
