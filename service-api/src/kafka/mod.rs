mod config;
mod scalar;

pub use self::config::*;

/// The messaging system identifier used to tag Kafka operations.
pub const MESSAGING_SYSTEM: &str = "kafka";
