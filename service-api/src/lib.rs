pub mod kafka;
mod topic;

pub use topic::*;
