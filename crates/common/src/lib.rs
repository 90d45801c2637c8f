//! Shared types for the scene editor crates.

mod types;

pub use types::{ObjectId, Transform};
