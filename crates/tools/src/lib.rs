//! Developer tooling: scene and history inspectors.
//!
//! # Invariants
//! - Tools are read-only; they never mutate the scene or history.

pub mod inspector;

pub use inspector::{HistoryInspector, HistoryRow, ObjectInfo, SceneInspector, SceneSummary};
