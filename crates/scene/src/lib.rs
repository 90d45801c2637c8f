//! Scene graph: the object model the editor mutates.
//!
//! # Invariants
//! - Every object sits in exactly one sibling list (the root list or its parent's children).
//! - All mutations flow through explicit operations and append a [`SceneEvent`].
//! - Removing an object detaches its whole subtree as an [`ObjectSnapshot`];
//!   re-adding that snapshot at the captured index restores the prior structure.

pub mod json;
pub mod object;
pub mod scene;

pub use json::{Metadata, ObjectJson, ObjectLoader, ObjectRecord};
pub use object::{AttributeValue, ObjectAttribute, ObjectSnapshot, SceneObject};
pub use scene::{Scene, SceneError, SceneEvent};
