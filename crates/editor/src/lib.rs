//! Command-driven scene editing: undoable commands, the history stack that
//! records and coalesces them, and the editor that ties both to a scene.
//!
//! # Invariants
//! - Every scene mutation made through the editor is a [`Command`] and is reversible.
//! - Executing a new command clears the redo stack.
//! - Updatable commands on the same target merge while inside the merge window.

pub mod command;
pub mod commands;
pub mod config;
pub mod editor;
pub mod history;
pub mod signal;

pub use command::{Command, CommandError, CommandKind, MergeKey};
pub use config::{ConfigError, EditorConfig, HistoryConfig};
pub use editor::{Editor, EditorSignals};
pub use history::{EntryInfo, History};
pub use signal::{Signal, SlotId};
