use seg_scene::Scene;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::command::{Command, CommandError};

/// Several commands recorded as one history entry.
///
/// Execution is all-or-nothing: if a child fails, the children that already
/// ran are reverted before the error is returned. Undo mirrors this in
/// reverse order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiCmds {
    pub cmds: Vec<Command>,
}

impl MultiCmds {
    pub fn new(cmds: Vec<Command>) -> Self {
        Self { cmds }
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        for (i, cmd) in self.cmds.iter().enumerate() {
            if let Err(err) = cmd.execute(scene) {
                for done in self.cmds[..i].iter().rev() {
                    if let Err(rollback) = done.undo(scene) {
                        warn!(command = done.name(), error = %rollback, "rollback failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        let n = self.cmds.len();
        for (i, cmd) in self.cmds.iter().enumerate().rev() {
            if let Err(err) = cmd.undo(scene) {
                for done in &self.cmds[i + 1..n] {
                    if let Err(rollback) = done.execute(scene) {
                        warn!(command = done.name(), error = %rollback, "rollback failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}
