use seg_common::ObjectId;
use seg_scene::Scene;
use serde::{Deserialize, Serialize};

use crate::command::CommandError;
use crate::commands::MultiCmds;

/// Give an object (or the scene root) a new uuid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUuid {
    pub old_uuid: ObjectId,
    pub new_uuid: ObjectId,
}

impl SetUuid {
    pub fn new(scene: &Scene, id: ObjectId, new_uuid: ObjectId) -> Result<Self, CommandError> {
        if id != scene.id() {
            scene.object_by_uuid(id)?;
        }
        Ok(Self {
            old_uuid: id,
            new_uuid,
        })
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_uuid(self.old_uuid, self.new_uuid)?)
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_uuid(self.new_uuid, self.old_uuid)?)
    }
}

/// Load a serialized scene into the current one: the root takes the loaded
/// name and uuid, and every loaded top-level object is added.
///
/// Serialized as the child list alone, like [`MultiCmds`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetScene {
    pub cmds: MultiCmds,
}

impl SetScene {
    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        self.cmds.execute(scene)
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        self.cmds.undo(scene)
    }
}
