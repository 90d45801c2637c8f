use seg_common::ObjectId;
use seg_scene::{ObjectJson, ObjectLoader, ObjectSnapshot, Scene};
use serde::{Deserialize, Serialize};

use crate::command::CommandError;

/// Attach an object subtree. Undo = detach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddObject {
    pub object: ObjectJson,
    #[serde(default)]
    pub parent_uuid: Option<ObjectId>,
    #[serde(default)]
    pub index: Option<usize>,
}

impl AddObject {
    pub fn new(object: &ObjectSnapshot, parent: Option<ObjectId>, index: Option<usize>) -> Self {
        Self {
            object: ObjectJson::from_snapshot(object),
            parent_uuid: parent,
            index,
        }
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        let snapshot = ObjectLoader::load(self.object.clone());
        scene.add(snapshot, self.parent_uuid, self.index)?;
        Ok(())
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        scene.remove(self.object.uuid())?;
        Ok(())
    }
}

/// Detach an object subtree. Parent and sibling index are captured when the
/// command is built so that undo re-inserts at the same place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveObject {
    pub object: ObjectJson,
    #[serde(default)]
    pub parent_uuid: Option<ObjectId>,
    pub index: usize,
}

impl RemoveObject {
    pub fn new(scene: &Scene, id: ObjectId) -> Result<Self, CommandError> {
        Ok(Self {
            object: scene.object_json(id)?,
            parent_uuid: scene.parent_of(id)?,
            index: scene.index_of(id)?,
        })
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        scene.remove(self.object.uuid())?;
        Ok(())
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        let snapshot = ObjectLoader::load(self.object.clone());
        scene.add(snapshot, self.parent_uuid, Some(self.index))?;
        Ok(())
    }
}

/// Reparent or reorder an object.
///
/// Indices are positions in the destination list after the object has been
/// detached from its current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveObject {
    pub object_uuid: ObjectId,
    #[serde(default)]
    pub old_parent_uuid: Option<ObjectId>,
    #[serde(default)]
    pub new_parent_uuid: Option<ObjectId>,
    pub old_index: usize,
    pub new_index: usize,
}

impl MoveObject {
    pub fn new(
        scene: &Scene,
        id: ObjectId,
        new_parent: Option<ObjectId>,
        before: Option<ObjectId>,
    ) -> Result<Self, CommandError> {
        let old_parent = scene.parent_of(id)?;
        let old_index = scene.index_of(id)?;
        let mut new_index = match before {
            Some(before) => {
                if scene.parent_of(before)? != new_parent {
                    return Err(CommandError::InvalidBefore { before });
                }
                scene.index_of(before)?
            }
            None => scene.children_of(new_parent)?.len(),
        };
        if old_parent == new_parent && new_index > old_index {
            new_index -= 1;
        }
        Ok(Self {
            object_uuid: id,
            old_parent_uuid: old_parent,
            new_parent_uuid: new_parent,
            old_index,
            new_index,
        })
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        scene.move_object(self.object_uuid, self.new_parent_uuid, self.new_index)?;
        Ok(())
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        scene.move_object(self.object_uuid, self.old_parent_uuid, self.old_index)?;
        Ok(())
    }
}
