use glam::Vec3;
use seg_scene::{ObjectJson, ObjectSnapshot, Scene};
use serde::{Deserialize, Serialize};

use super::transform::{SetPosition, SetRotation, SetScale};
use crate::command::CommandError;

/// Bring an object to the transform of an incoming copy of it.
///
/// Serialized as the incoming object plus the transform it replaced; the
/// position, rotation and scale sub-commands are derived from those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateObject {
    pub object: ObjectJson,
    pub old_position: Vec3,
    pub old_rotation: Vec3,
    pub old_scale: Vec3,
}

impl UpdateObject {
    pub fn new(scene: &Scene, target: &ObjectSnapshot) -> Result<Self, CommandError> {
        let current = scene.object_by_uuid(target.id)?.transform;
        Ok(Self {
            object: ObjectJson::from_snapshot(target),
            old_position: current.position,
            old_rotation: current.rotation,
            old_scale: current.scale,
        })
    }

    fn parts(&self) -> (SetPosition, SetRotation, SetScale) {
        let id = self.object.uuid();
        let target = &self.object.object;
        (
            SetPosition {
                object_uuid: id,
                old_position: self.old_position,
                new_position: target.position,
            },
            SetRotation {
                object_uuid: id,
                old_rotation: self.old_rotation,
                new_rotation: target.rotation,
            },
            SetScale {
                object_uuid: id,
                old_scale: self.old_scale,
                new_scale: target.scale,
            },
        )
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        let (position, rotation, scale) = self.parts();
        position.execute(scene)?;
        rotation.execute(scene)?;
        scale.execute(scene)
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        let (position, rotation, scale) = self.parts();
        position.undo(scene)?;
        rotation.undo(scene)?;
        scale.undo(scene)
    }

    pub fn update(&mut self, newer: &Self) {
        self.object = newer.object.clone();
    }
}
