use glam::Vec3;
use seg_common::ObjectId;
use seg_scene::Scene;
use serde::{Deserialize, Serialize};

use crate::command::CommandError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPosition {
    pub object_uuid: ObjectId,
    pub old_position: Vec3,
    pub new_position: Vec3,
}

impl SetPosition {
    pub fn new(scene: &Scene, id: ObjectId, position: Vec3) -> Result<Self, CommandError> {
        Ok(Self {
            object_uuid: id,
            old_position: scene.object_by_uuid(id)?.transform.position,
            new_position: position,
        })
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_position(self.object_uuid, self.new_position)?)
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_position(self.object_uuid, self.old_position)?)
    }

    pub fn update(&mut self, newer: &Self) {
        self.new_position = newer.new_position;
    }
}

/// Rotation values are Euler angles in radians (XYZ order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRotation {
    pub object_uuid: ObjectId,
    pub old_rotation: Vec3,
    pub new_rotation: Vec3,
}

impl SetRotation {
    pub fn new(scene: &Scene, id: ObjectId, rotation: Vec3) -> Result<Self, CommandError> {
        Ok(Self {
            object_uuid: id,
            old_rotation: scene.object_by_uuid(id)?.transform.rotation,
            new_rotation: rotation,
        })
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_rotation(self.object_uuid, self.new_rotation)?)
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_rotation(self.object_uuid, self.old_rotation)?)
    }

    pub fn update(&mut self, newer: &Self) {
        self.new_rotation = newer.new_rotation;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScale {
    pub object_uuid: ObjectId,
    pub old_scale: Vec3,
    pub new_scale: Vec3,
}

impl SetScale {
    pub fn new(scene: &Scene, id: ObjectId, scale: Vec3) -> Result<Self, CommandError> {
        Ok(Self {
            object_uuid: id,
            old_scale: scene.object_by_uuid(id)?.transform.scale,
            new_scale: scale,
        })
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_scale(self.object_uuid, self.new_scale)?)
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_scale(self.object_uuid, self.old_scale)?)
    }

    pub fn update(&mut self, newer: &Self) {
        self.new_scale = newer.new_scale;
    }
}
