use seg_common::ObjectId;
use seg_scene::{AttributeValue, ObjectAttribute, Scene};
use serde::{Deserialize, Serialize};

use crate::command::CommandError;

/// Set a scalar attribute (`name`, `visible`) on one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetValue {
    pub object_uuid: ObjectId,
    pub attribute_name: ObjectAttribute,
    pub old_value: AttributeValue,
    pub new_value: AttributeValue,
}

impl SetValue {
    pub fn new(
        scene: &Scene,
        id: ObjectId,
        attribute: ObjectAttribute,
        value: AttributeValue,
    ) -> Result<Self, CommandError> {
        Ok(Self {
            object_uuid: id,
            attribute_name: attribute,
            old_value: scene.attribute(id, attribute)?,
            new_value: value,
        })
    }

    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_attribute(self.object_uuid, self.attribute_name, &self.new_value)?)
    }

    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        Ok(scene.set_attribute(self.object_uuid, self.attribute_name, &self.old_value)?)
    }

    pub fn update(&mut self, newer: &Self) {
        self.new_value = newer.new_value.clone();
    }
}
