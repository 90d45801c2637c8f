use glam::Vec3;
use seg_common::ObjectId;
use seg_scene::json::SCENE_KIND;
use seg_scene::{
    AttributeValue, ObjectAttribute, ObjectJson, ObjectSnapshot, Scene, SceneError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commands::{
    AddObject, MoveObject, MultiCmds, RemoveObject, SetPosition, SetRotation, SetScale, SetScene,
    SetUuid, SetValue, UpdateObject,
};

/// Errors from executing, undoing, merging or (de)serializing commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot merge {incoming} into {existing}")]
    NotMergeable {
        existing: &'static str,
        incoming: &'static str,
    },
    #[error("{before} is not a child of the destination parent")]
    InvalidBefore { before: ObjectId },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("no history entry with id {0}")]
    UnknownState(u64),
}

/// The payload of a command: what it changes and how to revert it.
///
/// Serialized with a `type` tag naming the command, followed by the
/// payload's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommandKind {
    #[serde(rename = "AddObjectCommand")]
    AddObject(AddObject),
    #[serde(rename = "RemoveObjectCommand")]
    RemoveObject(RemoveObject),
    #[serde(rename = "MoveObjectCommand")]
    MoveObject(MoveObject),
    #[serde(rename = "SetPositionCommand")]
    SetPosition(SetPosition),
    #[serde(rename = "SetRotationCommand")]
    SetRotation(SetRotation),
    #[serde(rename = "SetScaleCommand")]
    SetScale(SetScale),
    #[serde(rename = "SetValueCommand")]
    SetValue(SetValue),
    #[serde(rename = "SetUuidCommand")]
    SetUuid(SetUuid),
    #[serde(rename = "SetSceneCommand")]
    SetScene(SetScene),
    #[serde(rename = "MultiCmdsCommand")]
    MultiCmds(MultiCmds),
    #[serde(rename = "UpdateObjectCommand")]
    UpdateObject(UpdateObject),
}

impl CommandKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::AddObject(_) => "AddObjectCommand",
            Self::RemoveObject(_) => "RemoveObjectCommand",
            Self::MoveObject(_) => "MoveObjectCommand",
            Self::SetPosition(_) => "SetPositionCommand",
            Self::SetRotation(_) => "SetRotationCommand",
            Self::SetScale(_) => "SetScaleCommand",
            Self::SetValue(_) => "SetValueCommand",
            Self::SetUuid(_) => "SetUuidCommand",
            Self::SetScene(_) => "SetSceneCommand",
            Self::MultiCmds(_) => "MultiCmdsCommand",
            Self::UpdateObject(_) => "UpdateObjectCommand",
        }
    }

    /// Continuous edits merge by default; structural edits never do.
    fn updatable_by_default(&self) -> bool {
        matches!(
            self,
            Self::SetPosition(_)
                | Self::SetRotation(_)
                | Self::SetScale(_)
                | Self::SetValue(_)
                | Self::UpdateObject(_)
        )
    }
}

/// Identity of what a command edits. Two updatable commands merge only when
/// their keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeKey {
    pub type_name: &'static str,
    pub object: ObjectId,
    pub attribute: Option<ObjectAttribute>,
}

/// An undoable unit of scene mutation.
///
/// `id` is assigned by the history when the command is first recorded.
/// `in_memory` is false for commands that have not been executed or restored
/// from JSON yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    updatable: bool,
    #[serde(skip)]
    in_memory: bool,
    #[serde(flatten)]
    kind: CommandKind,
}

impl Command {
    pub fn new(kind: CommandKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            updatable: kind.updatable_by_default(),
            in_memory: false,
            kind,
        }
    }

    pub fn add_object(object: &ObjectSnapshot, parent: Option<ObjectId>, index: Option<usize>) -> Self {
        let name = format!("Add Object: {}", object.name);
        Self::new(CommandKind::AddObject(AddObject::new(object, parent, index)), name)
    }

    pub fn remove_object(scene: &Scene, id: ObjectId) -> Result<Self, CommandError> {
        let name = format!("Remove Object: {}", scene.object_by_uuid(id)?.name);
        Ok(Self::new(
            CommandKind::RemoveObject(RemoveObject::new(scene, id)?),
            name,
        ))
    }

    /// Move `id` under `new_parent` (the root when `None`), before the sibling
    /// `before` or at the end of the list.
    pub fn move_object(
        scene: &Scene,
        id: ObjectId,
        new_parent: Option<ObjectId>,
        before: Option<ObjectId>,
    ) -> Result<Self, CommandError> {
        let name = format!("Move Object: {}", scene.object_by_uuid(id)?.name);
        Ok(Self::new(
            CommandKind::MoveObject(MoveObject::new(scene, id, new_parent, before)?),
            name,
        ))
    }

    /// Move `id` to `position`. Merges with later moves of the same object.
    pub fn set_position(scene: &Scene, id: ObjectId, position: Vec3) -> Result<Self, CommandError> {
        Ok(Self::new(
            CommandKind::SetPosition(SetPosition::new(scene, id, position)?),
            "Set Position",
        ))
    }

    /// Set Euler angles (radians) on `id`.
    pub fn set_rotation(scene: &Scene, id: ObjectId, rotation: Vec3) -> Result<Self, CommandError> {
        Ok(Self::new(
            CommandKind::SetRotation(SetRotation::new(scene, id, rotation)?),
            "Set Rotation",
        ))
    }

    /// Set the scale of `id`.
    pub fn set_scale(scene: &Scene, id: ObjectId, scale: Vec3) -> Result<Self, CommandError> {
        Ok(Self::new(
            CommandKind::SetScale(SetScale::new(scene, id, scale)?),
            "Set Scale",
        ))
    }

    /// Set a scalar attribute. The value type is checked when the command runs.
    pub fn set_value(
        scene: &Scene,
        id: ObjectId,
        attribute: ObjectAttribute,
        value: impl Into<AttributeValue>,
    ) -> Result<Self, CommandError> {
        Ok(Self::new(
            CommandKind::SetValue(SetValue::new(scene, id, attribute, value.into())?),
            format!("Set {attribute}"),
        ))
    }

    /// Group `cmds` into one all-or-nothing history entry.
    pub fn multi(cmds: Vec<Command>) -> Self {
        Self::new(CommandKind::MultiCmds(MultiCmds::new(cmds)), "Multiple Changes")
    }

    /// Give `id` (an object or the scene root) the uuid `new_uuid`.
    pub fn set_uuid(scene: &Scene, id: ObjectId, new_uuid: ObjectId) -> Result<Self, CommandError> {
        Ok(Self::new(
            CommandKind::SetUuid(SetUuid::new(scene, id, new_uuid)?),
            "Set Uuid",
        ))
    }

    /// Load the serialized scene `json` into `scene`: rename the root, adopt
    /// the loaded uuid and add every loaded top-level object.
    ///
    /// The name is set before the uuid changes, so undo restores the uuid
    /// first and the rename still finds the original root.
    pub fn set_scene(scene: &Scene, json: ObjectJson) -> Result<Self, CommandError> {
        let record = json.object;
        if record.kind != SCENE_KIND {
            return Err(SceneError::NotAScene(record.kind).into());
        }
        let mut cmds = vec![
            Self::set_value(scene, scene.id(), ObjectAttribute::Name, record.name)?,
            Self::set_uuid(scene, scene.id(), record.uuid)?,
        ];
        for child in record.children {
            cmds.push(Self::add_object(&ObjectSnapshot::from(child), None, None));
        }
        Ok(Self::new(
            CommandKind::SetScene(SetScene {
                cmds: MultiCmds::new(cmds),
            }),
            "Set Scene",
        ))
    }

    /// Bring an existing object to the transform of `target` (matched by uuid).
    pub fn update_object(scene: &Scene, target: &ObjectSnapshot) -> Result<Self, CommandError> {
        let name = format!("Update Object: {}", target.name);
        Ok(Self::new(
            CommandKind::UpdateObject(UpdateObject::new(scene, target)?),
            name,
        ))
    }

    pub fn set_updatable(mut self, updatable: bool) -> Self {
        self.updatable = updatable;
        self
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    pub(crate) fn mark_in_memory(&mut self) {
        self.in_memory = true;
    }

    /// Apply the change to `scene`.
    pub fn execute(&self, scene: &mut Scene) -> Result<(), CommandError> {
        match &self.kind {
            CommandKind::AddObject(c) => c.execute(scene),
            CommandKind::RemoveObject(c) => c.execute(scene),
            CommandKind::MoveObject(c) => c.execute(scene),
            CommandKind::SetPosition(c) => c.execute(scene),
            CommandKind::SetRotation(c) => c.execute(scene),
            CommandKind::SetScale(c) => c.execute(scene),
            CommandKind::SetValue(c) => c.execute(scene),
            CommandKind::SetUuid(c) => c.execute(scene),
            CommandKind::SetScene(c) => c.execute(scene),
            CommandKind::MultiCmds(c) => c.execute(scene),
            CommandKind::UpdateObject(c) => c.execute(scene),
        }
    }

    /// Revert a previous [`Command::execute`].
    pub fn undo(&self, scene: &mut Scene) -> Result<(), CommandError> {
        match &self.kind {
            CommandKind::AddObject(c) => c.undo(scene),
            CommandKind::RemoveObject(c) => c.undo(scene),
            CommandKind::MoveObject(c) => c.undo(scene),
            CommandKind::SetPosition(c) => c.undo(scene),
            CommandKind::SetRotation(c) => c.undo(scene),
            CommandKind::SetScale(c) => c.undo(scene),
            CommandKind::SetValue(c) => c.undo(scene),
            CommandKind::SetUuid(c) => c.undo(scene),
            CommandKind::SetScene(c) => c.undo(scene),
            CommandKind::MultiCmds(c) => c.undo(scene),
            CommandKind::UpdateObject(c) => c.undo(scene),
        }
    }

    /// Fold a newer command into this one: keep this command's "before"
    /// state and adopt the newer "after" state.
    pub fn update(&mut self, newer: &Command) -> Result<(), CommandError> {
        match (&mut self.kind, &newer.kind) {
            (CommandKind::SetPosition(a), CommandKind::SetPosition(b)) => a.update(b),
            (CommandKind::SetRotation(a), CommandKind::SetRotation(b)) => a.update(b),
            (CommandKind::SetScale(a), CommandKind::SetScale(b)) => a.update(b),
            (CommandKind::SetValue(a), CommandKind::SetValue(b)) => a.update(b),
            (CommandKind::UpdateObject(a), CommandKind::UpdateObject(b)) => a.update(b),
            (existing, incoming) => {
                return Err(CommandError::NotMergeable {
                    existing: existing.type_name(),
                    incoming: incoming.type_name(),
                });
            }
        }
        Ok(())
    }

    /// `None` for commands without a single target; those never merge.
    pub fn merge_key(&self) -> Option<MergeKey> {
        let (object, attribute) = match &self.kind {
            CommandKind::SetPosition(c) => (c.object_uuid, None),
            CommandKind::SetRotation(c) => (c.object_uuid, None),
            CommandKind::SetScale(c) => (c.object_uuid, None),
            CommandKind::SetValue(c) => (c.object_uuid, Some(c.attribute_name)),
            CommandKind::UpdateObject(c) => (c.object.uuid(), None),
            CommandKind::AddObject(_)
            | CommandKind::RemoveObject(_)
            | CommandKind::MoveObject(_)
            | CommandKind::SetUuid(_)
            | CommandKind::SetScene(_)
            | CommandKind::MultiCmds(_) => return None,
        };
        Some(MergeKey {
            type_name: self.type_name(),
            object,
            attribute,
        })
    }

    /// Header fields plus the `type`-tagged payload.
    pub fn to_json(&self) -> Result<Value, CommandError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a command from [`Command::to_json`] output.
    pub fn from_json(json: &Value) -> Result<Self, CommandError> {
        let mut cmd: Command = serde_json::from_value(json.clone())?;
        cmd.in_memory = true;
        Ok(cmd)
    }
}
