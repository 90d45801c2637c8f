//! Object JSON format.
//!
//! ```text
//! {
//!   "metadata": { "version": 4.5, "type": "Object", "generator": "Object3D.toJSON" },
//!   "object": {
//!     "uuid": "...", "type": "Mesh", "name": "Cube",
//!     "position": [0, 0, 0], "rotation": [0, 0, 0], "scale": [1, 1, 1],
//!     "visible": true,
//!     "children": [ ...nested object records... ]
//!   }
//! }
//! ```
//!
//! A whole scene uses the same envelope with a root record of type `"Scene"`.

use glam::Vec3;
use seg_common::{ObjectId, Transform};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object::ObjectSnapshot;
use crate::scene::{Scene, SceneError};

pub const FORMAT_VERSION: f64 = 4.5;
pub const GENERATOR: &str = "Object3D.toJSON";
pub const SCENE_KIND: &str = "Scene";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub generator: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            kind: "Object".into(),
            generator: GENERATOR.into(),
        }
    }
}

/// One object in the serialized tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub uuid: ObjectId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default = "visible_default")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectRecord>,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

fn visible_default() -> bool {
    true
}

impl From<&ObjectSnapshot> for ObjectRecord {
    fn from(snapshot: &ObjectSnapshot) -> Self {
        Self {
            uuid: snapshot.id,
            kind: snapshot.kind.clone(),
            name: snapshot.name.clone(),
            position: snapshot.transform.position,
            rotation: snapshot.transform.rotation,
            scale: snapshot.transform.scale,
            visible: snapshot.visible,
            children: snapshot.children.iter().map(ObjectRecord::from).collect(),
        }
    }
}

impl From<ObjectRecord> for ObjectSnapshot {
    fn from(record: ObjectRecord) -> Self {
        Self {
            id: record.uuid,
            name: record.name,
            kind: record.kind,
            transform: Transform {
                position: record.position,
                rotation: record.rotation,
                scale: record.scale,
            },
            visible: record.visible,
            children: record.children.into_iter().map(ObjectSnapshot::from).collect(),
        }
    }
}

/// The serialization envelope for an object (or scene) tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectJson {
    #[serde(default)]
    pub metadata: Metadata,
    pub object: ObjectRecord,
}

impl ObjectJson {
    pub fn from_snapshot(snapshot: &ObjectSnapshot) -> Self {
        Self {
            metadata: Metadata::default(),
            object: ObjectRecord::from(snapshot),
        }
    }

    pub fn uuid(&self) -> ObjectId {
        self.object.uuid
    }

    pub fn to_value(&self) -> Result<Value, SceneError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Parses object JSON back into detached snapshots.
pub struct ObjectLoader;

impl ObjectLoader {
    pub fn parse(value: &Value) -> Result<ObjectSnapshot, SceneError> {
        let json: ObjectJson = serde_json::from_value(value.clone())?;
        Ok(Self::load(json))
    }

    pub fn load(json: ObjectJson) -> ObjectSnapshot {
        ObjectSnapshot::from(json.object)
    }
}

impl Scene {
    /// Serialize one object subtree.
    pub fn object_json(&self, id: ObjectId) -> Result<ObjectJson, SceneError> {
        Ok(ObjectJson::from_snapshot(&self.snapshot(id)?))
    }

    /// Serialize the whole scene under a root record of type `"Scene"`.
    pub fn to_json(&self) -> Result<ObjectJson, SceneError> {
        let children = self
            .roots()
            .iter()
            .map(|id| self.snapshot(*id).map(|s| ObjectRecord::from(&s)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ObjectJson {
            metadata: Metadata::default(),
            object: ObjectRecord {
                uuid: self.id(),
                kind: SCENE_KIND.into(),
                name: self.name().to_string(),
                position: Vec3::ZERO,
                rotation: Vec3::ZERO,
                scale: Vec3::ONE,
                visible: true,
                children,
            },
        })
    }

    /// Rebuild a scene from [`Scene::to_json`] output. The event log starts empty.
    pub fn from_json(json: ObjectJson) -> Result<Self, SceneError> {
        if json.object.kind != SCENE_KIND {
            return Err(SceneError::NotAScene(json.object.kind));
        }
        let mut scene = Scene::with_id(json.object.uuid, json.object.name);
        for record in json.object.children {
            scene.add(ObjectSnapshot::from(record), None, None)?;
        }
        scene.drain_events();
        Ok(scene)
    }
}
