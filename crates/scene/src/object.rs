use glam::Vec3;
use seg_common::{ObjectId, Transform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node in the scene graph.
///
/// `parent == None` means the object is a direct child of the scene root.
/// Hierarchy links are owned by [`Scene`](crate::Scene) and only readable here.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    /// Type tag such as `"Mesh"` or `"Group"`.
    pub kind: String,
    pub transform: Transform,
    pub visible: bool,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
}

impl SceneObject {
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }
}

/// An owned, detached object subtree.
///
/// Snapshots are what commands carry around: they are produced by removing or
/// cloning a subtree and consumed by adding one back.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub name: String,
    pub kind: String,
    pub transform: Transform,
    pub visible: bool,
    pub children: Vec<ObjectSnapshot>,
}

impl ObjectSnapshot {
    /// A fresh object with a new id and identity transform.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            kind: kind.into(),
            transform: Transform::default(),
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_child(mut self, child: ObjectSnapshot) -> Self {
        self.children.push(child);
        self
    }

    /// Ids of this object and all descendants, depth-first.
    pub fn ids(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<ObjectId>) {
        out.push(self.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

/// Scalar attributes that can be set generically (see `SetValueCommand`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectAttribute {
    Name,
    Visible,
}

impl fmt::Display for ObjectAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Visible => f.write_str("visible"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Text(String),
}

impl AttributeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Text(_) => "string",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_ids_are_depth_first() {
        let leaf = ObjectSnapshot::new("Mesh", "leaf");
        let mid = ObjectSnapshot::new("Group", "mid").with_child(leaf.clone());
        let other = ObjectSnapshot::new("Mesh", "other");
        let root = ObjectSnapshot::new("Group", "root")
            .with_child(mid.clone())
            .with_child(other.clone());

        assert_eq!(root.ids(), vec![root.id, mid.id, leaf.id, other.id]);
    }

    #[test]
    fn attribute_value_json_is_untagged() {
        let v: AttributeValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, AttributeValue::Bool(true));
        let v: AttributeValue = serde_json::from_str("\"Cube\"").unwrap();
        assert_eq!(v, AttributeValue::Text("Cube".into()));
    }

    #[test]
    fn attribute_names_match_property_names() {
        assert_eq!(serde_json::to_string(&ObjectAttribute::Visible).unwrap(), "\"visible\"");
        assert_eq!(ObjectAttribute::Name.to_string(), "name");
    }
}
