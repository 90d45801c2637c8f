use glam::Vec3;
use seg_common::ObjectId;
use std::collections::BTreeMap;

use crate::object::{AttributeValue, ObjectAttribute, ObjectSnapshot, SceneObject};

/// A change record produced by every mutation to the scene.
///
/// The editor drains these after each command to notify observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A subtree rooted at `id` was attached.
    Added { id: ObjectId },
    /// A subtree rooted at `id` was detached.
    Removed { id: ObjectId },
    /// Transform or attribute of `id` changed.
    Changed { id: ObjectId },
    /// An object (or the scene root) took a new uuid.
    Rekeyed { old: ObjectId, new: ObjectId },
    /// `id` was reparented or reordered.
    Moved {
        id: ObjectId,
        old_parent: Option<ObjectId>,
        new_parent: Option<ObjectId>,
    },
}

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),
    #[error("parent {0} not found")]
    ParentNotFound(ObjectId),
    #[error("object {0} already exists in the scene")]
    DuplicateObject(ObjectId),
    #[error("index {index} out of range for {len} siblings")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cannot move {0} under itself or one of its descendants")]
    InvalidMove(ObjectId),
    #[error("attribute `{attribute}` expects a {expected} value, got {actual}")]
    AttributeMismatch {
        attribute: ObjectAttribute,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("the scene root has no `{0}` attribute")]
    RootAttribute(ObjectAttribute),
    #[error("expected a scene root, found object type `{0}`")]
    NotAScene(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The scene graph the editor operates on.
///
/// Objects live in a flat map keyed by id; hierarchy is kept as ordered child
/// lists so that sibling order survives remove/re-add cycles.
#[derive(Debug, Clone)]
pub struct Scene {
    id: ObjectId,
    name: String,
    objects: BTreeMap<ObjectId, SceneObject>,
    roots: Vec<ObjectId>,
    events: Vec<SceneEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_id(ObjectId::new(), "Scene")
    }

    pub fn with_id(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            objects: BTreeMap::new(),
            roots: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Lookup by uuid, failing with [`SceneError::ObjectNotFound`].
    pub fn object_by_uuid(&self, id: ObjectId) -> Result<&SceneObject, SceneError> {
        self.objects.get(&id).ok_or(SceneError::ObjectNotFound(id))
    }

    /// First object with the given name in depth-first order.
    pub fn object_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.traverse()
            .into_iter()
            .filter_map(|id| self.objects.get(&id))
            .find(|o| o.name == name)
    }

    /// Direct children of the scene root.
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    pub fn parent_of(&self, id: ObjectId) -> Result<Option<ObjectId>, SceneError> {
        Ok(self.object_by_uuid(id)?.parent)
    }

    /// Ordered children of `parent`, or of the root when `parent` is `None`.
    pub fn children_of(&self, parent: Option<ObjectId>) -> Result<&[ObjectId], SceneError> {
        match parent {
            None => Ok(&self.roots),
            Some(p) => self
                .objects
                .get(&p)
                .map(|o| o.children.as_slice())
                .ok_or(SceneError::ParentNotFound(p)),
        }
    }

    /// Position of `id` within its sibling list.
    pub fn index_of(&self, id: ObjectId) -> Result<usize, SceneError> {
        let parent = self.parent_of(id)?;
        self.children_of(parent)?
            .iter()
            .position(|c| *c == id)
            .ok_or(SceneError::ObjectNotFound(id))
    }

    /// All object ids in depth-first pre-order, starting from the root list.
    pub fn traverse(&self) -> Vec<ObjectId> {
        let mut out = Vec::with_capacity(self.objects.len());
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(obj) = self.objects.get(&id) {
                stack.extend(obj.children.iter().rev().copied());
            }
        }
        out
    }

    /// Whether `id` is `ancestor` or lies somewhere below it.
    pub fn is_descendant_of(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.objects.get(&current).and_then(|o| o.parent);
        }
        false
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Attach a subtree under `parent` (root when `None`) at `index`
    /// (appended when `None`). Returns the id of the subtree root.
    pub fn add(
        &mut self,
        snapshot: ObjectSnapshot,
        parent: Option<ObjectId>,
        index: Option<usize>,
    ) -> Result<ObjectId, SceneError> {
        let len = self.children_of(parent)?.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(SceneError::IndexOutOfRange { index, len });
        }
        let ids = snapshot.ids();
        for (i, id) in ids.iter().enumerate() {
            if self.objects.contains_key(id) || ids[..i].contains(id) {
                return Err(SceneError::DuplicateObject(*id));
            }
        }

        let id = snapshot.id;
        self.insert_subtree(snapshot, parent);
        self.siblings_mut(parent)?.insert(index, id);
        self.events.push(SceneEvent::Added { id });
        Ok(id)
    }

    /// Detach the subtree rooted at `id` and return it.
    pub fn remove(&mut self, id: ObjectId) -> Result<ObjectSnapshot, SceneError> {
        let snapshot = self.snapshot(id)?;
        let parent = self.parent_of(id)?;
        self.siblings_mut(parent)?.retain(|c| *c != id);
        for child in snapshot.ids() {
            self.objects.remove(&child);
        }
        self.events.push(SceneEvent::Removed { id });
        Ok(snapshot)
    }

    /// Clone the subtree rooted at `id`.
    pub fn snapshot(&self, id: ObjectId) -> Result<ObjectSnapshot, SceneError> {
        let obj = self.object_by_uuid(id)?;
        let children = obj
            .children
            .iter()
            .map(|c| self.snapshot(*c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ObjectSnapshot {
            id: obj.id,
            name: obj.name.clone(),
            kind: obj.kind.clone(),
            transform: obj.transform,
            visible: obj.visible,
            children,
        })
    }

    /// Reparent `id` under `new_parent` at `index` of the new sibling list,
    /// measured after `id` has been detached from its old list.
    pub fn move_object(
        &mut self,
        id: ObjectId,
        new_parent: Option<ObjectId>,
        index: usize,
    ) -> Result<(), SceneError> {
        let old_parent = self.parent_of(id)?;
        if let Some(p) = new_parent {
            if !self.objects.contains_key(&p) {
                return Err(SceneError::ParentNotFound(p));
            }
            if self.is_descendant_of(p, id) {
                return Err(SceneError::InvalidMove(id));
            }
        }
        let len = self.children_of(new_parent)?.len() - usize::from(old_parent == new_parent);
        if index > len {
            return Err(SceneError::IndexOutOfRange { index, len });
        }

        self.siblings_mut(old_parent)?.retain(|c| *c != id);
        self.siblings_mut(new_parent)?.insert(index, id);
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.parent = new_parent;
        }
        self.events.push(SceneEvent::Moved {
            id,
            old_parent,
            new_parent,
        });
        Ok(())
    }

    pub fn set_position(&mut self, id: ObjectId, position: Vec3) -> Result<(), SceneError> {
        self.modify(id, |o| o.transform.position = position)
    }

    pub fn set_rotation(&mut self, id: ObjectId, rotation: Vec3) -> Result<(), SceneError> {
        self.modify(id, |o| o.transform.rotation = rotation)
    }

    pub fn set_scale(&mut self, id: ObjectId, scale: Vec3) -> Result<(), SceneError> {
        self.modify(id, |o| o.transform.scale = scale)
    }

    pub fn set_name(&mut self, id: ObjectId, name: impl Into<String>) -> Result<(), SceneError> {
        let name = name.into();
        self.modify(id, |o| o.name = name)
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> Result<(), SceneError> {
        self.modify(id, |o| o.visible = visible)
    }

    /// Give an object, or the scene root when `old` is the scene id, a new
    /// uuid. Parent and child links follow the object.
    pub fn set_uuid(&mut self, old: ObjectId, new: ObjectId) -> Result<(), SceneError> {
        if old == new {
            return Ok(());
        }
        if new == self.id || self.objects.contains_key(&new) {
            return Err(SceneError::DuplicateObject(new));
        }
        if old == self.id {
            self.id = new;
        } else {
            let mut obj = self
                .objects
                .remove(&old)
                .ok_or(SceneError::ObjectNotFound(old))?;
            obj.id = new;
            let parent = obj.parent;
            for child in &obj.children {
                if let Some(c) = self.objects.get_mut(child) {
                    c.parent = Some(new);
                }
            }
            self.objects.insert(new, obj);
            for sibling in self.siblings_mut(parent)?.iter_mut() {
                if *sibling == old {
                    *sibling = new;
                }
            }
        }
        self.events.push(SceneEvent::Rekeyed { old, new });
        Ok(())
    }

    /// Current value of a generic attribute. The scene root answers for its
    /// own id: its name, and always visible.
    pub fn attribute(
        &self,
        id: ObjectId,
        attribute: ObjectAttribute,
    ) -> Result<AttributeValue, SceneError> {
        if id == self.id {
            return Ok(match attribute {
                ObjectAttribute::Name => AttributeValue::Text(self.name.clone()),
                ObjectAttribute::Visible => AttributeValue::Bool(true),
            });
        }
        let obj = self.object_by_uuid(id)?;
        Ok(match attribute {
            ObjectAttribute::Name => AttributeValue::Text(obj.name.clone()),
            ObjectAttribute::Visible => AttributeValue::Bool(obj.visible),
        })
    }

    /// Set a generic attribute. The value type must match the attribute.
    pub fn set_attribute(
        &mut self,
        id: ObjectId,
        attribute: ObjectAttribute,
        value: &AttributeValue,
    ) -> Result<(), SceneError> {
        match (attribute, value) {
            (ObjectAttribute::Name, AttributeValue::Text(name)) if id == self.id => {
                self.name = name.clone();
                self.events.push(SceneEvent::Changed { id });
                Ok(())
            }
            (ObjectAttribute::Visible, AttributeValue::Bool(_)) if id == self.id => {
                Err(SceneError::RootAttribute(attribute))
            }
            (ObjectAttribute::Name, AttributeValue::Text(name)) => self.set_name(id, name.clone()),
            (ObjectAttribute::Visible, AttributeValue::Bool(v)) => self.set_visible(id, *v),
            (ObjectAttribute::Name, other) => Err(SceneError::AttributeMismatch {
                attribute,
                expected: "string",
                actual: other.type_name(),
            }),
            (ObjectAttribute::Visible, other) => Err(SceneError::AttributeMismatch {
                attribute,
                expected: "bool",
                actual: other.type_name(),
            }),
        }
    }

    fn modify(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut SceneObject),
    ) -> Result<(), SceneError> {
        let obj = self
            .objects
            .get_mut(&id)
            .ok_or(SceneError::ObjectNotFound(id))?;
        f(obj);
        self.events.push(SceneEvent::Changed { id });
        Ok(())
    }

    fn siblings_mut(&mut self, parent: Option<ObjectId>) -> Result<&mut Vec<ObjectId>, SceneError> {
        match parent {
            None => Ok(&mut self.roots),
            Some(p) => self
                .objects
                .get_mut(&p)
                .map(|o| &mut o.children)
                .ok_or(SceneError::ParentNotFound(p)),
        }
    }

    fn insert_subtree(&mut self, snapshot: ObjectSnapshot, parent: Option<ObjectId>) {
        let ObjectSnapshot {
            id,
            name,
            kind,
            transform,
            visible,
            children,
        } = snapshot;
        let child_ids = children.iter().map(|c| c.id).collect();
        self.objects.insert(
            id,
            SceneObject {
                id,
                name,
                kind,
                transform,
                visible,
                parent,
                children: child_ids,
            },
        );
        for child in children {
            self.insert_subtree(child, Some(id));
        }
    }
}
