use seg_common::ObjectId;
use seg_editor::{Editor, History};
use seg_scene::Scene;

/// Scene inspector for developer tooling.
///
/// Read-only queries against the scene graph for debugging and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &Scene) -> SceneSummary {
        SceneSummary {
            name: scene.name().to_string(),
            object_count: scene.len(),
            root_count: scene.roots().len(),
            max_depth: scene
                .traverse()
                .into_iter()
                .map(|id| depth(scene, id))
                .max()
                .unwrap_or(0),
            pending_events: scene.events().len(),
        }
    }

    pub fn inspect_object(scene: &Scene, id: ObjectId) -> Option<ObjectInfo> {
        scene.get(id).map(|obj| {
            let t = obj.transform;
            ObjectInfo {
                id,
                name: obj.name.clone(),
                kind: obj.kind.clone(),
                parent: obj.parent(),
                depth: depth(scene, id),
                child_count: obj.children().len(),
                visible: obj.visible,
                position: t.position.to_array(),
                rotation: t.rotation.to_array(),
                scale: t.scale.to_array(),
            }
        })
    }

    /// Every object in depth-first order.
    pub fn list_objects(scene: &Scene) -> Vec<ObjectInfo> {
        scene
            .traverse()
            .into_iter()
            .filter_map(|id| Self::inspect_object(scene, id))
            .collect()
    }
}

fn depth(scene: &Scene, id: ObjectId) -> usize {
    let mut depth = 0;
    let mut current = scene.get(id).and_then(|o| o.parent());
    while let Some(parent) = current {
        depth += 1;
        current = scene.get(parent).and_then(|o| o.parent());
    }
    depth
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub name: String,
    pub object_count: usize,
    pub root_count: usize,
    pub max_depth: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene '{}': objects={} roots={} depth={} pending_events={}",
            self.name, self.object_count, self.root_count, self.max_depth, self.pending_events
        )
    }
}

/// Detailed info about a single object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub name: String,
    pub kind: String,
    pub parent: Option<ObjectId>,
    pub depth: usize,
    pub child_count: usize,
    pub visible: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl std::fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:indent$}{} [{:.8}] '{}' pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
            "",
            self.kind,
            self.id.to_string(),
            self.name,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
            indent = self.depth * 2,
        )?;
        if !self.visible {
            write!(f, " hidden")?;
        }
        Ok(())
    }
}

/// History inspector: the editor timeline as a flat list.
pub struct HistoryInspector;

impl HistoryInspector {
    /// Applied entries first, then undone ones in redo order.
    pub fn entries(history: &History) -> Vec<HistoryRow> {
        let applied = history.undo_len();
        history
            .entries()
            .into_iter()
            .enumerate()
            .map(|(i, entry)| HistoryRow {
                id: entry.id,
                name: entry.name,
                type_name: entry.type_name,
                undone: i >= applied,
            })
            .collect()
    }

    /// One line: applied and undone counts plus the current entry id.
    pub fn summary(editor: &Editor) -> String {
        let history = editor.history();
        format!(
            "History: {} applied, {} undone, current={}",
            history.undo_len(),
            history.redo_len(),
            history.current_id()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: u64,
    pub name: String,
    pub type_name: String,
    pub undone: bool,
}

impl std::fmt::Display for HistoryRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.undone { " " } else { "*" };
        write!(f, "{marker} #{:<4} {:<22} {}", self.id, self.type_name, self.name)
    }
}
