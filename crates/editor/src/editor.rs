use seg_common::ObjectId;
use seg_scene::{ObjectJson, ObjectSnapshot, Scene, SceneError, SceneEvent, SceneObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::command::{Command, CommandError};
use crate::config::EditorConfig;
use crate::history::{EntryInfo, History};
use crate::signal::Signal;

/// Observers notified after each editor operation.
#[derive(Debug, Default)]
pub struct EditorSignals {
    pub object_added: Signal<ObjectId>,
    pub object_removed: Signal<ObjectId>,
    pub object_changed: Signal<ObjectId>,
    pub object_selected: Signal<Option<ObjectId>>,
    pub scene_graph_changed: Signal<()>,
    /// Carries the newest applied history entry, `None` when nothing is applied.
    pub history_changed: Signal<Option<EntryInfo>>,
}

const PROJECT_FORMAT: &str = "SegProject";
const PROJECT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ProjectMetadata {
    #[serde(rename = "type")]
    kind: String,
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectInfo {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct EditorJson {
    metadata: ProjectMetadata,
    project: ProjectInfo,
    scene: ObjectJson,
    history: Value,
    #[serde(default)]
    selected: Option<ObjectId>,
}

/// The command-driven scene editor.
///
/// Every scene mutation goes through [`Editor::execute`] (or undo/redo), so
/// it lands in the history and is announced on [`EditorSignals`].
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    scene: Scene,
    history: History,
    selected: Option<ObjectId>,
    pub signals: EditorSignals,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// An empty scene and history configured by `config`.
    pub fn new(config: EditorConfig) -> Self {
        let history = History::new(config.history.clone());
        Self {
            config,
            scene: Scene::new(),
            history,
            selected: None,
            signals: EditorSignals::default(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn project_name(&self) -> &str {
        &self.config.project_name
    }

    /// Read-only view of the scene. Changes go through [`Editor::execute`].
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The undo/redo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Execute and record `cmd`, optionally renaming its history entry.
    /// Returns the id of the entry holding the change.
    pub fn execute(&mut self, cmd: Command, name: Option<&str>) -> Result<u64, CommandError> {
        let result = self.history.execute(&mut self.scene, cmd, name);
        self.flush_events();
        let id = result?;
        self.signals.history_changed.dispatch(&self.history.last_entry());
        Ok(id)
    }

    /// Revert the newest applied entry and return it.
    pub fn undo(&mut self) -> Result<EntryInfo, CommandError> {
        let result = self.history.undo(&mut self.scene);
        self.flush_events();
        let info = result?;
        self.signals.history_changed.dispatch(&self.history.last_entry());
        Ok(info)
    }

    /// Re-apply the most recently undone entry and return it.
    pub fn redo(&mut self) -> Result<EntryInfo, CommandError> {
        let result = self.history.redo(&mut self.scene);
        self.flush_events();
        let info = result?;
        self.signals.history_changed.dispatch(&self.history.last_entry());
        Ok(info)
    }

    /// Undo or redo until entry `id` is the newest applied one (`0` for the
    /// initial state).
    pub fn go_to_state(&mut self, id: u64) -> Result<(), CommandError> {
        let result = self.history.go_to_state(&mut self.scene, id);
        self.flush_events();
        self.signals.history_changed.dispatch(&self.history.last_entry());
        result
    }

    /// Forget all history. The scene is left as it is.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.signals.history_changed.dispatch(&None);
    }

    /// Empty the scene and forget all history. Not undoable.
    pub fn clear(&mut self) -> Result<(), CommandError> {
        let roots = self.scene.roots().to_vec();
        for id in roots {
            self.scene.remove(id)?;
        }
        self.flush_events();
        self.clear_history();
        Ok(())
    }

    pub fn object_by_uuid(&self, id: ObjectId) -> Option<&SceneObject> {
        self.scene.get(id)
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    /// Select an object in the scene. Fails if `id` is unknown.
    pub fn select(&mut self, id: ObjectId) -> Result<(), CommandError> {
        if !self.scene.contains(id) {
            return Err(SceneError::ObjectNotFound(id).into());
        }
        self.set_selected(Some(id));
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.set_selected(None);
    }

    /// Apply an incoming copy of an object. Unknown objects are added first;
    /// the transform change is then recorded as an update command, so
    /// a stream of updates to one object coalesces into one undo step.
    pub fn update_object(&mut self, target: &ObjectSnapshot) -> Result<u64, CommandError> {
        if !self.scene.contains(target.id) {
            self.execute(Command::add_object(target, None, None), None)?;
        }
        let cmd = Command::update_object(&self.scene, target)?;
        self.execute(cmd, None)
    }

    fn set_selected(&mut self, id: Option<ObjectId>) {
        if self.selected == id {
            return;
        }
        self.selected = id;
        self.signals.object_selected.dispatch(&id);
    }

    fn flush_events(&mut self) {
        let events = self.scene.drain_events();
        let mut graph_changed = false;

        for event in &events {
            match *event {
                SceneEvent::Added { id } => {
                    graph_changed = true;
                    self.signals.object_added.dispatch(&id);
                    if self.scene.contains(id) {
                        self.set_selected(Some(id));
                    }
                }
                SceneEvent::Removed { id } => {
                    graph_changed = true;
                    self.signals.object_removed.dispatch(&id);
                }
                SceneEvent::Changed { id } => self.signals.object_changed.dispatch(&id),
                SceneEvent::Rekeyed { old, new } => {
                    graph_changed = true;
                    if self.selected == Some(old) {
                        self.set_selected(Some(new));
                    }
                    self.signals.object_changed.dispatch(&new);
                }
                SceneEvent::Moved { .. } => graph_changed = true,
            }
        }

        if self.selected.is_some_and(|sel| !self.scene.contains(sel)) {
            self.set_selected(None);
        }

        if graph_changed {
            self.signals.scene_graph_changed.dispatch(&());
        }
        if !events.is_empty() {
            debug!(events = events.len(), "dispatched scene events");
        }
    }

    /// `{ metadata, project: { name }, scene, history, selected }`.
    pub fn to_json(&self) -> Result<Value, CommandError> {
        let json = EditorJson {
            metadata: ProjectMetadata {
                kind: PROJECT_FORMAT.to_string(),
                version: PROJECT_VERSION,
            },
            project: ProjectInfo {
                name: self.config.project_name.clone(),
            },
            scene: self.scene.to_json()?,
            history: self.history.to_json()?,
            selected: self.selected,
        };
        Ok(serde_json::to_value(json)?)
    }

    /// Restore an editor from [`Editor::to_json`] output. History entries stay
    /// serialized until first undone or redone. The stored project name
    /// overrides the one in `config`.
    pub fn from_json(json: &Value, mut config: EditorConfig) -> Result<Self, CommandError> {
        let parsed: EditorJson = serde_json::from_value(json.clone())?;
        let scene = Scene::from_json(parsed.scene)?;
        let history = History::from_json(&parsed.history, config.history.clone())?;
        config.project_name = parsed.project.name;
        let selected = parsed.selected.filter(|id| scene.contains(*id));

        Ok(Self {
            config,
            scene,
            history,
            selected,
            signals: EditorSignals::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryConfig;
    use glam::Vec3;
    use seg_scene::ObjectAttribute;
    use std::sync::{Arc, Mutex};

    fn editor(merge_window_ms: u64) -> Editor {
        Editor::new(EditorConfig {
            project_name: "test".into(),
            history: HistoryConfig {
                merge_window_ms,
                max_undos: None,
            },
        })
    }

    fn add(editor: &mut Editor, name: &str) -> ObjectId {
        let obj = ObjectSnapshot::new("Mesh", name);
        editor
            .execute(Command::add_object(&obj, None, None), None)
            .unwrap();
        obj.id
    }

    fn record<T: Clone + Send + 'static>(signal: &mut Signal<T>) -> Arc<Mutex<Vec<T>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        signal.add(move |v: &T| log.lock().unwrap().push(v.clone()));
        seen
    }

    #[test]
    fn add_selects_and_undo_deselects() {
        let mut editor = editor(0);
        let selected = record(&mut editor.signals.object_selected);
        let added = record(&mut editor.signals.object_added);
        let removed = record(&mut editor.signals.object_removed);

        let id = add(&mut editor, "cube");
        assert_eq!(editor.selected(), Some(id));

        editor.undo().unwrap();
        assert_eq!(editor.selected(), None);
        assert!(editor.object_by_uuid(id).is_none());

        assert_eq!(*added.lock().unwrap(), vec![id]);
        assert_eq!(*removed.lock().unwrap(), vec![id]);
        assert_eq!(*selected.lock().unwrap(), vec![Some(id), None]);
    }

    #[test]
    fn removing_parent_clears_selected_child() {
        let mut editor = editor(0);
        let child = ObjectSnapshot::new("Mesh", "child");
        let group = ObjectSnapshot::new("Group", "group").with_child(child.clone());
        editor
            .execute(Command::add_object(&group, None, None), None)
            .unwrap();
        editor.select(child.id).unwrap();

        let cmd = Command::remove_object(editor.scene(), group.id).unwrap();
        editor.execute(cmd, None).unwrap();
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn select_unknown_object_fails() {
        let mut editor = editor(0);
        assert!(editor.select(ObjectId::new()).is_err());
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn signals_follow_commands() {
        let mut editor = editor(0);
        let id = add(&mut editor, "cube");
        let changed = record(&mut editor.signals.object_changed);
        let graph = record(&mut editor.signals.scene_graph_changed);
        let history = record(&mut editor.signals.history_changed);

        let cmd = Command::set_value(editor.scene(), id, ObjectAttribute::Name, "box").unwrap();
        editor.execute(cmd, None).unwrap();
        editor.undo().unwrap();

        assert_eq!(*changed.lock().unwrap(), vec![id, id]);
        assert!(graph.lock().unwrap().is_empty());
        let history = history.lock().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].as_ref().map(|e| e.id), Some(2));
        assert_eq!(history[1].as_ref().map(|e| e.id), Some(1));
    }

    #[test]
    fn drag_coalesces_within_window() {
        let mut editor = editor(60_000);
        let id = add(&mut editor, "cube");

        for step in 1..=10 {
            let target = Vec3::new(step as f32 * 0.1, 0.0, 0.0);
            let cmd = Command::set_position(editor.scene(), id, target).unwrap();
            editor.execute(cmd, None).unwrap();
        }
        assert_eq!(editor.history().undo_len(), 2);

        editor.undo().unwrap();
        assert_eq!(editor.scene().get(id).unwrap().transform.position, Vec3::ZERO);
    }

    #[test]
    fn drag_without_window_records_each_step() {
        let mut editor = editor(0);
        let id = add(&mut editor, "cube");

        for step in 1..=3 {
            let cmd = Command::set_position(editor.scene(), id, Vec3::splat(step as f32)).unwrap();
            editor.execute(cmd, None).unwrap();
        }
        assert_eq!(editor.history().undo_len(), 4);
    }

    #[test]
    fn update_object_adds_unknown_then_updates() {
        let mut editor = editor(60_000);
        let incoming = ObjectSnapshot::new("Mesh", "remote").with_position(Vec3::X);

        editor.update_object(&incoming).unwrap();
        assert_eq!(editor.history().undo_len(), 2);
        assert_eq!(
            editor.scene().get(incoming.id).unwrap().transform.position,
            Vec3::X
        );

        editor
            .update_object(&incoming.clone().with_position(Vec3::Y))
            .unwrap();
        editor
            .update_object(&incoming.clone().with_position(Vec3::Z))
            .unwrap();
        assert_eq!(editor.history().undo_len(), 2);
        assert_eq!(
            editor.scene().get(incoming.id).unwrap().transform.position,
            Vec3::Z
        );
    }

    #[test]
    fn go_to_state_and_clear() {
        let mut editor = editor(0);
        add(&mut editor, "a");
        add(&mut editor, "b");
        add(&mut editor, "c");

        editor.go_to_state(1).unwrap();
        assert_eq!(editor.scene().len(), 1);
        editor.go_to_state(3).unwrap();
        assert_eq!(editor.scene().len(), 3);

        editor.clear_history();
        assert!(!editor.history().can_undo());
        assert_eq!(editor.scene().len(), 3);

        editor.clear().unwrap();
        assert!(editor.scene().is_empty());
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn failed_command_leaves_state() {
        let mut editor = editor(0);
        add(&mut editor, "a");
        let orphan = ObjectSnapshot::new("Mesh", "orphan");
        let cmd = Command::add_object(&orphan, Some(ObjectId::new()), None);

        assert!(editor.execute(cmd, None).is_err());
        assert_eq!(editor.history().undo_len(), 1);
        assert_eq!(editor.scene().len(), 1);
    }

    #[test]
    fn json_round_trip_restores_scene_and_history() {
        let mut editor = editor(0);
        let id = add(&mut editor, "cube");
        let cmd = Command::set_scale(editor.scene(), id, Vec3::splat(2.0)).unwrap();
        editor.execute(cmd, Some("Grow")).unwrap();

        let json = editor.to_json().unwrap();
        assert_eq!(json["project"]["name"], "test");
        assert_eq!(json["scene"]["object"]["type"], "Scene");
        assert_eq!(json["history"]["undos"].as_array().unwrap().len(), 2);

        let mut restored = Editor::from_json(&json, EditorConfig::default()).unwrap();
        assert_eq!(restored.project_name(), "test");
        assert_eq!(restored.selected(), Some(id));
        assert_eq!(restored.history().undo_entries()[1].name, "Grow");

        restored.undo().unwrap();
        assert_eq!(restored.scene().get(id).unwrap().transform.scale, Vec3::ONE);
        restored.undo().unwrap();
        assert!(restored.scene().is_empty());
    }

    #[test]
    fn selection_follows_uuid_change() {
        let mut editor = editor(0);
        let id = add(&mut editor, "cube");
        let selected = record(&mut editor.signals.object_selected);
        let changed = record(&mut editor.signals.object_changed);
        let graph = record(&mut editor.signals.scene_graph_changed);

        let fresh = ObjectId::new();
        let cmd = Command::set_uuid(editor.scene(), id, fresh).unwrap();
        editor.execute(cmd, None).unwrap();
        assert_eq!(editor.selected(), Some(fresh));
        assert!(editor.object_by_uuid(fresh).is_some());

        editor.undo().unwrap();
        assert_eq!(editor.selected(), Some(id));

        assert_eq!(*selected.lock().unwrap(), vec![Some(fresh), Some(id)]);
        assert_eq!(*changed.lock().unwrap(), vec![fresh, id]);
        assert_eq!(graph.lock().unwrap().len(), 2);
    }

    #[test]
    fn set_scene_is_one_undo_step() {
        let mut editor = editor(0);
        add(&mut editor, "existing");
        let mut loaded = Scene::new();
        let ball = loaded.add(ObjectSnapshot::new("Mesh", "ball"), None, None).unwrap();
        let json = loaded.to_json().unwrap();

        let cmd = Command::set_scene(editor.scene(), json).unwrap();
        editor.execute(cmd, None).unwrap();
        assert_eq!(editor.scene().id(), loaded.id());
        assert_eq!(editor.selected(), Some(ball));
        assert_eq!(editor.history().undo_len(), 2);

        editor.undo().unwrap();
        assert_eq!(editor.scene().len(), 1);
        assert_eq!(editor.selected(), None);
    }
}
