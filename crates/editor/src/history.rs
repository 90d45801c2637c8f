use seg_scene::Scene;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, warn};

use crate::command::{Command, CommandError};
use crate::config::HistoryConfig;

/// Read-only description of a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub id: u64,
    pub name: String,
    pub type_name: String,
    pub in_memory: bool,
}

impl From<&Command> for EntryInfo {
    fn from(cmd: &Command) -> Self {
        Self {
            id: cmd.id().unwrap_or_default(),
            name: cmd.name().to_string(),
            type_name: cmd.type_name().to_string(),
            in_memory: cmd.is_in_memory(),
        }
    }
}

/// Header fields read from a serialized command without parsing its payload.
#[derive(Debug, Clone, Deserialize)]
struct StoredCommand {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(skip)]
    json: Value,
}

impl StoredCommand {
    fn parse(json: Value) -> Result<Self, CommandError> {
        let mut stored: StoredCommand = serde_json::from_value(json.clone())?;
        stored.json = json;
        Ok(stored)
    }

    fn restore(&self) -> Result<Command, CommandError> {
        let mut cmd = Command::from_json(&self.json)?;
        cmd.set_id(self.id);
        Ok(cmd)
    }
}

/// A history slot: either a live command or JSON waiting to be deserialized
/// on first undo/redo.
#[derive(Debug, Clone)]
enum Entry {
    Live(Command),
    Stored(StoredCommand),
}

impl Entry {
    fn id(&self) -> u64 {
        match self {
            Self::Live(cmd) => cmd.id().unwrap_or_default(),
            Self::Stored(stored) => stored.id,
        }
    }

    fn info(&self) -> EntryInfo {
        match self {
            Self::Live(cmd) => EntryInfo::from(cmd),
            Self::Stored(stored) => EntryInfo {
                id: stored.id,
                name: stored.name.clone(),
                type_name: stored.type_name.clone(),
                in_memory: false,
            },
        }
    }

    fn to_json(&self) -> Result<Value, CommandError> {
        match self {
            Self::Live(cmd) => cmd.to_json(),
            Self::Stored(stored) => Ok(stored.json.clone()),
        }
    }

    fn load(&mut self) -> Result<&Command, CommandError> {
        if let Self::Stored(stored) = self {
            let cmd = stored.restore()?;
            debug!(id = stored.id, command = %stored.type_name, "deserialized history entry");
            *self = Self::Live(cmd);
        }
        match self {
            Self::Live(cmd) => Ok(cmd),
            Self::Stored(stored) => Err(CommandError::UnknownState(stored.id)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryJson {
    #[serde(default)]
    undos: Vec<Value>,
    #[serde(default)]
    redos: Vec<Value>,
}

/// Linear undo/redo history.
///
/// Executing a new command clears the redo stack. Updatable commands that hit
/// the same target within the merge window fold into the previous entry
/// instead of pushing a new one, so a drag becomes a single undo step.
#[derive(Debug)]
pub struct History {
    undos: VecDeque<Entry>,
    redos: Vec<Entry>,
    id_counter: u64,
    last_cmd_time: Option<Instant>,
    config: HistoryConfig,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undos: VecDeque::new(),
            redos: Vec::new(),
            id_counter: 0,
            last_cmd_time: None,
            config,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Execute `cmd` and record it. Returns the id of the entry that now
    /// holds the change (the previous entry's id when merged).
    pub fn execute(
        &mut self,
        scene: &mut Scene,
        cmd: Command,
        name: Option<&str>,
    ) -> Result<u64, CommandError> {
        let now = Instant::now();
        let id = match self.try_merge(scene, &cmd, name, now)? {
            Some(id) => {
                debug!(id, command = cmd.type_name(), "merged into previous command");
                id
            }
            None => self.push(scene, cmd, name)?,
        };
        self.last_cmd_time = Some(now);
        self.redos.clear();
        Ok(id)
    }

    fn try_merge(
        &mut self,
        scene: &mut Scene,
        cmd: &Command,
        name: Option<&str>,
        now: Instant,
    ) -> Result<Option<u64>, CommandError> {
        let within_window = self
            .last_cmd_time
            .is_some_and(|t| now.duration_since(t) < self.config.merge_window());
        if !within_window || !cmd.is_updatable() {
            return Ok(None);
        }
        let Some(Entry::Live(last)) = self.undos.back_mut() else {
            return Ok(None);
        };
        if !last.is_updatable() || last.merge_key().is_none() || last.merge_key() != cmd.merge_key()
        {
            return Ok(None);
        }

        let previous = last.clone();
        last.update(cmd)?;
        if let Err(err) = last.execute(scene) {
            *last = previous;
            return Err(err);
        }
        if let Some(name) = name {
            last.set_name(name);
        }
        Ok(last.id())
    }

    fn push(&mut self, scene: &mut Scene, mut cmd: Command, name: Option<&str>) -> Result<u64, CommandError> {
        cmd.execute(scene)?;
        self.id_counter += 1;
        cmd.set_id(self.id_counter);
        if let Some(name) = name {
            cmd.set_name(name);
        }
        cmd.mark_in_memory();
        debug!(id = self.id_counter, command = cmd.type_name(), name = cmd.name(), "executed");
        self.undos.push_back(Entry::Live(cmd));

        if let Some(max) = self.config.max_undos.filter(|max| *max > 0) {
            while self.undos.len() > max {
                if let Some(dropped) = self.undos.pop_front() {
                    warn!(id = dropped.id(), max, "history full, dropping oldest entry");
                }
            }
        }
        Ok(self.id_counter)
    }

    /// Revert the most recent entry. On failure both stacks are left as they were.
    pub fn undo(&mut self, scene: &mut Scene) -> Result<EntryInfo, CommandError> {
        let Some(entry) = self.undos.back_mut() else {
            return Err(CommandError::NothingToUndo);
        };
        let cmd = entry.load()?;
        cmd.undo(scene)?;
        let info = EntryInfo::from(cmd);
        debug!(id = info.id, command = %info.type_name, "undo");

        if let Some(entry) = self.undos.pop_back() {
            self.redos.push(entry);
        }
        self.last_cmd_time = None;
        Ok(info)
    }

    /// Re-apply the most recently undone entry.
    pub fn redo(&mut self, scene: &mut Scene) -> Result<EntryInfo, CommandError> {
        let Some(entry) = self.redos.last_mut() else {
            return Err(CommandError::NothingToRedo);
        };
        let cmd = entry.load()?;
        cmd.execute(scene)?;
        let info = EntryInfo::from(cmd);
        debug!(id = info.id, command = %info.type_name, "redo");

        if let Some(entry) = self.redos.pop() {
            self.undos.push_back(entry);
        }
        self.last_cmd_time = None;
        Ok(info)
    }

    /// Undo or redo until the entry `id` is the newest applied one.
    /// `0` means the state before any recorded command.
    pub fn go_to_state(&mut self, scene: &mut Scene, id: u64) -> Result<(), CommandError> {
        let known = self.undos.iter().chain(&self.redos).any(|e| e.id() == id);
        if id != 0 && !known {
            return Err(CommandError::UnknownState(id));
        }

        if id > self.current_id() {
            while self.current_id() < id {
                self.redo(scene)?;
            }
        } else {
            while self.current_id() != id {
                self.undo(scene)?;
            }
        }
        Ok(())
    }

    /// Id of the newest applied entry, `0` when nothing is applied.
    pub fn current_id(&self) -> u64 {
        self.undos.back().map(Entry::id).unwrap_or(0)
    }

    /// Drop both stacks and restart ids at 1. The scene is not touched.
    pub fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
        self.id_counter = 0;
        self.last_cmd_time = None;
    }

    /// Whether there is an applied entry to revert.
    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    /// Number of applied entries.
    pub fn undo_len(&self) -> usize {
        self.undos.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redos.len()
    }

    /// The newest applied entry.
    pub fn last_entry(&self) -> Option<EntryInfo> {
        self.undos.back().map(Entry::info)
    }

    /// Applied entries, oldest first.
    pub fn undo_entries(&self) -> Vec<EntryInfo> {
        self.undos.iter().map(Entry::info).collect()
    }

    /// Undone entries, next-to-redo last.
    pub fn redo_entries(&self) -> Vec<EntryInfo> {
        self.redos.iter().map(Entry::info).collect()
    }

    /// Every entry in timeline order: applied ones first, then undone ones
    /// from next-to-redo onwards.
    pub fn entries(&self) -> Vec<EntryInfo> {
        self.undos
            .iter()
            .chain(self.redos.iter().rev())
            .map(Entry::info)
            .collect()
    }

    /// `{ undos, redos }`, each a list of serialized commands, oldest first.
    pub fn to_json(&self) -> Result<Value, CommandError> {
        let json = HistoryJson {
            undos: self.undos.iter().map(Entry::to_json).collect::<Result<_, _>>()?,
            redos: self.redos.iter().map(Entry::to_json).collect::<Result<_, _>>()?,
        };
        Ok(serde_json::to_value(json)?)
    }

    /// Restore a history from [`History::to_json`] output. Commands stay
    /// serialized until they are first undone or redone.
    pub fn from_json(json: &Value, config: HistoryConfig) -> Result<Self, CommandError> {
        let parsed: HistoryJson = serde_json::from_value(json.clone())?;
        let load = |values: Vec<Value>| {
            values
                .into_iter()
                .map(|v| StoredCommand::parse(v).map(Entry::Stored))
                .collect::<Result<Vec<_>, _>>()
        };
        let undos: VecDeque<Entry> = load(parsed.undos)?.into();
        let redos = load(parsed.redos)?;
        let id_counter = undos.iter().chain(&redos).map(Entry::id).max().unwrap_or(0);

        Ok(Self {
            undos,
            redos,
            id_counter,
            last_cmd_time: None,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use seg_common::ObjectId;
    use seg_scene::{ObjectAttribute, ObjectSnapshot};

    fn merging() -> HistoryConfig {
        HistoryConfig {
            merge_window_ms: 60_000,
            max_undos: None,
        }
    }

    fn never_merging() -> HistoryConfig {
        HistoryConfig {
            merge_window_ms: 0,
            max_undos: None,
        }
    }

    fn add_cube(history: &mut History, scene: &mut Scene) -> ObjectId {
        let cube = ObjectSnapshot::new("Mesh", "cube");
        history
            .execute(scene, Command::add_object(&cube, None, None), None)
            .unwrap();
        cube.id
    }

    fn position(scene: &Scene, id: ObjectId) -> Vec3 {
        scene.get(id).unwrap().transform.position
    }

    #[test]
    fn execute_assigns_increasing_ids() {
        let mut scene = Scene::new();
        let mut history = History::new(never_merging());
        let id = add_cube(&mut history, &mut scene);

        let cmd = Command::set_position(&scene, id, Vec3::X).unwrap();
        let second = history.execute(&mut scene, cmd, Some("Nudge")).unwrap();

        assert_eq!(second, 2);
        let entries = history.undo_entries();
        assert_eq!(entries[0].id, 1);
        assert_eq!(entries[1].name, "Nudge");
        assert!(entries.iter().all(|e| e.in_memory));
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut scene = Scene::new();
        let mut history = History::new(never_merging());
        let id = add_cube(&mut history, &mut scene);
        let cmd = Command::set_position(&scene, id, Vec3::new(3.0, 0.0, 0.0)).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();

        let undone = history.undo(&mut scene).unwrap();
        assert_eq!(undone.type_name, "SetPositionCommand");
        assert_eq!(position(&scene, id), Vec3::ZERO);
        assert!(history.can_redo());

        history.redo(&mut scene).unwrap();
        assert_eq!(position(&scene, id), Vec3::new(3.0, 0.0, 0.0));
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_empty_is_error() {
        let mut scene = Scene::new();
        let mut history = History::default();
        assert!(matches!(history.undo(&mut scene), Err(CommandError::NothingToUndo)));
        assert!(matches!(history.redo(&mut scene), Err(CommandError::NothingToRedo)));
    }

    #[test]
    fn new_command_clears_redo() {
        let mut scene = Scene::new();
        let mut history = History::new(never_merging());
        add_cube(&mut history, &mut scene);
        history.undo(&mut scene).unwrap();
        assert!(history.can_redo());

        add_cube(&mut history, &mut scene);
        assert!(!history.can_redo());
    }

    #[test]
    fn updatable_commands_merge_within_window() {
        let mut scene = Scene::new();
        let mut history = History::new(merging());
        let id = add_cube(&mut history, &mut scene);

        for x in 1..=5 {
            let cmd = Command::set_position(&scene, id, Vec3::new(x as f32, 0.0, 0.0)).unwrap();
            history.execute(&mut scene, cmd, None).unwrap();
        }
        assert_eq!(history.undo_len(), 2);
        assert_eq!(position(&scene, id), Vec3::new(5.0, 0.0, 0.0));

        // One undo reverts the whole drag.
        history.undo(&mut scene).unwrap();
        assert_eq!(position(&scene, id), Vec3::ZERO);
    }

    #[test]
    fn zero_window_never_merges() {
        let mut scene = Scene::new();
        let mut history = History::new(never_merging());
        let id = add_cube(&mut history, &mut scene);

        for x in 1..=3 {
            let cmd = Command::set_position(&scene, id, Vec3::new(x as f32, 0.0, 0.0)).unwrap();
            history.execute(&mut scene, cmd, None).unwrap();
        }
        assert_eq!(history.undo_len(), 4);
    }

    #[test]
    fn different_targets_or_attributes_do_not_merge() {
        let mut scene = Scene::new();
        let mut history = History::new(merging());
        let a = add_cube(&mut history, &mut scene);
        let b = add_cube(&mut history, &mut scene);

        let cmd = Command::set_position(&scene, a, Vec3::X).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();
        let cmd = Command::set_position(&scene, b, Vec3::X).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();
        let cmd = Command::set_value(&scene, b, ObjectAttribute::Name, "x").unwrap();
        history.execute(&mut scene, cmd, None).unwrap();
        let cmd = Command::set_value(&scene, b, ObjectAttribute::Visible, false).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();

        assert_eq!(history.undo_len(), 6);
    }

    #[test]
    fn non_updatable_commands_do_not_merge() {
        let mut scene = Scene::new();
        let mut history = History::new(merging());
        let id = add_cube(&mut history, &mut scene);

        for x in 1..=2 {
            let cmd = Command::set_position(&scene, id, Vec3::new(x as f32, 0.0, 0.0))
                .unwrap()
                .set_updatable(false);
            history.execute(&mut scene, cmd, None).unwrap();
        }
        assert_eq!(history.undo_len(), 3);
    }

    #[test]
    fn undo_breaks_the_merge_chain() {
        let mut scene = Scene::new();
        let mut history = History::new(merging());
        let id = add_cube(&mut history, &mut scene);

        let cmd = Command::set_position(&scene, id, Vec3::X).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();
        let cmd = Command::set_position(&scene, id, Vec3::Y).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();
        history.undo(&mut scene).unwrap();
        history.redo(&mut scene).unwrap();

        let cmd = Command::set_position(&scene, id, Vec3::Z).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();
        assert_eq!(history.undo_len(), 3);
    }

    #[test]
    fn failed_execute_records_nothing() {
        let mut scene = Scene::new();
        let mut history = History::default();
        let cube = ObjectSnapshot::new("Mesh", "cube");
        let cmd = Command::add_object(&cube, Some(ObjectId::new()), None);

        assert!(history.execute(&mut scene, cmd, None).is_err());
        assert_eq!(history.undo_len(), 0);
        assert!(scene.is_empty());
    }

    #[test]
    fn max_undos_drops_oldest() {
        let mut scene = Scene::new();
        let mut history = History::new(HistoryConfig {
            merge_window_ms: 0,
            max_undos: Some(2),
        });
        for _ in 0..4 {
            add_cube(&mut history, &mut scene);
        }
        let ids: Vec<u64> = history.undo_entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn go_to_state_moves_both_ways() {
        let mut scene = Scene::new();
        let mut history = History::new(never_merging());
        let id = add_cube(&mut history, &mut scene);
        for x in 1..=3 {
            let cmd = Command::set_position(&scene, id, Vec3::new(x as f32, 0.0, 0.0)).unwrap();
            history.execute(&mut scene, cmd, None).unwrap();
        }

        history.go_to_state(&mut scene, 2).unwrap();
        assert_eq!(history.current_id(), 2);
        let timeline: Vec<u64> = history.entries().iter().map(|e| e.id).collect();
        assert_eq!(timeline, vec![1, 2, 3, 4]);
        assert_eq!(position(&scene, id), Vec3::new(1.0, 0.0, 0.0));

        history.go_to_state(&mut scene, 4).unwrap();
        assert_eq!(position(&scene, id), Vec3::new(3.0, 0.0, 0.0));

        history.go_to_state(&mut scene, 0).unwrap();
        assert!(scene.is_empty());

        assert!(matches!(
            history.go_to_state(&mut scene, 99),
            Err(CommandError::UnknownState(99))
        ));
    }

    #[test]
    fn json_restore_is_lazy() {
        let mut scene = Scene::new();
        let mut history = History::new(never_merging());
        let id = add_cube(&mut history, &mut scene);
        let cmd = Command::set_position(&scene, id, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();
        let cmd = Command::set_scale(&scene, id, Vec3::splat(4.0)).unwrap();
        history.execute(&mut scene, cmd, None).unwrap();
        history.undo(&mut scene).unwrap();

        let json = history.to_json().unwrap();
        assert_eq!(json["undos"].as_array().unwrap().len(), 2);
        assert_eq!(json["redos"][0]["type"], "SetScaleCommand");

        let mut restored = History::from_json(&json, never_merging()).unwrap();
        assert!(restored.undo_entries().iter().all(|e| !e.in_memory));
        assert_eq!(restored.undo_entries()[1].name, "Set Position");

        restored.undo(&mut scene).unwrap();
        assert_eq!(position(&scene, id), Vec3::ZERO);
        let redos = restored.redo_entries();
        assert!(!redos[0].in_memory);
        assert!(redos[1].in_memory);

        restored.redo(&mut scene).unwrap();
        restored.redo(&mut scene).unwrap();
        assert_eq!(scene.get(id).unwrap().transform.scale, Vec3::splat(4.0));

        // New ids continue after the restored ones.
        let cube = ObjectSnapshot::new("Mesh", "next");
        let next = restored
            .execute(&mut scene, Command::add_object(&cube, None, None), None)
            .unwrap();
        assert_eq!(next, 4);
    }

    #[test]
    fn restored_history_replays_every_command_kind() {
        let mut scene = Scene::new();
        let original_id = scene.id();
        let original_name = scene.name().to_string();
        let mut history = History::new(never_merging());
        let mut run = |scene: &mut Scene, cmd: Command| {
            history.execute(scene, cmd, None).unwrap();
        };

        let child = ObjectSnapshot::new("Mesh", "child");
        let group = ObjectSnapshot::new("Group", "group").with_child(child.clone());
        run(&mut scene, Command::add_object(&group, None, None));
        let cube = ObjectSnapshot::new("Mesh", "cube");
        run(&mut scene, Command::add_object(&cube, None, None));

        let cmd = Command::move_object(&scene, cube.id, Some(group.id), Some(child.id)).unwrap();
        run(&mut scene, cmd);
        let cmd = Command::set_position(&scene, cube.id, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        run(&mut scene, cmd);
        let cmd = Command::set_rotation(&scene, cube.id, Vec3::new(0.0, 1.5, 0.0)).unwrap();
        run(&mut scene, cmd);
        let cmd = Command::set_scale(&scene, cube.id, Vec3::splat(2.0)).unwrap();
        run(&mut scene, cmd);
        let cmd = Command::set_value(&scene, child.id, ObjectAttribute::Visible, false).unwrap();
        run(&mut scene, cmd);

        let ball = ObjectSnapshot::new("Mesh", "ball");
        let add_ball = Command::add_object(&ball, None, None);
        let rename_group = Command::set_value(&scene, group.id, ObjectAttribute::Name, "rig").unwrap();
        run(&mut scene, Command::multi(vec![add_ball, rename_group]));

        let moved = ObjectSnapshot::new("Mesh", "ball")
            .with_id(ball.id)
            .with_position(Vec3::new(0.0, 5.0, 0.0));
        let cmd = Command::update_object(&scene, &moved).unwrap();
        run(&mut scene, cmd);
        let cmd = Command::remove_object(&scene, ball.id).unwrap();
        run(&mut scene, cmd);

        let cmd = Command::set_uuid(&scene, child.id, ObjectId::new()).unwrap();
        run(&mut scene, cmd);

        let mut imported = Scene::new();
        imported
            .add(ObjectSnapshot::new("Mesh", "imported"), None, None)
            .unwrap();
        let cmd = Command::set_scene(&scene, imported.to_json().unwrap()).unwrap();
        run(&mut scene, cmd);

        let final_scene = scene.to_json().unwrap();
        let json = history.to_json().unwrap();
        let undos = json["undos"].as_array().unwrap();
        let types: Vec<&str> = undos.iter().map(|u| u["type"].as_str().unwrap()).collect();
        assert_eq!(
            types,
            vec![
                "AddObjectCommand",
                "AddObjectCommand",
                "MoveObjectCommand",
                "SetPositionCommand",
                "SetRotationCommand",
                "SetScaleCommand",
                "SetValueCommand",
                "MultiCmdsCommand",
                "UpdateObjectCommand",
                "RemoveObjectCommand",
                "SetUuidCommand",
                "SetSceneCommand",
            ]
        );
        // Only top-level entries carry history ids.
        assert!(undos[7]["cmds"][0]["id"].is_null());
        assert!(undos[11]["cmds"][0]["id"].is_null());

        let mut restored = History::from_json(&json, never_merging()).unwrap();
        restored.go_to_state(&mut scene, 0).unwrap();
        assert!(scene.is_empty());
        assert_eq!(scene.id(), original_id);
        assert_eq!(scene.name(), original_name);

        restored.go_to_state(&mut scene, 12).unwrap();
        assert_eq!(scene.to_json().unwrap(), final_scene);
        assert!(restored.undo_entries().iter().all(|e| e.in_memory));
    }

    #[test]
    fn zero_max_undos_keeps_everything() {
        let mut scene = Scene::new();
        let mut history = History::new(HistoryConfig {
            merge_window_ms: 0,
            max_undos: Some(0),
        });
        add_cube(&mut history, &mut scene);
        add_cube(&mut history, &mut scene);
        assert_eq!(history.undo_len(), 2);
        assert!(history.undo(&mut scene).is_ok());
    }

    #[test]
    fn from_json_requires_entry_headers() {
        let bad = serde_json::json!({ "undos": [{ "name": "no id" }] });
        assert!(History::from_json(&bad, HistoryConfig::default()).is_err());
    }
}
