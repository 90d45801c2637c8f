use seg_editor::{CommandError, Editor, EditorConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A self-checking copy of an editor's project document (scene, history and
/// selection) at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project_name: String,
    /// Id of the newest applied history entry when captured.
    pub history_position: u64,
    /// Output of [`Editor::to_json`].
    pub document: Value,
    /// FNV-1a over the fields above.
    pub hash: u64,
}

impl ProjectSnapshot {
    pub fn capture(editor: &Editor) -> Result<Self, CommandError> {
        let project_name = editor.project_name().to_string();
        let history_position = editor.history().current_id();
        let document = editor.to_json()?;
        let hash = content_hash(&project_name, history_position, &document);
        Ok(Self {
            project_name,
            history_position,
            document,
            hash,
        })
    }

    /// Recompute the hash and compare.
    pub fn verify(&self) -> bool {
        self.hash == content_hash(&self.project_name, self.history_position, &self.document)
    }

    /// Rebuild an editor. History entries stay serialized until first used.
    pub fn restore(&self, config: EditorConfig) -> Result<Editor, CommandError> {
        Editor::from_json(&self.document, config)
    }
}

// serde_json objects are ordered maps, so the rendering is stable.
fn content_hash(project_name: &str, history_position: u64, document: &Value) -> u64 {
    fnv1a_hash(&format!("{project_name}\0{history_position}\0{document}"))
}

fn fnv1a_hash(data: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in data.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
