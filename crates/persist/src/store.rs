//! File-backed project persistence.
//!
//! Layout inside the store directory:
//! ```text
//! project.meta.json            - metadata and schema version
//! snapshots/
//!   000001.snapshot.cbor.zst   - CBOR+zstd compressed project snapshots
//! integrity/
//!   manifest.json              - hash chain manifest
//! ```

use crate::snapshot::ProjectSnapshot;
use seg_editor::{CommandError, Editor, EditorConfig};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current schema version.
const PROJECT_SCHEMA_VERSION: u32 = 1;

const META_FILE: &str = "project.meta.json";

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("no snapshots found")]
    NoSnapshots,
    #[error("snapshot {0} not found")]
    SnapshotNotFound(u32),
}

/// Metadata stored in project.meta.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub schema_version: u32,
    pub project_name: String,
    pub snapshot_count: u32,
}

/// A single entry in the integrity manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    pub prev_hash: Option<String>,
}

/// Integrity manifest tracking all snapshot hashes in a chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

/// File-backed project store with schema versioning and integrity checking.
pub struct ProjectStore {
    root: PathBuf,
    meta: ProjectMeta,
    manifest: IntegrityManifest,
}

impl ProjectStore {
    /// Open or create a project store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("snapshots"))?;
        std::fs::create_dir_all(root.join("integrity"))?;

        let meta_path = root.join(META_FILE);
        let manifest_path = root.join("integrity").join("manifest.json");

        let (meta, manifest) = if meta_path.exists() {
            let meta: ProjectMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            if meta.schema_version != PROJECT_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    file_version: meta.schema_version,
                    expected_version: PROJECT_SCHEMA_VERSION,
                });
            }
            let manifest: IntegrityManifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            (meta, manifest)
        } else {
            let meta = ProjectMeta {
                schema_version: PROJECT_SCHEMA_VERSION,
                project_name: String::new(),
                snapshot_count: 0,
            };
            let manifest = IntegrityManifest::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            serde_json::to_writer_pretty(std::fs::File::create(&manifest_path)?, &manifest)?;
            info!(path = %root.display(), "created project store");
            (meta, manifest)
        };

        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    /// Write a snapshot of the editor to disk. Returns its 1-based index.
    pub fn save(&mut self, editor: &Editor) -> Result<u32, StoreError> {
        let snap = ProjectSnapshot::capture(editor)?;
        let index = self.meta.snapshot_count + 1;
        let filename = snapshot_filename(index);
        let path = self.root.join("snapshots").join(&filename);

        let cbor_bytes = cbor_serialize(&snap)?;
        let compressed = zstd_compress(&cbor_bytes)?;

        let hash = sha256_hex(&compressed);
        let prev_hash = self.manifest.entries.last().map(|e| e.sha256.clone());

        std::fs::write(&path, &compressed)?;

        self.manifest.entries.push(ManifestEntry {
            filename,
            sha256: hash,
            prev_hash,
        });
        self.meta.snapshot_count = index;
        self.meta.project_name = snap.project_name;

        self.save_meta()?;
        self.save_manifest()?;
        info!(
            index,
            bytes = compressed.len(),
            history_position = snap.history_position,
            "saved project snapshot"
        );
        Ok(index)
    }

    /// Load and verify the newest snapshot, then rebuild an editor from it.
    pub fn load_latest(&self, config: EditorConfig) -> Result<Editor, StoreError> {
        if self.meta.snapshot_count == 0 {
            return Err(StoreError::NoSnapshots);
        }
        self.load(self.meta.snapshot_count, config)
    }

    /// Load and verify snapshot `index`, then rebuild an editor from it.
    pub fn load(&self, index: u32, config: EditorConfig) -> Result<Editor, StoreError> {
        let snap = self.load_snapshot(index)?;
        if !snap.verify() {
            return Err(StoreError::IntegrityMismatch {
                expected: "valid snapshot hash".into(),
                actual: "snapshot hash mismatch".into(),
            });
        }
        debug!(index, history_position = snap.history_position, "restoring project");
        Ok(snap.restore(config)?)
    }

    /// Verify all integrity hashes in the manifest.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        let mut prev_hash: Option<String> = None;
        for entry in &self.manifest.entries {
            if entry.prev_hash != prev_hash {
                return Err(StoreError::IntegrityMismatch {
                    expected: prev_hash.unwrap_or_else(|| "None".into()),
                    actual: entry
                        .prev_hash
                        .clone()
                        .unwrap_or_else(|| "None".into()),
                });
            }

            let data = std::fs::read(self.root.join("snapshots").join(&entry.filename))?;
            let actual_hash = sha256_hex(&data);
            if actual_hash != entry.sha256 {
                return Err(StoreError::IntegrityMismatch {
                    expected: entry.sha256.clone(),
                    actual: actual_hash,
                });
            }

            prev_hash = Some(entry.sha256.clone());
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    pub fn manifest(&self) -> &IntegrityManifest {
        &self.manifest
    }

    fn load_snapshot(&self, index: u32) -> Result<ProjectSnapshot, StoreError> {
        if index == 0 || index > self.meta.snapshot_count {
            return Err(StoreError::SnapshotNotFound(index));
        }
        let filename = snapshot_filename(index);
        let compressed = std::fs::read(self.root.join("snapshots").join(&filename))?;

        self.verify_file_hash(&filename, &compressed)?;

        let cbor_bytes = zstd_decompress(&compressed)?;
        cbor_deserialize(&cbor_bytes)
    }

    fn verify_file_hash(&self, filename: &str, data: &[u8]) -> Result<(), StoreError> {
        let actual = sha256_hex(data);
        let entry = self
            .manifest
            .entries
            .iter()
            .find(|e| e.filename == filename)
            .ok_or_else(|| StoreError::IntegrityMismatch {
                expected: format!("manifest entry for {filename}"),
                actual: "none".into(),
            })?;
        if entry.sha256 != actual {
            return Err(StoreError::IntegrityMismatch {
                expected: entry.sha256.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn save_meta(&self) -> Result<(), StoreError> {
        let path = self.root.join(META_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.meta)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), StoreError> {
        let path = self.root.join("integrity").join("manifest.json");
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.manifest)?;
        Ok(())
    }
}

fn snapshot_filename(index: u32) -> String {
    format!("{index:06}.snapshot.cbor.zst")
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
