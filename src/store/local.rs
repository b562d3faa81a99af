//! In-process document store
//!
//! `LocalStore` keeps every collection in memory behind one `RwLock` and
//! assigns each commit the next store-wide [`Version`]. When opened with a
//! snapshot path, every commit is written to disk before it becomes visible:
//! the new state is serialized, checksummed, written to a temp file, fsynced
//! and renamed over the previous snapshot.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::document::{CommitRequest, DocumentSnapshot, Fields, FieldFilter, Version, WriteOp};
use super::errors::{StoreError, StoreResult};
use super::DocumentStore;
use crate::observability::{Event, Logger};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    version: Version,
    fields: Fields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    last_version: u64,
    collections: BTreeMap<String, BTreeMap<String, StoredDocument>>,
}

impl StoreState {
    fn document(&self, collection: &str, id: &str) -> Option<&StoredDocument> {
        self.collections.get(collection).and_then(|docs| docs.get(id))
    }

    /// Check every precondition and apply every write, or change nothing.
    fn apply(&mut self, request: CommitRequest) -> StoreResult<Version> {
        for pre in &request.preconditions {
            let current = self.document(&pre.collection, &pre.id).map(|d| d.version);
            if current != pre.expected {
                return Err(StoreError::conflict(&pre.collection, &pre.id));
            }
        }

        // Updates need their target to exist, either already or from an
        // earlier write in this same commit.
        let mut created: Vec<(&str, &str)> = Vec::new();
        for write in &request.writes {
            match write {
                WriteOp::Set { collection, id, .. } => {
                    created.push((collection.as_str(), id.as_str()))
                }
                WriteOp::Update { collection, id, .. } => {
                    let exists = self.document(collection, id).is_some()
                        || created.contains(&(collection.as_str(), id.as_str()));
                    if !exists {
                        return Err(StoreError::not_found(collection, id));
                    }
                }
            }
        }

        let version = Version::new(self.last_version + 1);
        self.last_version = version.value();

        for write in request.writes {
            match write {
                WriteOp::Set {
                    collection,
                    id,
                    fields,
                } => {
                    self.collections
                        .entry(collection)
                        .or_default()
                        .insert(id, StoredDocument { version, fields });
                }
                WriteOp::Update {
                    collection,
                    id,
                    fields,
                } => {
                    if let Some(doc) = self
                        .collections
                        .get_mut(&collection)
                        .and_then(|docs| docs.get_mut(&id))
                    {
                        doc.fields.extend(fields);
                        doc.version = version;
                    }
                }
            }
        }

        Ok(version)
    }
}

/// On-disk snapshot: the full state plus a CRC32 of its JSON encoding
#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    checksum: u32,
    state: StoreState,
}

fn state_checksum(state: &StoreState) -> StoreResult<u32> {
    let bytes = serde_json::to_vec(state)
        .map_err(|e| StoreError::Snapshot(format!("failed to serialize state: {}", e)))?;
    Ok(crc32fast::hash(&bytes))
}

/// In-process document store with optional snapshot persistence
#[derive(Debug, Default)]
pub struct LocalStore {
    state: RwLock<StoreState>,
    snapshot_path: Option<PathBuf>,
}

impl LocalStore {
    /// Create an empty store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store, loading the snapshot at `path` if present
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            read_snapshot(&path)?
        } else {
            StoreState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
        })
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        let state = self.state.read().map_err(|_| StoreError::lock_poisoned())?;
        Ok(state.collections.get(collection).map_or(0, |docs| docs.len()))
    }
}

impl DocumentStore for LocalStore {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>> {
        let state = self.state.read().map_err(|_| StoreError::lock_poisoned())?;
        Ok(state.document(collection, id).map(|doc| DocumentSnapshot {
            id: id.to_string(),
            fields: doc.fields.clone(),
            version: doc.version,
        }))
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<DocumentSnapshot>> {
        self.find(collection, &[])
    }

    fn find(&self, collection: &str, filters: &[FieldFilter]) -> StoreResult<Vec<DocumentSnapshot>> {
        let state = self.state.read().map_err(|_| StoreError::lock_poisoned())?;
        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|(_, doc)| filters.iter().all(|f| f.matches(&doc.fields)))
            .map(|(id, doc)| DocumentSnapshot {
                id: id.clone(),
                fields: doc.fields.clone(),
                version: doc.version,
            })
            .collect())
    }

    fn commit(&self, request: CommitRequest) -> StoreResult<Version> {
        let mut state = self.state.write().map_err(|_| StoreError::lock_poisoned())?;

        match &self.snapshot_path {
            None => state.apply(request),
            Some(path) => {
                let mut next = state.clone();
                let version = next.apply(request)?;
                write_snapshot(path, &next)?;
                *state = next;

                let version_str = version.value().to_string();
                Logger::debug(Event::SnapshotPersisted, &[("version", version_str.as_str())]);
                Ok(version)
            }
        }
    }
}

fn read_snapshot(path: &Path) -> StoreResult<StoreState> {
    let content = fs::read_to_string(path)?;
    let snapshot: SnapshotFile = serde_json::from_str(&content).map_err(|e| {
        StoreError::Snapshot(format!("failed to parse {}: {}", path.display(), e))
    })?;

    let actual = state_checksum(&snapshot.state)?;
    if actual != snapshot.checksum {
        return Err(StoreError::Snapshot(format!(
            "checksum mismatch in {}: expected {:08x}, got {:08x}",
            path.display(),
            snapshot.checksum,
            actual
        )));
    }

    Ok(snapshot.state)
}

fn write_snapshot(path: &Path, state: &StoreState) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let snapshot = SnapshotFile {
        checksum: state_checksum(state)?,
        state: state.clone(),
    };
    let content = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| StoreError::Snapshot(format!("failed to serialize snapshot: {}", e)))?;

    let temp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;
    file.write_all(&content)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
