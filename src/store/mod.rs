//! Vote record store: per-validator, height-indexed vote history with a
//! bounded retention window and append-per-insert file durability.
//!
//! A single `parking_lot::RwLock` guards the whole outer mapping, following
//! the locking discipline used for the teacher's snapshot provider
//! (`consensus::parlia::provider::DbSnapshotProvider`) — simple, and
//! sufficient for the expected workload of roughly one vote every few
//! hundred milliseconds.

pub mod record;

use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::RETENTION_WINDOW;
use crate::error::StoreError;
use crate::types::{VoteAddress, VoteEnvelope};

use record::{file_path, validator_from_filename, Record};

type Inner = HashMap<VoteAddress, BTreeMap<u64, VoteEnvelope>>;

pub struct VoteRecordStore {
    dir: PathBuf,
    inner: RwLock<Inner>,
}

impl VoteRecordStore {
    fn empty(dir: PathBuf) -> Self {
        Self { dir, inner: RwLock::new(HashMap::new()) }
    }

    /// Open `dir` (creating it if absent), fan out one concurrent loader
    /// task per on-disk validator file, and join before returning.
    pub async fn load(dir: impl Into<PathBuf>) -> Result<Arc<Self>, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;

        let mut candidates = Vec::new();
        let entries = std::fs::read_dir(&dir).map_err(|source| StoreError::ReadDir {
            path: dir.display().to_string(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::ReadDir {
                path: dir.display().to_string(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if validator_from_filename(name).is_some() {
                candidates.push(entry.path());
            }
        }

        let store = Arc::new(Self::empty(dir));
        let mut tasks = tokio::task::JoinSet::new();
        for path in candidates {
            let store = store.clone();
            tasks.spawn_blocking(move || load_file(&store, &path));
        }
        let mut loaded_files = 0usize;
        while let Some(result) = tasks.join_next().await {
            result.expect("vote record loader task panicked")?;
            loaded_files += 1;
        }
        info!(files = loaded_files, dir = %store.dir.display(), "vote record store preloaded");
        Ok(store)
    }

    /// Insert `envelope` at `(validator, target)`, evicting the entry at
    /// `target - RETENTION_WINDOW` if present, then append the record to
    /// the validator's file. The detector must have already established
    /// that no conflict exists — this never checks for one.
    ///
    /// This never fails: the in-memory map, not the on-disk file, is the
    /// store's source of truth (spec §7 — the detector that calls this must
    /// never fail). A transient append-write error is logged and otherwise
    /// swallowed; the affected validator's file is simply missing this one
    /// record until the next `snapshot_to_dir` truncate-and-rewrite, which
    /// dumps the full in-memory map and so reconciles it regardless — this
    /// preserves invariant 4 without surfacing disk I/O as a detector error.
    pub fn insert(&self, validator: VoteAddress, target: u64, envelope: VoteEnvelope) -> bool {
        {
            let mut guard = self.inner.write();
            insert_in_memory(&mut guard, validator, target, envelope.clone());
        }
        if let Err(e) = append_record(&self.dir, &validator, target, &envelope) {
            warn!(
                ?validator, target, error = %e,
                "failed to append vote record to disk; in-memory state is authoritative \
                 and will be reconciled at the next snapshot"
            );
        }
        true
    }

    /// Look up the envelope stored at `(validator, height)`, if any.
    pub fn get(&self, validator: &VoteAddress, height: u64) -> Option<VoteEnvelope> {
        self.inner.read().get(validator).and_then(|m| m.get(&height)).cloned()
    }

    /// All `(height, envelope)` pairs for `validator`, descending by height.
    pub fn iterate(&self, validator: &VoteAddress) -> Vec<(u64, VoteEnvelope)> {
        match self.inner.read().get(validator) {
            Some(m) => m.iter().rev().map(|(h, e)| (*h, e.clone())).collect(),
            None => Vec::new(),
        }
    }

    /// Drop a validator's entire in-memory record (used after a successful
    /// slash: the validator will not vote again, so the window is reclaimed).
    /// Does not touch the on-disk file; the next `snapshot_to_dir` call, or
    /// an operator cleanup, reconciles it.
    pub fn forget(&self, validator: &VoteAddress) {
        self.inner.write().remove(validator);
    }

    /// Truncate-and-rewrite every validator's file with a full dump of its
    /// current in-memory contents. Called at shutdown.
    pub fn snapshot_to_dir(&self) -> Result<(), StoreError> {
        let guard = self.inner.read();
        for (validator, heights) in guard.iter() {
            let path = file_path(&self.dir, validator);
            let mut file = std::fs::File::create(&path).map_err(|source| StoreError::Write {
                file: path.display().to_string(),
                source,
            })?;
            for (height, envelope) in heights {
                write_record_line(&mut file, &path, *height, envelope)?;
            }
        }
        info!(validators = guard.len(), dir = %self.dir.display(), "vote record store snapshotted");
        Ok(())
    }
}

fn insert_in_memory(guard: &mut Inner, validator: VoteAddress, target: u64, envelope: VoteEnvelope) {
    let heights = guard.entry(validator).or_default();
    heights.insert(target, envelope);
    if let Some(evict_at) = target.checked_sub(RETENTION_WINDOW) {
        heights.remove(&evict_at);
    }
}

fn write_record_line(
    file: &mut std::fs::File,
    path: &Path,
    height: u64,
    envelope: &VoteEnvelope,
) -> Result<(), StoreError> {
    let record = Record { height, envelope: envelope.clone() };
    let line = serde_json::to_string(&record).expect("Record serialization cannot fail");
    writeln!(file, "{line}").map_err(|source| StoreError::Write {
        file: path.display().to_string(),
        source,
    })
}

fn append_record(
    dir: &Path,
    validator: &VoteAddress,
    height: u64,
    envelope: &VoteEnvelope,
) -> Result<(), StoreError> {
    let path = file_path(dir, validator);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| StoreError::Write { file: path.display().to_string(), source })?;
    write_record_line(&mut file, &path, height, envelope)
}

/// Parse every `Record` line in `path` and insert it in memory. A line that
/// fails to parse ends this file's load at that point (the rest of the file
/// is assumed to be a torn write) without failing the whole preload; an
/// error opening or reading the file itself is fatal.
fn load_file(store: &VoteRecordStore, path: &Path) -> Result<(), StoreError> {
    let Some(validator) = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(validator_from_filename)
    else {
        return Ok(());
    };

    let file = std::fs::File::open(path).map_err(|source| StoreError::MalformedFile {
        file: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut count = 0usize;
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "torn read while loading vote record file; stopping at this point");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Record>(&line) {
            Ok(record) => {
                let mut guard = store.inner.write();
                insert_in_memory(&mut guard, validator, record.height, record.envelope);
                count += 1;
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "unparseable record; stopping at this point");
                break;
            }
        }
    }
    info!(file = %path.display(), records = count, "loaded vote record file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn envelope(source: u64, target: u64) -> VoteEnvelope {
        VoteEnvelope {
            vote_address: VoteAddress::repeat_byte(0x01),
            signature: crate::types::VoteSignature::repeat_byte(0x02),
            data: crate::types::VoteData {
                source_number: source,
                source_hash: B256::repeat_byte(3),
                target_number: target,
                target_hash: B256::repeat_byte(4),
            },
        }
    }

    #[tokio::test]
    async fn eviction_on_insert_at_window_boundary() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VoteRecordStore::load(tmp.path()).await.unwrap();
        let v = VoteAddress::repeat_byte(0x01);

        store.insert(v, 10, envelope(1, 10));
        assert!(store.get(&v, 10).is_some());

        store.insert(v, 266, envelope(200, 266));
        assert!(store.get(&v, 10).is_none(), "height 10 must be evicted once 266 = 10 + 256 arrives");
        assert!(store.get(&v, 266).is_some());
    }

    #[tokio::test]
    async fn eviction_is_a_noop_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VoteRecordStore::load(tmp.path()).await.unwrap();
        let v = VoteAddress::repeat_byte(0x02);

        store.insert(v, 500, envelope(400, 500));
        assert!(store.get(&v, 500).is_some());
    }

    #[tokio::test]
    async fn round_trip_through_snapshot_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let store = VoteRecordStore::load(tmp.path()).await.unwrap();

        let v1 = VoteAddress::repeat_byte(0x11);
        let v2 = VoteAddress::repeat_byte(0x22);
        let v3 = VoteAddress::repeat_byte(0x33);
        store.insert(v1, 10, envelope(1, 10));
        store.insert(v2, 20, envelope(2, 20));
        store.insert(v3, 30, envelope(3, 30));

        store.snapshot_to_dir().unwrap();

        let reloaded = VoteRecordStore::load(tmp.path()).await.unwrap();
        assert_eq!(reloaded.get(&v1, 10), Some(envelope(1, 10)));
        assert_eq!(reloaded.get(&v2, 20), Some(envelope(2, 20)));
        assert_eq!(reloaded.get(&v3, 30), Some(envelope(3, 30)));
    }

    #[tokio::test]
    async fn loader_ignores_files_with_wrong_name_length() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("not-a-validator-file.json"), "garbage").unwrap();
        let store = VoteRecordStore::load(tmp.path()).await.unwrap();
        assert!(store.inner.read().is_empty());
    }

    #[tokio::test]
    async fn append_per_insert_is_durable_without_explicit_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let v = VoteAddress::repeat_byte(0x55);
        {
            let store = VoteRecordStore::load(tmp.path()).await.unwrap();
            store.insert(v, 7, envelope(1, 7));
        }
        let reloaded = VoteRecordStore::load(tmp.path()).await.unwrap();
        assert_eq!(reloaded.get(&v, 7), Some(envelope(1, 7)));
    }
}
