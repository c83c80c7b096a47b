//! Persistent session record: one versioned JSON document holding the
//! resolver cache and the shadow ledger entries, written synchronously on
//! every mutation so a reload never loses a confirmed commit.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use alloy::primitives::U256;
use ledgerflow_primitives::resource::{PairKey, ResourceId};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::shadow::CategoryKey;

/// Fixed application key namespacing the record on its storage medium.
pub const SESSION_NAMESPACE: &str = "ledgerflow-session";

const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResource {
    pair: PairKey,
    id: ResourceId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShadowEntry {
    category: CategoryKey,
    cumulative: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    version: u32,
    resolver_cache: Vec<CachedResource>,
    shadow_entries: Vec<ShadowEntry>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            resolver_cache: Vec::new(),
            shadow_entries: Vec::new(),
        }
    }
}

/// File-backed store for the session record. All writes flush to disk
/// before returning.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    record: Mutex<SessionRecord>,
}

impl SessionStore {
    /// Opens the session record under `storage_dir`, creating an empty one
    /// if none exists. A record with an unknown version is replaced rather
    /// than partially interpreted.
    pub fn open(storage_dir: &Path) -> Result<Self> {
        let path = storage_dir.join(format!("{SESSION_NAMESPACE}.json"));
        let record = match fs::read_to_string(&path) {
            Ok(data) => {
                let record: SessionRecord = serde_json::from_str(&data)
                    .map_err(|e| ClientError::StorageError(e.to_string()))?;
                if record.version != RECORD_VERSION {
                    tracing::warn!(
                        found = record.version,
                        expected = RECORD_VERSION,
                        "discarding session record with unknown version"
                    );
                    SessionRecord::default()
                } else {
                    record
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionRecord::default(),
            Err(e) => return Err(ClientError::StorageError(e.to_string())),
        };

        Ok(Self {
            path,
            record: Mutex::new(record),
        })
    }

    pub fn resolver_cache(&self) -> HashMap<PairKey, ResourceId> {
        let record = self.record.lock().expect("session record lock poisoned");
        record
            .resolver_cache
            .iter()
            .map(|c| (c.pair, c.id))
            .collect()
    }

    pub fn shadow_entries(&self) -> HashMap<CategoryKey, U256> {
        let record = self.record.lock().expect("session record lock poisoned");
        record
            .shadow_entries
            .iter()
            .map(|e| (e.category, e.cumulative))
            .collect()
    }

    /// Inserts or replaces the cached identity for `pair` and flushes.
    pub fn write_resolver_entry(&self, pair: PairKey, id: ResourceId) -> Result<()> {
        let mut record = self.record.lock().expect("session record lock poisoned");
        match record.resolver_cache.iter_mut().find(|c| c.pair == pair) {
            Some(entry) => entry.id = id,
            None => record.resolver_cache.push(CachedResource { pair, id }),
        }
        Self::flush(&self.path, &record)
    }

    /// Inserts or replaces the cumulative amount for `category` and flushes.
    pub fn write_shadow_entry(&self, category: CategoryKey, cumulative: U256) -> Result<()> {
        let mut record = self.record.lock().expect("session record lock poisoned");
        match record
            .shadow_entries
            .iter_mut()
            .find(|e| e.category == category)
        {
            Some(entry) => entry.cumulative = cumulative,
            None => record.shadow_entries.push(ShadowEntry {
                category,
                cumulative,
            }),
        }
        Self::flush(&self.path, &record)
    }

    fn flush(path: &Path, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ClientError::StorageError(e.to_string()))?;
        }
        let data = serde_json::to_string_pretty(record)
            .map_err(|e| ClientError::StorageError(e.to_string()))?;
        fs::write(path, data).map_err(|e| ClientError::StorageError(e.to_string()))
    }
}
