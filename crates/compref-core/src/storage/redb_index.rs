//! # redb-backed Persisted Index
//!
//! Component identities recorded by previous analyses, stored in a redb
//! embedded database:
//! - ACID transactions (one transaction per recorded run)
//! - Crash safety (copy-on-write B-trees)
//!
//! Lookups during resolution are served from an in-memory copy loaded at
//! open time; the copy is only updated after a successful commit.

use crate::cache::ComponentsRefCache;
use crate::identity::PersistedIndex;
use crate::ComprefError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Table for identities: component key -> uuid
const COMPONENT_UUIDS: TableDefinition<&str, &str> = TableDefinition::new("component_uuids");

/// Reverse table: uuid -> component key
const UUID_KEYS: TableDefinition<&str, &str> = TableDefinition::new("uuid_keys");

fn io_err(e: impl std::fmt::Display) -> ComprefError {
    ComprefError::IoError(e.to_string())
}

fn corrupt(key: &str, uuid: &str) -> ComprefError {
    ComprefError::CorruptIndex {
        key: key.to_string(),
        uuid: uuid.to_string(),
    }
}

/// A disk-backed persisted-component index.
pub struct RedbIndex {
    /// The redb database handle.
    db: Database,
    /// In-memory copy of `component_uuids`.
    uuids_by_key: BTreeMap<String, String>,
    /// In-memory copy of `uuid_keys`.
    keys_by_uuid: BTreeMap<String, String>,
}

impl std::fmt::Debug for RedbIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbIndex")
            .field("entries", &self.uuids_by_key.len())
            .finish_non_exhaustive()
    }
}

impl RedbIndex {
    /// Open or create an index database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ComprefError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;
        Self::load(db)
    }

    /// Open an index database that must already exist.
    ///
    /// Used by read-only commands so a mistyped path fails instead of
    /// leaving an empty database behind.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, ComprefError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ComprefError::IoError(format!(
                "Index database '{}' does not exist. Run `compref init` first.",
                path.display()
            )));
        }
        let db = Database::open(path).map_err(io_err)?;
        Self::load(db)
    }

    fn load(db: Database) -> Result<Self, ComprefError> {
        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(COMPONENT_UUIDS).map_err(io_err)?;
            let _ = write_txn.open_table(UUID_KEYS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        let mut uuids_by_key = BTreeMap::new();
        let mut keys_by_uuid = BTreeMap::new();
        {
            let read_txn = db.begin_read().map_err(io_err)?;
            let table = read_txn.open_table(COMPONENT_UUIDS).map_err(io_err)?;
            for entry in table.iter().map_err(io_err)? {
                let (key, uuid) = entry.map_err(io_err)?;
                uuids_by_key.insert(key.value().to_string(), uuid.value().to_string());
            }

            let table = read_txn.open_table(UUID_KEYS).map_err(io_err)?;
            for entry in table.iter().map_err(io_err)? {
                let (uuid, key) = entry.map_err(io_err)?;
                keys_by_uuid.insert(uuid.value().to_string(), key.value().to_string());
            }
        }

        tracing::debug!(entries = uuids_by_key.len(), "opened persisted index");

        Ok(Self {
            db,
            uuids_by_key,
            keys_by_uuid,
        })
    }

    /// Persist the identities of a finished run in a single transaction.
    ///
    /// Existing keys are overwritten with the run's identifier. Returns the
    /// number of keys that were added or changed.
    ///
    /// # Errors
    /// - `CorruptIndex` if an identifier is already stored for a key that
    ///   keeps it, or appears twice in the run; nothing is written
    /// - `IoError` if the transaction fails
    pub fn record(&mut self, cache: &ComponentsRefCache) -> Result<usize, ComprefError> {
        let mut changes: Vec<(String, String, Option<String>)> = Vec::new();
        let mut batch_uuids = BTreeSet::new();
        for (_, component) in cache.iter() {
            if !batch_uuids.insert(component.uuid()) {
                return Err(corrupt(component.key(), component.uuid()));
            }

            // The identifier may only belong to another key if this run
            // moves that key to a different identifier.
            if let Some(owner) = self.keys_by_uuid.get(component.uuid()) {
                let owner_keeps_it = owner != component.key()
                    && cache
                        .get_by_key(owner)
                        .is_none_or(|c| c.uuid() == component.uuid());
                if owner_keeps_it {
                    return Err(corrupt(component.key(), component.uuid()));
                }
            }

            let previous = self.uuids_by_key.get(component.key());
            if previous.map(String::as_str) != Some(component.uuid()) {
                changes.push((
                    component.key.clone(),
                    component.uuid.clone(),
                    previous.cloned(),
                ));
            }
        }

        if changes.is_empty() {
            return Ok(0);
        }

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut key_table = write_txn.open_table(COMPONENT_UUIDS).map_err(io_err)?;
            let mut uuid_table = write_txn.open_table(UUID_KEYS).map_err(io_err)?;

            // Drop replaced identifiers first so a swap between keys survives.
            for (_, _, previous) in &changes {
                if let Some(previous) = previous {
                    uuid_table.remove(previous.as_str()).map_err(io_err)?;
                }
            }
            for (key, uuid, _) in &changes {
                key_table
                    .insert(key.as_str(), uuid.as_str())
                    .map_err(io_err)?;
                uuid_table
                    .insert(uuid.as_str(), key.as_str())
                    .map_err(io_err)?;
            }
        }
        write_txn.commit().map_err(io_err)?;

        // Update in-memory state only after successful commit.
        let changed = changes.len();
        for (_, _, previous) in &changes {
            if let Some(previous) = previous {
                self.keys_by_uuid.remove(previous);
            }
        }
        for (key, uuid, _) in changes {
            self.keys_by_uuid.insert(uuid.clone(), key.clone());
            self.uuids_by_key.insert(key, uuid);
        }

        tracing::info!(changed, total = self.uuids_by_key.len(), "recorded component identities");
        Ok(changed)
    }

    /// All `(key, uuid)` entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.uuids_by_key
            .iter()
            .map(|(k, u)| (k.as_str(), u.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.uuids_by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uuids_by_key.is_empty()
    }
}

impl PersistedIndex for RedbIndex {
    fn uuid_for_key(&self, key: &str) -> Result<Option<String>, ComprefError> {
        Ok(self.uuids_by_key.get(key).cloned())
    }

    fn contains_uuid(&self, uuid: &str) -> Result<bool, ComprefError> {
        Ok(self.keys_by_uuid.contains_key(uuid))
    }
}

// =============================================================================
// TESTS
// =============================================================================
