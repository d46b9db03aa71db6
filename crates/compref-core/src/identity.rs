//! # Identity
//!
//! Where component identifiers come from.
//!
//! - `PersistedIndex`: identifiers recorded by previous analyses, by key
//! - `UuidMinter`: fresh identifiers for keys never seen before
//!
//! Both are injected into the resolver, so a run can be pointed at a redb
//! index, an in-memory snapshot, or nothing at all.

use crate::cache::ComponentsRefCache;
use crate::ComprefError;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

// =============================================================================
// PERSISTED INDEX
// =============================================================================

/// Lookup of identifiers persisted by earlier analyses of the same project.
///
/// A miss is `Ok(None)`: the key belongs to a new component.
pub trait PersistedIndex {
    /// The identifier previously stored for `key`, if any.
    fn uuid_for_key(&self, key: &str) -> Result<Option<String>, ComprefError>;

    /// Whether `uuid` is already assigned to some persisted component.
    fn contains_uuid(&self, uuid: &str) -> Result<bool, ComprefError>;
}

/// In-memory key -> identifier index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryIndex {
    uuids_by_key: BTreeMap<String, String>,
    uuids: BTreeSet<String>,
}

impl InMemoryIndex {
    /// Create an empty index. Every key resolves to a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key -> uuid`, replacing any previous identifier for `key`.
    pub fn insert(&mut self, key: impl Into<String>, uuid: impl Into<String>) {
        let uuid = uuid.into();
        if let Some(previous) = self.uuids_by_key.insert(key.into(), uuid.clone()) {
            if previous != uuid && !self.uuids_by_key.values().any(|u| *u == previous) {
                self.uuids.remove(&previous);
            }
        }
        self.uuids.insert(uuid);
    }

    /// Snapshot the identities of a finished run.
    #[must_use]
    pub fn from_cache(cache: &ComponentsRefCache) -> Self {
        cache
            .iter()
            .map(|(_, c)| (c.key.clone(), c.uuid.clone()))
            .collect()
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

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InMemoryIndex {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut index = Self::new();
        for (key, uuid) in iter {
            index.insert(key, uuid);
        }
        index
    }
}

impl PersistedIndex for InMemoryIndex {
    fn uuid_for_key(&self, key: &str) -> Result<Option<String>, ComprefError> {
        Ok(self.uuids_by_key.get(key).cloned())
    }

    fn contains_uuid(&self, uuid: &str) -> Result<bool, ComprefError> {
        Ok(self.uuids.contains(uuid))
    }
}

// =============================================================================
// IDENTIFIER MINTING
// =============================================================================

/// Source of fresh identifiers.
///
/// The resolver discards a minted identifier that is already in use and asks
/// again, so implementations only need to be unique with high probability.
pub trait UuidMinter {
    fn mint(&mut self) -> String;
}

/// Random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuids;

impl UuidMinter for RandomUuids {
    fn mint(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic name-based (v5) UUIDs derived from a namespace and a counter.
///
/// Two runs with the same namespace, report and index mint the same
/// identifiers in the same order.
#[derive(Debug, Clone)]
pub struct SequentialUuids {
    namespace: Uuid,
    counter: u64,
}

impl SequentialUuids {
    #[must_use]
    pub fn new(namespace: Uuid) -> Self {
        Self {
            namespace,
            counter: 0,
        }
    }

    /// A minter whose namespace is derived from a seed string.
    #[must_use]
    pub fn seeded(seed: &str) -> Self {
        Self::new(Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()))
    }

    /// Number of identifiers minted so far.
    #[must_use]
    pub fn minted(&self) -> u64 {
        self.counter
    }
}

impl Default for SequentialUuids {
    fn default() -> Self {
        Self::seeded("compref")
    }
}

impl UuidMinter for SequentialUuids {
    fn mint(&mut self) -> String {
        let uuid = Uuid::new_v5(&self.namespace, &self.counter.to_be_bytes());
        self.counter = self.counter.saturating_add(1);
        uuid.to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
