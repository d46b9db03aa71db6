//! # Components Reference Cache
//!
//! The per-run table of resolved components.
//!
//! The resolver writes every reachable ref exactly once; afterwards the cache
//! is shared behind `Arc` and only read. Lookups by ref serve consumers that
//! hold an integer reference from the report, lookups by key serve consumers
//! correlating with persisted state.

use crate::{ComponentRef, ComprefError, ResolvedComponent};
use std::collections::{BTreeMap, BTreeSet};

/// Ref-indexed and key-indexed view of the components resolved in one run.
///
/// Uses `BTreeMap` so iteration is ordered by ref.
#[derive(Debug, Clone, Default)]
pub struct ComponentsRefCache {
    /// Primary storage: ref -> component
    by_ref: BTreeMap<ComponentRef, ResolvedComponent>,
    /// Key index: key -> ref
    by_key: BTreeMap<String, ComponentRef>,
    /// Every identifier handed out in this run
    uuids: BTreeSet<String>,
}

impl ComponentsRefCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resolved component under `component_ref`.
    ///
    /// # Errors
    /// - `DuplicateRef` if the ref was already written
    /// - `MalformedReport` if another ref already owns the component's key
    /// - `CorruptIndex` if another ref already owns the component's identifier
    pub fn put(
        &mut self,
        component_ref: ComponentRef,
        component: ResolvedComponent,
    ) -> Result<(), ComprefError> {
        if self.by_ref.contains_key(&component_ref) {
            return Err(ComprefError::DuplicateRef(component_ref));
        }
        if let Some(owner) = self.by_key.get(component.key()) {
            return Err(ComprefError::malformed(format!(
                "components {} and {} both resolve to key '{}'",
                owner,
                component_ref,
                component.key()
            )));
        }
        if self.uuids.contains(component.uuid()) {
            return Err(ComprefError::CorruptIndex {
                key: component.key.clone(),
                uuid: component.uuid.clone(),
            });
        }

        self.by_key.insert(component.key.clone(), component_ref);
        self.uuids.insert(component.uuid.clone());
        self.by_ref.insert(component_ref, component);
        Ok(())
    }

    /// Lookup a component by the ref it had in the report.
    #[must_use]
    pub fn get(&self, component_ref: ComponentRef) -> Option<&ResolvedComponent> {
        self.by_ref.get(&component_ref)
    }

    /// Lookup a component by its canonical key.
    #[must_use]
    pub fn get_by_key(&self, key: &str) -> Option<&ResolvedComponent> {
        self.by_key.get(key).and_then(|r| self.by_ref.get(r))
    }

    /// Check whether an identifier is already assigned in this run.
    #[must_use]
    pub fn contains_uuid(&self, uuid: &str) -> bool {
        self.uuids.contains(uuid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_ref.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_ref.is_empty()
    }

    /// Iterate over `(ref, component)` pairs in ref order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentRef, &ResolvedComponent)> {
        self.by_ref.iter().map(|(r, c)| (*r, c))
    }
}

// =============================================================================
// TESTS
// =============================================================================
