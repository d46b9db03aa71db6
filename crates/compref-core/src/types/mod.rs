//! # Core Type Definitions
//!
//! This module contains the core types shared by every stage of resolution:
//! - Report identifiers (`ComponentRef`, `ComponentType`)
//! - Raw report input (`RawComponentNode`, `ReportMetadata`)
//! - Resolution output (`ResolvedComponent`)
//! - Error types (`ComprefError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` so they can key `BTreeMap`/`BTreeSet`
//! collections, which keeps iteration order stable across runs.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use thiserror::Error;

// =============================================================================
// REPORT IDENTIFIERS
// =============================================================================

/// Reference of a component inside one report.
///
/// Refs are small positive integers and are only meaningful within the report
/// that declared them. Ref `0` is never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRef(pub u32);

impl ComponentRef {
    /// Get the raw ref value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Refs must be strictly positive.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a component in the scanned tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    Project,
    Module,
    Directory,
    File,
}

impl ComponentType {
    /// PROJECT and MODULE nodes open a new key-inheritance scope.
    #[must_use]
    pub const fn is_module_scope(self) -> bool {
        matches!(self, Self::Project | Self::Module)
    }

    /// Upper-case name as it appears in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Project => "PROJECT",
            Self::Module => "MODULE",
            Self::Directory => "DIRECTORY",
            Self::File => "FILE",
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// RAW REPORT INPUT
// =============================================================================

/// A component node exactly as the analysis report declares it.
///
/// `key` is only meaningful for PROJECT/MODULE nodes, `path` only for
/// DIRECTORY/FILE nodes (relative to the enclosing module). The resolver
/// rejects nodes missing the field their type requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComponentNode {
    #[serde(rename = "ref")]
    pub component_ref: ComponentRef,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(rename = "key", default)]
    pub declared_key: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub child_refs: Vec<ComponentRef>,
}

impl RawComponentNode {
    /// Create a node with no key, no path and no children.
    #[must_use]
    pub fn new(component_ref: ComponentRef, component_type: ComponentType) -> Self {
        Self {
            component_ref,
            component_type,
            declared_key: None,
            path: None,
            child_refs: Vec::new(),
        }
    }

    /// Create a PROJECT node with its declared key.
    #[must_use]
    pub fn project(component_ref: u32, key: impl Into<String>) -> Self {
        Self::new(ComponentRef(component_ref), ComponentType::Project).with_key(key)
    }

    /// Create a MODULE node with its declared key.
    #[must_use]
    pub fn module(component_ref: u32, key: impl Into<String>) -> Self {
        Self::new(ComponentRef(component_ref), ComponentType::Module).with_key(key)
    }

    /// Create a DIRECTORY node with its module-relative path.
    #[must_use]
    pub fn directory(component_ref: u32, path: impl Into<String>) -> Self {
        Self::new(ComponentRef(component_ref), ComponentType::Directory).with_path(path)
    }

    /// Create a FILE node with its module-relative path.
    #[must_use]
    pub fn file(component_ref: u32, path: impl Into<String>) -> Self {
        Self::new(ComponentRef(component_ref), ComponentType::File).with_path(path)
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.declared_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replace the child list. Declaration order is preserved.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = u32>) -> Self {
        self.child_refs = children.into_iter().map(ComponentRef).collect();
        self
    }
}

/// Report-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub root_ref: ComponentRef,
    #[serde(default)]
    pub branch: Option<String>,
}

impl ReportMetadata {
    /// Metadata for an unbranched analysis.
    #[must_use]
    pub fn new(root_ref: u32) -> Self {
        Self {
            root_ref: ComponentRef(root_ref),
            branch: None,
        }
    }

    /// Set the branch qualifier. An empty branch means "no branch".
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.branch = (!branch.is_empty()).then_some(branch);
        self
    }

    /// The branch qualifier, if the analysis is branched.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref().filter(|b| !b.is_empty())
    }
}

// =============================================================================
// RESOLUTION OUTPUT
// =============================================================================

/// A component after key and identifier resolution.
///
/// Equality and hashing use `key` and `uuid` only: refs are scoped to a single
/// report and say nothing about component identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedComponent {
    #[serde(rename = "ref")]
    pub component_ref: ComponentRef,
    pub key: String,
    pub uuid: String,
}

impl ResolvedComponent {
    #[must_use]
    pub fn new(component_ref: ComponentRef, key: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            component_ref,
            key: key.into(),
            uuid: uuid.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }
}

impl PartialEq for ResolvedComponent {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid && self.key == other.key
    }
}

impl Eq for ResolvedComponent {}

impl Hash for ResolvedComponent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
        self.key.hash(state);
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while resolving components.
///
/// - Every error is fatal for the run that raised it
/// - A lookup miss in the persisted index is NOT an error
/// - No partial cache is ever published alongside an error
#[derive(Debug, Error)]
pub enum ComprefError {
    /// The report is structurally invalid: missing field, dangling or
    /// repeated reference, duplicate key.
    #[error("Malformed report: {0}")]
    MalformedReport(String),

    /// A ref was written to the cache twice.
    #[error("Duplicate component ref: {0}")]
    DuplicateRef(ComponentRef),

    /// The minter kept producing identifiers that are already in use.
    #[error("Identifier collision: no unique identifier could be minted for '{0}'")]
    IdentifierCollision(String),

    /// The persisted index hands out one identifier for two components.
    #[error("Corrupt persisted index: identifier {uuid} for key '{key}' is already assigned")]
    CorruptIndex { key: String, uuid: String },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ComprefError {
    /// Shorthand for building a `MalformedReport` error.
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedReport(message.into())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn resolved_component_equality_ignores_ref() {
        let a = ResolvedComponent::new(ComponentRef(1), "KEY", "uuid-1");
        let b = ResolvedComponent::new(ComponentRef(7), "KEY", "uuid-1");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn resolved_component_equality_needs_key_and_uuid() {
        let a = ResolvedComponent::new(ComponentRef(1), "KEY", "uuid-1");
        assert_ne!(a, ResolvedComponent::new(ComponentRef(1), "OTHER", "uuid-1"));
        assert_ne!(a, ResolvedComponent::new(ComponentRef(1), "KEY", "uuid-2"));
    }

    #[test]
    fn empty_branch_is_no_branch() {
        let metadata = ReportMetadata::new(1).with_branch("");
        assert_eq!(metadata.branch(), None);

        let metadata = ReportMetadata::new(1).with_branch("origin/master");
        assert_eq!(metadata.branch(), Some("origin/master"));
    }

    #[test]
    fn module_scopes() {
        assert!(ComponentType::Project.is_module_scope());
        assert!(ComponentType::Module.is_module_scope());
        assert!(!ComponentType::Directory.is_module_scope());
        assert!(!ComponentType::File.is_module_scope());
    }

    #[test]
    fn ref_zero_is_invalid() {
        assert!(!ComponentRef(0).is_valid());
        assert!(ComponentRef(1).is_valid());
    }
}
