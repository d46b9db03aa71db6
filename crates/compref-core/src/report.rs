//! # Report Source
//!
//! The raw component tree of one analysis report.
//!
//! `ReportSource` is the read-only view the walker and resolver need:
//! report metadata plus a `ref -> node` lookup. `ComponentReport` is the
//! in-memory implementation, built either programmatically or from the
//! binary/JSON report formats.

use crate::primitives::MAX_REPORT_COMPONENTS;
use crate::{ComponentRef, ComprefError, RawComponentNode, ReportMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// REPORTSOURCE TRAIT
// =============================================================================

/// Read access to an already-parsed report.
pub trait ReportSource {
    /// Report-level metadata (root ref, branch).
    fn metadata(&self) -> &ReportMetadata;

    /// Lookup a raw node by its ref. `None` means the report has no such node.
    fn component(&self, component_ref: ComponentRef) -> Option<&RawComponentNode>;

    /// Number of raw nodes in the report.
    fn component_count(&self) -> usize;
}

// =============================================================================
// IN-MEMORY REPORT
// =============================================================================

/// An in-memory report: metadata plus every raw node indexed by ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReport {
    metadata: ReportMetadata,
    components: BTreeMap<ComponentRef, RawComponentNode>,
}

impl ComponentReport {
    /// Create an empty report.
    #[must_use]
    pub fn new(metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            components: BTreeMap::new(),
        }
    }

    /// Add a raw node.
    ///
    /// Returns `MalformedReport` if the ref is `0` or was already declared.
    pub fn add_component(&mut self, node: RawComponentNode) -> Result<(), ComprefError> {
        let component_ref = node.component_ref;
        if !component_ref.is_valid() {
            return Err(ComprefError::malformed("component ref must be positive"));
        }
        if self.components.len() >= MAX_REPORT_COMPONENTS {
            return Err(ComprefError::malformed(format!(
                "report exceeds {} components",
                MAX_REPORT_COMPONENTS
            )));
        }
        if self.components.contains_key(&component_ref) {
            return Err(ComprefError::malformed(format!(
                "component ref {} is declared twice",
                component_ref
            )));
        }
        self.components.insert(component_ref, node);
        Ok(())
    }

    /// Builder-style variant of [`add_component`](Self::add_component).
    pub fn with_component(mut self, node: RawComponentNode) -> Result<Self, ComprefError> {
        self.add_component(node)?;
        Ok(self)
    }

    /// Build a report from metadata and a list of nodes.
    pub fn from_components(
        metadata: ReportMetadata,
        nodes: impl IntoIterator<Item = RawComponentNode>,
    ) -> Result<Self, ComprefError> {
        let mut report = Self::new(metadata);
        for node in nodes {
            report.add_component(node)?;
        }
        Ok(report)
    }

    /// Iterate over all raw nodes in ref order.
    pub fn components(&self) -> impl Iterator<Item = &RawComponentNode> {
        self.components.values()
    }
}

impl ReportSource for ComponentReport {
    fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    fn component(&self, component_ref: ComponentRef) -> Option<&RawComponentNode> {
        self.components.get(&component_ref)
    }

    fn component_count(&self) -> usize {
        self.components.len()
    }
}

// =============================================================================
// SERIALIZABLE FORM
// =============================================================================

/// Flat, serializable representation of a report.
///
/// Shared by the binary format and the JSON input of the application layer.
/// Converting back into a `ComponentReport` re-runs the builder validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableReport {
    pub metadata: ReportMetadata,
    pub components: Vec<RawComponentNode>,
}

impl From<&ComponentReport> for SerializableReport {
    fn from(report: &ComponentReport) -> Self {
        Self {
            metadata: report.metadata.clone(),
            components: report.components.values().cloned().collect(),
        }
    }
}

impl TryFrom<SerializableReport> for ComponentReport {
    type Error = ComprefError;

    fn try_from(value: SerializableReport) -> Result<Self, Self::Error> {
        Self::from_components(value.metadata, value.components)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_ref() {
        let report = ComponentReport::from_components(
            ReportMetadata::new(1),
            [
                RawComponentNode::project(1, "PROJECT_KEY").with_children([2]),
                RawComponentNode::file(2, "Foo.java"),
            ],
        )
        .expect("build report");

        assert_eq!(report.component_count(), 2);
        assert_eq!(
            report.component(ComponentRef(2)).and_then(|n| n.path.as_deref()),
            Some("Foo.java")
        );
        assert!(report.component(ComponentRef(3)).is_none());
    }

    #[test]
    fn duplicate_ref_rejected() {
        let result = ComponentReport::from_components(
            ReportMetadata::new(1),
            [
                RawComponentNode::project(1, "A"),
                RawComponentNode::module(1, "B"),
            ],
        );
        assert!(matches!(result, Err(ComprefError::MalformedReport(_))));
    }

    #[test]
    fn ref_zero_rejected() {
        let mut report = ComponentReport::new(ReportMetadata::new(1));
        let result = report.add_component(RawComponentNode::project(0, "A"));
        assert!(matches!(result, Err(ComprefError::MalformedReport(_))));
    }

    #[test]
    fn serializable_conversion_preserves_nodes() {
        let report = ComponentReport::from_components(
            ReportMetadata::new(1).with_branch("dev"),
            [
                RawComponentNode::project(1, "P").with_children([3, 2]),
                RawComponentNode::directory(3, "src"),
                RawComponentNode::directory(2, "lib"),
            ],
        )
        .expect("build report");

        let flat = SerializableReport::from(&report);
        assert_eq!(flat.components.len(), 3);

        let rebuilt = ComponentReport::try_from(flat).expect("rebuild");
        assert_eq!(rebuilt, report);
    }
}
