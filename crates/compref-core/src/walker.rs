//! # Report Walker
//!
//! Pre-order traversal of the raw component tree.
//!
//! - A node is always yielded before any of its descendants
//! - Children are followed in declared order, never re-sorted
//! - The walk is lazy and restartable: every `iter()` starts from the root
//! - Dangling or repeated refs end the walk with `MalformedReport`

use crate::report::ReportSource;
use crate::{ComponentRef, ComprefError, RawComponentNode};
use std::collections::BTreeSet;

/// One step of the walk: a node and its depth below the root (root = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit<'a> {
    pub node: &'a RawComponentNode,
    pub depth: usize,
}

/// Walks a report from its root ref.
#[derive(Debug)]
pub struct ReportWalker<'a, R: ReportSource + ?Sized> {
    report: &'a R,
}

impl<'a, R: ReportSource + ?Sized> ReportWalker<'a, R> {
    #[must_use]
    pub fn new(report: &'a R) -> Self {
        Self { report }
    }

    /// Start a fresh pre-order walk from the report root.
    #[must_use]
    pub fn iter(&self) -> Walk<'a, R> {
        let root = self.report.metadata().root_ref;
        Walk {
            report: self.report,
            stack: vec![Pending {
                component_ref: root,
                parent: None,
                depth: 0,
            }],
            visited: BTreeSet::new(),
            failed: false,
        }
    }
}

impl<'a, R: ReportSource + ?Sized> IntoIterator for &ReportWalker<'a, R> {
    type Item = Result<Visit<'a>, ComprefError>;
    type IntoIter = Walk<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    component_ref: ComponentRef,
    parent: Option<ComponentRef>,
    depth: usize,
}

/// Lazy pre-order iterator returned by [`ReportWalker::iter`].
///
/// Fused after the first error.
#[derive(Debug)]
pub struct Walk<'a, R: ReportSource + ?Sized> {
    report: &'a R,
    stack: Vec<Pending>,
    visited: BTreeSet<ComponentRef>,
    failed: bool,
}

impl<'a, R: ReportSource + ?Sized> Walk<'a, R> {
    fn fail(&mut self, message: String) -> Option<Result<Visit<'a>, ComprefError>> {
        self.failed = true;
        self.stack.clear();
        Some(Err(ComprefError::malformed(message)))
    }
}

impl<'a, R: ReportSource + ?Sized> Iterator for Walk<'a, R> {
    type Item = Result<Visit<'a>, ComprefError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let pending = self.stack.pop()?;

        let Some(node) = self.report.component(pending.component_ref) else {
            let message = match pending.parent {
                Some(parent) => format!(
                    "component {} references missing child {}",
                    parent, pending.component_ref
                ),
                None => format!("root component {} does not exist", pending.component_ref),
            };
            return self.fail(message);
        };

        if !self.visited.insert(pending.component_ref) {
            let message = format!(
                "component {} is reached more than once (cycle or shared child)",
                pending.component_ref
            );
            return self.fail(message);
        }

        // Reverse push so the first declared child is popped first.
        self.stack.extend(node.child_refs.iter().rev().map(|&child| Pending {
            component_ref: child,
            parent: Some(pending.component_ref),
            depth: pending.depth + 1,
        }));

        Some(Ok(Visit {
            node,
            depth: pending.depth,
        }))
    }
}

impl<R: ReportSource + ?Sized> std::iter::FusedIterator for Walk<'_, R> {}

// =============================================================================
// TESTS
// =============================================================================
