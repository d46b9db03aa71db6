//! # compref-core
//!
//! Component reference resolution for batch analysis reports - THE LOGIC.
//!
//! An analysis report describes the scanned codebase as a tree of components
//! (project, modules, directories, files) identified by small integer refs.
//! This crate resolves every ref to a canonical hierarchical key and a stable
//! identifier, and publishes the result in a per-run [`ComponentsRefCache`].
//!
//! ## Flow
//!
//! ```text
//! report ──► ReportWalker ──► KeyResolver ──► ComponentsRefCache ──► consumers
//!             (pre-order)      (keys, uuids)     (get by ref/key)
//! ```
//!
//! ## Architectural Constraints
//!
//! - No async, no network, no file I/O beyond what `storage` needs
//! - No global state: cache, index and minter are explicit per-run values
//! - All-or-nothing: a failed resolution never publishes a partial cache
//!
//! ## Example
//!
//! ```
//! use compref_core::{
//!     ComponentRef, ComponentReport, InMemoryIndex, KeyResolver, RawComponentNode,
//!     ReportMetadata, SequentialUuids,
//! };
//!
//! let report = ComponentReport::from_components(
//!     ReportMetadata::new(1),
//!     [
//!         RawComponentNode::project(1, "PROJECT_KEY").with_children([2]),
//!         RawComponentNode::file(2, "src/Foo.java"),
//!     ],
//! )
//! .unwrap();
//!
//! let index = InMemoryIndex::new();
//! let mut minter = SequentialUuids::default();
//! let resolution = KeyResolver::new(&index, &mut minter).resolve(&report).unwrap();
//!
//! let file = resolution.cache.get(ComponentRef(2)).unwrap();
//! assert_eq!(file.key(), "PROJECT_KEY:src/Foo.java");
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod cache;
pub mod formats;
pub mod identity;
pub mod primitives;
pub mod report;
pub mod resolver;
pub mod step;
pub mod storage;
pub mod types;
pub mod walker;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ComponentRef, ComponentType, ComprefError, RawComponentNode, ReportMetadata,
    ResolvedComponent,
};

// =============================================================================
// RE-EXPORTS: Resolution
// =============================================================================

pub use cache::ComponentsRefCache;
pub use identity::{InMemoryIndex, PersistedIndex, RandomUuids, SequentialUuids, UuidMinter};
pub use report::{ComponentReport, ReportSource, SerializableReport};
pub use resolver::{KeyResolver, Resolution, ResolutionStats};
pub use step::{ComputationContext, ComputationStep, FeedComponentsCacheStep, Pipeline};
pub use storage::RedbIndex;
pub use walker::{ReportWalker, Visit, Walk};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{ReportHeader, report_from_bytes, report_to_bytes};
