//! # Key Resolver
//!
//! Turns a raw component tree into a populated [`ComponentsRefCache`].
//!
//! ## Key rules
//!
//! | Node type          | Key                                          |
//! |--------------------|----------------------------------------------|
//! | PROJECT / MODULE   | `declaredKey` or `declaredKey:branch`        |
//! | DIRECTORY / FILE   | `nearestModuleKey:path`                      |
//!
//! The nearest module is the deepest PROJECT/MODULE ancestor. Its key already
//! carries the branch, so directory and file keys never repeat it.
//!
//! ## Identifiers
//!
//! A key found in the persisted index keeps its identifier. Any other key gets
//! a freshly minted one that is unused both in this run and in the index.
//!
//! Resolution follows walker order exactly, so with a deterministic minter the
//! same report and index always produce the same cache. Any error aborts the
//! whole run; the partially built cache is dropped.

use crate::cache::ComponentsRefCache;
use crate::identity::{PersistedIndex, UuidMinter};
use crate::primitives::{KEY_SEPARATOR, MAX_KEY_LENGTH, MAX_MINT_ATTEMPTS};
use crate::report::ReportSource;
use crate::walker::{ReportWalker, Visit};
use crate::{ComponentType, ComprefError, RawComponentNode, ResolvedComponent};

// =============================================================================
// RESOLUTION RESULT
// =============================================================================

/// Counters describing one resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Components written to the cache.
    pub resolved: usize,
    /// Identifiers taken from the persisted index.
    pub reused: usize,
    /// Identifiers minted in this run.
    pub minted: usize,
    /// Raw nodes present in the report but not reachable from the root.
    pub unreachable: usize,
}

/// A fully populated cache and the counters of the run that built it.
#[derive(Debug)]
pub struct Resolution {
    pub cache: ComponentsRefCache,
    pub stats: ResolutionStats,
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Key of an enclosing module and the depth it was declared at.
#[derive(Debug)]
struct ModuleScope {
    depth: usize,
    key: String,
}

/// Resolves keys and identifiers for every node reachable from the root.
pub struct KeyResolver<'a, I: PersistedIndex + ?Sized, M: UuidMinter + ?Sized> {
    index: &'a I,
    minter: &'a mut M,
}

impl<'a, I: PersistedIndex + ?Sized, M: UuidMinter + ?Sized> KeyResolver<'a, I, M> {
    #[must_use]
    pub fn new(index: &'a I, minter: &'a mut M) -> Self {
        Self { index, minter }
    }

    /// Walk `report` and resolve every reachable component.
    ///
    /// # Errors
    /// - `MalformedReport` for missing fields, dangling or repeated refs,
    ///   a non-PROJECT root, or two nodes computing the same key
    /// - `IdentifierCollision` / `CorruptIndex` for identifier conflicts
    /// - any error raised by the persisted index
    pub fn resolve<R: ReportSource + ?Sized>(
        &mut self,
        report: &R,
    ) -> Result<Resolution, ComprefError> {
        let branch = report.metadata().branch();
        let mut cache = ComponentsRefCache::new();
        let mut stats = ResolutionStats::default();
        let mut scopes: Vec<ModuleScope> = Vec::new();

        for visit in ReportWalker::new(report).iter() {
            let Visit { node, depth } = visit?;

            if depth == 0 && node.component_type != ComponentType::Project {
                return Err(ComprefError::malformed(format!(
                    "root component {} is a {}, expected PROJECT",
                    node.component_ref, node.component_type
                )));
            }

            // Leave every module scope that is not an ancestor of this node.
            while scopes.last().is_some_and(|scope| scope.depth >= depth) {
                scopes.pop();
            }

            let key = match node.component_type {
                ComponentType::Project | ComponentType::Module => {
                    let key = module_key(node, branch)?;
                    scopes.push(ModuleScope {
                        depth,
                        key: key.clone(),
                    });
                    key
                }
                ComponentType::Directory | ComponentType::File => {
                    let module = scopes.last().ok_or_else(|| {
                        ComprefError::malformed(format!(
                            "component {} has no enclosing module",
                            node.component_ref
                        ))
                    })?;
                    path_key(node, &module.key)?
                }
            };

            if let Some(owner) = cache.get_by_key(&key) {
                return Err(ComprefError::malformed(format!(
                    "components {} and {} both resolve to key '{}'",
                    owner.component_ref, node.component_ref, key
                )));
            }

            let (uuid, reused) = self.identify(&key, &cache)?;
            if reused {
                stats.reused += 1;
            } else {
                stats.minted += 1;
            }

            tracing::debug!(
                component_ref = node.component_ref.value(),
                component_type = %node.component_type,
                key = %key,
                uuid = %uuid,
                reused,
                "resolved component"
            );

            cache.put(
                node.component_ref,
                ResolvedComponent::new(node.component_ref, key, uuid),
            )?;
            stats.resolved += 1;
        }

        stats.unreachable = report.component_count().saturating_sub(stats.resolved);
        if stats.unreachable > 0 {
            tracing::warn!(
                unreachable = stats.unreachable,
                "report contains components not reachable from the root"
            );
        }

        tracing::info!(
            resolved = stats.resolved,
            reused = stats.reused,
            minted = stats.minted,
            branch = branch.unwrap_or(""),
            "component resolution complete"
        );

        Ok(Resolution { cache, stats })
    }

    /// Find the identifier for `key`: persisted if known, freshly minted
    /// otherwise. The flag is `true` when the identifier was reused.
    fn identify(
        &mut self,
        key: &str,
        cache: &ComponentsRefCache,
    ) -> Result<(String, bool), ComprefError> {
        if let Some(uuid) = self.index.uuid_for_key(key)? {
            if cache.contains_uuid(&uuid) {
                return Err(ComprefError::CorruptIndex {
                    key: key.to_string(),
                    uuid,
                });
            }
            return Ok((uuid, true));
        }

        for _ in 0..MAX_MINT_ATTEMPTS {
            let candidate = self.minter.mint();
            if cache.contains_uuid(&candidate) || self.index.contains_uuid(&candidate)? {
                tracing::warn!(key, uuid = %candidate, "discarding minted identifier already in use");
                continue;
            }
            return Ok((candidate, false));
        }

        Err(ComprefError::IdentifierCollision(key.to_string()))
    }
}

// =============================================================================
// KEY DERIVATION
// =============================================================================

/// Key of a PROJECT/MODULE node: its declared key, qualified by the branch.
fn module_key(node: &RawComponentNode, branch: Option<&str>) -> Result<String, ComprefError> {
    let declared = node
        .declared_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ComprefError::malformed(format!(
                "{} component {} has no key",
                node.component_type, node.component_ref
            ))
        })?;

    let key = match branch {
        Some(branch) => format!("{}{}{}", declared, KEY_SEPARATOR, branch),
        None => declared.to_string(),
    };
    check_length(node, key)
}

/// Key of a DIRECTORY/FILE node: the enclosing module key and its path.
fn path_key(node: &RawComponentNode, module_key: &str) -> Result<String, ComprefError> {
    let path = node
        .path
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            ComprefError::malformed(format!(
                "{} component {} has no path",
                node.component_type, node.component_ref
            ))
        })?;

    check_length(node, format!("{}{}{}", module_key, KEY_SEPARATOR, path))
}

fn check_length(node: &RawComponentNode, key: String) -> Result<String, ComprefError> {
    if key.len() > MAX_KEY_LENGTH {
        return Err(ComprefError::malformed(format!(
            "key of component {} exceeds {} bytes",
            node.component_ref, MAX_KEY_LENGTH
        )));
    }
    Ok(key)
}

// =============================================================================
// TESTS
// =============================================================================
