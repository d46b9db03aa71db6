//! # Computation Steps
//!
//! The batch-pipeline contract around the resolver.
//!
//! A `ComputationContext` carries everything one analysis run shares between
//! steps. Steps run in the order they were added to a `Pipeline`; the first
//! failing step stops the pipeline. The components cache is published into
//! the context only once resolution completed, so a failed run leaves nothing
//! for later steps to read.

use crate::cache::ComponentsRefCache;
use crate::identity::{PersistedIndex, RandomUuids, UuidMinter};
use crate::report::ReportSource;
use crate::resolver::{KeyResolver, ResolutionStats};
use crate::ComprefError;
use std::sync::Arc;

// =============================================================================
// CONTEXT
// =============================================================================

/// Per-run state shared by pipeline steps.
pub struct ComputationContext<'a> {
    report: &'a dyn ReportSource,
    index: &'a dyn PersistedIndex,
    components: Option<Arc<ComponentsRefCache>>,
    resolution_stats: Option<ResolutionStats>,
}

impl<'a> ComputationContext<'a> {
    #[must_use]
    pub fn new(report: &'a dyn ReportSource, index: &'a dyn PersistedIndex) -> Self {
        Self {
            report,
            index,
            components: None,
            resolution_stats: None,
        }
    }

    #[must_use]
    pub fn report(&self) -> &'a dyn ReportSource {
        self.report
    }

    #[must_use]
    pub fn index(&self) -> &'a dyn PersistedIndex {
        self.index
    }

    /// The resolved components, once the feeding step has completed.
    #[must_use]
    pub fn components(&self) -> Option<Arc<ComponentsRefCache>> {
        self.components.clone()
    }

    #[must_use]
    pub fn resolution_stats(&self) -> Option<ResolutionStats> {
        self.resolution_stats
    }

    fn publish(&mut self, cache: ComponentsRefCache, stats: ResolutionStats) {
        self.components = Some(Arc::new(cache));
        self.resolution_stats = Some(stats);
    }
}

// =============================================================================
// STEP TRAIT
// =============================================================================

/// One stage of the analysis pipeline.
///
/// Returning normally signals completion; an error is fatal for the run.
pub trait ComputationStep {
    fn name(&self) -> &'static str;

    fn execute(&mut self, context: &mut ComputationContext<'_>) -> Result<(), ComprefError>;
}

/// Resolves every report component and publishes the components cache.
pub struct FeedComponentsCacheStep {
    minter: Box<dyn UuidMinter + Send>,
}

impl FeedComponentsCacheStep {
    /// A step minting random identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_minter(RandomUuids)
    }

    #[must_use]
    pub fn with_minter(minter: impl UuidMinter + Send + 'static) -> Self {
        Self {
            minter: Box::new(minter),
        }
    }
}

impl Default for FeedComponentsCacheStep {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputationStep for FeedComponentsCacheStep {
    fn name(&self) -> &'static str {
        "Feed components cache"
    }

    fn execute(&mut self, context: &mut ComputationContext<'_>) -> Result<(), ComprefError> {
        let resolution =
            KeyResolver::new(context.index(), self.minter.as_mut()).resolve(context.report())?;
        context.publish(resolution.cache, resolution.stats);
        Ok(())
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// An explicit, ordered list of steps.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn ComputationStep>>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; steps run in insertion order.
    #[must_use]
    pub fn with_step(mut self, step: impl ComputationStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Names of the steps, in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order, stopping at the first failure.
    pub fn run(&mut self, context: &mut ComputationContext<'_>) -> Result<(), ComprefError> {
        for step in &mut self.steps {
            tracing::debug!(step = step.name(), "executing step");
            if let Err(e) = step.execute(context) {
                tracing::error!(step = step.name(), error = %e, "step failed");
                return Err(e);
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
