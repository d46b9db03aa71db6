//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::Settings;
use crate::input::{ReportFormat, read_report, validate_output_path};
use compref_core::{
    ComponentRef, ComponentReport, ComponentsRefCache, ComprefError, ComputationContext,
    FeedComponentsCacheStep, Pipeline, RandomUuids, RedbIndex, ReportSource, ResolutionStats,
    SequentialUuids, report_to_bytes,
};
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Resolve every component of a report.
pub fn cmd_resolve(
    settings: &Settings,
    report_path: &Path,
    format: Option<ReportFormat>,
    record: bool,
) -> Result<(), ComprefError> {
    let report = read_report(report_path, format)?;
    let mut index = if record {
        RedbIndex::open(&settings.database)?
    } else {
        RedbIndex::open_existing(&settings.database)?
    };
    let (cache, stats) = resolve_report(settings, &report, &index)?;

    let recorded = if record {
        Some(index.record(&cache)?)
    } else {
        None
    };

    if settings.json_output {
        let components: Vec<_> = cache.iter().map(|(_, c)| c).collect();
        let output = serde_json::json!({
            "database": settings.database.to_string_lossy(),
            "components": components,
            "stats": stats_json(&stats),
            "recorded": recorded,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    if !settings.quiet {
        println!("Resolved Components");
        println!("===================");
        println!("Report:   {:?}", report_path);
        println!("Database: {:?}", settings.database);
        println!();
    }

    for (component_ref, component) in cache.iter() {
        println!("{:>8}  {}  {}", component_ref.value(), component.uuid(), component.key());
    }

    if !settings.quiet {
        println!();
        println!(
            "Resolved: {}  Reused: {}  Minted: {}  Unreachable: {}",
            stats.resolved, stats.reused, stats.minted, stats.unreachable
        );
        if let Some(changed) = recorded {
            println!("Recorded {} identities to {:?}", changed, settings.database);
        }
    }

    Ok(())
}

// =============================================================================
// LOOKUP COMMAND
// =============================================================================

/// Resolve a report and show one component.
pub fn cmd_lookup(
    settings: &Settings,
    report_path: &Path,
    format: Option<ReportFormat>,
    component_ref: u32,
) -> Result<(), ComprefError> {
    let report = read_report(report_path, format)?;
    let index = RedbIndex::open_existing(&settings.database)?;
    let (cache, _) = resolve_report(settings, &report, &index)?;
    let found = cache.get(ComponentRef(component_ref));

    if settings.json_output {
        let output = match found {
            Some(component) => serde_json::json!({
                "found": true,
                "component": component,
            }),
            None => serde_json::json!({
                "found": false,
                "ref": component_ref,
            }),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    match found {
        Some(component) => {
            println!("Ref:  {}", component_ref);
            println!("Key:  {}", component.key());
            println!("UUID: {}", component.uuid());
        }
        None => println!("Component {} not found", component_ref),
    }

    Ok(())
}

// =============================================================================
// ENCODE COMMAND
// =============================================================================

/// Convert a JSON report into the binary format.
pub fn cmd_encode(settings: &Settings, input: &Path, output: &Path) -> Result<(), ComprefError> {
    let validated_output = validate_output_path(output)?;
    let report = read_report(input, Some(ReportFormat::Json))?;
    let data = report_to_bytes(&report)?;

    std::fs::write(&validated_output, &data)
        .map_err(|e| ComprefError::IoError(format!("Write file: {}", e)))?;

    if settings.json_output {
        let output = serde_json::json!({
            "output": validated_output.to_string_lossy(),
            "bytes": data.len(),
            "components": report.components().count(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else if !settings.quiet {
        println!("Encoded {} bytes to {:?}", data.len(), validated_output);
    }

    Ok(())
}

// =============================================================================
// INDEX COMMAND
// =============================================================================

/// List the persisted identities.
pub fn cmd_index(settings: &Settings) -> Result<(), ComprefError> {
    let index = RedbIndex::open_existing(&settings.database)?;

    if settings.json_output {
        let entries: Vec<_> = index
            .entries()
            .map(|(key, uuid)| serde_json::json!({ "key": key, "uuid": uuid }))
            .collect();
        let output = serde_json::json!({
            "database": settings.database.to_string_lossy(),
            "entry_count": index.len(),
            "entries": entries,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    if !settings.quiet {
        println!("Compref Index");
        println!("=============");
        println!("Database: {:?}", settings.database);
        println!("Entries:  {}", index.len());
        println!();
    }

    for (key, uuid) in index.entries() {
        println!("{}  {}", uuid, key);
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty index database.
pub fn cmd_init(settings: &Settings, force: bool) -> Result<(), ComprefError> {
    let db_path = &settings.database;
    if db_path.exists() {
        if !force {
            return Err(ComprefError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| ComprefError::IoError(format!("Remove database: {}", e)))?;
    }

    let _index = RedbIndex::open(db_path)?;
    if !settings.quiet {
        println!("Initialized new index database at {:?}", db_path);
    }

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Run the resolution pipeline over a report against an index.
///
/// Deterministic runs seed their minter from [`deterministic_seed`].
pub fn resolve_report(
    settings: &Settings,
    report: &ComponentReport,
    index: &RedbIndex,
) -> Result<(Arc<ComponentsRefCache>, ResolutionStats), ComprefError> {
    let feed = if settings.deterministic_ids {
        FeedComponentsCacheStep::with_minter(SequentialUuids::seeded(&deterministic_seed(
            report,
            index.len(),
        )))
    } else {
        FeedComponentsCacheStep::with_minter(RandomUuids)
    };

    let mut context = ComputationContext::new(report, index);
    Pipeline::new().with_step(feed).run(&mut context)?;

    match (context.components(), context.resolution_stats()) {
        (Some(cache), Some(stats)) => Ok((cache, stats)),
        _ => Err(ComprefError::MalformedReport(
            "Pipeline finished without publishing components".to_string(),
        )),
    }
}

/// Seed for deterministic identifiers: root project key, branch and index size.
///
/// The project key separates unrelated projects; the index size keeps a run
/// over a grown index from replaying identifiers it already stores.
pub fn deterministic_seed(report: &ComponentReport, index_len: usize) -> String {
    let metadata = report.metadata();
    let project_key = report
        .component(metadata.root_ref)
        .and_then(|root| root.declared_key.as_deref())
        .unwrap_or_default();
    format!(
        "compref:{}:{}:{}",
        project_key,
        metadata.branch().unwrap_or_default(),
        index_len
    )
}

fn stats_json(stats: &ResolutionStats) -> serde_json::Value {
    serde_json::json!({
        "resolved": stats.resolved,
        "reused": stats.reused,
        "minted": stats.minted,
        "unreachable": stats.unreachable,
    })
}
