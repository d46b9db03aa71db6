//! # Report Input
//!
//! Reading analysis reports from disk. JSON is the interchange format
//! produced by scanners; binary (`CREP`) reports come from `compref encode`.

use compref_core::primitives::MAGIC_BYTES;
use compref_core::{ComponentReport, ComprefError, SerializableReport, report_from_bytes};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum report file size (100 MB).
///
/// Checked before the file is read.
pub const MAX_REPORT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
pub fn validate_file_size(path: &Path, max_size: u64) -> Result<(), ComprefError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ComprefError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(ComprefError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
pub fn validate_file_path(path: &Path) -> Result<PathBuf, ComprefError> {
    let canonical = path.canonicalize().map_err(|e| {
        ComprefError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(ComprefError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent directory of an output path.
pub fn validate_output_path(path: &Path) -> Result<PathBuf, ComprefError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        ComprefError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(ComprefError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| ComprefError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// REPORT FORMATS
// =============================================================================

/// On-disk report encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Binary,
}

impl ReportFormat {
    /// Parse a `-t` argument.
    pub fn parse(value: &str) -> Result<Self, ComprefError> {
        match value {
            "json" => Ok(Self::Json),
            "binary" | "bin" => Ok(Self::Binary),
            other => Err(ComprefError::ConfigError(format!(
                "Unknown report format: {}. Use: json, binary",
                other
            ))),
        }
    }

    /// Guess the encoding from the leading bytes.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(MAGIC_BYTES) {
            Self::Binary
        } else {
            Self::Json
        }
    }
}

/// Parse a JSON report and validate its components.
pub fn parse_json_report(bytes: &[u8]) -> Result<ComponentReport, ComprefError> {
    let serializable: SerializableReport = serde_json::from_slice(bytes)
        .map_err(|e| ComprefError::MalformedReport(format!("Invalid JSON report: {}", e)))?;
    ComponentReport::try_from(serializable)
}

/// Decode report bytes in the given format.
pub fn parse_report(bytes: &[u8], format: ReportFormat) -> Result<ComponentReport, ComprefError> {
    match format {
        ReportFormat::Json => parse_json_report(bytes),
        ReportFormat::Binary => report_from_bytes(bytes),
    }
}

/// Read a report file, detecting its format unless one is given.
pub fn read_report(
    path: &Path,
    format: Option<ReportFormat>,
) -> Result<ComponentReport, ComprefError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_REPORT_FILE_SIZE)?;

    let bytes = std::fs::read(&validated)
        .map_err(|e| ComprefError::IoError(format!("Read file: {}", e)))?;
    let format = format.unwrap_or_else(|| ReportFormat::detect(&bytes));

    tracing::debug!(path = %validated.display(), ?format, bytes = bytes.len(), "reading report");
    parse_report(&bytes, format)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use compref_core::{RawComponentNode, ReportMetadata, report_to_bytes};

    #[test]
    fn detect_binary_by_magic() {
        let report = ComponentReport::from_components(
            ReportMetadata::new(1),
            [RawComponentNode::project(1, "P")],
        )
        .expect("build");
        let bytes = report_to_bytes(&report).expect("encode");

        assert_eq!(ReportFormat::detect(&bytes), ReportFormat::Binary);
        assert_eq!(ReportFormat::detect(b"{\"metadata\":{}}"), ReportFormat::Json);
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(matches!(
            ReportFormat::parse("xml"),
            Err(ComprefError::ConfigError(_))
        ));
        assert_eq!(ReportFormat::parse("bin").expect("parse"), ReportFormat::Binary);
    }

    #[test]
    fn output_path_without_parent_uses_cwd() {
        let validated = validate_output_path(Path::new("report.bin")).expect("validate");
        assert!(validated.ends_with("report.bin"));
        assert!(validated.is_absolute());
    }
}
