//! # Binary Report Format
//!
//! Format: Header (5 bytes) + postcard-serialized report payload.
//! - 4 bytes: Magic ("CREP")
//! - 1 byte: Version
//!
//! The payload is a [`SerializableReport`]. Decoding validates size, magic
//! and version before touching the payload, then rebuilds the report through
//! the validating builder so duplicate or zero refs are rejected.

use crate::primitives::{self, HEADER_SIZE};
use crate::report::{ComponentReport, SerializableReport};
use crate::ComprefError;

/// Maximum accepted size of an encoded report.
///
/// Checked before deserialization to bound memory use on corrupted input.
pub const MAX_REPORT_PAYLOAD_SIZE: usize = 256 * 1024 * 1024; // 256 MB

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header preceding every encoded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl ReportHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), ComprefError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(ComprefError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(ComprefError::SerializationError(format!(
                "Unsupported report version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ComprefError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ComprefError::SerializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for ReportHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode a report to bytes (header + payload).
pub fn report_to_bytes(report: &ComponentReport) -> Result<Vec<u8>, ComprefError> {
    let header = ReportHeader::new();
    let payload = postcard::to_stdvec(&SerializableReport::from(report))
        .map_err(|e| ComprefError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Decode a report from bytes.
///
/// # Errors
/// - `SerializationError` for truncated, oversized or foreign data
/// - `MalformedReport` if the decoded nodes fail builder validation
pub fn report_from_bytes(bytes: &[u8]) -> Result<ComponentReport, ComprefError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ComprefError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }
    if bytes.len() > MAX_REPORT_PAYLOAD_SIZE {
        return Err(ComprefError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_REPORT_PAYLOAD_SIZE
        )));
    }

    ReportHeader::from_bytes(bytes)?.validate()?;

    let serializable: SerializableReport =
        postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
            ComprefError::SerializationError(format!("Failed to decode report payload: {}", e))
        })?;

    ComponentReport::try_from(serializable)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportSource;
    use crate::{ComponentRef, RawComponentNode, ReportMetadata};

    fn sample_report() -> ComponentReport {
        ComponentReport::from_components(
            ReportMetadata::new(1).with_branch("origin/master"),
            [
                RawComponentNode::project(1, "PROJECT_KEY").with_children([2]),
                RawComponentNode::module(2, "MODULE_KEY").with_children([3]),
                RawComponentNode::directory(3, "src/main/java/dir").with_children([4]),
                RawComponentNode::file(4, "src/main/java/dir/Foo.java"),
            ],
        )
        .expect("build report")
    }

    #[test]
    fn header_fields() {
        let bytes = ReportHeader::new().to_bytes();
        let restored = ReportHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn decoded_report_matches_encoded() {
        let report = sample_report();
        let bytes = report_to_bytes(&report).expect("encode");
        assert_eq!(&bytes[0..4], b"CREP");

        let restored = report_from_bytes(&bytes).expect("decode");
        assert_eq!(restored.metadata().branch(), Some("origin/master"));
        assert_eq!(
            restored
                .component(ComponentRef(3))
                .map(|n| n.child_refs.clone()),
            Some(vec![ComponentRef(4)])
        );
        assert_eq!(restored, report);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = report_to_bytes(&sample_report()).expect("encode");
        bytes[0..4].copy_from_slice(b"XXXX");

        let result = report_from_bytes(&bytes);
        assert!(matches!(result, Err(ComprefError::SerializationError(_))));
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = report_to_bytes(&sample_report()).expect("encode");
        bytes[4] = primitives::FORMAT_VERSION + 1;

        assert!(report_from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_data_rejected() {
        assert!(report_from_bytes(b"CRE").is_err());

        let bytes = report_to_bytes(&sample_report()).expect("encode");
        assert!(report_from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn duplicate_refs_in_payload_rejected() {
        let flat = SerializableReport {
            metadata: ReportMetadata::new(1),
            components: vec![
                RawComponentNode::project(1, "A"),
                RawComponentNode::project(1, "B"),
            ],
        };
        let mut bytes = ReportHeader::new().to_bytes().to_vec();
        bytes.extend(postcard::to_stdvec(&flat).expect("encode payload"));

        let result = report_from_bytes(&bytes);
        assert!(matches!(result, Err(ComprefError::MalformedReport(_))));
    }
}
