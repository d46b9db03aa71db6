//! # Primitives
//!
//! Fixed constants of the resolution core. They are compiled into the binary
//! and immutable at runtime.

/// Separator between a module key and a branch, and between a module key and
/// a module-relative path.
pub const KEY_SEPARATOR: char = ':';

/// Magic bytes for the binary report format header.
pub const MAGIC_BYTES: &[u8; 4] = b"CREP";

/// Current binary report format version.
///
/// Increment this when making breaking changes to the report payload.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the binary report header (magic + version).
pub const HEADER_SIZE: usize = 5;

/// How many times a freshly minted identifier may be discarded because it is
/// already in use before resolution gives up.
pub const MAX_MINT_ATTEMPTS: usize = 8;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of components in one report.
pub const MAX_REPORT_COMPONENTS: usize = 5_000_000;

/// Maximum length of a computed component key.
///
/// Keys longer than this are rejected as malformed input.
pub const MAX_KEY_LENGTH: usize = 4000;
