//! # Formats
//!
//! Byte-level report encodings. File I/O is the application's job.

mod report;

pub use report::*;
