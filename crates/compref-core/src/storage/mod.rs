//! # Storage
//!
//! Disk-backed persisted-component index.

mod redb_index;

pub use redb_index::RedbIndex;
