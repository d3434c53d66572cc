//! Per-entry compression, optionally spread over a rayon pool
//!
//! Each entry's block, sizes and hash depend only on its own bytes, so the
//! parallel path yields exactly the same archive as the sequential one.
//! Results are collected in insertion order.

use crate::encoder::{PackedEntry, PendingEntry};
use crate::error::Result;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Compress every pending entry, preserving order
#[cfg(feature = "parallel")]
pub(crate) fn pack_entries(entries: &[PendingEntry], level: u32) -> Result<Vec<PackedEntry>> {
    entries.par_iter().map(|e| e.pack(level)).collect()
}

/// Compress every pending entry, preserving order
#[cfg(not(feature = "parallel"))]
pub(crate) fn pack_entries(entries: &[PendingEntry], level: u32) -> Result<Vec<PackedEntry>> {
    entries.iter().map(|e| e.pack(level)).collect()
}
