//! Error types for szip

use std::io;
use thiserror::Error;

/// Result type for szip operations
pub type Result<T> = std::result::Result<T, SZipError>;

/// Archive section an integrity hash belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Compressed entry-record table
    EntryTable,
    /// Compressed name blob
    NameTable,
    /// One entry's compressed payload block
    Payload(usize),
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::EntryTable => write!(f, "entry table"),
            Section::NameTable => write!(f, "name table"),
            Section::Payload(index) => write!(f, "payload {}", index),
        }
    }
}

/// Error types that can occur while building or reading an archive
#[derive(Debug, Error)]
pub enum SZipError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Entry count does not fit the 16-bit signed header field
    #[error("too many entries: {count} (at most {})", i16::MAX)]
    TooManyEntries { count: usize },

    /// A buffer is too large for its signed 32-bit size field
    #[error("size overflow: {0}")]
    SizeOverflow(String),

    /// Declared sizes disagree with the available bytes, or a compressed stream is malformed
    #[error("corrupt archive data: {0}")]
    CorruptData(String),

    /// No entry carries the requested name
    #[error("entry not found: {0}")]
    NotFound(String),

    /// Entry index outside `0..len`
    #[error("entry index {index} out of range (entry count {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Header magic is not `SZIP`
    #[error("invalid archive format: {0}")]
    InvalidFormat(String),

    /// Header version is newer than this library understands
    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u16),

    /// Stored integrity hash does not match the bytes on record
    #[error("hash mismatch in {section}: stored 0x{expected:08x}, computed 0x{actual:08x}")]
    HashMismatch {
        section: Section,
        expected: u32,
        actual: u32,
    },
}

impl SZipError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        SZipError::CorruptData(msg.into())
    }
}
