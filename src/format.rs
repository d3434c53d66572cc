//! On-disk layout of an SZIP archive
//!
//! ```text
//! Header (28B) | entry table (zlib) | name blob (zlib) | payload 0 | payload 1 | ...
//! ```
//!
//! All integers are little-endian. Nothing stores where a name or payload
//! block starts: both are recovered by walking the entry records in order.

use crate::error::{Result, SZipError};

/// Fixed-size archive header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u16,
    /// Number of entries, at most `i16::MAX`
    pub entry_count: i16,
    /// Hash of the compressed name blob
    pub name_table_hash: u32,
    /// Hash of the compressed entry table
    pub entry_table_hash: u32,
    pub entry_table_compressed_size: i32,
    pub name_table_original_size: i32,
    pub name_table_compressed_size: i32,
}

impl Header {
    /// Serialized size in bytes
    pub const SIZE: usize = 28;

    /// Magic bytes at offset 0
    pub const MAGIC: [u8; 4] = *b"SZIP";

    /// Newest format version this library reads and the one it writes
    pub const VERSION: u16 = 1;

    /// Header for a freshly built archive
    pub fn new(
        entry_count: i16,
        name_table_hash: u32,
        entry_table_hash: u32,
        entry_table_compressed_size: i32,
        name_table_original_size: i32,
        name_table_compressed_size: i32,
    ) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            entry_count,
            name_table_hash,
            entry_table_hash,
            entry_table_compressed_size,
            name_table_original_size,
            name_table_compressed_size,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&self.entry_count.to_le_bytes());
        buf[8..12].copy_from_slice(&self.name_table_hash.to_le_bytes());
        buf[12..16].copy_from_slice(&self.entry_table_hash.to_le_bytes());
        buf[16..20].copy_from_slice(&self.entry_table_compressed_size.to_le_bytes());
        buf[20..24].copy_from_slice(&self.name_table_original_size.to_le_bytes());
        buf[24..28].copy_from_slice(&self.name_table_compressed_size.to_le_bytes());
        buf
    }

    /// Parse the fields in order. Only the length is checked here; magic and
    /// version are left to [`Header::validate`].
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(SZipError::corrupt(format!(
                "archive too short for header: {} bytes",
                buf.len()
            )));
        }

        Ok(Self {
            magic: [buf[0], buf[1], buf[2], buf[3]],
            version: u16::from_le_bytes([buf[4], buf[5]]),
            entry_count: i16::from_le_bytes([buf[6], buf[7]]),
            name_table_hash: read_u32(buf, 8),
            entry_table_hash: read_u32(buf, 12),
            entry_table_compressed_size: read_i32(buf, 16),
            name_table_original_size: read_i32(buf, 20),
            name_table_compressed_size: read_i32(buf, 24),
        })
    }

    /// Reject foreign or newer archives
    pub fn validate(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(SZipError::InvalidFormat(format!(
                "bad magic {:02x?}, expected \"SZIP\"",
                self.magic
            )));
        }
        if self.version > Self::VERSION {
            return Err(SZipError::UnsupportedVersion(self.version));
        }
        Ok(())
    }

    /// Offset of the compressed entry table
    pub fn entry_table_offset(&self) -> usize {
        Self::SIZE
    }

    /// Offset of the compressed name blob
    pub fn name_table_offset(&self) -> usize {
        Self::SIZE + self.entry_table_compressed_size.max(0) as usize
    }

    /// Offset of the first payload block
    pub fn first_payload_offset(&self) -> usize {
        self.name_table_offset() + self.name_table_compressed_size.max(0) as usize
    }
}

/// Fixed-size metadata for one packed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryRecord {
    /// UTF-8 byte length of the entry name
    pub name_len: i32,
    /// Payload size before compression
    pub original_size: i32,
    /// Payload block size
    pub compressed_size: i32,
    /// Hash of the compressed payload block
    pub compressed_hash: u32,
}

impl EntryRecord {
    /// Serialized size in bytes
    pub const SIZE: usize = 16;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.name_len.to_le_bytes());
        buf[4..8].copy_from_slice(&self.original_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.compressed_hash.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(SZipError::corrupt(format!(
                "entry record truncated: {} bytes",
                buf.len()
            )));
        }

        Ok(Self {
            name_len: read_i32(buf, 0),
            original_size: read_i32(buf, 4),
            compressed_size: read_i32(buf, 8),
            compressed_hash: read_u32(buf, 12),
        })
    }

    /// Name length as a byte count, rejecting negative values
    pub(crate) fn name_len_checked(&self, index: usize) -> Result<usize> {
        non_negative(self.name_len, || format!("entry {} name length", index))
    }

    pub(crate) fn original_size_checked(&self, index: usize) -> Result<usize> {
        non_negative(self.original_size, || format!("entry {} original size", index))
    }

    pub(crate) fn compressed_size_checked(&self, index: usize) -> Result<usize> {
        non_negative(self.compressed_size, || {
            format!("entry {} compressed size", index)
        })
    }
}

/// Convert a signed size field, rejecting negatives as corruption
pub(crate) fn non_negative(value: i32, what: impl FnOnce() -> String) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| SZipError::corrupt(format!("{} is negative: {}", what(), value)))
}

/// Convert a length to a signed 32-bit size field
pub(crate) fn size_field(len: usize, what: &str) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        SZipError::SizeOverflow(format!("{} of {} bytes exceeds {} bytes", what, len, i32::MAX))
    })
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_i32(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
