//! Archive encoder
//!
//! Collects named buffers, then compresses each one independently and lays
//! out header, entry table, name blob and payload blocks in a single pass.

use crate::error::{Result, SZipError};
use crate::format::{size_field, EntryRecord, Header};
use crate::hash::fnv_hash;
use crate::inflate::deflate;
use log::{debug, trace};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Largest entry count the 16-bit signed header field can carry
pub const MAX_ENTRIES: usize = i16::MAX as usize;

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// zlib compression level, 0-9 (default: 6)
    pub compression_level: u32,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

impl EncoderOptions {
    /// Fastest settings, for throwaway archives
    pub fn fast() -> Self {
        Self {
            compression_level: 1,
        }
    }

    /// Smallest output
    pub fn best() -> Self {
        Self {
            compression_level: 9,
        }
    }

    /// Set compression level, clamped to 9
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}

/// A named buffer waiting to be packed
#[derive(Debug)]
pub(crate) struct PendingEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// One entry after compression
pub(crate) struct PackedEntry {
    pub record: EntryRecord,
    pub block: Vec<u8>,
}

impl PendingEntry {
    pub(crate) fn pack(&self, level: u32) -> Result<PackedEntry> {
        let block = deflate(&self.data, level)?;
        let record = EntryRecord {
            name_len: size_field(self.name.len(), "entry name")?,
            original_size: size_field(self.data.len(), "entry payload")?,
            compressed_size: size_field(block.len(), "compressed payload")?,
            compressed_hash: fnv_hash(&block),
        };

        trace!(
            "packed {:?}: {} -> {} bytes",
            self.name,
            self.data.len(),
            block.len()
        );
        Ok(PackedEntry { record, block })
    }
}

/// Builds an SZIP archive from named byte buffers
///
/// # Example
/// ```
/// use szip::{SZipDecoder, SZipEncoder};
///
/// let mut encoder = SZipEncoder::new();
/// encoder.add_entry("a.txt", b"hello".to_vec());
/// encoder.add_entry("b.txt", b"world!!".to_vec());
/// let archive = encoder.build()?;
///
/// let decoder = SZipDecoder::open(archive)?;
/// assert_eq!(decoder.decompress(1)?, b"world!!");
/// # Ok::<(), szip::SZipError>(())
/// ```
#[derive(Debug, Default)]
pub struct SZipEncoder {
    entries: Vec<PendingEntry>,
    options: EncoderOptions,
}

impl SZipEncoder {
    /// Create an encoder with default compression level (6)
    pub fn new() -> Self {
        Self::with_options(EncoderOptions::default())
    }

    /// Create an encoder with custom compression level (0-9)
    pub fn with_compression(compression_level: u32) -> Self {
        Self::with_options(EncoderOptions::default().with_compression_level(compression_level))
    }

    pub fn with_options(options: EncoderOptions) -> Self {
        Self {
            entries: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Queue a named buffer. Names need not be unique.
    pub fn add_entry(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(PendingEntry {
            name: name.into(),
            data: data.into(),
        });
        self
    }

    /// Read a file and queue its contents under `name`
    pub fn add_file<P: AsRef<Path>>(&mut self, name: impl Into<String>, path: P) -> Result<&mut Self> {
        let data = fs::read(path)?;
        Ok(self.add_entry(name, data))
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of a queued entry
    pub fn name_at(&self, index: usize) -> Result<&str> {
        self.entries
            .get(index)
            .map(|e| e.name.as_str())
            .ok_or(SZipError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Build the archive and drain the queue
    ///
    /// On failure the queue is left untouched.
    pub fn build(&mut self) -> Result<Vec<u8>> {
        self.build_into(Vec::new())
    }

    /// Build the archive straight into a new file
    pub fn build_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let output = BufWriter::new(File::create(path)?);
        self.build_into(output)?;
        Ok(())
    }

    /// Build the archive into an arbitrary writer and return the writer
    pub fn build_into<W: Write>(&mut self, mut output: W) -> Result<W> {
        if self.entries.len() > MAX_ENTRIES {
            return Err(SZipError::TooManyEntries {
                count: self.entries.len(),
            });
        }

        let entries = &self.entries;
        let level = self.options.compression_level;

        let packed = crate::parallel::pack_entries(entries, level)?;

        // Name blob: all names back to back, no separators
        let names: Vec<u8> = entries
            .iter()
            .flat_map(|e| e.name.as_bytes().iter().copied())
            .collect();
        let name_table = deflate(&names, level)?;

        let mut records = Vec::with_capacity(packed.len() * EntryRecord::SIZE);
        for entry in &packed {
            records.extend_from_slice(&entry.record.to_bytes());
        }
        let entry_table = deflate(&records, level)?;

        let header = Header::new(
            entries.len() as i16,
            fnv_hash(&name_table),
            fnv_hash(&entry_table),
            size_field(entry_table.len(), "entry table")?,
            size_field(names.len(), "name table")?,
            size_field(name_table.len(), "compressed name table")?,
        );

        output.write_all(&header.to_bytes())?;
        output.write_all(&entry_table)?;
        output.write_all(&name_table)?;
        let mut payload_total = 0usize;
        for entry in &packed {
            output.write_all(&entry.block)?;
            payload_total += entry.block.len();
        }
        output.flush()?;

        debug!(
            "built archive: {} entries, {} bytes (tables {} + {}, payload {})",
            entries.len(),
            Header::SIZE + entry_table.len() + name_table.len() + payload_total,
            entry_table.len(),
            name_table.len(),
            payload_total
        );

        self.entries.clear();
        Ok(output)
    }
}
