//! Archive decoder
//!
//! Opening an archive parses the header and inflates the entry table and
//! name blob. Payload blocks stay compressed in the retained buffer until an
//! entry is asked for, so any single entry can be read without touching the
//! others.

use crate::error::{Result, SZipError, Section};
use crate::format::{non_negative, EntryRecord, Header};
use crate::hash::fnv_hash;
use crate::inflate::{inflate_chunked, DEFAULT_CHUNK_SIZE};
use flate2::read::ZlibDecoder;
use log::{debug, trace, warn};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Reject archives whose magic is not `SZIP` or whose version is newer
    /// than [`Header::VERSION`] (default: false, archives are parsed as-is)
    pub validate_header: bool,
    /// Check stored FNV hashes: table hashes on open, the payload hash on
    /// every decompress (default: false)
    pub verify_hashes: bool,
    /// Compressed bytes fed to the inflater per step (default: 4096)
    pub chunk_size: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::lenient()
    }
}

impl DecoderOptions {
    /// Validate the header and verify every hash
    pub fn strict() -> Self {
        Self {
            validate_header: true,
            verify_hashes: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Accept any header, verify nothing (the default)
    pub fn lenient() -> Self {
        Self {
            validate_header: false,
            verify_hashes: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_validate_header(mut self, validate: bool) -> Self {
        self.validate_header = validate;
        self
    }

    pub fn with_verify_hashes(mut self, verify: bool) -> Self {
        self.verify_hashes = verify;
        self
    }

    /// Set inflater chunk size (minimum 1)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Random-access reader over an in-memory SZIP archive
#[derive(Debug)]
pub struct SZipDecoder {
    data: Vec<u8>,
    header: Header,
    records: Vec<EntryRecord>,
    names: Vec<String>,
    /// Absolute start of each payload block
    offsets: Vec<usize>,
    payload_end: usize,
    options: DecoderOptions,
}

impl SZipDecoder {
    /// Open an archive held in memory with default options
    pub fn open(data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::open_with_options(data, DecoderOptions::default())
    }

    /// Read an archive file fully into memory and open it
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_file_with_options(path, DecoderOptions::default())
    }

    pub fn open_file_with_options<P: AsRef<Path>>(path: P, options: DecoderOptions) -> Result<Self> {
        Self::open_with_options(fs::read(path)?, options)
    }

    pub fn open_with_options(data: impl Into<Vec<u8>>, options: DecoderOptions) -> Result<Self> {
        let data = data.into();
        let header = Header::from_bytes(&data)?;

        if options.validate_header {
            header.validate()?;
        } else if header.validate().is_err() {
            warn!(
                "accepting archive with magic {:02x?} version {} unchecked",
                header.magic, header.version
            );
        }

        let count = usize::try_from(header.entry_count).map_err(|_| {
            SZipError::corrupt(format!("negative entry count: {}", header.entry_count))
        })?;
        let table_size = non_negative(header.entry_table_compressed_size, || {
            "entry table size".to_string()
        })?;
        let names_size = non_negative(header.name_table_compressed_size, || {
            "name table size".to_string()
        })?;
        let names_original = non_negative(header.name_table_original_size, || {
            "name table original size".to_string()
        })?;

        let payload_start = header.first_payload_offset();
        if payload_start > data.len() {
            return Err(SZipError::corrupt(format!(
                "tables end at byte {} but archive is {} bytes",
                payload_start,
                data.len()
            )));
        }

        let table_bytes = &data[header.entry_table_offset()..header.name_table_offset()];
        let name_bytes = &data[header.name_table_offset()..payload_start];

        if options.verify_hashes {
            check_hash(Section::EntryTable, header.entry_table_hash, table_bytes)?;
            check_hash(Section::NameTable, header.name_table_hash, name_bytes)?;
        }

        let table = inflate_chunked(
            &mut Cursor::new(table_bytes),
            table_size,
            count * EntryRecord::SIZE,
            options.chunk_size,
        )?;
        let records = table
            .chunks_exact(EntryRecord::SIZE)
            .map(EntryRecord::from_bytes)
            .collect::<Result<Vec<_>>>()?;

        let blob = inflate_chunked(
            &mut Cursor::new(name_bytes),
            names_size,
            names_original,
            options.chunk_size,
        )?;
        let names = split_names(&blob, &records)?;

        let mut offsets = Vec::with_capacity(count);
        let mut cursor = payload_start;
        for (index, record) in records.iter().enumerate() {
            record.original_size_checked(index)?;
            let size = record.compressed_size_checked(index)?;
            offsets.push(cursor);
            cursor += size;
            if cursor > data.len() {
                return Err(SZipError::corrupt(format!(
                    "payload {} ends at byte {} but archive is {} bytes",
                    index,
                    cursor,
                    data.len()
                )));
            }
        }
        let payload_end = cursor;

        if payload_end < data.len() {
            warn!(
                "{} trailing bytes after last payload block",
                data.len() - payload_end
            );
        }
        debug!(
            "opened archive: {} entries, {} bytes, payload at {}..{}",
            count,
            data.len(),
            payload_start,
            payload_end
        );

        Ok(Self {
            data,
            header,
            records,
            names,
            offsets,
            payload_end,
            options,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Number of entries in the archive
    pub fn entry_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entry record at `index`
    pub fn metadata(&self, index: usize) -> Result<&EntryRecord> {
        self.records.get(index).ok_or(SZipError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// Entry record of the first entry named `name`
    pub fn metadata_by_name(&self, name: &str) -> Result<&EntryRecord> {
        let index = self.require_index(name)?;
        Ok(&self.records[index])
    }

    /// Name of the entry at `index`
    pub fn name_at(&self, index: usize) -> Result<&str> {
        self.check_index(index)?;
        Ok(&self.names[index])
    }

    /// Position of the first entry named `name` (linear scan)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// All entries in archive order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &EntryRecord)> + '_ {
        self.names.iter().map(String::as_str).zip(self.records.iter())
    }

    /// Absolute byte offset of an entry's payload block
    pub fn payload_offset(&self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        Ok(self.offsets[index])
    }

    /// Bytes after the last payload block
    pub fn trailing_bytes(&self) -> usize {
        self.data.len() - self.payload_end
    }

    /// The retained archive buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Decompress the entry at `index` into a fresh buffer
    pub fn decompress(&self, index: usize) -> Result<Vec<u8>> {
        let record = *self.metadata(index)?;
        if self.options.verify_hashes {
            self.verify(index)?;
        }

        let offset = self.offsets[index];
        let compressed = record.compressed_size_checked(index)?;
        let original = record.original_size_checked(index)?;
        trace!(
            "decompressing entry {} ({} -> {} bytes at {})",
            index,
            compressed,
            original,
            offset
        );

        let mut source = Cursor::new(self.data.as_slice());
        source.set_position(offset as u64);
        inflate_chunked(&mut source, compressed, original, self.options.chunk_size)
    }

    /// Decompress the first entry named `name`
    pub fn decompress_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let index = self.require_index(name)?;
        self.decompress(index)
    }

    /// Reader that inflates an entry on the fly
    ///
    /// Sizes are not enforced here; use [`SZipDecoder::decompress`] when the
    /// output must match the recorded original size exactly.
    pub fn decompress_streaming(&self, index: usize) -> Result<Box<dyn Read + '_>> {
        let block = self.block(index)?;
        Ok(Box::new(ZlibDecoder::new(block)))
    }

    pub fn decompress_streaming_by_name(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        let index = self.require_index(name)?;
        self.decompress_streaming(index)
    }

    /// Check one payload block against its stored hash
    pub fn verify(&self, index: usize) -> Result<()> {
        let expected = self.metadata(index)?.compressed_hash;
        check_hash(Section::Payload(index), expected, self.block(index)?)
    }

    /// Check both table hashes
    pub fn verify_tables(&self) -> Result<()> {
        let header = &self.header;
        check_hash(
            Section::EntryTable,
            header.entry_table_hash,
            &self.data[header.entry_table_offset()..header.name_table_offset()],
        )?;
        check_hash(
            Section::NameTable,
            header.name_table_hash,
            &self.data[header.name_table_offset()..header.first_payload_offset()],
        )
    }

    /// Check every stored hash in the archive
    pub fn verify_all(&self) -> Result<()> {
        self.verify_tables()?;
        (0..self.entry_count()).try_for_each(|index| self.verify(index))
    }

    /// Compressed payload block of an entry
    fn block(&self, index: usize) -> Result<&[u8]> {
        let record = self.metadata(index)?;
        let start = self.offsets[index];
        let len = record.compressed_size_checked(index)?;
        Ok(&self.data[start..start + len])
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(SZipError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }

    fn require_index(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| SZipError::NotFound(name.to_string()))
    }
}

/// Slice the name blob by each record's name length, in order
fn split_names(blob: &[u8], records: &[EntryRecord]) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(records.len());
    let mut pos = 0usize;

    for (index, record) in records.iter().enumerate() {
        let len = record.name_len_checked(index)?;
        let end = pos + len;
        if end > blob.len() {
            return Err(SZipError::corrupt(format!(
                "name of entry {} runs past name table ({} > {})",
                index,
                end,
                blob.len()
            )));
        }
        names.push(String::from_utf8_lossy(&blob[pos..end]).into_owned());
        pos = end;
    }

    if pos != blob.len() {
        return Err(SZipError::corrupt(format!(
            "name table holds {} bytes but entries name {}",
            blob.len(),
            pos
        )));
    }

    Ok(names)
}

fn check_hash(section: Section, expected: u32, bytes: &[u8]) -> Result<()> {
    let actual = fnv_hash(bytes);
    if actual == expected {
        Ok(())
    } else {
        Err(SZipError::HashMismatch {
            section,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::SZipEncoder;

    fn two_entry_archive() -> Vec<u8> {
        let mut encoder = SZipEncoder::new();
        encoder.add_entry("a.txt", "hello");
        encoder.add_entry("b.txt", "world!!");
        encoder.build().unwrap()
    }

    #[test]
    fn offsets_are_prefix_sums() {
        let decoder = SZipDecoder::open(two_entry_archive()).unwrap();
        let first = decoder.header().first_payload_offset();
        assert_eq!(decoder.payload_offset(0).unwrap(), first);
        assert_eq!(
            decoder.payload_offset(1).unwrap(),
            first + decoder.metadata(0).unwrap().compressed_size as usize
        );
        assert_eq!(decoder.trailing_bytes(), 0);
    }

    #[test]
    fn split_names_walks_lengths() {
        let record = |n| EntryRecord {
            name_len: n,
            ..Default::default()
        };
        let names = split_names(b"abcdef", &[record(1), record(0), record(5)]).unwrap();
        assert_eq!(names, vec!["a", "", "bcdef"]);

        assert!(split_names(b"abc", &[record(4)]).is_err());
        assert!(split_names(b"abcd", &[record(2)]).is_err());
    }

    #[test]
    fn chunk_size_does_not_change_output() {
        let archive = two_entry_archive();
        let small =
            SZipDecoder::open_with_options(archive.clone(), DecoderOptions::default().with_chunk_size(1))
                .unwrap();
        let large = SZipDecoder::open(archive).unwrap();
        for i in 0..2 {
            assert_eq!(small.decompress(i).unwrap(), large.decompress(i).unwrap());
        }
    }

    #[test]
    fn streaming_matches_buffered() {
        let decoder = SZipDecoder::open(two_entry_archive()).unwrap();
        let mut out = Vec::new();
        decoder
            .decompress_streaming_by_name("b.txt")
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"world!!");
    }

    #[test]
    fn preset_options() {
        assert!(DecoderOptions::strict().verify_hashes);
        assert!(!DecoderOptions::lenient().validate_header);
        assert_eq!(DecoderOptions::default(), DecoderOptions::lenient());
        assert_eq!(DecoderOptions::default().chunk_size, 4096);
        assert_eq!(DecoderOptions::default().with_chunk_size(0).chunk_size, 1);
    }
}
