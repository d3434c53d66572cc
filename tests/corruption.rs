//! Damaged, foreign and hand-crafted archives

use szip::inflate::deflate;
use szip::{fnv_hash, DecoderOptions, EntryRecord, Header, SZipDecoder, SZipEncoder, SZipError, Section};

fn sample_archive() -> Vec<u8> {
    let mut encoder = SZipEncoder::new();
    encoder.add_entry("a.txt", "hello hello hello hello");
    encoder.add_entry("b.txt", "world!!".repeat(50));
    encoder.build().unwrap()
}

fn rewrite_header(archive: &mut [u8], edit: impl FnOnce(&mut Header)) {
    let mut header = Header::from_bytes(archive).unwrap();
    edit(&mut header);
    archive[..Header::SIZE].copy_from_slice(&header.to_bytes());
}

#[test]
fn bad_magic_accepted_by_default() {
    let mut archive = sample_archive();
    archive[0..4].copy_from_slice(b"ZZZZ");

    let decoder = SZipDecoder::open(archive.clone()).unwrap();
    assert_eq!(&decoder.header().magic, b"ZZZZ");
    assert_eq!(decoder.decompress(0).unwrap(), b"hello hello hello hello");

    let options = DecoderOptions::default().with_validate_header(true);
    let err = SZipDecoder::open_with_options(archive.clone(), options).unwrap_err();
    assert!(matches!(err, SZipError::InvalidFormat(_)), "{:?}", err);

    let err = SZipDecoder::open_with_options(archive, DecoderOptions::strict()).unwrap_err();
    assert!(matches!(err, SZipError::InvalidFormat(_)), "{:?}", err);
}

#[test]
fn newer_version_rejected_when_validating() {
    let mut archive = sample_archive();
    rewrite_header(&mut archive, |h| h.version = 7);

    assert!(SZipDecoder::open(archive.clone()).is_ok());

    let options = DecoderOptions::default().with_validate_header(true);
    let err = SZipDecoder::open_with_options(archive, options).unwrap_err();
    assert!(matches!(err, SZipError::UnsupportedVersion(7)));
}

#[test]
fn too_short_for_header() {
    let err = SZipDecoder::open(b"SZIP\x01\x00".to_vec()).unwrap_err();
    assert!(matches!(err, SZipError::CorruptData(_)));
}

#[test]
fn table_sizes_past_end() {
    let mut archive = sample_archive();
    let len = archive.len() as i32;
    rewrite_header(&mut archive, |h| h.entry_table_compressed_size = len);

    let err = SZipDecoder::open(archive).unwrap_err();
    assert!(matches!(err, SZipError::CorruptData(_)), "{:?}", err);
}

#[test]
fn negative_sizes() {
    let mut archive = sample_archive();
    rewrite_header(&mut archive, |h| h.name_table_compressed_size = -4);
    assert!(matches!(
        SZipDecoder::open(archive).unwrap_err(),
        SZipError::CorruptData(_)
    ));

    let mut archive = sample_archive();
    rewrite_header(&mut archive, |h| h.entry_count = -1);
    assert!(matches!(
        SZipDecoder::open(archive).unwrap_err(),
        SZipError::CorruptData(_)
    ));
}

#[test]
fn entry_count_disagrees_with_table() {
    let mut archive = sample_archive();
    rewrite_header(&mut archive, |h| h.entry_count = 3);
    assert!(matches!(
        SZipDecoder::open(archive).unwrap_err(),
        SZipError::CorruptData(_)
    ));
}

#[test]
fn name_table_size_disagrees() {
    let mut archive = sample_archive();
    rewrite_header(&mut archive, |h| h.name_table_original_size += 1);
    assert!(matches!(
        SZipDecoder::open(archive).unwrap_err(),
        SZipError::CorruptData(_)
    ));
}

#[test]
fn truncated_payload() {
    let archive = sample_archive();
    let truncated = archive[..archive.len() - 3].to_vec();
    assert!(matches!(
        SZipDecoder::open(truncated).unwrap_err(),
        SZipError::CorruptData(_)
    ));
}

#[test]
fn trailing_bytes_are_tolerated() {
    let mut archive = sample_archive();
    archive.extend_from_slice(b"padding");

    let decoder = SZipDecoder::open(archive).unwrap();
    assert_eq!(decoder.trailing_bytes(), 7);
    assert_eq!(decoder.decompress(1).unwrap(), "world!!".repeat(50).as_bytes());
}

#[test]
fn flipped_payload_byte() {
    let mut archive = sample_archive();
    let clean = SZipDecoder::open(archive.clone()).unwrap();
    let start = clean.payload_offset(1).unwrap();
    let len = clean.metadata(1).unwrap().compressed_size as usize;
    archive[start + len / 2] ^= 0xff;

    // Without hash checks the inflater still rejects the damaged stream
    let decoder = SZipDecoder::open(archive.clone()).unwrap();
    assert!(decoder.decompress(1).is_err());
    assert_eq!(decoder.decompress(0).unwrap(), b"hello hello hello hello");

    let err = decoder.verify(1).unwrap_err();
    assert!(matches!(
        err,
        SZipError::HashMismatch {
            section: Section::Payload(1),
            ..
        }
    ));
    assert!(decoder.verify(0).is_ok());

    let strict = SZipDecoder::open_with_options(archive, DecoderOptions::strict()).unwrap();
    assert!(matches!(
        strict.decompress(1).unwrap_err(),
        SZipError::HashMismatch { .. }
    ));
    assert!(strict.verify_all().is_err());
}

#[test]
fn stored_hash_mismatch_on_tables() {
    let mut archive = sample_archive();
    rewrite_header(&mut archive, |h| h.entry_table_hash ^= 1);

    // Hashes are not checked unless asked for
    let decoder = SZipDecoder::open(archive.clone()).unwrap();
    assert!(matches!(
        decoder.verify_tables().unwrap_err(),
        SZipError::HashMismatch {
            section: Section::EntryTable,
            ..
        }
    ));

    let err = SZipDecoder::open_with_options(archive, DecoderOptions::strict()).unwrap_err();
    assert!(matches!(
        err,
        SZipError::HashMismatch {
            section: Section::EntryTable,
            ..
        }
    ));
}

#[test]
fn clean_archive_verifies() {
    let decoder = SZipDecoder::open_with_options(sample_archive(), DecoderOptions::strict()).unwrap();
    decoder.verify_all().unwrap();
    assert_eq!(decoder.decompress(0).unwrap(), b"hello hello hello hello");
}

/// Lay out a one-entry archive by hand around an arbitrary record
fn assemble(record: &EntryRecord, name: &[u8], payload: &[u8]) -> Vec<u8> {
    let table = deflate(&record.to_bytes(), 6).unwrap();
    let names = deflate(name, 6).unwrap();
    let header = Header::new(
        1,
        fnv_hash(&names),
        fnv_hash(&table),
        table.len() as i32,
        name.len() as i32,
        names.len() as i32,
    );

    let mut archive = header.to_bytes().to_vec();
    archive.extend_from_slice(&table);
    archive.extend_from_slice(&names);
    archive.extend_from_slice(payload);
    archive
}

fn abc_record(payload: &[u8]) -> EntryRecord {
    EntryRecord {
        name_len: 4,
        original_size: 3,
        compressed_size: payload.len() as i32,
        compressed_hash: fnv_hash(payload),
    }
}

#[test]
fn hand_built_archive() {
    let payload = deflate(b"abc", 6).unwrap();
    let record = abc_record(&payload);
    let archive = assemble(&record, b"file", &payload);

    let decoder = SZipDecoder::open_with_options(archive, DecoderOptions::strict()).unwrap();
    assert_eq!(decoder.name_at(0).unwrap(), "file");
    assert_eq!(decoder.metadata(0).unwrap(), &record);
    assert_eq!(decoder.decompress_by_name("file").unwrap(), b"abc");
}

#[test]
fn huge_declared_name_table_size() {
    let mut archive = sample_archive();
    rewrite_header(&mut archive, |h| h.name_table_original_size = i32::MAX);

    let err = SZipDecoder::open(archive).unwrap_err();
    assert!(matches!(err, SZipError::CorruptData(_)), "{:?}", err);
}

#[test]
fn huge_entry_original_size() {
    let payload = deflate(b"abc", 6).unwrap();
    let record = EntryRecord {
        original_size: i32::MAX,
        ..abc_record(&payload)
    };

    // Sizes are only checked against the stream when the entry is read
    let decoder = SZipDecoder::open(assemble(&record, b"file", &payload)).unwrap();
    let err = decoder.decompress(0).unwrap_err();
    assert!(matches!(err, SZipError::CorruptData(_)), "{:?}", err);
}

#[test]
fn huge_entry_compressed_size() {
    let payload = deflate(b"abc", 6).unwrap();
    let record = EntryRecord {
        compressed_size: i32::MAX,
        ..abc_record(&payload)
    };

    let err = SZipDecoder::open(assemble(&record, b"file", &payload)).unwrap_err();
    assert!(matches!(err, SZipError::CorruptData(_)), "{:?}", err);
}
