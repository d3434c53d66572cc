//! # szip: compact multi-file archive container
//!
//! `szip` bundles many small buffers into one archive with a fixed 28-byte
//! header, a zlib-compressed entry table, a zlib-compressed name blob and one
//! independently compressed payload block per entry. Any entry can be
//! decompressed on its own without touching the rest of the archive.
//!
//! ## Layout
//!
//! ```text
//! Header (28B) | entry table | name blob | payload 0 | payload 1 | ... | payload N-1
//! ```
//!
//! No offsets are stored. Names and payload blocks are located by walking the
//! 16-byte entry records in order; the decoder precomputes payload offsets
//! once when the archive is opened.
//!
//! ## Quick Start
//!
//! ### Building an archive
//!
//! ```
//! use szip::SZipEncoder;
//!
//! let mut encoder = SZipEncoder::new();
//! encoder.add_entry("a.txt", "hello");
//! encoder.add_entry("b.txt", "world!!");
//!
//! let archive = encoder.build()?;
//! # Ok::<(), szip::SZipError>(())
//! ```
//!
//! ### Reading entries back
//!
//! ```
//! use szip::{SZipDecoder, SZipEncoder};
//!
//! # let mut encoder = SZipEncoder::new();
//! # encoder.add_entry("a.txt", "hello");
//! # encoder.add_entry("b.txt", "world!!");
//! # let archive = encoder.build()?;
//! let decoder = SZipDecoder::open(archive)?;
//!
//! for (name, record) in decoder.entries() {
//!     println!("{}: {} bytes", name, record.original_size);
//! }
//!
//! assert!(decoder.contains("a.txt"));
//! assert_eq!(decoder.decompress_by_name("b.txt")?, b"world!!");
//! # Ok::<(), szip::SZipError>(())
//! ```
//!
//! ### Integrity checks
//!
//! Every compressed section carries a 32-bit FNV hash. Hashes are not checked
//! unless asked for:
//!
//! ```
//! use szip::{DecoderOptions, SZipDecoder, SZipEncoder};
//!
//! # let mut encoder = SZipEncoder::new();
//! # encoder.add_entry("a.txt", "hello");
//! # let archive = encoder.build()?;
//! let decoder = SZipDecoder::open_with_options(archive, DecoderOptions::strict())?;
//! decoder.verify_all()?;
//! # Ok::<(), szip::SZipError>(())
//! ```

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod hash;
pub mod inflate;

mod parallel;

#[cfg(feature = "async")]
mod async_reader;

#[cfg(feature = "async")]
mod async_writer;

pub use decoder::{DecoderOptions, SZipDecoder};
pub use encoder::{EncoderOptions, SZipEncoder, MAX_ENTRIES};
pub use error::{Result, SZipError, Section};
pub use format::{EntryRecord, Header};
pub use hash::{fnv_hash, FnvHasher};
