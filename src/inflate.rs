//! Section compression and bounded, chunked decompression
//!
//! Every section of an archive is an independent zlib stream. Reading one
//! back pulls a known number of compressed bytes from the source in
//! fixed-size chunks and lets the inflater write straight into an output
//! buffer sized from the declared original length.

use crate::error::{Result, SZipError};
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::{self, Read, Write};

/// Default number of compressed bytes pulled from the source per step
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Most output one compressed byte can expand to. Deflate tops out near
/// 1032:1; the slack covers zlib framing and the final block.
const MAX_EXPANSION: usize = 1032;
const EXPANSION_SLACK: usize = 64;

/// Compress a whole buffer into a single zlib stream
pub fn deflate(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 2 + 16),
        Compression::new(level),
    );
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress exactly `compressed_size` bytes from `source` into a buffer of
/// exactly `original_size` bytes.
///
/// The source is consumed in `chunk_size` pieces. Fails with
/// [`SZipError::CorruptData`] if the source is short, the stream is
/// malformed, or the stream's real length disagrees with either size. A
/// declared original size that `compressed_size` bytes could never inflate
/// to is rejected before anything is allocated.
pub fn inflate_chunked<R: Read>(
    source: &mut R,
    compressed_size: usize,
    original_size: usize,
    chunk_size: usize,
) -> Result<Vec<u8>> {
    let ceiling = compressed_size
        .saturating_mul(MAX_EXPANSION)
        .saturating_add(EXPANSION_SLACK);
    if original_size > ceiling {
        return Err(SZipError::corrupt(format!(
            "declared size of {} bytes cannot come from {} compressed bytes",
            original_size, compressed_size
        )));
    }

    let chunk_size = chunk_size.max(1);
    let mut chunk = vec![0u8; chunk_size.min(compressed_size.max(1))];

    // One spare byte so an oversized stream shows up as overrun instead of
    // stalling on a full buffer
    let mut output = vec![0u8; original_size + 1];

    let mut inflater = Decompress::new(true);
    let mut remaining = compressed_size;
    let mut finished = false;

    while remaining > 0 {
        let n = remaining.min(chunk.len());
        source.read_exact(&mut chunk[..n]).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                SZipError::corrupt(format!(
                    "compressed stream truncated: {} of {} bytes available",
                    compressed_size - remaining,
                    compressed_size
                ))
            } else {
                SZipError::Io(e)
            }
        })?;
        remaining -= n;

        if finished {
            return Err(SZipError::corrupt(format!(
                "{} bytes left over after end of compressed stream",
                n + remaining
            )));
        }

        let mut input = &chunk[..n];
        loop {
            let in_before = inflater.total_in();
            let out_before = inflater.total_out() as usize;

            let status = inflater
                .decompress(input, &mut output[out_before..], FlushDecompress::None)
                .map_err(|e| SZipError::corrupt(format!("invalid compressed stream: {}", e)))?;

            let consumed = (inflater.total_in() - in_before) as usize;
            let produced = inflater.total_out() as usize - out_before;
            input = &input[consumed..];

            if inflater.total_out() as usize > original_size {
                return Err(SZipError::corrupt(format!(
                    "stream inflates past declared size of {} bytes",
                    original_size
                )));
            }

            if status == Status::StreamEnd {
                finished = true;
                if !input.is_empty() {
                    return Err(SZipError::corrupt(format!(
                        "{} bytes left over after end of compressed stream",
                        input.len() + remaining
                    )));
                }
                break;
            }

            if input.is_empty() {
                break;
            }
            if consumed == 0 && produced == 0 {
                return Err(SZipError::corrupt("compressed stream stalled"));
            }
        }
    }

    if !finished {
        return Err(SZipError::corrupt(format!(
            "compressed stream of {} bytes does not terminate",
            compressed_size
        )));
    }

    let produced = inflater.total_out() as usize;
    if produced != original_size {
        return Err(SZipError::corrupt(format!(
            "stream inflated to {} bytes, expected {}",
            produced, original_size
        )));
    }

    output.truncate(original_size);
    Ok(output)
}
