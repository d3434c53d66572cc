//! Pack every file in a directory, then read each entry back and compare
//!
//! Usage: cargo run --example pack_dir -- <dir> [output.szip]

use std::fs;
use std::path::PathBuf;
use szip::{fnv_hash, DecoderOptions, SZipDecoder, SZipEncoder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let dir = PathBuf::from(args.next().unwrap_or_else(|| "src".to_string()));
    let output = args.next().map(PathBuf::from);

    let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(format!("no files in {}", dir.display()).into());
    }
    println!("Packing {} files from {}", files.len(), dir.display());

    let mut encoder = SZipEncoder::new();
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        encoder.add_file(name, path)?;
    }
    let archive = encoder.build()?;

    let original_total: u64 = files
        .iter()
        .filter_map(|p| fs::metadata(p).ok())
        .map(|m| m.len())
        .sum();
    println!(
        "Archive: {} bytes ({} bytes before compression)",
        archive.len(),
        original_total
    );

    if let Some(path) = &output {
        fs::write(path, &archive)?;
        println!("Wrote {}", path.display());
    }

    let decoder = SZipDecoder::open_with_options(archive, DecoderOptions::strict())?;
    if decoder.entry_count() != files.len() {
        return Err("entry count does not match".into());
    }

    for (index, path) in files.iter().enumerate() {
        let original = fs::read(path)?;
        let record = decoder.metadata(index)?;
        if record.original_size as usize != original.len() {
            return Err(format!("original size mismatch: {}", path.display()).into());
        }

        let restored = decoder.decompress(index)?;
        if fnv_hash(&restored) != fnv_hash(&original) || restored != original {
            return Err(format!("content mismatch: {}", path.display()).into());
        }
        println!(
            "  ✓ {} ({} -> {} bytes)",
            decoder.name_at(index)?,
            record.original_size,
            record.compressed_size
        );
    }

    println!("All {} entries verified", decoder.entry_count());
    Ok(())
}
