//! Sector compression
//!
//! Compressed sectors start with a byte listing the methods that were
//! applied. zlib, PKWARE DCL and IMA ADPCM are decoded; Huffman, bzip2,
//! sparse and LZMA are reported as unsupported so callers can skip the file
//! instead of returning garbage.

use crate::error::{MpqError, MpqResult};
use crate::{adpcm, pkware};
use flate2::Compression as ZlibLevel;
use flate2::read::{ZlibDecoder, ZlibEncoder};
use std::io::Read;

/// Huffman (used for WAVE files)
pub const COMPRESSION_HUFFMAN: u8 = 0x01;
/// zlib / deflate
pub const COMPRESSION_ZLIB: u8 = 0x02;
/// PKWARE Data Compression Library
pub const COMPRESSION_PKWARE: u8 = 0x08;
/// bzip2
pub const COMPRESSION_BZIP2: u8 = 0x10;
/// Sparse
pub const COMPRESSION_SPARSE: u8 = 0x20;
/// IMA ADPCM mono
pub const COMPRESSION_ADPCM_MONO: u8 = 0x40;
/// IMA ADPCM stereo
pub const COMPRESSION_ADPCM_STEREO: u8 = 0x80;
/// LZMA (not combinable with other methods)
pub const COMPRESSION_LZMA: u8 = 0x12;

/// Methods the decoder handles
const SUPPORTED_METHODS: u8 =
    COMPRESSION_ZLIB | COMPRESSION_PKWARE | COMPRESSION_ADPCM_MONO | COMPRESSION_ADPCM_STEREO;

/// Compression applied by the archive builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Store data as-is
    #[default]
    None,
    /// zlib with the default level
    Zlib,
    /// PKWARE DCL behind a method byte (`COMPRESS` block flag)
    Pkware,
    /// Bare PKWARE DCL stream (`IMPLODE` block flag), as in Diablo II archives
    Implode,
}

/// Decompress one sector.
///
/// `data` includes the leading method byte. The output must have exactly
/// `expected_len` bytes.
pub fn decompress_sector(data: &[u8], expected_len: usize) -> MpqResult<Vec<u8>> {
    let Some((&mask, payload)) = data.split_first() else {
        return Err(MpqError::CorruptData("empty compressed sector".to_string()));
    };

    if mask == 0 || mask == COMPRESSION_LZMA || mask & !SUPPORTED_METHODS != 0 {
        return Err(MpqError::UnsupportedCompression(describe_methods(mask)));
    }

    // Undo the methods in reverse order of application
    let mut output = payload.to_vec();
    if mask & COMPRESSION_ZLIB != 0 {
        output = inflate(&output, expected_len)?;
    }
    if mask & COMPRESSION_PKWARE != 0 {
        output = pkware::explode(&output)?;
    }
    if mask & COMPRESSION_ADPCM_STEREO != 0 {
        output = adpcm::decompress(&output, 2)?;
    }
    if mask & COMPRESSION_ADPCM_MONO != 0 {
        output = adpcm::decompress(&output, 1)?;
    }

    check_length(output, expected_len)
}

/// Decompress data stored under the `IMPLODE` block flag (no method byte)
pub fn explode_sector(data: &[u8], expected_len: usize) -> MpqResult<Vec<u8>> {
    check_length(pkware::explode(data)?, expected_len)
}

fn check_length(output: Vec<u8>, expected_len: usize) -> MpqResult<Vec<u8>> {
    if output.len() != expected_len {
        return Err(MpqError::CorruptData(format!(
            "sector decompressed to {} bytes, expected {}",
            output.len(),
            expected_len
        )));
    }
    Ok(output)
}

/// Compress one sector for storage.
///
/// Returns `None` when compression does not make the sector smaller, in
/// which case it must be stored raw (readers detect this by size).
pub fn compress_sector(data: &[u8], compression: Compression) -> MpqResult<Option<Vec<u8>>> {
    let compressed = match compression {
        Compression::None => return Ok(None),
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(data, ZlibLevel::default());
            let mut compressed = vec![COMPRESSION_ZLIB];
            encoder
                .read_to_end(&mut compressed)
                .map_err(|e| MpqError::Compression(format!("zlib compression failed: {e}")))?;
            compressed
        }
        Compression::Pkware => {
            let mut compressed = vec![COMPRESSION_PKWARE];
            compressed.extend(pkware::implode(data));
            compressed
        }
        Compression::Implode => pkware::implode(data),
    };

    Ok((compressed.len() < data.len()).then_some(compressed))
}

fn inflate(payload: &[u8], expected_len: usize) -> MpqResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(payload).take(expected_len as u64 + 1);
    let mut output = Vec::with_capacity(expected_len);
    decoder
        .read_to_end(&mut output)
        .map_err(|e| MpqError::Compression(format!("zlib decompression failed: {e}")))?;
    Ok(output)
}

/// Human readable list of the methods in a compression mask
pub fn describe_methods(mask: u8) -> String {
    if mask == COMPRESSION_LZMA {
        return "LZMA (0x12)".to_string();
    }

    let names = [
        (COMPRESSION_HUFFMAN, "Huffman"),
        (COMPRESSION_ZLIB, "zlib"),
        (COMPRESSION_PKWARE, "PKWARE"),
        (COMPRESSION_BZIP2, "bzip2"),
        (COMPRESSION_SPARSE, "sparse"),
        (COMPRESSION_ADPCM_MONO, "ADPCM mono"),
        (COMPRESSION_ADPCM_STEREO, "ADPCM stereo"),
    ];

    let parts: Vec<&str> = names
        .iter()
        .filter(|(bit, _)| mask & bit != 0)
        .map(|(_, name)| *name)
        .collect();

    if parts.is_empty() {
        format!("unknown (0x{mask:02X})")
    } else {
        format!("{} (0x{mask:02X})", parts.join(" + "))
    }
}
