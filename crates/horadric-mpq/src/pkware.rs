//! PKWARE Data Compression Library (DCL) streams
//!
//! Diablo II stores most of its files, `(listfile)` included, with DCL
//! "implode". Decoding goes through the `explode` crate. The encoder writes
//! binary-mode streams using a greedy longest-match search.
//!
//! Stream layout: literal mode byte, dictionary size byte (4, 5 or 6 bits
//! of distance below the distance code), then a bit stream read least
//! significant bit first. Huffman codes are stored with every bit inverted.

use crate::error::{MpqError, MpqResult};

/// Base match length of each length symbol
const LENGTH_BASE: [usize; 16] = [3, 2, 4, 5, 6, 7, 8, 9, 10, 12, 16, 24, 40, 72, 136, 264];

/// Extra bits following each length symbol
const LENGTH_EXTRA: [u32; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8];

/// Code lengths of the 16 length symbols as `(repeat - 1) << 4 | bits`
const LENGTH_CODE_RUNS: [u8; 6] = [0x02, 0x23, 0x24, 0x35, 0x26, 0x17];

/// Code lengths of the 64 distance symbols, same packing
const DISTANCE_CODE_RUNS: [u8; 7] = [0x02, 0x14, 0x35, 0xE6, 0xF7, 0x97, 0xF8];

/// Match length reserved as the end-of-stream marker
const END_OF_STREAM: usize = 519;

const MAX_MATCH: usize = END_OF_STREAM - 1;
const MIN_MATCH: usize = 3;

/// Literal mode byte for uncoded 8-bit literals
const BINARY_LITERALS: u8 = 0;

/// Decode a DCL stream
pub fn explode(data: &[u8]) -> MpqResult<Vec<u8>> {
    ::explode::explode(data)
        .map_err(|e| MpqError::Compression(format!("PKWARE decompression failed: {e:?}")))
}

/// Encode `data` as a binary-mode DCL stream
pub fn implode(data: &[u8]) -> Vec<u8> {
    let dict_bits = dictionary_bits(data.len());
    let max_distance = 64usize << dict_bits;
    let length_codes = canonical_codes(&LENGTH_CODE_RUNS);
    let distance_codes = canonical_codes(&DISTANCE_CODE_RUNS);

    let mut out = BitWriter::with_header(BINARY_LITERALS, dict_bits as u8);
    let mut pos = 0;

    while pos < data.len() {
        let (length, distance) = longest_match(data, pos, max_distance);

        if length >= MIN_MATCH {
            out.write_bits(1, 1);
            write_length(&mut out, &length_codes, length);

            let encoded = distance - 1;
            out.write_code(distance_codes[encoded >> dict_bits]);
            out.write_bits((encoded & ((1 << dict_bits) - 1)) as u32, dict_bits);
            pos += length;
        } else {
            out.write_bits(0, 1);
            out.write_bits(u32::from(data[pos]), 8);
            pos += 1;
        }
    }

    out.write_bits(1, 1);
    write_length(&mut out, &length_codes, END_OF_STREAM);
    out.finish()
}

/// Dictionary size StormLib picks for a buffer of `len` bytes
fn dictionary_bits(len: usize) -> u32 {
    if len < 0x600 {
        4
    } else if len < 0xC00 {
        5
    } else {
        6
    }
}

/// Expand packed code lengths and assign canonical codes in symbol order
fn canonical_codes(runs: &[u8]) -> Vec<(u32, u32)> {
    let lengths: Vec<u32> = runs
        .iter()
        .flat_map(|run| std::iter::repeat_n(u32::from(run & 0x0F), usize::from(run >> 4) + 1))
        .collect();

    let mut codes = vec![(0, 0); lengths.len()];
    let max_bits = lengths.iter().copied().max().unwrap_or(0);
    let mut code = 0u32;
    for bits in 1..=max_bits {
        for (symbol, _) in lengths.iter().enumerate().filter(|(_, l)| **l == bits) {
            codes[symbol] = (code, bits);
            code += 1;
        }
        code <<= 1;
    }
    codes
}

fn write_length(out: &mut BitWriter, codes: &[(u32, u32)], length: usize) {
    let symbol = (0..LENGTH_BASE.len())
        .find(|&s| length >= LENGTH_BASE[s] && length < LENGTH_BASE[s] + (1 << LENGTH_EXTRA[s]))
        .unwrap_or(LENGTH_BASE.len() - 1);

    out.write_code(codes[symbol]);
    out.write_bits((length - LENGTH_BASE[symbol]) as u32, LENGTH_EXTRA[symbol]);
}

/// Longest earlier occurrence of the bytes at `pos`, as `(length, distance)`
fn longest_match(data: &[u8], pos: usize, max_distance: usize) -> (usize, usize) {
    let max_len = (data.len() - pos).min(MAX_MATCH);
    let mut best = (0, 0);
    if max_len < MIN_MATCH {
        return best;
    }

    for distance in 1..=pos.min(max_distance) {
        let start = pos - distance;
        let len = (0..max_len)
            .take_while(|&i| data[start + i] == data[pos + i])
            .count();
        if len > best.0 {
            best = (len, distance);
            if len == max_len {
                break;
            }
        }
    }
    best
}

/// Collects bits least significant first
struct BitWriter {
    bytes: Vec<u8>,
    pending: u8,
    used: u32,
}

impl BitWriter {
    fn with_header(literal_mode: u8, dict_bits: u8) -> Self {
        Self {
            bytes: vec![literal_mode, dict_bits],
            pending: 0,
            used: 0,
        }
    }

    fn write_bits(&mut self, value: u32, count: u32) {
        for i in 0..count {
            self.pending |= (((value >> i) & 1) as u8) << self.used;
            self.used += 1;
            if self.used == 8 {
                self.bytes.push(self.pending);
                self.pending = 0;
                self.used = 0;
            }
        }
    }

    /// Huffman codes go out most significant bit first, inverted
    fn write_code(&mut self, (code, bits): (u32, u32)) {
        for i in (0..bits).rev() {
            self.write_bits(((code >> i) & 1) ^ 1, 1);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.used > 0 {
            self.bytes.push(self.pending);
        }
        self.bytes
    }
}
