//! MPQ hashing and encryption
//!
//! MPQ archives use a single 0x500-entry table of pseudo-random values for
//! both purposes. The same one-way hash locates files in the hash table
//! (three independent hash types over the upper-cased name) and derives
//! encryption keys for the hash table, block table and encrypted files.

/// Hash table key: `hash_string("(hash table)", HashType::FileKey)`
pub const HASH_TABLE_KEY: u32 = 0xC3AF_3770;

/// Block table key: `hash_string("(block table)", HashType::FileKey)`
pub const BLOCK_TABLE_KEY: u32 = 0xEC83_B3A3;

const CRYPT_TABLE_SIZE: usize = 0x500;

/// Crypt table, generated at compile time
static CRYPT_TABLE: [u32; CRYPT_TABLE_SIZE] = build_crypt_table();

const fn build_crypt_table() -> [u32; CRYPT_TABLE_SIZE] {
    let mut table = [0u32; CRYPT_TABLE_SIZE];
    let mut seed: u32 = 0x0010_0001;
    let mut index1 = 0;

    while index1 < 0x100 {
        let mut index2 = index1;
        let mut i = 0;
        while i < 5 {
            seed = (seed * 125 + 3) % 0x002A_AAAB;
            let high = (seed & 0xFFFF) << 0x10;
            seed = (seed * 125 + 3) % 0x002A_AAAB;
            let low = seed & 0xFFFF;
            table[index2] = high | low;
            index2 += 0x100;
            i += 1;
        }
        index1 += 1;
    }

    table
}

/// Which of the four hash functions to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum HashType {
    /// Starting slot in the hash table
    TableOffset = 0,
    /// First name check value
    NameA = 1,
    /// Second name check value
    NameB = 2,
    /// Encryption key derivation
    FileKey = 3,
}

/// Upper-case a path byte the way Storm does, treating `/` as `\`
#[inline]
const fn normalize_byte(byte: u8) -> u8 {
    if byte == b'/' {
        b'\\'
    } else {
        byte.to_ascii_uppercase()
    }
}

/// Hash a file name with one of the MPQ hash functions.
///
/// Hashing is case-insensitive and treats `/` and `\` as the same separator.
///
/// # Examples
///
/// ```
/// use horadric_mpq::crypto::{HashType, hash_string, HASH_TABLE_KEY};
///
/// assert_eq!(hash_string("(hash table)", HashType::FileKey), HASH_TABLE_KEY);
/// ```
pub fn hash_string(name: &str, hash_type: HashType) -> u32 {
    let mut seed1: u32 = 0x7FED_7FED;
    let mut seed2: u32 = 0xEEEE_EEEE;
    let offset = (hash_type as usize) << 8;

    for byte in name.bytes() {
        let ch = normalize_byte(byte);
        seed1 = CRYPT_TABLE[offset + ch as usize] ^ seed1.wrapping_add(seed2);
        seed2 = u32::from(ch)
            .wrapping_add(seed1)
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }

    seed1
}

#[inline]
fn next_key(key: u32) -> u32 {
    ((!key << 0x15).wrapping_add(0x1111_1111)) | (key >> 0x0B)
}

/// Decrypt a block of little-endian words in place
pub fn decrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed: u32 = 0xEEEE_EEEE;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(CRYPT_TABLE[0x400 + (key & 0xFF) as usize]);
        let plain = *value ^ key.wrapping_add(seed);
        key = next_key(key);
        seed = plain
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
        *value = plain;
    }
}

/// Encrypt a block of little-endian words in place
pub fn encrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed: u32 = 0xEEEE_EEEE;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(CRYPT_TABLE[0x400 + (key & 0xFF) as usize]);
        let plain = *value;
        *value = plain ^ key.wrapping_add(seed);
        key = next_key(key);
        seed = plain
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
    }
}

/// Decrypt a byte buffer in place.
///
/// Only whole 32-bit words are processed; up to three trailing bytes are
/// stored in the clear.
pub fn decrypt_bytes(data: &mut [u8], key: u32) {
    let mut words = bytes_to_words(data);
    decrypt_block(&mut words, key);
    words_to_bytes(&words, data);
}

/// Encrypt a byte buffer in place (whole words only, see [`decrypt_bytes`])
pub fn encrypt_bytes(data: &mut [u8], key: u32) {
    let mut words = bytes_to_words(data);
    encrypt_block(&mut words, key);
    words_to_bytes(&words, data);
}

fn bytes_to_words(data: &[u8]) -> Vec<u32> {
    data.chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn words_to_bytes(words: &[u32], data: &mut [u8]) {
    for (chunk, word) in data.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

/// Derive the encryption key of a stored file.
///
/// The key only depends on the file's base name (the part after the last
/// separator). Files flagged with `FIX_KEY` additionally mix in their block
/// offset and uncompressed size.
pub fn file_key(name: &str, block_offset: u32, file_size: u32, fix_key: bool) -> u32 {
    let base_name = name.rsplit(['\\', '/']).next().unwrap_or(name);
    let key = hash_string(base_name, HashType::FileKey);

    if fix_key {
        key.wrapping_add(block_offset) ^ file_size
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypt_table_known_values() {
        // First entries of the Storm crypt table
        assert_eq!(CRYPT_TABLE[0], 0x55C6_36E2);
        assert_eq!(CRYPT_TABLE[1], 0x02BE_0170);
    }

    #[test]
    fn test_table_keys() {
        assert_eq!(hash_string("(hash table)", HashType::FileKey), HASH_TABLE_KEY);
        assert_eq!(
            hash_string("(block table)", HashType::FileKey),
            BLOCK_TABLE_KEY
        );
    }

    #[test]
    fn test_hash_is_case_and_separator_insensitive() {
        let a = hash_string("data\\global\\ui\\Cursor.dc6", HashType::NameA);
        let b = hash_string("DATA/GLOBAL/UI/cursor.DC6", HashType::NameA);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_types_differ() {
        let name = "data\\global\\excel\\levels.txt";
        let offset = hash_string(name, HashType::TableOffset);
        let a = hash_string(name, HashType::NameA);
        let b = hash_string(name, HashType::NameB);
        assert_ne!(offset, a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_encrypt_then_decrypt_words() {
        let original = vec![0u32, 1, 0xDEAD_BEEF, 0xFFFF_FFFF, 42];
        let mut data = original.clone();

        encrypt_block(&mut data, HASH_TABLE_KEY);
        assert_ne!(data, original);

        decrypt_block(&mut data, HASH_TABLE_KEY);
        assert_eq!(data, original);
    }

    #[test]
    fn test_byte_encryption_leaves_tail_in_clear() {
        let original = b"abcdefgh\x01\x02".to_vec();
        let mut data = original.clone();

        encrypt_bytes(&mut data, 0x1234_5678);
        assert_ne!(&data[..8], &original[..8]);
        assert_eq!(&data[8..], &original[8..]);

        decrypt_bytes(&mut data, 0x1234_5678);
        assert_eq!(data, original);
    }

    #[test]
    fn test_file_key_uses_base_name() {
        let full = file_key("data\\global\\music\\intro.wav", 0, 0, false);
        let base = file_key("intro.wav", 0, 0, false);
        assert_eq!(full, base);
    }

    #[test]
    fn test_file_key_fix_key_adjustment() {
        let plain = file_key("x.txt", 0x200, 77, false);
        let fixed = file_key("x.txt", 0x200, 77, true);
        assert_eq!(fixed, plain.wrapping_add(0x200) ^ 77);
    }
}
