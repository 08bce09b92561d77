//! Hash table and block table structures
//!
//! Both tables are stored encrypted as arrays of 16-byte records. The hash
//! table is an open-addressed map from name hashes to block indices; the
//! block table describes where each file lives and how it is stored.

use crate::crypto::{self, HashType};
use crate::error::{MpqError, MpqResult};
use std::io::{Read, Seek, SeekFrom};

/// Hash table slot that has never been used
pub const HASH_ENTRY_EMPTY: u32 = 0xFFFF_FFFF;

/// Hash table slot whose file was deleted
pub const HASH_ENTRY_DELETED: u32 = 0xFFFF_FFFE;

/// Neutral locale (language independent files)
pub const LOCALE_NEUTRAL: u16 = 0;

/// Flags of a block table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockFlags(pub u32);

impl BlockFlags {
    /// File is compressed with PKWARE Data Compression Library
    pub const IMPLODE: u32 = 0x0000_0100;
    /// File is compressed with one or more methods (first byte of each sector)
    pub const COMPRESS: u32 = 0x0000_0200;
    /// File is encrypted
    pub const ENCRYPTED: u32 = 0x0001_0000;
    /// Encryption key is adjusted by block offset and file size
    pub const FIX_KEY: u32 = 0x0002_0000;
    /// File is an incremental patch for a file in a base archive
    pub const PATCH_FILE: u32 = 0x0010_0000;
    /// File is stored as a single unit instead of sectors
    pub const SINGLE_UNIT: u32 = 0x0100_0000;
    /// File is a deletion marker
    pub const DELETE_MARKER: u32 = 0x0200_0000;
    /// Sectors are followed by a checksum table
    pub const SECTOR_CRC: u32 = 0x0400_0000;
    /// File exists
    pub const EXISTS: u32 = 0x8000_0000;

    /// Check whether a flag bit is set
    pub const fn contains(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    /// Whether the file is stored with any kind of compression
    pub const fn is_compressed(self) -> bool {
        self.contains(Self::COMPRESS) || self.contains(Self::IMPLODE)
    }
}

/// One hash table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEntry {
    /// `NameA` hash of the file name
    pub name_a: u32,
    /// `NameB` hash of the file name
    pub name_b: u32,
    /// Locale of the file
    pub locale: u16,
    /// Platform of the file (always 0 in practice)
    pub platform: u16,
    /// Index into the block table, or one of the empty/deleted markers
    pub block_index: u32,
}

impl HashEntry {
    /// An unused slot
    pub const EMPTY: Self = Self {
        name_a: HASH_ENTRY_EMPTY,
        name_b: HASH_ENTRY_EMPTY,
        locale: 0xFFFF,
        platform: 0xFFFF,
        block_index: HASH_ENTRY_EMPTY,
    };

    /// Whether the slot has never held a file (terminates probing)
    pub const fn is_empty(&self) -> bool {
        self.block_index == HASH_ENTRY_EMPTY
    }

    /// Whether the slot held a file that was deleted (probing continues)
    pub const fn is_deleted(&self) -> bool {
        self.block_index == HASH_ENTRY_DELETED
    }

    fn from_words(words: &[u32]) -> Self {
        Self {
            name_a: words[0],
            name_b: words[1],
            locale: (words[2] & 0xFFFF) as u16,
            platform: (words[2] >> 16) as u16,
            block_index: words[3],
        }
    }

    fn to_words(self) -> [u32; 4] {
        [
            self.name_a,
            self.name_b,
            u32::from(self.locale) | (u32::from(self.platform) << 16),
            self.block_index,
        ]
    }
}

/// One block table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEntry {
    /// Offset of the file data relative to the archive header
    pub offset: u32,
    /// Stored (compressed) size in bytes
    pub compressed_size: u32,
    /// Uncompressed size in bytes
    pub file_size: u32,
    /// Storage flags
    pub flags: BlockFlags,
}

impl BlockEntry {
    fn from_words(words: &[u32]) -> Self {
        Self {
            offset: words[0],
            compressed_size: words[1],
            file_size: words[2],
            flags: BlockFlags(words[3]),
        }
    }

    fn to_words(self) -> [u32; 4] {
        [self.offset, self.compressed_size, self.file_size, self.flags.0]
    }
}

/// Decrypted hash table
#[derive(Debug, Clone, Default)]
pub struct HashTable {
    entries: Vec<HashEntry>,
}

impl HashTable {
    /// Create a table of `size` empty slots
    pub fn with_size(size: usize) -> Self {
        Self {
            entries: vec![HashEntry::EMPTY; size],
        }
    }

    /// Read and decrypt `count` slots at `offset`
    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64, count: u32) -> MpqResult<Self> {
        let words = read_encrypted_words(reader, offset, count, crypto::HASH_TABLE_KEY)?;
        let entries = words.chunks_exact(4).map(HashEntry::from_words).collect();
        Ok(Self { entries })
    }

    /// All slots, in table order
    pub fn entries(&self) -> &[HashEntry] {
        &self.entries
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no slots
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a file name.
    ///
    /// Probing starts at the slot selected by the `TableOffset` hash and
    /// stops at the first never-used slot. When several locales of the file
    /// exist the neutral one is preferred, otherwise the first match wins.
    pub fn find(&self, name: &str) -> Option<&HashEntry> {
        if self.entries.is_empty() {
            return None;
        }

        let len = self.entries.len();
        let start = hash_string_index(name, len);
        let name_a = crypto::hash_string(name, HashType::NameA);
        let name_b = crypto::hash_string(name, HashType::NameB);
        let mut first_match = None;

        for step in 0..len {
            let entry = &self.entries[(start + step) % len];
            if entry.is_empty() {
                break;
            }
            if entry.is_deleted() {
                continue;
            }
            if entry.name_a == name_a && entry.name_b == name_b {
                if entry.locale == LOCALE_NEUTRAL {
                    return Some(entry);
                }
                first_match.get_or_insert(entry);
            }
        }

        first_match
    }

    /// Insert a file name pointing at `block_index`, replacing an existing
    /// slot for the same name and locale
    pub fn insert(&mut self, name: &str, block_index: u32) -> MpqResult<()> {
        let len = self.entries.len();
        if len == 0 {
            return Err(MpqError::InvalidInput("hash table has no slots".to_string()));
        }

        let start = hash_string_index(name, len);
        let name_a = crypto::hash_string(name, HashType::NameA);
        let name_b = crypto::hash_string(name, HashType::NameB);

        for step in 0..len {
            let slot = &mut self.entries[(start + step) % len];
            let same_name = slot.name_a == name_a
                && slot.name_b == name_b
                && slot.locale == LOCALE_NEUTRAL
                && !slot.is_empty()
                && !slot.is_deleted();

            if slot.is_empty() || slot.is_deleted() || same_name {
                *slot = HashEntry {
                    name_a,
                    name_b,
                    locale: LOCALE_NEUTRAL,
                    platform: 0,
                    block_index,
                };
                return Ok(());
            }
        }

        Err(MpqError::InvalidInput(format!(
            "hash table is full ({len} slots)"
        )))
    }

    /// Serialize and encrypt the table
    pub fn to_encrypted_bytes(&self) -> Vec<u8> {
        let mut words: Vec<u32> = self.entries.iter().flat_map(|e| e.to_words()).collect();
        crypto::encrypt_block(&mut words, crypto::HASH_TABLE_KEY);
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

/// Decrypted block table
#[derive(Debug, Clone, Default)]
pub struct BlockTable {
    entries: Vec<BlockEntry>,
}

impl BlockTable {
    /// Read and decrypt `count` entries at `offset`
    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64, count: u32) -> MpqResult<Self> {
        let words = read_encrypted_words(reader, offset, count, crypto::BLOCK_TABLE_KEY)?;
        let entries = words.chunks_exact(4).map(BlockEntry::from_words).collect();
        Ok(Self { entries })
    }

    /// Build a table from entries
    pub fn from_entries(entries: Vec<BlockEntry>) -> Self {
        Self { entries }
    }

    /// Entry at `index`
    pub fn get(&self, index: u32) -> MpqResult<&BlockEntry> {
        self.entries
            .get(index as usize)
            .ok_or(MpqError::BlockIndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// All entries
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize and encrypt the table
    pub fn to_encrypted_bytes(&self) -> Vec<u8> {
        let mut words: Vec<u32> = self.entries.iter().flat_map(|e| e.to_words()).collect();
        crypto::encrypt_block(&mut words, crypto::BLOCK_TABLE_KEY);
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

fn hash_string_index(name: &str, len: usize) -> usize {
    crypto::hash_string(name, HashType::TableOffset) as usize % len
}

fn read_encrypted_words<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    count: u32,
    key: u32,
) -> MpqResult<Vec<u32>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut raw = vec![0u8; count as usize * 16];
    reader.read_exact(&mut raw)?;

    let mut words: Vec<u32> = raw
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    crypto::decrypt_block(&mut words, key);
    Ok(words)
}
