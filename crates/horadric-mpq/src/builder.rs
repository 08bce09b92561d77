//! MPQ archive builder
//!
//! Writes version 0 archives (the layout Diablo II uses): header, file data,
//! encrypted hash table, encrypted block table.

use crate::compression::{Compression, compress_sector};
use crate::crypto;
use crate::error::{MpqError, MpqResult};
use crate::header::{HEADER_SIZE_V0, MpqHeader};
use crate::listfile::{self, LISTFILE_NAME};
use crate::table::{BlockEntry, BlockFlags, BlockTable, HashTable};
use binrw::BinWrite;
use std::io::Cursor;
use std::path::Path;

/// Sector size shift used by Diablo II archives (4096-byte sectors)
pub const DEFAULT_SECTOR_SIZE_SHIFT: u16 = 3;

/// Smallest hash table the builder emits
const MIN_HASH_TABLE_SIZE: usize = 16;

/// How a single file is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileOptions {
    /// Compression applied per sector
    pub compression: Compression,
    /// Encrypt the stored data
    pub encrypted: bool,
    /// Adjust the encryption key by block offset and file size
    pub fix_key: bool,
    /// Store as one unit instead of sectors
    pub single_unit: bool,
}

impl FileOptions {
    /// zlib-compressed sectors
    pub fn compressed() -> Self {
        Self {
            compression: Compression::Zlib,
            ..Self::default()
        }
    }

    /// Bare PKWARE DCL sectors under the `IMPLODE` flag, the way Diablo II
    /// stores most files
    pub fn imploded() -> Self {
        Self {
            compression: Compression::Implode,
            ..Self::default()
        }
    }

    /// PKWARE DCL sectors behind a method byte
    pub fn pkware() -> Self {
        Self {
            compression: Compression::Pkware,
            ..Self::default()
        }
    }

    /// Enable encryption, optionally with the fix-key adjustment
    #[must_use]
    pub const fn encrypted(mut self, fix_key: bool) -> Self {
        self.encrypted = true;
        self.fix_key = fix_key;
        self
    }

    /// Store the file as a single unit
    #[must_use]
    pub const fn single_unit(mut self) -> Self {
        self.single_unit = true;
        self
    }
}

#[derive(Debug, Clone)]
struct PendingFile {
    name: String,
    data: Vec<u8>,
    options: FileOptions,
}

/// Builder for MPQ archives
///
/// ```
/// use horadric_mpq::{Archive, ArchiveBuilder, FileOptions};
/// use std::io::Cursor;
///
/// let mut builder = ArchiveBuilder::new();
/// builder.add_file("data\\global\\ui\\a.dc6", b"sprite".to_vec());
/// builder.add_file_with("data\\global\\excel\\levels.txt", b"Name".to_vec(), FileOptions::compressed());
///
/// let bytes = builder.build()?;
/// let mut archive = Archive::from_reader(Cursor::new(bytes))?;
/// assert_eq!(archive.read_file("data\\global\\ui\\a.dc6")?, b"sprite");
/// # Ok::<(), horadric_mpq::MpqError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    sector_size_shift: u16,
    include_listfile: bool,
    listfile_options: FileOptions,
    files: Vec<PendingFile>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    /// Create a builder with 4096-byte sectors and an automatic listfile
    pub fn new() -> Self {
        Self {
            sector_size_shift: DEFAULT_SECTOR_SIZE_SHIFT,
            include_listfile: true,
            listfile_options: FileOptions::default(),
            files: Vec::new(),
        }
    }

    /// Use `512 << shift` byte sectors
    #[must_use]
    pub fn with_sector_size_shift(mut self, shift: u16) -> Self {
        self.sector_size_shift = shift;
        self
    }

    /// Do not generate a `(listfile)` entry
    #[must_use]
    pub fn without_listfile(mut self) -> Self {
        self.include_listfile = false;
        self
    }

    /// Store the generated `(listfile)` with `options`
    #[must_use]
    pub fn with_listfile_options(mut self, options: FileOptions) -> Self {
        self.listfile_options = options;
        self
    }

    /// Add a file stored uncompressed and unencrypted
    pub fn add_file(&mut self, name: impl Into<String>, data: Vec<u8>) -> &mut Self {
        self.add_file_with(name, data, FileOptions::default())
    }

    /// Add a file with explicit storage options.
    ///
    /// Adding a name that is already present (compared the way the hash
    /// table compares names) replaces the earlier file.
    pub fn add_file_with(
        &mut self,
        name: impl Into<String>,
        data: Vec<u8>,
        options: FileOptions,
    ) -> &mut Self {
        let name = name.into();
        let key = comparable_name(&name);
        self.files.retain(|f| comparable_name(&f.name) != key);
        self.files.push(PendingFile {
            name,
            data,
            options,
        });
        self
    }

    /// Number of files added so far
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Build the archive into memory
    pub fn build(&self) -> MpqResult<Vec<u8>> {
        let header_size = HEADER_SIZE_V0;
        let sector_size = 0x200u32 << self.sector_size_shift;

        let has_custom_listfile = self
            .files
            .iter()
            .any(|f| comparable_name(&f.name) == comparable_name(LISTFILE_NAME));
        let generated_listfile = (self.include_listfile && !has_custom_listfile)
            .then(|| listfile::render(self.files.iter().map(|f| f.name.as_str())));

        let mut entries: Vec<(&str, &[u8], FileOptions)> = self
            .files
            .iter()
            .map(|f| (f.name.as_str(), f.data.as_slice(), f.options))
            .collect();
        if let Some(data) = &generated_listfile {
            entries.push((LISTFILE_NAME, data.as_slice(), self.listfile_options));
        }

        let mut out = vec![0u8; header_size as usize];
        let mut blocks = Vec::with_capacity(entries.len());

        for (name, data, options) in &entries {
            let offset = to_u32(out.len(), "archive size")?;
            let file_size = to_u32(data.len(), "file size")?;
            let (stored, flags) = encode_file(name, data, *options, offset, sector_size)?;

            blocks.push(BlockEntry {
                offset,
                compressed_size: to_u32(stored.len(), "stored file size")?,
                file_size,
                flags,
            });
            out.extend_from_slice(&stored);
        }

        let hash_size = (entries.len() * 2)
            .next_power_of_two()
            .max(MIN_HASH_TABLE_SIZE);
        let mut hash_table = HashTable::with_size(hash_size);
        for (index, (name, _, _)) in entries.iter().enumerate() {
            hash_table.insert(name, to_u32(index, "block index")?)?;
        }

        let hash_table_offset = to_u32(out.len(), "archive size")?;
        out.extend(hash_table.to_encrypted_bytes());

        let block_table_offset = to_u32(out.len(), "archive size")?;
        let block_count = blocks.len();
        out.extend(BlockTable::from_entries(blocks).to_encrypted_bytes());

        let header = MpqHeader {
            header_size,
            archive_size: to_u32(out.len(), "archive size")?,
            format_version: 0,
            sector_size_shift: self.sector_size_shift,
            hash_table_offset,
            block_table_offset,
            hash_table_entries: to_u32(hash_size, "hash table size")?,
            block_table_entries: to_u32(block_count, "block table size")?,
        };

        let mut cursor = Cursor::new(&mut out[..header_size as usize]);
        header.write(&mut cursor)?;

        Ok(out)
    }

    /// Build the archive and write it to `path`
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> MpqResult<()> {
        std::fs::write(path, self.build()?)?;
        Ok(())
    }
}

fn comparable_name(name: &str) -> String {
    name.replace('/', "\\").to_ascii_uppercase()
}

fn to_u32(value: usize, what: &str) -> MpqResult<u32> {
    u32::try_from(value).map_err(|_| MpqError::InvalidInput(format!("{what} exceeds 4 GiB")))
}

fn encode_file(
    name: &str,
    data: &[u8],
    options: FileOptions,
    offset: u32,
    sector_size: u32,
) -> MpqResult<(Vec<u8>, BlockFlags)> {
    let mut flags = BlockFlags::EXISTS;
    match options.compression {
        Compression::None => {}
        Compression::Zlib | Compression::Pkware => flags |= BlockFlags::COMPRESS,
        Compression::Implode => flags |= BlockFlags::IMPLODE,
    }

    let key = if options.encrypted {
        flags |= BlockFlags::ENCRYPTED;
        if options.fix_key {
            flags |= BlockFlags::FIX_KEY;
        }
        Some(crypto::file_key(
            name,
            offset,
            to_u32(data.len(), "file size")?,
            options.fix_key,
        ))
    } else {
        None
    };

    if options.single_unit {
        flags |= BlockFlags::SINGLE_UNIT;
        let mut stored = compress_sector(data, options.compression)?.unwrap_or_else(|| data.to_vec());
        if let Some(key) = key {
            crypto::encrypt_bytes(&mut stored, key);
        }
        return Ok((stored, BlockFlags(flags)));
    }

    let sectors: Vec<&[u8]> = data.chunks(sector_size as usize).collect();

    if options.compression == Compression::None {
        let mut stored = Vec::with_capacity(data.len());
        for (index, sector) in sectors.iter().enumerate() {
            let mut sector = sector.to_vec();
            if let Some(key) = key {
                crypto::encrypt_bytes(&mut sector, key.wrapping_add(index as u32));
            }
            stored.extend(sector);
        }
        return Ok((stored, BlockFlags(flags)));
    }

    let table_len = (sectors.len() + 1) * 4;
    let mut offsets = Vec::with_capacity(sectors.len() + 1);
    offsets.push(to_u32(table_len, "sector table")?);

    let mut body = Vec::new();
    for (index, sector) in sectors.iter().enumerate() {
        let mut stored =
            compress_sector(sector, options.compression)?.unwrap_or_else(|| sector.to_vec());
        if let Some(key) = key {
            crypto::encrypt_bytes(&mut stored, key.wrapping_add(index as u32));
        }
        body.extend(stored);
        offsets.push(to_u32(table_len + body.len(), "sector offset")?);
    }

    if let Some(key) = key {
        crypto::encrypt_block(&mut offsets, key.wrapping_sub(1));
    }

    let mut stored: Vec<u8> = offsets.iter().flat_map(|o| o.to_le_bytes()).collect();
    stored.extend(body);
    Ok((stored, BlockFlags(flags)))
}
