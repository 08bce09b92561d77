//! Read-only access to an MPQ archive

use crate::crypto;
use crate::error::{MpqError, MpqResult};
use crate::header::{MpqHeader, find_header};
use crate::listfile::{self, LISTFILE_NAME};
use crate::stream::FileStream;
use crate::table::{BlockEntry, BlockFlags, BlockTable, HashTable};
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

/// An opened MPQ archive.
///
/// The archive keeps its decrypted hash and block tables in memory and reads
/// file data on demand. Dropping the archive closes the underlying file.
#[derive(Debug)]
pub struct Archive<R> {
    reader: R,
    path: Option<PathBuf>,
    archive_offset: u64,
    header: MpqHeader,
    hash_table: HashTable,
    block_table: BlockTable,
}

impl Archive<BufReader<File>> {
    /// Open an archive from disk.
    ///
    /// If no file exists at `path` with that exact case, the parent
    /// directory is searched for a case-insensitive match.
    pub fn open(path: impl AsRef<Path>) -> MpqResult<Self> {
        let path = resolve_case_insensitive(path.as_ref());
        let file = File::open(&path)?;
        let mut archive = Self::from_reader(BufReader::new(file))?;
        archive.path = Some(path);
        Ok(archive)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Parse an archive from any seekable reader
    pub fn from_reader(mut reader: R) -> MpqResult<Self> {
        let (archive_offset, header) = find_header(&mut reader)?;

        let hash_table = HashTable::read(
            &mut reader,
            archive_offset + u64::from(header.hash_table_offset),
            header.hash_table_entries,
        )?;
        let block_table = BlockTable::read(
            &mut reader,
            archive_offset + u64::from(header.block_table_offset),
            header.block_table_entries,
        )?;

        Ok(Self {
            reader,
            path: None,
            archive_offset,
            header,
            hash_table,
            block_table,
        })
    }

    /// Path the archive was opened from, if it came from disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Archive header
    pub fn header(&self) -> &MpqHeader {
        &self.header
    }

    /// Absolute offset of the archive header in the file
    pub fn archive_offset(&self) -> u64 {
        self.archive_offset
    }

    /// Decrypted hash table
    pub fn hash_table(&self) -> &HashTable {
        &self.hash_table
    }

    /// Decrypted block table
    pub fn block_table(&self) -> &BlockTable {
        &self.block_table
    }

    /// Number of existing files in the block table
    pub fn file_count(&self) -> usize {
        self.block_table
            .entries()
            .iter()
            .filter(|b| b.flags.contains(BlockFlags::EXISTS))
            .count()
    }

    /// Check whether the archive has an entry for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.hash_table.find(name).is_some()
    }

    /// Block table entry for `name`
    pub fn find_block(&self, name: &str) -> MpqResult<&BlockEntry> {
        let entry = self
            .hash_table
            .find(name)
            .ok_or_else(|| MpqError::FileNotFound(name.to_string()))?;
        self.block_table.get(entry.block_index)
    }

    /// Open a streaming reader over the file `name`
    pub fn open_file(&mut self, name: &str) -> MpqResult<FileStream<'_, R>> {
        let block = *self.find_block(name)?;

        let key = block.flags.contains(BlockFlags::ENCRYPTED).then(|| {
            crypto::file_key(
                name,
                block.offset,
                block.file_size,
                block.flags.contains(BlockFlags::FIX_KEY),
            )
        });

        FileStream::new(
            &mut self.reader,
            self.archive_offset,
            block,
            self.header.sector_size(),
            key,
        )
    }

    /// Read the whole file `name` into memory
    pub fn read_file(&mut self, name: &str) -> MpqResult<Vec<u8>> {
        let mut stream = self.open_file(name)?;
        let mut data = Vec::with_capacity(stream.len() as usize);
        stream.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Names listed in the archive's `(listfile)`
    pub fn list_files(&mut self) -> MpqResult<Vec<String>> {
        let data = self.read_file(LISTFILE_NAME)?;
        Ok(listfile::parse(&data))
    }

    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Find `path`, or a case-insensitive match of its file name in the same
/// directory. Returns `path` unchanged when nothing matches.
pub fn resolve_case_insensitive(path: &Path) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }

    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let wanted = name.to_string_lossy().to_lowercase();

    fs::read_dir(parent)
        .ok()
        .and_then(|entries| {
            entries
                .filter_map(Result::ok)
                .find(|entry| entry.file_name().to_string_lossy().to_lowercase() == wanted)
                .map(|entry| entry.path())
        })
        .unwrap_or_else(|| path.to_path_buf())
}
