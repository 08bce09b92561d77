//! Streaming reader for a single archived file

use crate::compression::{decompress_sector, explode_sector};
use crate::crypto;
use crate::error::{MpqError, MpqResult};
use crate::table::{BlockEntry, BlockFlags};
use std::io::{self, Read, Seek, SeekFrom};

/// Reader over the uncompressed content of one file in an archive.
///
/// Each call to [`Read::read`] returns data from at most one sector, so
/// callers must keep reading until `Ok(0)`.
pub struct FileStream<'a, R> {
    reader: &'a mut R,
    /// Absolute offset of the file data in the underlying reader
    data_offset: u64,
    block: BlockEntry,
    sector_size: u32,
    key: Option<u32>,
    sector_offsets: Option<Vec<u32>>,
    position: u64,
    buffer: Vec<u8>,
    buffered_sector: Option<u32>,
}

impl<'a, R: Read + Seek> FileStream<'a, R> {
    /// Open a stream over a block.
    ///
    /// `archive_offset` is the absolute position of the archive header and
    /// `key` the file key, required when the block is encrypted.
    pub fn new(
        reader: &'a mut R,
        archive_offset: u64,
        block: BlockEntry,
        sector_size: u32,
        key: Option<u32>,
    ) -> MpqResult<Self> {
        let flags = block.flags;

        if flags.contains(BlockFlags::PATCH_FILE) {
            return Err(MpqError::Unsupported("patch files".to_string()));
        }
        if flags.contains(BlockFlags::DELETE_MARKER) || !flags.contains(BlockFlags::EXISTS) {
            return Err(MpqError::CorruptData(
                "block is a deletion marker or does not exist".to_string(),
            ));
        }
        if flags.contains(BlockFlags::ENCRYPTED) && key.is_none() {
            return Err(MpqError::CorruptData(
                "encrypted block opened without a key".to_string(),
            ));
        }
        if sector_size == 0 {
            return Err(MpqError::InvalidHeader("sector size is zero".to_string()));
        }

        let mut stream = Self {
            reader,
            data_offset: archive_offset + u64::from(block.offset),
            block,
            sector_size,
            key: key.filter(|_| flags.contains(BlockFlags::ENCRYPTED)),
            sector_offsets: None,
            position: 0,
            buffer: Vec::new(),
            buffered_sector: None,
        };

        if flags.is_compressed() && !flags.contains(BlockFlags::SINGLE_UNIT) {
            stream.sector_offsets = Some(stream.load_sector_offsets()?);
        }

        Ok(stream)
    }

    /// Uncompressed size of the file
    pub fn len(&self) -> u64 {
        u64::from(self.block.file_size)
    }

    /// Whether the file is empty
    pub fn is_empty(&self) -> bool {
        self.block.file_size == 0
    }

    /// Block table entry the stream reads from
    pub fn block(&self) -> &BlockEntry {
        &self.block
    }

    fn sector_count(&self) -> u32 {
        self.block.file_size.div_ceil(self.sector_size)
    }

    fn load_sector_offsets(&mut self) -> MpqResult<Vec<u32>> {
        let mut count = self.sector_count() as usize + 1;
        if self.block.flags.contains(BlockFlags::SECTOR_CRC) {
            count += 1;
        }

        self.reader.seek(SeekFrom::Start(self.data_offset))?;
        let mut raw = vec![0u8; count * 4];
        self.reader.read_exact(&mut raw)?;

        let mut offsets: Vec<u32> = raw
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        if let Some(key) = self.key {
            crypto::decrypt_block(&mut offsets, key.wrapping_sub(1));
        }

        let table_size = (count * 4) as u32;
        if offsets[0] != table_size {
            return Err(MpqError::CorruptSectorTable(format!(
                "first offset {} does not match table size {}",
                offsets[0], table_size
            )));
        }
        if offsets.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(MpqError::CorruptSectorTable(
                "sector offsets are not ascending".to_string(),
            ));
        }
        let data_end = offsets[self.sector_count() as usize];
        if data_end > self.block.compressed_size {
            return Err(MpqError::CorruptSectorTable(format!(
                "sector data ends at {data_end}, past the stored size {}",
                self.block.compressed_size
            )));
        }

        Ok(offsets)
    }

    fn read_raw(&mut self, offset: u32, size: u32) -> MpqResult<Vec<u8>> {
        self.reader
            .seek(SeekFrom::Start(self.data_offset + u64::from(offset)))?;
        let mut data = vec![0u8; size as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    fn load_single_unit(&mut self) -> MpqResult<Vec<u8>> {
        let stored = self.block.compressed_size;
        let expected = self.block.file_size;
        let mut data = self.read_raw(0, stored)?;

        if let Some(key) = self.key {
            crypto::decrypt_bytes(&mut data, key);
        }

        if self.block.flags.contains(BlockFlags::IMPLODE) && stored < expected {
            return explode_sector(&data, expected as usize);
        }
        if self.block.flags.contains(BlockFlags::COMPRESS) && stored < expected {
            return decompress_sector(&data, expected as usize);
        }

        data.truncate(expected as usize);
        Ok(data)
    }

    fn load_sector(&mut self, index: u32) -> MpqResult<Vec<u8>> {
        let start = index * self.sector_size;
        let expected = (self.block.file_size - start).min(self.sector_size);

        let (offset, stored) = match &self.sector_offsets {
            Some(offsets) => {
                let begin = offsets[index as usize];
                (begin, offsets[index as usize + 1] - begin)
            }
            None => (start, expected),
        };

        let mut data = self.read_raw(offset, stored)?;

        if let Some(key) = self.key {
            crypto::decrypt_bytes(&mut data, key.wrapping_add(index));
        }

        if stored < expected {
            if self.block.flags.contains(BlockFlags::IMPLODE) {
                return explode_sector(&data, expected as usize);
            }
            if self.block.flags.contains(BlockFlags::COMPRESS) {
                return decompress_sector(&data, expected as usize);
            }
            return Err(MpqError::CorruptData(format!(
                "sector {index} holds {stored} bytes, expected {expected}"
            )));
        }

        Ok(data)
    }

    /// Make sure the buffer covers the current position and return the
    /// offset of the position inside the buffer
    fn fill_buffer(&mut self) -> MpqResult<usize> {
        if self.block.flags.contains(BlockFlags::SINGLE_UNIT) {
            if self.buffered_sector.is_none() {
                self.buffer = self.load_single_unit()?;
                self.buffered_sector = Some(0);
            }
            return Ok(self.position as usize);
        }

        let sector = (self.position / u64::from(self.sector_size)) as u32;
        if self.buffered_sector != Some(sector) {
            self.buffer = self.load_sector(sector)?;
            self.buffered_sector = Some(sector);
        }
        Ok((self.position % u64::from(self.sector_size)) as usize)
    }
}

impl<R: Read + Seek> Read for FileStream<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.position >= self.len() {
            return Ok(0);
        }

        let local = self.fill_buffer()?;
        let available = self.buffer.len().saturating_sub(local);
        let count = available.min(buf.len());
        buf[..count].copy_from_slice(&self.buffer[local..local + count]);
        self.position += count as u64;
        Ok(count)
    }
}
