//! MPQ archive header and header search

use crate::error::{MpqError, MpqResult};
use binrw::{BinRead, BinWrite};
use std::io::{Read, Seek, SeekFrom};

/// Archive header magic (`MPQ\x1A`)
pub const MPQ_HEADER_SIGNATURE: [u8; 4] = *b"MPQ\x1a";

/// User data header magic (`MPQ\x1B`)
pub const MPQ_USER_DATA_SIGNATURE: [u8; 4] = *b"MPQ\x1b";

/// Size of the version 0 header in bytes, magic included
pub const HEADER_SIZE_V0: u32 = 32;

/// Headers may only start on multiples of this value
pub const HEADER_ALIGNMENT: u64 = 0x200;

/// Highest sector size shift accepted (sector size 64 MiB)
const MAX_SECTOR_SIZE_SHIFT: u16 = 17;

/// MPQ archive header (32 bytes, little-endian)
///
/// Version 1 archives append high offset words which are not needed for
/// archives below 4 GiB and are ignored here.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"MPQ\x1a")]
pub struct MpqHeader {
    /// Size of the header in bytes
    pub header_size: u32,
    /// Size of the whole archive in bytes
    pub archive_size: u32,
    /// Format version (0 for Diablo II archives)
    pub format_version: u16,
    /// Sector size is `512 << sector_size_shift`
    pub sector_size_shift: u16,
    /// Hash table offset relative to the header
    pub hash_table_offset: u32,
    /// Block table offset relative to the header
    pub block_table_offset: u32,
    /// Number of hash table slots
    pub hash_table_entries: u32,
    /// Number of block table entries
    pub block_table_entries: u32,
}

/// User data header (`MPQ\x1B`) pointing at the real archive header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"MPQ\x1b")]
pub struct MpqUserDataHeader {
    /// Maximum size of the user data
    pub user_data_size: u32,
    /// Offset of the archive header relative to this header
    pub header_offset: u32,
    /// Size of the user data header
    pub user_data_header_size: u32,
}

impl MpqHeader {
    /// Create a version 0 header for a new archive
    pub fn new(sector_size_shift: u16) -> Self {
        Self {
            header_size: HEADER_SIZE_V0,
            archive_size: 0,
            format_version: 0,
            sector_size_shift,
            hash_table_offset: 0,
            block_table_offset: 0,
            hash_table_entries: 0,
            block_table_entries: 0,
        }
    }

    /// Sector size in bytes
    pub fn sector_size(&self) -> u32 {
        0x200 << self.sector_size_shift
    }

    /// Validate header fields against the size of the archive data that
    /// follows the header
    pub fn validate(&self, available: u64) -> MpqResult<()> {
        if self.format_version > 1 {
            return Err(MpqError::UnsupportedVersion(self.format_version));
        }

        if self.header_size < HEADER_SIZE_V0 {
            return Err(MpqError::InvalidHeader(format!(
                "header size {} is smaller than {}",
                self.header_size, HEADER_SIZE_V0
            )));
        }

        if self.sector_size_shift > MAX_SECTOR_SIZE_SHIFT {
            return Err(MpqError::InvalidHeader(format!(
                "sector size shift {} is too large",
                self.sector_size_shift
            )));
        }

        let hash_end =
            u64::from(self.hash_table_offset) + u64::from(self.hash_table_entries) * 16;
        if hash_end > available {
            return Err(MpqError::InvalidHeader(format!(
                "hash table ends at {hash_end}, past the end of the archive ({available})"
            )));
        }

        let block_end =
            u64::from(self.block_table_offset) + u64::from(self.block_table_entries) * 16;
        if block_end > available {
            return Err(MpqError::InvalidHeader(format!(
                "block table ends at {block_end}, past the end of the archive ({available})"
            )));
        }

        Ok(())
    }
}

/// Locate and parse the archive header.
///
/// The header is searched at every 512-byte boundary. A user data header
/// found first redirects to the archive header it points at. Returns the
/// absolute offset of the archive header together with the parsed header.
pub fn find_header<R: Read + Seek>(reader: &mut R) -> MpqResult<(u64, MpqHeader)> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    let mut offset = 0u64;

    while offset + u64::from(HEADER_SIZE_V0) <= file_size {
        reader.seek(SeekFrom::Start(offset))?;
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if magic == MPQ_HEADER_SIGNATURE {
            return read_header_at(reader, offset, file_size);
        }

        if magic == MPQ_USER_DATA_SIGNATURE {
            reader.seek(SeekFrom::Start(offset))?;
            let user = MpqUserDataHeader::read(reader)?;
            let header_offset = offset + u64::from(user.header_offset);
            return read_header_at(reader, header_offset, file_size);
        }

        offset += HEADER_ALIGNMENT;
    }

    Err(MpqError::HeaderNotFound)
}

fn read_header_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    file_size: u64,
) -> MpqResult<(u64, MpqHeader)> {
    if offset + u64::from(HEADER_SIZE_V0) > file_size {
        return Err(MpqError::HeaderNotFound);
    }

    reader.seek(SeekFrom::Start(offset))?;
    let header = MpqHeader::read(reader)?;
    header.validate(file_size - offset)?;
    Ok((offset, header))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(header: &MpqHeader) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        header.write(&mut cursor).unwrap();
        cursor.into_inner()
    }

    fn empty_header() -> MpqHeader {
        let mut header = MpqHeader::new(3);
        header.hash_table_offset = HEADER_SIZE_V0;
        header.block_table_offset = HEADER_SIZE_V0;
        header.archive_size = HEADER_SIZE_V0;
        header
    }

    #[test]
    fn test_header_is_32_bytes() {
        let bytes = header_bytes(&empty_header());
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..4], b"MPQ\x1a");
    }

    #[test]
    fn test_sector_size() {
        assert_eq!(MpqHeader::new(3).sector_size(), 4096);
        assert_eq!(MpqHeader::new(0).sector_size(), 512);
    }

    #[test]
    fn test_find_header_at_start() {
        let header = empty_header();
        let mut cursor = Cursor::new(header_bytes(&header));
        let (offset, parsed) = find_header(&mut cursor).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_find_header_after_prefix() {
        let header = empty_header();
        let mut data = vec![0xAAu8; 0x400];
        data.extend(header_bytes(&header));

        let (offset, _) = find_header(&mut Cursor::new(data)).unwrap();
        assert_eq!(offset, 0x400);
    }

    #[test]
    fn test_find_header_through_user_data() {
        let header = empty_header();
        let user = MpqUserDataHeader {
            user_data_size: 0x200,
            header_offset: 0x200,
            user_data_header_size: 16,
        };
        let mut cursor = Cursor::new(Vec::new());
        user.write(&mut cursor).unwrap();
        let mut data = cursor.into_inner();
        data.resize(0x200, 0);
        data.extend(header_bytes(&header));

        let (offset, parsed) = find_header(&mut Cursor::new(data)).unwrap();
        assert_eq!(offset, 0x200);
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_missing_header() {
        let data = vec![0u8; 2048];
        let result = find_header(&mut Cursor::new(data));
        assert!(matches!(result, Err(MpqError::HeaderNotFound)));
    }

    #[test]
    fn test_tables_past_end_rejected() {
        let mut header = empty_header();
        header.hash_table_entries = 16;
        let result = find_header(&mut Cursor::new(header_bytes(&header)));
        assert!(matches!(result, Err(MpqError::InvalidHeader(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let mut header = empty_header();
        header.format_version = 3;
        let result = find_header(&mut Cursor::new(header_bytes(&header)));
        assert!(matches!(result, Err(MpqError::UnsupportedVersion(3))));
    }
}
