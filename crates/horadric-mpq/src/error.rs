//! Error types for MPQ operations

use thiserror::Error;

/// MPQ operation result type
pub type MpqResult<T> = Result<T, MpqError>;

/// Errors that can occur while reading or building MPQ archives
#[derive(Debug, Error)]
pub enum MpqError {
    /// No `MPQ\x1A` header was found in the file
    #[error("no MPQ header found")]
    HeaderNotFound,

    /// Header fields are inconsistent with the file
    #[error("invalid MPQ header: {0}")]
    InvalidHeader(String),

    /// Archive format version newer than this reader understands
    #[error("unsupported MPQ format version: {0}")]
    UnsupportedVersion(u16),

    /// The named file has no entry in the hash table
    #[error("file not found in archive: {0}")]
    FileNotFound(String),

    /// Hash table points to a block outside the block table
    #[error("block index {index} out of range (block table has {len} entries)")]
    BlockIndexOutOfRange {
        /// Block index taken from the hash table
        index: u32,
        /// Number of block table entries
        len: usize,
    },

    /// Sector offset table failed validation (usually a bad decryption key)
    #[error("corrupt sector table: {0}")]
    CorruptSectorTable(String),

    /// Sector or file data is inconsistent with the block table
    #[error("corrupt file data: {0}")]
    CorruptData(String),

    /// Compression method byte the reader cannot decode
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// File uses a feature the reader cannot handle (patch files)
    #[error("unsupported file feature: {0}")]
    Unsupported(String),

    /// Zlib compression or decompression failed
    #[error("compression error: {0}")]
    Compression(String),

    /// Builder input cannot be represented in an MPQ archive
    #[error("invalid build input: {0}")]
    InvalidInput(String),

    /// Binary read/write error
    #[error("binary format error: {0}")]
    BinRead(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl MpqError {
    /// Check whether the error means the archive itself is unusable
    /// rather than a single entry inside it
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            Self::HeaderNotFound
                | Self::InvalidHeader(_)
                | Self::UnsupportedVersion(_)
                | Self::BinRead(_)
        )
    }
}

impl From<std::io::Error> for MpqError {
    /// Unwraps archive errors that travelled through a [`std::io::Read`]
    /// implementation so callers still see the original variant.
    fn from(err: std::io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Self>()) {
            return Self::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Self>()) {
            Some(Ok(mpq)) => *mpq,
            Some(Err(other)) => Self::Io(std::io::Error::new(kind, other)),
            None => Self::Io(kind.into()),
        }
    }
}

impl From<MpqError> for std::io::Error {
    fn from(err: MpqError) -> Self {
        match err {
            MpqError::Io(io) => io,
            MpqError::FileNotFound(_) => Self::new(std::io::ErrorKind::NotFound, err),
            other => Self::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MpqError::FileNotFound("(listfile)".to_string());
        assert_eq!(err.to_string(), "file not found in archive: (listfile)");

        let err = MpqError::BlockIndexOutOfRange { index: 9, len: 4 };
        assert_eq!(
            err.to_string(),
            "block index 9 out of range (block table has 4 entries)"
        );
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: std::io::Error = MpqError::FileNotFound("x".to_string()).into();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);

        let err: std::io::Error = MpqError::CorruptData("short".to_string()).into();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_round_trip_through_io_error() {
        let io: std::io::Error = MpqError::UnsupportedCompression("bzip2".to_string()).into();
        let back = MpqError::from(io);
        assert!(matches!(back, MpqError::UnsupportedCompression(_)));

        let back = MpqError::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert!(matches!(back, MpqError::Io(_)));
    }

    #[test]
    fn test_archive_error_classification() {
        assert!(MpqError::HeaderNotFound.is_archive_error());
        assert!(!MpqError::FileNotFound("a".to_string()).is_archive_error());
    }
}
