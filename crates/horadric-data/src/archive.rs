//! Archive access seam used by the index builder and data manager
//!
//! The index only needs to open an archive, open a named entry and read it.
//! Closing is dropping: an entry borrows its archive, so the entry is always
//! released before the archive it came from.

use crate::error::Result;
use horadric_mpq::{Archive, FileStream, MpqError};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Opens archives from the filesystem
pub trait ArchiveOpener {
    /// Handle for an opened archive
    type Handle: ArchiveHandle;

    /// Open the archive at `path` read-only
    fn open(&self, path: &Path) -> Result<Self::Handle>;
}

/// An opened archive
pub trait ArchiveHandle {
    /// Reader over one entry
    type Entry<'a>: Read
    where
        Self: 'a;

    /// Open the entry `name`, or `Ok(None)` when the archive has no such entry
    fn open_entry(&mut self, name: &str) -> Result<Option<Self::Entry<'_>>>;
}

/// Opens MPQ archives with `horadric-mpq`
#[derive(Debug, Clone, Copy, Default)]
pub struct MpqOpener;

impl ArchiveOpener for MpqOpener {
    type Handle = Archive<BufReader<File>>;

    fn open(&self, path: &Path) -> Result<Self::Handle> {
        Ok(Archive::open(path)?)
    }
}

impl<R: Read + Seek> ArchiveHandle for Archive<R> {
    type Entry<'a>
        = FileStream<'a, R>
    where
        Self: 'a;

    fn open_entry(&mut self, name: &str) -> Result<Option<Self::Entry<'_>>> {
        match self.open_file(name) {
            Ok(stream) => Ok(Some(stream)),
            Err(MpqError::FileNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use horadric_mpq::ArchiveBuilder;

    #[test]
    fn test_mpq_opener_reads_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d2data.mpq");
        let mut builder = ArchiveBuilder::new();
        builder.add_file("data\\global\\ui\\a.dc6", b"abc".to_vec());
        builder.write_to_path(&path).unwrap();

        let mut handle = MpqOpener.open(&path).unwrap();
        let mut entry = handle.open_entry("data\\global\\ui\\a.dc6").unwrap().unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"abc");

        assert!(handle.open_entry("missing.dc6").unwrap().is_none());
    }

    #[test]
    fn test_mpq_opener_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mpq");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let result = MpqOpener.open(&path);
        assert!(matches!(
            result,
            Err(DataError::Archive(MpqError::HeaderNotFound))
        ));
    }
}
