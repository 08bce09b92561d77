//! Reading archive manifests
//!
//! Entry streams may return fewer bytes than requested (MPQ streams stop at
//! sector boundaries), so the manifest is drained chunk by chunk until a
//! read returns zero.

use horadric_mpq::listfile;
use std::io::{self, Read};

/// Size of the buffer each manifest read fills
pub const MANIFEST_CHUNK_SIZE: usize = 4096;

/// Read a manifest stream to the end into a fresh buffer
pub fn read_manifest<R: Read + ?Sized>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut content = Vec::new();
    let mut chunk = [0u8; MANIFEST_CHUNK_SIZE];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => content.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(content)
}

/// Asset names listed in manifest content
pub fn manifest_entries(content: &[u8]) -> Vec<String> {
    listfile::parse(content)
}
