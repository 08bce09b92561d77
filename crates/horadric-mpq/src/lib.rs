//! MPQ archive reading and building for Diablo II game data
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // MPQ terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! Diablo II ships its assets in MPQ archives (`d2data.mpq`, `d2exp.mpq`,
//! `patch_d2.mpq`, ...). This crate reads version 0 and 1 archives and can
//! build version 0 archives, which the data layer uses in its tests.
//!
//! # Supported features
//!
//! - **Header discovery**: headers at 512-byte boundaries and `MPQ\x1B` user data redirects
//! - **Tables**: encrypted hash and block tables
//! - **Files**: single-unit and sectored files, encrypted files with or without the fix-key adjustment
//! - **Compression**: zlib, PKWARE DCL (method byte or `IMPLODE` flag) and IMA ADPCM sectors; Huffman, bzip2, sparse and LZMA are reported as unsupported
//! - **Listfile**: `(listfile)` parsing and generation
//!
//! # Example
//!
//! ```
//! use horadric_mpq::{Archive, ArchiveBuilder};
//! use std::io::Cursor;
//!
//! let mut builder = ArchiveBuilder::new();
//! builder.add_file("data\\global\\palette\\act1\\pal.dat", vec![0u8; 768]);
//! let bytes = builder.build()?;
//!
//! let mut archive = Archive::from_reader(Cursor::new(bytes))?;
//! assert_eq!(archive.list_files()?, vec!["data\\global\\palette\\act1\\pal.dat"]);
//! # Ok::<(), horadric_mpq::MpqError>(())
//! ```

#![warn(missing_docs)]

pub mod adpcm;
pub mod archive;
pub mod builder;
pub mod compression;
pub mod crypto;
pub mod error;
pub mod header;
pub mod listfile;
pub mod pkware;
pub mod stream;
pub mod table;

pub use archive::{Archive, resolve_case_insensitive};
pub use builder::{ArchiveBuilder, FileOptions};
pub use compression::Compression;
pub use crypto::{HashType, hash_string};
pub use error::{MpqError, MpqResult};
pub use header::MpqHeader;
pub use listfile::LISTFILE_NAME;
pub use stream::FileStream;
pub use table::{BlockEntry, BlockFlags, HashEntry};
