//! Game data access for Diablo II
//!
//! The central piece is the [`ArchiveIndex`]: a map from every asset path
//! listed in the archives' `(listfile)` manifests to the archive holding
//! it. [`DataManager`] builds the index from a [`DataConfig`] and reads
//! assets through it.
//!
//! # Example
//!
//! ```no_run
//! use horadric_data::{ArchiveIndex, ArchiveStatus};
//!
//! let (index, report) = ArchiveIndex::build("/games/diablo2")?;
//! for scan in report.skipped() {
//!     eprintln!("{}: {}", scan.path.display(), scan.status);
//! }
//! println!("{:?}", index.lookup("data\\global\\excel\\levels.txt"));
//! # Ok::<(), horadric_data::DataError>(())
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod error;
pub mod index;
pub mod manager;
pub mod manifest;
pub mod resource;

pub use archive::{ArchiveHandle, ArchiveOpener, MpqOpener};
pub use config::DataConfig;
pub use error::{DataError, Result};
pub use index::{ArchiveIndex, ArchiveScan, ArchiveStatus, IndexBuilder, ScanReport};
pub use manager::{DataManager, verify_sanity_archive};
pub use resource::{Palette, ResourcePath};
