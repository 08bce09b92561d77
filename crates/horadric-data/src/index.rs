//! Archive index: which archive holds each asset
//!
//! The index is built once from a base directory by reading the manifest of
//! every archive found below it. Archives are scanned in descending
//! lexicographic path order and later archives overwrite earlier entries, so
//! the result does not depend on the order the filesystem lists files in.

use crate::archive::{ArchiveHandle, ArchiveOpener, MpqOpener};
use crate::config::{DEFAULT_ARCHIVE_EXTENSION, DataConfig};
use crate::error::{DataError, Result};
use crate::manifest::{manifest_entries, read_manifest};
use horadric_mpq::LISTFILE_NAME;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Normalise an asset path for use as an index key.
///
/// Keys are ASCII lower-case with `\` as the separator.
pub fn normalize_asset_path(path: &str) -> String {
    path.replace('/', "\\").to_ascii_lowercase()
}

/// Archive identifier: the file name without its extension.
///
/// Identifiers are not unique: `a/d2data.mpq` and `b/d2data.mpq` share one.
pub fn archive_id(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| DataError::InvalidArchiveName(path.to_path_buf()))
}

/// Outcome of scanning one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveStatus {
    /// Manifest read; `entries` names were added to the index
    Indexed {
        /// Number of manifest entries
        entries: usize,
    },
    /// The archive could not be opened
    OpenFailed {
        /// Error message
        reason: String,
    },
    /// The file name yields no archive identifier
    Unnamed,
    /// The archive has no manifest
    ManifestMissing,
    /// Opening or reading the manifest failed
    ManifestUnreadable {
        /// Error message
        reason: String,
    },
}

impl ArchiveStatus {
    /// Whether the archive contributed to the index
    pub const fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indexed { entries } => write!(f, "indexed {entries} entries"),
            Self::OpenFailed { reason } => write!(f, "open failed: {reason}"),
            Self::Unnamed => write!(f, "no archive identifier in file name"),
            Self::ManifestMissing => write!(f, "no {LISTFILE_NAME}"),
            Self::ManifestUnreadable { reason } => write!(f, "unreadable {LISTFILE_NAME}: {reason}"),
        }
    }
}

/// Scan result for one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveScan {
    /// Archive location
    pub path: PathBuf,
    /// Archive identifier
    pub archive_id: String,
    /// What happened
    pub status: ArchiveStatus,
}

/// Per-archive outcomes of an index build, in scan order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// One record per archive found
    pub archives: Vec<ArchiveScan>,
}

impl ScanReport {
    /// Number of archives found
    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    /// Number of archives that contributed entries
    pub fn indexed_count(&self) -> usize {
        self.archives.iter().filter(|a| a.status.is_indexed()).count()
    }

    /// Number of archives that were skipped
    pub fn skipped_count(&self) -> usize {
        self.archive_count() - self.indexed_count()
    }

    /// Total manifest entries read, duplicates included
    pub fn entry_count(&self) -> usize {
        self.archives
            .iter()
            .map(|a| match a.status {
                ArchiveStatus::Indexed { entries } => entries,
                _ => 0,
            })
            .sum()
    }

    /// Archives that were skipped
    pub fn skipped(&self) -> impl Iterator<Item = &ArchiveScan> {
        self.archives.iter().filter(|a| !a.status.is_indexed())
    }
}

/// An archive that contributed to the index
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexedArchive {
    id: String,
    path: PathBuf,
}

/// Mapping from asset path to the archive holding it.
///
/// Each entry refers to one archive file, so archives that share an
/// identifier still resolve to the file that listed the asset. Immutable once
/// built; share it behind an `Arc` if several owners need it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveIndex {
    entries: HashMap<String, usize>,
    archives: Vec<IndexedArchive>,
}

impl ArchiveIndex {
    /// Build an index of the MPQ archives below `base_path`
    pub fn build(base_path: impl AsRef<Path>) -> Result<(Self, ScanReport)> {
        IndexBuilder::new().build(base_path.as_ref())
    }

    fn owner(&self, asset_path: &str) -> Option<&IndexedArchive> {
        self.entries
            .get(&normalize_asset_path(asset_path))
            .map(|&slot| &self.archives[slot])
    }

    /// Archive identifier holding `asset_path`
    pub fn lookup(&self, asset_path: &str) -> Option<&str> {
        self.owner(asset_path).map(|archive| archive.id.as_str())
    }

    /// Filesystem path of the archive holding `asset_path`
    pub fn locate(&self, asset_path: &str) -> Option<&Path> {
        self.owner(asset_path).map(|archive| archive.path.as_path())
    }

    /// Whether any archive holds `asset_path`
    pub fn contains(&self, asset_path: &str) -> bool {
        self.entries.contains_key(&normalize_asset_path(asset_path))
    }

    /// Filesystem path of an indexed archive.
    ///
    /// With several archives sharing `archive_id`, the last one scanned.
    pub fn archive_path(&self, archive_id: &str) -> Option<&Path> {
        self.archives
            .iter()
            .rev()
            .find(|archive| archive.id == archive_id)
            .map(|archive| archive.path.as_path())
    }

    /// `(identifier, path)` of every indexed archive, in scan order
    pub fn archives(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.archives
            .iter()
            .map(|archive| (archive.id.as_str(), archive.path.as_path()))
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no assets
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(asset path, archive id)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(asset, &slot)| (asset.as_str(), self.archives[slot].id.as_str()))
    }

    /// Asset path to archive identifier mapping
    pub fn entries(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(asset, id)| (asset.to_string(), id.to_string()))
            .collect()
    }

    /// Record an archive and return the slot its entries refer to
    fn register_archive(&mut self, archive_id: &str, path: &Path) -> usize {
        self.archives.push(IndexedArchive {
            id: archive_id.to_string(),
            path: path.to_path_buf(),
        });
        self.archives.len() - 1
    }

    fn insert(&mut self, asset_path: &str, slot: usize) {
        self.entries.insert(normalize_asset_path(asset_path), slot);
    }
}

/// Builds an [`ArchiveIndex`] from a directory of archives
#[derive(Debug, Clone)]
pub struct IndexBuilder<O = MpqOpener> {
    opener: O,
    extension: String,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    /// Index `.mpq` archives with the MPQ reader
    pub fn new() -> Self {
        Self::with_opener(MpqOpener)
    }

    /// Builder using the extension from `config`
    pub fn from_config(config: &DataConfig) -> Self {
        Self::new().with_extension(config.extension())
    }
}

impl<O: ArchiveOpener> IndexBuilder<O> {
    /// Index archives opened by `opener`
    pub fn with_opener(opener: O) -> Self {
        Self {
            opener,
            extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
        }
    }

    /// Select files with this extension (case-insensitive, leading dot ignored)
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// The archive opener
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Give back the archive opener
    pub fn into_opener(self) -> O {
        self.opener
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
    }

    /// Find archive files below `base_path`, in scan order.
    ///
    /// Fails only when `base_path` itself cannot be enumerated; unreadable
    /// subdirectories are logged and skipped.
    pub fn discover(&self, base_path: &Path) -> Result<Vec<PathBuf>> {
        let enumerate_error = |source| DataError::Enumerate {
            path: base_path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(base_path).map_err(enumerate_error)?;
        if !metadata.is_dir() {
            return Err(enumerate_error(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }

        let mut archives = Vec::new();
        for entry in WalkDir::new(base_path).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(enumerate_error(err.into())),
                Err(err) => {
                    warn!("Skipping unreadable directory entry: {err}");
                    continue;
                }
            };

            if entry.file_type().is_file() && self.matches_extension(entry.path()) {
                archives.push(entry.into_path());
            }
        }

        archives.sort_by(|a, b| b.cmp(a));
        Ok(archives)
    }

    /// Build the index for every archive below `base_path`
    pub fn build(&self, base_path: &Path) -> Result<(ArchiveIndex, ScanReport)> {
        info!("Indexing archives under {}", base_path.display());

        let mut index = ArchiveIndex::default();
        let mut report = ScanReport::default();

        for path in self.discover(base_path)? {
            let (archive_id, status) = match archive_id(&path) {
                Ok(id) => {
                    let status = self.scan_archive(&path, &id, &mut index);
                    (id, status)
                }
                Err(e) => {
                    warn!("Skipping archive: {e}");
                    (String::new(), ArchiveStatus::Unnamed)
                }
            };
            report.archives.push(ArchiveScan {
                path,
                archive_id,
                status,
            });
        }

        info!(
            "Indexed {} assets from {} of {} archives",
            index.len(),
            report.indexed_count(),
            report.archive_count()
        );

        Ok((index, report))
    }

    fn scan_archive(&self, path: &Path, archive_id: &str, index: &mut ArchiveIndex) -> ArchiveStatus {
        let mut handle = match self.opener.open(path) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Skipping archive {}: failed to open: {e}", path.display());
                return ArchiveStatus::OpenFailed {
                    reason: e.to_string(),
                };
            }
        };

        let content = {
            let mut manifest = match handle.open_entry(LISTFILE_NAME) {
                Ok(Some(manifest)) => manifest,
                Ok(None) => {
                    warn!("Skipping archive {}: no {LISTFILE_NAME}", path.display());
                    return ArchiveStatus::ManifestMissing;
                }
                Err(e) => {
                    warn!(
                        "Skipping archive {}: cannot open {LISTFILE_NAME}: {e}",
                        path.display()
                    );
                    return ArchiveStatus::ManifestUnreadable {
                        reason: e.to_string(),
                    };
                }
            };

            match read_manifest(&mut manifest) {
                Ok(content) => content,
                Err(e) => {
                    warn!(
                        "Skipping archive {}: cannot read {LISTFILE_NAME}: {e}",
                        path.display()
                    );
                    return ArchiveStatus::ManifestUnreadable {
                        reason: e.to_string(),
                    };
                }
            }
        };
        drop(handle);

        let names = manifest_entries(&content);
        let slot = index.register_archive(archive_id, path);
        for name in &names {
            debug!("{name} -> {archive_id}");
            index.insert(name, slot);
        }

        info!("Indexed {} entries from {}", names.len(), path.display());
        ArchiveStatus::Indexed {
            entries: names.len(),
        }
    }
}
