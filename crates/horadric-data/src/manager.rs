//! Asset access by logical path

use crate::archive::{ArchiveHandle, ArchiveOpener, MpqOpener};
use crate::config::DataConfig;
use crate::error::{DataError, Result};
use crate::index::{ArchiveIndex, IndexBuilder, ScanReport, normalize_asset_path};
use crate::resource::{Palette, ResourcePath, localize};
use horadric_mpq::Archive;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Check that the sanity-check archive exists and opens.
///
/// Returns the archive's path. The name is matched case-insensitively.
pub fn verify_sanity_archive(config: &DataConfig) -> Result<PathBuf> {
    let path = config.sanity_archive_path();
    if !path.is_file() {
        return Err(DataError::MissingArchive(path));
    }

    let archive = Archive::open(&path)?;
    info!(
        "Found {} ({} files)",
        path.display(),
        archive.file_count()
    );
    Ok(path)
}

/// Serves asset bytes from the indexed archives
///
/// ```no_run
/// use horadric_data::{DataConfig, DataManager, Palette};
///
/// let manager = DataManager::open(DataConfig::new("/games/diablo2"))?;
/// let palette = manager.read_palette(Palette::Act1)?;
/// assert_eq!(palette.len(), 768);
/// # Ok::<(), horadric_data::DataError>(())
/// ```
#[derive(Debug)]
pub struct DataManager<O = MpqOpener> {
    config: DataConfig,
    index: Arc<ArchiveIndex>,
    report: ScanReport,
    opener: O,
}

impl DataManager {
    /// Index the MPQ archives under `config.base_path`
    pub fn open(config: DataConfig) -> Result<Self> {
        Self::with_opener(config, MpqOpener)
    }
}

impl<O: ArchiveOpener> DataManager<O> {
    /// Index archives under `config.base_path` using `opener`
    pub fn with_opener(config: DataConfig, opener: O) -> Result<Self> {
        config.validate()?;

        let builder = IndexBuilder::with_opener(opener).with_extension(config.extension());
        let (index, report) = builder.build(&config.base_path)?;

        Ok(Self {
            config,
            index: Arc::new(index),
            report,
            opener: builder.into_opener(),
        })
    }

    /// Configuration the manager was opened with
    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// The archive index
    pub fn index(&self) -> &Arc<ArchiveIndex> {
        &self.index
    }

    /// Outcome of the index build
    pub fn scan_report(&self) -> &ScanReport {
        &self.report
    }

    /// Turn a resource path into an index key.
    ///
    /// Language tokens are replaced, the path is normalised and the leading
    /// separator dropped, so `/data/global/ui/x.dc6` and
    /// `data\global\ui\x.dc6` resolve to the same key.
    pub fn resolve_path(&self, path: &str) -> String {
        let localized = localize(path, &self.config.language);
        normalize_asset_path(&localized)
            .trim_start_matches('\\')
            .to_string()
    }

    /// Whether any indexed archive holds `path`
    pub fn file_exists(&self, path: &str) -> bool {
        self.index.contains(&self.resolve_path(path))
    }

    /// Identifier of the archive holding `path`
    pub fn archive_for(&self, path: &str) -> Option<&str> {
        self.index.lookup(&self.resolve_path(path))
    }

    /// Read the whole asset at `path`
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let key = self.resolve_path(path);
        let archive_path = self
            .index
            .locate(&key)
            .ok_or_else(|| DataError::AssetNotFound(path.to_string()))?;

        debug!("Loading {key} from {}", archive_path.display());

        let mut handle = self.opener.open(archive_path)?;
        let mut entry = handle
            .open_entry(&key)?
            .ok_or_else(|| DataError::AssetNotFound(path.to_string()))?;

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read the asset at `path` as UTF-8 text
    pub fn read_text_file(&self, path: &str) -> Result<String> {
        String::from_utf8(self.read_file(path)?)
            .map_err(|_| DataError::InvalidText(path.to_string()))
    }

    /// Whether a fixed resource is present
    pub fn resource_exists(&self, resource: ResourcePath) -> bool {
        self.file_exists(resource.path())
    }

    /// Read a fixed resource
    pub fn read_resource(&self, resource: ResourcePath) -> Result<Vec<u8>> {
        self.read_file(resource.path())
    }

    /// Read a palette
    pub fn read_palette(&self, palette: Palette) -> Result<Vec<u8>> {
        self.read_file(palette.path())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use horadric_mpq::{ArchiveBuilder, FileOptions};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn write_archive(dir: &Path, name: &str, files: &[(&str, &[u8])]) {
        let mut builder = ArchiveBuilder::new();
        for (path, data) in files {
            builder.add_file_with(*path, data.to_vec(), FileOptions::compressed());
        }
        builder.write_to_path(dir.join(name)).unwrap();
    }

    #[test]
    fn test_resolve_path() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DataManager::open(DataConfig::new(dir.path())).unwrap();

        assert_eq!(
            manager.resolve_path("/data/global/ui/FrontEnd/fire.DC6"),
            "data\\global\\ui\\frontend\\fire.dc6"
        );
        assert_eq!(
            manager.resolve_path(ResourcePath::CreditsText.path()),
            "data\\local\\ui\\eng\\expansioncredits.txt"
        );
    }

    #[test]
    fn test_read_resources() {
        let dir = tempfile::tempdir().unwrap();
        let palette = vec![7u8; 768];
        write_archive(
            dir.path(),
            "d2data.mpq",
            &[
                ("data\\global\\palette\\act1\\pal.dat", palette.as_slice()),
                ("data\\local\\ui\\eng\\ExpansionCredits.txt", b"Blizzard North".as_slice()),
            ],
        );

        let manager = DataManager::open(DataConfig::new(dir.path())).unwrap();
        assert_eq!(manager.read_palette(Palette::Act1).unwrap(), palette);
        assert_eq!(
            manager.read_text_file(ResourcePath::CreditsText.path()).unwrap(),
            "Blizzard North"
        );
        assert!(manager.resource_exists(ResourcePath::CreditsText));
        assert!(!manager.resource_exists(ResourcePath::TrademarkScreen));
        assert_eq!(
            manager.archive_for("/data/global/palette/act1/pal.dat"),
            Some("d2data")
        );
    }

    #[test]
    fn test_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "d2data.mpq", &[("a.txt", b"a".as_slice())]);

        let manager = DataManager::open(DataConfig::new(dir.path())).unwrap();
        let err = manager.read_file("/data/missing.txt").unwrap_err();
        assert!(matches!(err, DataError::AssetNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_text() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "d2data.mpq", &[("bin.dat", [0xFF, 0xFE, 0x00].as_slice())]);

        let manager = DataManager::open(DataConfig::new(dir.path())).unwrap();
        assert!(matches!(
            manager.read_text_file("bin.dat"),
            Err(DataError::InvalidText(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig::new(dir.path()).with_language("");
        assert!(matches!(
            DataManager::open(config),
            Err(DataError::Config(_))
        ));
    }

    #[test]
    fn test_verify_sanity_archive() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig::new(dir.path());
        assert!(matches!(
            verify_sanity_archive(&config),
            Err(DataError::MissingArchive(_))
        ));

        std::fs::write(dir.path().join("d2data.mpq"), vec![0u8; 1024]).unwrap();
        assert!(matches!(
            verify_sanity_archive(&config),
            Err(DataError::Archive(_))
        ));

        std::fs::remove_file(dir.path().join("d2data.mpq")).unwrap();
        write_archive(dir.path(), "D2DATA.MPQ", &[("a.txt", b"a".as_slice())]);
        assert!(verify_sanity_archive(&config).is_ok());
    }
}
