//! Index builds over directories of real and simulated archives

#![allow(clippy::unwrap_used)]

use horadric_data::{
    ArchiveHandle, ArchiveIndex, ArchiveOpener, ArchiveStatus, DataConfig, DataError,
    DataManager, IndexBuilder,
};
use horadric_mpq::{ArchiveBuilder, FileOptions, LISTFILE_NAME};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;
use std::io::{self, Read};
use std::path::Path;

fn write_mpq(dir: &Path, name: &str, files: &[&str]) {
    let mut builder = ArchiveBuilder::new();
    for file in files {
        builder.add_file_with(
            *file,
            format!("{name}:{file}").into_bytes(),
            FileOptions::compressed(),
        );
    }
    builder.write_to_path(dir.join(name)).unwrap();
}

fn mapping(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn single_archive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = ArchiveBuilder::new();
    builder.add_file(LISTFILE_NAME, b"a\\b.txt\r\nc\\d.dc6".to_vec());
    builder.write_to_path(dir.path().join("d2data.mpq")).unwrap();

    let (index, report) = ArchiveIndex::build(dir.path()).unwrap();

    assert_eq!(
        index.entries(),
        mapping(&[("a\\b.txt", "d2data"), ("c\\d.dc6", "d2data")])
    );
    assert_eq!(
        report.archives[0].status,
        ArchiveStatus::Indexed { entries: 2 }
    );
}

#[test]
fn union_of_all_manifests() {
    let dir = tempfile::tempdir().unwrap();
    write_mpq(dir.path(), "d2data.mpq", &["data\\global\\ui\\a.dc6"]);
    write_mpq(dir.path(), "d2exp.mpq", &["data\\global\\ui\\b.dc6"]);
    write_mpq(dir.path(), "d2speech.mpq", &["data\\local\\sfx\\c.wav"]);

    let (index, report) = ArchiveIndex::build(dir.path()).unwrap();

    assert_eq!(
        index.entries(),
        mapping(&[
            ("data\\global\\ui\\a.dc6", "d2data"),
            ("data\\global\\ui\\b.dc6", "d2exp"),
            ("data\\local\\sfx\\c.wav", "d2speech"),
        ])
    );
    assert_eq!(report.indexed_count(), 3);
    assert_eq!(report.entry_count(), 3);
}

#[test]
fn d2data_overrides_patch_entries() {
    let dir = tempfile::tempdir().unwrap();
    write_mpq(dir.path(), "patch_d2.mpq", &["data\\global\\ui\\a.dc6"]);
    write_mpq(
        dir.path(),
        "d2data.mpq",
        &["data\\global\\ui\\a.dc6", "data\\global\\ui\\b.dc6"],
    );

    let (index, report) = ArchiveIndex::build(dir.path()).unwrap();

    assert_eq!(
        index.entries(),
        mapping(&[
            ("data\\global\\ui\\a.dc6", "d2data"),
            ("data\\global\\ui\\b.dc6", "d2data"),
        ])
    );
    let order: Vec<&str> = report
        .archives
        .iter()
        .map(|a| a.archive_id.as_str())
        .collect();
    assert_eq!(order, vec!["patch_d2", "d2data"]);
}

#[test]
fn manager_reads_from_winning_archive() {
    let dir = tempfile::tempdir().unwrap();
    write_mpq(dir.path(), "patch_d2.mpq", &["data\\global\\ui\\a.dc6"]);
    write_mpq(dir.path(), "d2data.mpq", &["data\\global\\ui\\a.dc6"]);

    let manager = DataManager::open(DataConfig::new(dir.path())).unwrap();
    assert_eq!(
        manager.read_file("/data/global/ui/a.dc6").unwrap(),
        b"d2data.mpq:data\\global\\ui\\a.dc6"
    );
}

#[test]
fn missing_manifest_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_mpq(dir.path(), "d2data.mpq", &["data\\global\\ui\\a.dc6"]);

    let mut builder = ArchiveBuilder::new().without_listfile();
    builder.add_file("data\\global\\ui\\hidden.dc6", b"x".to_vec());
    builder.write_to_path(dir.path().join("d2char.mpq")).unwrap();

    let (index, report) = ArchiveIndex::build(dir.path()).unwrap();

    assert_eq!(index.len(), 1);
    assert!(!index.contains("data\\global\\ui\\hidden.dc6"));
    assert!(index.archive_path("d2char").is_none());

    let statuses: HashMap<&str, &ArchiveStatus> = report
        .archives
        .iter()
        .map(|a| (a.archive_id.as_str(), &a.status))
        .collect();
    assert_eq!(statuses["d2char"], &ArchiveStatus::ManifestMissing);
    assert_eq!(statuses["d2data"], &ArchiveStatus::Indexed { entries: 1 });
}

#[test]
fn corrupt_archive_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_mpq(dir.path(), "d2data.mpq", &["data\\global\\ui\\a.dc6"]);
    std::fs::write(dir.path().join("broken.mpq"), vec![0xAB; 4096]).unwrap();
    std::fs::write(dir.path().join("empty.mpq"), b"").unwrap();

    let (index, report) = ArchiveIndex::build(dir.path()).unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(report.archive_count(), 3);
    assert_eq!(report.skipped_count(), 2);
    for scan in report.skipped() {
        assert!(
            matches!(scan.status, ArchiveStatus::OpenFailed { .. }),
            "{}: {}",
            scan.archive_id,
            scan.status
        );
    }
}

#[test]
fn build_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_mpq(dir.path(), "d2data.mpq", &["a.txt", "b.txt"]);
    write_mpq(dir.path(), "d2exp.mpq", &["b.txt", "c.txt"]);

    let first = ArchiveIndex::build(dir.path()).unwrap();
    let second = ArchiveIndex::build(dir.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn zero_archives_give_empty_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"no archives here").unwrap();

    let (index, report) = ArchiveIndex::build(dir.path()).unwrap();
    assert!(index.is_empty());
    assert_eq!(report.archive_count(), 0);
}

#[test]
fn nested_directories_and_extension_case() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("expansion/music")).unwrap();
    write_mpq(dir.path(), "D2DATA.MPQ", &["a.txt"]);
    write_mpq(&dir.path().join("expansion/music"), "d2xmusic.Mpq", &["b.wav"]);

    let (index, _) = ArchiveIndex::build(dir.path()).unwrap();
    assert_eq!(index.lookup("a.txt"), Some("D2DATA"));
    assert_eq!(index.lookup("B.WAV"), Some("d2xmusic"));
    assert_eq!(
        index.archive_path("d2xmusic"),
        Some(dir.path().join("expansion/music/d2xmusic.Mpq").as_path())
    );
}

#[test]
fn archives_sharing_a_name_keep_their_own_files() {
    let dir = tempfile::tempdir().unwrap();
    for sub in ["a", "b"] {
        std::fs::create_dir(dir.path().join(sub)).unwrap();
    }
    write_mpq(&dir.path().join("a"), "d2data.mpq", &["x.txt"]);
    write_mpq(&dir.path().join("b"), "d2data.mpq", &["y.txt"]);

    let (index, report) = ArchiveIndex::build(dir.path()).unwrap();
    assert_eq!(report.indexed_count(), 2);
    assert_eq!(index.lookup("x.txt"), Some("d2data"));
    assert_eq!(index.lookup("y.txt"), Some("d2data"));
    assert_eq!(
        index.locate("x.txt"),
        Some(dir.path().join("a/d2data.mpq").as_path())
    );
    assert_eq!(
        index.locate("y.txt"),
        Some(dir.path().join("b/d2data.mpq").as_path())
    );

    let manager = DataManager::open(DataConfig::new(dir.path())).unwrap();
    assert_eq!(manager.read_file("x.txt").unwrap(), b"d2data.mpq:x.txt");
    assert_eq!(manager.read_file("y.txt").unwrap(), b"d2data.mpq:y.txt");
}

#[test]
fn imploded_manifests_are_indexed() {
    let dir = tempfile::tempdir().unwrap();

    for (stem, options) in [
        ("d2data", FileOptions::imploded()),
        ("d2exp", FileOptions::pkware()),
    ] {
        let mut builder = ArchiveBuilder::new().with_listfile_options(options);
        for i in 0..120 {
            let name = format!("data\\global\\items\\{stem}_inv{i:03}.dc6");
            builder.add_file_with(
                name.as_str(),
                format!("{stem}:{name}").into_bytes(),
                FileOptions::imploded(),
            );
        }
        builder
            .write_to_path(dir.path().join(format!("{stem}.mpq")))
            .unwrap();
    }

    let (index, report) = ArchiveIndex::build(dir.path()).unwrap();
    assert_eq!(report.indexed_count(), 2);
    assert_eq!(report.entry_count(), 240);
    assert_eq!(index.len(), 240);
    assert_eq!(
        index.lookup("data\\global\\items\\d2exp_inv042.dc6"),
        Some("d2exp")
    );

    let manager = DataManager::open(DataConfig::new(dir.path())).unwrap();
    assert_eq!(
        manager
            .read_file("/data/global/items/d2data_inv007.dc6")
            .unwrap(),
        b"d2data:data\\global\\items\\d2data_inv007.dc6"
    );
}

#[test]
fn unreadable_base_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let result = ArchiveIndex::build(dir.path().join("missing"));
    assert!(matches!(result, Err(DataError::Enumerate { .. })));
}

/// Simulated archive contents
#[derive(Debug, Clone)]
enum FakeArchive {
    Manifest(Vec<u8>),
    NoManifest,
    Corrupt,
    FailsAfter(Vec<u8>, usize),
}

/// Opens simulated archives by file name; entries hand out at most
/// `step` bytes per read
#[derive(Debug, Clone)]
struct FakeOpener {
    archives: HashMap<String, FakeArchive>,
    step: usize,
}

struct FakeHandle {
    archive: FakeArchive,
    step: usize,
}

struct FakeEntry<'a> {
    data: &'a [u8],
    step: usize,
    fail_after: Option<usize>,
    served: usize,
}

impl ArchiveOpener for FakeOpener {
    type Handle = FakeHandle;

    fn open(&self, path: &Path) -> horadric_data::Result<FakeHandle> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        match self.archives.get(&name) {
            Some(FakeArchive::Corrupt) | None => Err(DataError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "not an archive",
            ))),
            Some(archive) => Ok(FakeHandle {
                archive: archive.clone(),
                step: self.step,
            }),
        }
    }
}

impl ArchiveHandle for FakeHandle {
    type Entry<'a>
        = FakeEntry<'a>
    where
        Self: 'a;

    fn open_entry(&mut self, name: &str) -> horadric_data::Result<Option<FakeEntry<'_>>> {
        assert_eq!(name, LISTFILE_NAME);
        let (data, fail_after) = match &self.archive {
            FakeArchive::Manifest(data) => (data.as_slice(), None),
            FakeArchive::FailsAfter(data, limit) => (data.as_slice(), Some(*limit)),
            FakeArchive::NoManifest | FakeArchive::Corrupt => return Ok(None),
        };
        Ok(Some(FakeEntry {
            data,
            step: self.step,
            fail_after,
            served: 0,
        }))
    }
}

impl Read for FakeEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_after.is_some_and(|limit| self.served >= limit) {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad sector"));
        }
        let n = self.step.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        self.served += n;
        Ok(n)
    }
}

fn fake_dir(opener: &FakeOpener) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in opener.archives.keys() {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    dir
}

fn long_manifest(prefix: &str, count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| format!("data\\global\\{prefix}\\file{i:05}.dc6"))
        .collect::<Vec<_>>()
        .join("\r\n")
        .into_bytes()
}

#[test]
fn one_byte_reads_give_the_same_index() {
    let archives: HashMap<String, FakeArchive> = [
        ("d2data.mpq", FakeArchive::Manifest(long_manifest("ui", 600))),
        ("d2exp.mpq", FakeArchive::Manifest(long_manifest("ui", 20))),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let chunked = FakeOpener {
        archives: archives.clone(),
        step: 4096,
    };
    let trickle = FakeOpener { archives, step: 1 };
    let dir = fake_dir(&chunked);

    let (expected, _) = IndexBuilder::with_opener(chunked).build(dir.path()).unwrap();
    let (actual, report) = IndexBuilder::with_opener(trickle).build(dir.path()).unwrap();

    assert_eq!(actual, expected);
    assert_eq!(actual.len(), 600);
    assert_eq!(report.entry_count(), 620);
    assert_eq!(actual.lookup("data\\global\\ui\\file00000.dc6"), Some("d2data"));
}

#[test]
fn failed_manifest_read_skips_archive() {
    let opener = FakeOpener {
        archives: [
            (
                "a.mpq".to_string(),
                FakeArchive::FailsAfter(long_manifest("a", 1000), 5000),
            ),
            (
                "b.mpq".to_string(),
                FakeArchive::Manifest(b"data\\b.txt".to_vec()),
            ),
            ("c.mpq".to_string(), FakeArchive::NoManifest),
            ("d.mpq".to_string(), FakeArchive::Corrupt),
        ]
        .into_iter()
        .collect(),
        step: 4096,
    };
    let dir = fake_dir(&opener);

    let (index, report) = IndexBuilder::with_opener(opener).build(dir.path()).unwrap();

    assert_eq!(index.entries(), mapping(&[("data\\b.txt", "b")]));
    let statuses: HashMap<&str, &ArchiveStatus> = report
        .archives
        .iter()
        .map(|a| (a.archive_id.as_str(), &a.status))
        .collect();
    assert!(matches!(
        statuses["a"],
        ArchiveStatus::ManifestUnreadable { .. }
    ));
    assert_eq!(statuses["c"], &ArchiveStatus::ManifestMissing);
    assert!(matches!(statuses["d"], ArchiveStatus::OpenFailed { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever the manifests contain, each asset maps to the archive that
    /// comes first in lexicographic order among those listing it.
    #[test]
    fn smallest_archive_name_wins(
        manifests in proptest::collection::btree_map(
            "[a-e][a-z0-9_]{0,6}",
            proptest::collection::vec("[a-d]\\\\[a-d]\\.dc6", 0..6),
            0..6,
        ),
        step in 1usize..64,
    ) {
        let opener = FakeOpener {
            archives: manifests
                .iter()
                .map(|(name, lines)| {
                    (format!("{name}.mpq"), FakeArchive::Manifest(lines.join("\r\n").into_bytes()))
                })
                .collect(),
            step,
        };
        let dir = fake_dir(&opener);

        let (index, _) = IndexBuilder::with_opener(opener).build(dir.path()).unwrap();

        let mut expected = HashMap::new();
        for (name, lines) in manifests.iter().rev() {
            for line in lines {
                expected.insert(line.clone(), name.clone());
            }
        }
        prop_assert_eq!(index.entries(), expected);
    }
}
