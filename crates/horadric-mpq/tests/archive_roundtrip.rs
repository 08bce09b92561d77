//! Archives written by the builder read back through the public API

#![allow(clippy::unwrap_used)]

use horadric_mpq::{
    Archive, ArchiveBuilder, BlockFlags, Compression, FileOptions, MpqError, LISTFILE_NAME,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::{Cursor, Read};

fn open(builder: &ArchiveBuilder) -> Archive<Cursor<Vec<u8>>> {
    Archive::from_reader(Cursor::new(builder.build().unwrap())).unwrap()
}

fn text_file(size: usize) -> Vec<u8> {
    b"Name\tId\tAct\tLayer\r\n"
        .iter()
        .copied()
        .cycle()
        .take(size)
        .collect()
}

#[test]
fn multi_sector_compressed_file() {
    let data = text_file(20_000);
    let mut builder = ArchiveBuilder::new();
    builder.add_file_with("data\\global\\excel\\levels.txt", data.clone(), FileOptions::compressed());
    let mut archive = open(&builder);

    let block = *archive.find_block("data\\global\\excel\\levels.txt").unwrap();
    assert!(block.flags.contains(BlockFlags::COMPRESS));
    assert!(block.compressed_size < block.file_size);
    assert_eq!(archive.read_file("data\\global\\excel\\levels.txt").unwrap(), data);
}

#[test]
fn pkware_files() {
    let data = text_file(10_000);
    let mut builder = ArchiveBuilder::new();
    builder.add_file_with("imploded.txt", data.clone(), FileOptions::imploded());
    builder.add_file_with("pkware.txt", data.clone(), FileOptions::pkware());
    builder.add_file_with(
        "sealed.txt",
        data.clone(),
        FileOptions::imploded().single_unit().encrypted(true),
    );
    let mut archive = open(&builder);

    let block = *archive.find_block("imploded.txt").unwrap();
    assert!(block.flags.contains(BlockFlags::IMPLODE));
    assert!(block.compressed_size < block.file_size);

    for name in ["imploded.txt", "pkware.txt", "sealed.txt"] {
        assert_eq!(archive.read_file(name).unwrap(), data, "{name}");
    }
}

#[test]
fn imploded_listfile() {
    let names: Vec<String> = (0..200)
        .map(|i| format!("data\\global\\ui\\FrontEnd\\frame{i:03}.dc6"))
        .collect();
    let mut builder = ArchiveBuilder::new().with_listfile_options(FileOptions::imploded());
    for name in &names {
        builder.add_file(name.as_str(), vec![0]);
    }
    let mut archive = open(&builder);

    let listfile = *archive.find_block(LISTFILE_NAME).unwrap();
    assert!(listfile.flags.contains(BlockFlags::IMPLODE));
    assert!(listfile.compressed_size < listfile.file_size);
    assert_eq!(archive.list_files().unwrap(), names);
}

#[test]
fn encrypted_files() {
    let data = text_file(9_000);
    let mut builder = ArchiveBuilder::new();
    builder.add_file_with("plain\\enc.txt", data.clone(), FileOptions::default().encrypted(false));
    builder.add_file_with("fixed\\enc.txt", data.clone(), FileOptions::default().encrypted(true));
    builder.add_file_with(
        "zipped\\enc.txt",
        data.clone(),
        FileOptions::compressed().encrypted(true),
    );
    let mut archive = open(&builder);

    for name in ["plain\\enc.txt", "fixed\\enc.txt", "zipped\\enc.txt"] {
        let block = *archive.find_block(name).unwrap();
        assert!(block.flags.contains(BlockFlags::ENCRYPTED), "{name}");
        assert_eq!(archive.read_file(name).unwrap(), data, "{name}");
    }

    let fixed = archive.find_block("fixed\\enc.txt").unwrap();
    assert!(fixed.flags.contains(BlockFlags::FIX_KEY));
}

#[test]
fn single_unit_files() {
    let data = text_file(6_000);
    let mut builder = ArchiveBuilder::new();
    builder.add_file_with("raw.bin", data.clone(), FileOptions::default().single_unit());
    builder.add_file_with(
        "packed.bin",
        data.clone(),
        FileOptions::compressed().single_unit().encrypted(true),
    );
    let mut archive = open(&builder);

    assert_eq!(archive.read_file("raw.bin").unwrap(), data);
    assert_eq!(archive.read_file("packed.bin").unwrap(), data);
}

#[test]
fn empty_files() {
    let mut builder = ArchiveBuilder::new();
    builder.add_file("empty.txt", Vec::new());
    builder.add_file_with("empty.z", Vec::new(), FileOptions::compressed());
    let mut archive = open(&builder);

    assert!(archive.read_file("empty.txt").unwrap().is_empty());
    assert!(archive.read_file("empty.z").unwrap().is_empty());
    assert!(archive.open_file("empty.z").unwrap().is_empty());
}

#[test]
fn small_sector_size() {
    let data = text_file(3_000);
    let mut builder = ArchiveBuilder::new().with_sector_size_shift(0);
    builder.add_file_with("small.txt", data.clone(), FileOptions::compressed());
    let mut archive = open(&builder);

    assert_eq!(archive.header().sector_size(), 512);
    assert_eq!(archive.read_file("small.txt").unwrap(), data);
}

#[test]
fn stream_reads_at_most_one_sector() {
    let data = text_file(10_000);
    let mut builder = ArchiveBuilder::new();
    builder.add_file_with("big.txt", data.clone(), FileOptions::compressed());
    let mut archive = open(&builder);

    let mut stream = archive.open_file("big.txt").unwrap();
    let mut buf = vec![0u8; 10_000];
    let first = stream.read(&mut buf).unwrap();
    assert_eq!(first, 4096);

    let mut collected = buf[..first].to_vec();
    let mut one = [0u8; 1];
    loop {
        let n = stream.read(&mut one).unwrap();
        if n == 0 {
            break;
        }
        collected.push(one[0]);
    }
    assert_eq!(collected, data);
}

#[test]
fn archive_behind_user_data_header() {
    let mut builder = ArchiveBuilder::new();
    builder.add_file("inner.txt", b"inside".to_vec());
    let inner = builder.build().unwrap();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MPQ\x1b");
    bytes.extend_from_slice(&0x200u32.to_le_bytes());
    bytes.extend_from_slice(&0x200u32.to_le_bytes());
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.resize(0x200, 0);
    bytes.extend(inner);

    let mut archive = Archive::from_reader(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.archive_offset(), 0x200);
    assert_eq!(archive.read_file("inner.txt").unwrap(), b"inside");
}

#[test]
fn archive_after_padding() {
    let mut builder = ArchiveBuilder::new();
    builder.add_file("late.txt", b"late".to_vec());

    let mut bytes = vec![0u8; 0x400];
    bytes.extend(builder.build().unwrap());

    let mut archive = Archive::from_reader(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.archive_offset(), 0x400);
    assert_eq!(archive.read_file("late.txt").unwrap(), b"late");
}

#[test]
fn truncated_archive_is_rejected() {
    let mut builder = ArchiveBuilder::new();
    builder.add_file("a.txt", text_file(5_000));
    let mut bytes = builder.build().unwrap();
    bytes.truncate(64);

    let result = Archive::from_reader(Cursor::new(bytes));
    assert!(result.is_err());
}

#[test]
fn missing_listfile_reports_not_found() {
    let mut builder = ArchiveBuilder::new().without_listfile();
    builder.add_file("a.txt", b"a".to_vec());
    let mut archive = open(&builder);

    let result = archive.list_files();
    assert!(matches!(result, Err(MpqError::FileNotFound(name)) if name == LISTFILE_NAME));
}

#[test]
fn unsupported_compression_is_reported() {
    let data = text_file(5_000);
    let mut builder = ArchiveBuilder::new().without_listfile();
    builder.add_file_with("a.txt", data, FileOptions::compressed().single_unit());
    let mut bytes = builder.build().unwrap();

    // First stored byte is the compression mask; switch zlib to Huffman
    assert_eq!(bytes[32], 0x02);
    bytes[32] = 0x01;

    let mut archive = Archive::from_reader(Cursor::new(bytes)).unwrap();
    let err = archive.read_file("a.txt").unwrap_err();
    assert!(matches!(err, MpqError::UnsupportedCompression(_)), "{err}");
}

#[test]
fn compression_default_is_none() {
    assert_eq!(FileOptions::default().compression, Compression::None);
}

proptest! {
    #[test]
    fn any_content_reads_back(
        data in proptest::collection::vec(any::<u8>(), 0..12_000),
        compressed in any::<bool>(),
        encrypted in any::<bool>(),
    ) {
        let mut options = if compressed { FileOptions::compressed() } else { FileOptions::default() };
        if encrypted {
            options = options.encrypted(true);
        }

        let mut builder = ArchiveBuilder::new();
        builder.add_file_with("data\\random.bin", data.clone(), options);
        let mut archive = open(&builder);

        prop_assert_eq!(archive.read_file("data\\random.bin").unwrap(), data);
    }
}
