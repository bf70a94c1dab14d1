use std::io::{Cursor, Read, Write};

use binrw::BinWrite;
use df_bsa::{
    error::{Error, Result},
    types::{BsaHeader, BsaNameEntry, BsaNumberEntry, DirectoryType, HEADER_SIZE},
    BsaArchive, BsaOptions,
};
use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;

fn name_keyed(records: &[(&str, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    BsaHeader {
        records: records.len() as i16,
        directory_type: DirectoryType::NameRecord.tag(),
        reserved: 0,
    }
    .write(&mut out)?;

    for (_, data) in records {
        out.write_all(data)?;
    }
    for (name, data) in records {
        BsaNameEntry::new(name, data.len() as u32).write(&mut out)?;
    }

    Ok(out.into_inner())
}

fn number_keyed(records: &[(u32, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    BsaHeader {
        records: records.len() as i16,
        directory_type: DirectoryType::NumberRecord.tag(),
        reserved: 0,
    }
    .write(&mut out)?;

    for (_, data) in records {
        out.write_all(data)?;
    }
    for (id, data) in records {
        BsaNumberEntry {
            id: *id,
            size: data.len() as u32,
        }
        .write(&mut out)?;
    }

    Ok(out.into_inner())
}

fn sample_records() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("A.RMB", vec![0x11; 300]),
        ("B.RDI", (0..=255u8).cycle().take(512).collect()),
        ("EMPTY.TXT", Vec::new()),
        ("C.RDB", vec![0x7F; 33]),
    ]
}

#[traced_test]
#[test]
fn record_sizes_account_for_whole_file() -> Result<()> {
    let bytes = name_keyed(&sample_records())?;
    let file_len = bytes.len() as u64;

    let archive = BsaArchive::new(Cursor::new(bytes))?;
    let count = archive.len() as u64;
    let total: u64 = (0..archive.len())
        .map(|i| archive.record_length(i))
        .sum::<Result<u64>>()?;

    info!(total, count, file_len, "checking sizes");
    assert_eq!(
        total + HEADER_SIZE + DirectoryType::NameRecord.entry_size() * count,
        file_len
    );
    assert_eq!(archive.records_size(), total);

    Ok(())
}

#[traced_test]
#[test]
fn records_are_read_back_in_directory_order() -> Result<()> {
    let records = sample_records();
    let mut archive = BsaArchive::new(Cursor::new(name_keyed(&records)?))?;

    assert_eq!(
        archive.record_names().collect::<Vec<_>>(),
        vec!["A.RMB", "B.RDI", "EMPTY.TXT", "C.RDB"]
    );

    let mut expected_offset = HEADER_SIZE;
    for (i, (name, data)) in records.iter().enumerate() {
        assert_eq!(archive.record_offset(i)?, expected_offset);
        assert_eq!(archive.record_bytes_by_name(name)?, *data);
        expected_offset += data.len() as u64;
    }

    let mut streamed = Vec::new();
    archive.by_name("b.rdi")?.read_to_end(&mut streamed)?;
    assert_eq!(streamed, records[1].1);

    Ok(())
}

#[traced_test]
#[test]
fn duplicate_names_resolve_to_first_record() -> Result<()> {
    let records = vec![("DUP.RMB", vec![1, 2]), ("DUP.RMB", vec![3, 4, 5])];
    let archive = BsaArchive::new(Cursor::new(name_keyed(&records)?))?;

    assert_eq!(archive.len(), 2);
    assert_eq!(archive.index_for_name("dup.rmb"), Some(0));

    Ok(())
}

#[traced_test]
#[test]
fn number_keyed_archives_expose_ids() -> Result<()> {
    let records = vec![(7u32, vec![1, 2, 3]), (400_000, vec![4])];
    let mut archive = BsaArchive::new(Cursor::new(number_keyed(&records)?))?;

    assert_eq!(archive.directory_type(), DirectoryType::NumberRecord);
    assert_eq!(archive.record_name(1)?, "400000");
    assert_eq!(archive.record_id(0)?, Some(7));
    assert_eq!(archive.index_for_name("400000"), Some(1));
    assert_eq!(archive.record_bytes(1)?, vec![4]);

    Ok(())
}

#[traced_test]
#[test]
fn open_requires_bsa_suffix() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("BLOCKS.DAT");
    std::fs::write(&path, name_keyed(&sample_records())?)?;

    let result = BsaArchive::open(&path, BsaOptions::default());
    assert!(matches!(result, Err(Error::InvalidFilename(_))));

    let renamed = dir.path().join("blocks.bsa");
    std::fs::rename(&path, &renamed)?;
    let archive = BsaArchive::open(&renamed, BsaOptions::default())?;
    assert_eq!(archive.len(), 4);

    Ok(())
}

#[traced_test]
#[test]
fn rewrite_record_in_place() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("MAPS.BSA");
    let original = name_keyed(&sample_records())?;
    std::fs::write(&path, &original)?;

    {
        let mut archive = BsaArchive::open(&path, BsaOptions::builder().writable(true).build())?;
        assert!(archive.is_writable());
        archive.rewrite_record(3, &[0x01; 33])?;
        assert_eq!(archive.record_bytes(3)?, vec![0x01; 33]);
    }

    let mut reopened = BsaArchive::open(&path, BsaOptions::default())?;
    assert_eq!(reopened.record_bytes(3)?, vec![0x01; 33]);
    assert_eq!(reopened.record_bytes(0)?, vec![0x11; 300]);
    assert_eq!(std::fs::metadata(&path)?.len(), original.len() as u64);

    Ok(())
}

#[traced_test]
#[test]
fn truncated_archive_reports_end_of_data() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("MAPS.BSA");
    std::fs::write(&path, name_keyed(&sample_records())?)?;

    let mut archive = BsaArchive::open(&path, BsaOptions::default())?;
    let offset = archive.record_offset(1)?;
    std::fs::OpenOptions::new()
        .write(true)
        .open(&path)?
        .set_len(offset + 100)?;

    assert_eq!(archive.record_bytes(0)?, vec![0x11; 300]);
    assert!(matches!(
        archive.record_bytes(1),
        Err(Error::UnexpectedEndOfData {
            needed: 512,
            available: 100,
            ..
        })
    ));

    Ok(())
}

#[traced_test]
#[test]
fn rewrite_record_rejects_length_changes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("MAPS.BSA");
    std::fs::write(&path, name_keyed(&sample_records())?)?;

    let mut archive = BsaArchive::open(&path, BsaOptions::builder().writable(true).build())?;
    let result = archive.rewrite_record(0, &[0x00; 299]);

    assert!(matches!(
        result,
        Err(Error::LengthMismatch {
            index: 0,
            expected: 300,
            actual: 299
        })
    ));
    assert_eq!(archive.record_bytes(0)?, vec![0x11; 300]);

    Ok(())
}

#[traced_test]
#[test]
fn rewrite_record_requires_writable_archive() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("MAPS.BSA");
    std::fs::write(&path, name_keyed(&sample_records())?)?;

    let mut archive = BsaArchive::open(&path, BsaOptions::default())?;
    assert!(!archive.is_writable());
    assert!(matches!(
        archive.rewrite_record(0, &[0x00; 300]),
        Err(Error::ReadOnly)
    ));

    Ok(())
}
