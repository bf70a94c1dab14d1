use std::{fs, io::Cursor};

use binrw::BinWrite;
use df_wld::{error::Result, WldHeader, WoodsFile, MAP_HEIGHT, MAP_WIDTH, TERRAIN_TYPES_SIZE};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use tracing_test::traced_test;

/// A complete map where elevation is `(x + y) % 256` and every offset is its cell index
fn woods() -> Vec<u8> {
    let cells = MAP_WIDTH * MAP_HEIGHT;
    let terrain_types_offset = WldHeader::SIZE + cells * 4;
    let elevation_offset = terrain_types_offset + TERRAIN_TYPES_SIZE;

    let mut out = Cursor::new(Vec::new());
    WldHeader {
        offset_size: (cells * 4) as u32,
        width: MAP_WIDTH as u32,
        height: MAP_HEIGHT as u32,
        terrain_types_offset: terrain_types_offset as u32,
        elevation_offset: elevation_offset as u32,
        ..Default::default()
    }
    .write(&mut out)
    .unwrap();

    let mut data = out.into_inner();
    for i in 0..cells as u32 {
        data.extend(i.to_le_bytes());
    }
    data.extend((0..TERRAIN_TYPES_SIZE).map(|i| i as u8));
    for y in 0..MAP_HEIGHT {
        for x in 0..MAP_WIDTH {
            data.push(((x + y) % 256) as u8);
        }
    }
    data
}

#[traced_test]
#[test]
fn cells_and_tables() -> Result<()> {
    let map = WoodsFile::from_bytes(&woods())?;

    assert_eq!((map.width(), map.height()), (1000, 500));
    assert_eq!(map.height_at(3, 4)?, 7);
    assert_eq!(map.height_at(999, 499)?, ((999 + 499) % 256) as u8);
    assert_eq!(map.offset_at(10, 2)?, 2010);
    assert_eq!(map.terrain_types()[255], 255);
    assert_eq!(map.elevation().len(), MAP_WIDTH * MAP_HEIGHT);
    assert!(map.height_at(1000, 0).is_err());
    assert!(map.offset_at(0, 500).is_err());
    assert!(logs_contain("read heightmap"));

    Ok(())
}

#[traced_test]
#[test]
fn windows_clamp_at_the_edges() -> Result<()> {
    let map = WoodsFile::from_bytes(&woods())?;

    assert_eq!(map.elevation_window(0, 0, 2), vec![0, 1, 1, 2]);

    let corner = map.elevation_window(998, 498, 3);
    let edge = |x: usize, y: usize| ((x + y) % 256) as u8;
    #[rustfmt::skip]
    let expected = vec![
        edge(998, 498), edge(999, 498), edge(999, 498),
        edge(998, 499), edge(999, 499), edge(999, 499),
        edge(998, 499), edge(999, 499), edge(999, 499),
    ];
    assert_eq!(corner, expected);

    Ok(())
}

#[traced_test]
#[test]
fn open_from_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("WOODS.WLD");
    fs::write(&path, woods())?;

    let map = WoodsFile::open(&path)?;
    assert_eq!(map.height_at(500, 250)?, (750 % 256) as u8);

    let result = WoodsFile::open(dir.path().join("WOODS.DAT"));
    assert!(result.is_err());

    Ok(())
}
