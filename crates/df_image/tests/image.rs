use std::fs;

use df_image::{
    error::Result, CifRciFile, ImageSource, ImgFile, Palette, PixelFormat, Size, TextureFile,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use tracing_test::traced_test;

fn sizes(source: &impl ImageSource) -> Result<Vec<(Size, usize)>> {
    (0..source.record_count())
        .map(|r| Ok((source.size(r)?, source.frame_count(r)?)))
        .collect()
}

#[traced_test]
#[test]
fn open_files_from_disk() -> Result<()> {
    let dir = tempdir()?;

    #[rustfmt::skip]
    let img = [
        0x00, 0x00, 0x00, 0x00, // offsets
        0x02, 0x00, 0x01, 0x00, // 2x1
        0x02, 0x00, 0x02, 0x00, // classic rle, 2 bytes
        0x81, 0x2A,
    ];
    let img_path = dir.path().join("BUTN01I0.IMG");
    fs::write(&img_path, img)?;

    let mut pal = vec![0u8; 768];
    pal[42 * 3..42 * 3 + 3].copy_from_slice(&[200, 100, 50]);
    let pal_path = dir.path().join("PAL.PAL");
    fs::write(&pal_path, pal)?;

    let image = ImgFile::open(&img_path)?;
    let palette = Palette::open(&pal_path)?;

    assert_eq!(sizes(&image)?, vec![(Size::new(2, 1), 1)]);

    let rgb = image.get_frame(0, 0)?.to_rgb(&palette);
    assert_eq!(rgb.format, PixelFormat::Rgb);
    assert_eq!(rgb.pixels, vec![200, 100, 50, 200, 100, 50]);

    Ok(())
}

#[traced_test]
#[test]
fn rci_on_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("MPOP.RCI");
    fs::write(&path, vec![1u8; 17 * 17 * 2])?;

    let file = CifRciFile::open(&path)?;
    assert_eq!(sizes(&file)?, vec![(Size::new(17, 17), 2)]);
    assert_eq!(file.frames(0)?.len(), 2);

    Ok(())
}

#[traced_test]
#[test]
fn solid_color_archive_on_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("TEXTURE.001");

    let mut data = 2i16.to_le_bytes().to_vec();
    data.extend([0u8; 24]);
    fs::write(&path, data)?;

    let textures = TextureFile::open(&path)?;
    assert_eq!(
        sizes(&textures)?,
        vec![(Size::new(32, 32), 1), (Size::new(32, 32), 1)]
    );
    assert_eq!(textures.get_frame(1, 0)?.index_at(31, 31), Some(1));

    Ok(())
}

#[test]
fn unsupported_texture_files_never_reach_the_disk() {
    let dir = tempdir().unwrap();

    for name in ["TEXTURE.215", "TEXTURE.217", "TEXTURE.436", "TEXTURE.ABC"] {
        let result = TextureFile::open(dir.path().join(name));
        assert!(result.unwrap_err().is_invalid_filename(), "{name}");
    }
}
