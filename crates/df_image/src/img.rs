//! Single images (`.IMG`)
//!
//! Most files start with a 12 byte header. A handful of files have no header at all: their
//! dimensions are known only from their exact length, see [`HEADERLESS_SIZES`].

use std::{fs, path::Path};

use binrw::{BinRead, BinWrite};
use derive_more::derive::Display;
use df_bsa::{require_extension, RecordView};
use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    compression::{copy_rows, decode_classic_rle, decode_row_rle},
    error::{Error, Result},
    palette::{Palette, PAL_SIZE},
    types::{Frame, ImageRecord, ImageSource, Size},
};

/// Image header shared by IMG files and CIF records (12 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct ImgHeader {
    pub x_offset: i16,
    pub y_offset: i16,
    pub width: i16,
    pub height: i16,
    pub compression: u16,
    pub pixel_data_length: u16,
}

impl ImgHeader {
    pub const SIZE: usize = 12;

    pub fn size(&self) -> Result<Size> {
        if self.width < 0 || self.height < 0 {
            return Err(Error::mismatch(format!(
                "negative image size {}x{}",
                self.width, self.height
            )));
        }
        Ok(Size::new(self.width as usize, self.height as usize))
    }
}

/// Pixel encoding named by an image header
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Compression {
    Uncompressed,
    ClassicRle,
    RowRle,
    RowRleImage,
}

impl TryFrom<u16> for Compression {
    type Error = Error;

    fn try_from(tag: u16) -> Result<Self> {
        match tag {
            0x0000 => Ok(Compression::Uncompressed),
            0x0002 => Ok(Compression::ClassicRle),
            0x0108 => Ok(Compression::RowRle),
            0x1108 => Ok(Compression::RowRleImage),
            other => Err(Error::UnknownCompression(other)),
        }
    }
}

/// Headerless files by exact byte length: `(length, width, height)`
pub const HEADERLESS_SIZES: &[(usize, usize, usize)] = &[
    (720, 9, 80),
    (990, 45, 22),
    (1720, 43, 40),
    (2140, 107, 20),
    (2916, 81, 36),
    (3200, 40, 80),
    (3938, 179, 22),
    (4280, 107, 40),
    (4508, 322, 14),
    (20480, 320, 64),
    (26496, 184, 144),
    (64000, 320, 200),
    (64768, 320, 200),
    (68800, 320, 215),
    (112128, 512, 219),
];

/// Files with a 768 byte palette after their pixels, by file stem
pub const EMBEDDED_PALETTE_FILES: &[&str] =
    &["CHGN00I0", "DIE_00I0", "PICK02I0", "PICK03I0", "PRIS00I0", "TITLE"];

/// Length of the headerless full screen image that ends in a palette
const PALETTE_IMAGE_LENGTH: usize = 64768;

/// Dimensions of a headerless file of this length
pub fn headerless_size(len: usize) -> Option<Size> {
    HEADERLESS_SIZES
        .iter()
        .find(|(length, _, _)| *length == len)
        .map(|&(_, width, height)| Size::new(width, height))
}

fn file_stem(name: &str) -> String {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    file.split('.').next().unwrap_or(file).to_ascii_uppercase()
}

/// Decode pixels that follow an image header at the view's cursor.
///
/// `base` is the position row RLE offsets are measured from.
pub(crate) fn decode_pixels(
    view: &mut RecordView,
    header: &ImgHeader,
    base: usize,
) -> Result<Frame> {
    let Size { width, height } = header.size()?;
    let pixels = match Compression::try_from(header.compression)? {
        Compression::Uncompressed => copy_rows(view, width, height, width)?,
        Compression::ClassicRle => decode_classic_rle(view, width * height)?,
        Compression::RowRle | Compression::RowRleImage => {
            decode_row_rle(view, base, width, height)?
        }
    };
    Frame::indexed(width, height, pixels)
}

/// A decoded `.IMG` file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ImgFile {
    pub name: String,
    /// `None` for headerless files
    pub header: Option<ImgHeader>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub palette: Option<Palette>,
    record: ImageRecord,
}

impl ImgFile {
    /// Read and decode an image from disk; the name must end in `.IMG`
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        require_extension(path, "IMG")?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(&name, &fs::read(path)?)
    }

    /// Decode an image from memory. `name` decides whether a palette is embedded.
    #[instrument(skip(data), fields(len = data.len()), err)]
    pub fn from_bytes(name: &str, data: &[u8]) -> Result<Self> {
        let stem = file_stem(name);
        let embedded_palette = data.len() == PALETTE_IMAGE_LENGTH
            || EMBEDDED_PALETTE_FILES.contains(&stem.as_str());

        let mut view = RecordView::new(data);
        let (header, frame) = match headerless_size(data.len()) {
            Some(Size { width, height }) => {
                debug!(width, height, "headerless image");
                let pixels = copy_rows(&mut view, width, height, width)?;
                (None, Frame::indexed(width, height, pixels)?)
            }
            None => {
                let header = view.read_binrw::<ImgHeader>()?;
                let frame = decode_pixels(&mut view, &header, 0)?;
                (Some(header), frame)
            }
        };

        let palette = if embedded_palette {
            let start = data.len().checked_sub(PAL_SIZE).ok_or_else(|| {
                Error::mismatch(format!("{name} is too short for an embedded palette"))
            })?;
            Some(Palette::from_pal(&data[start..])?)
        } else {
            None
        };

        let (x_offset, y_offset) = header.map_or((0, 0), |h| (h.x_offset, h.y_offset));
        Ok(Self {
            name: name.to_owned(),
            header,
            palette,
            record: ImageRecord::single(x_offset, y_offset, frame),
        })
    }

    pub fn frame(&self) -> &Frame {
        &self.record.frames[0]
    }

    pub fn record(&self) -> &ImageRecord {
        &self.record
    }
}

impl ImageSource for ImgFile {
    fn record_count(&self) -> usize {
        1
    }

    fn frame_count(&self, record: usize) -> Result<usize> {
        match record {
            0 => Ok(1),
            _ => Err(Error::record_not_found(record)),
        }
    }

    fn size(&self, record: usize) -> Result<Size> {
        self.frame_count(record)?;
        Ok(self.record.size())
    }

    fn get_frame(&self, record: usize, frame: usize) -> Result<Frame> {
        self.frame_count(record)?;
        self.record.frame(record, frame)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::io::Cursor;

    use binrw::BinWrite;
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::img::{headerless_size, ImgFile, ImgHeader};
    use crate::palette::Palette;
    use crate::types::{ImageSource, Size};

    pub(crate) fn img_bytes(header: ImgHeader, body: &[u8]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        header.write(&mut out).unwrap();
        let mut data = out.into_inner();
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn uncompressed_image() -> Result<()> {
        let header = ImgHeader {
            x_offset: 4,
            y_offset: -2,
            width: 3,
            height: 2,
            compression: 0,
            pixel_data_length: 6,
        };
        let img = ImgFile::from_bytes("GRID00I0.IMG", &img_bytes(header, &[1, 2, 3, 4, 5, 6]))?;

        assert_eq!(img.header, Some(header));
        assert_eq!(img.frame().pixels, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(img.record().x_offset, 4);
        assert_eq!(img.size(0)?, Size::new(3, 2));
        assert!(img.palette.is_none());
        assert!(matches!(img.get_frame(0, 1), Err(Error::FrameNotFound { .. })));

        Ok(())
    }

    #[test]
    fn zero_width_image_expands_to_empty_rgb() -> Result<()> {
        let header = ImgHeader {
            width: 0,
            height: 4,
            pixel_data_length: 16,
            ..Default::default()
        };
        let img = ImgFile::from_bytes("ZERO.IMG", &img_bytes(header, &[0; 16]))?;

        let rgb = img.get_frame(0, 0)?.to_rgb(&Palette::default());
        assert_eq!(rgb.size(), Size::new(0, 4));
        assert!(rgb.pixels.is_empty());

        Ok(())
    }

    #[test]
    fn classic_rle_image() -> Result<()> {
        let header = ImgHeader {
            width: 4,
            height: 1,
            compression: 0x0002,
            pixel_data_length: 2,
            ..Default::default()
        };
        let img = ImgFile::from_bytes("BUTN00I0.IMG", &img_bytes(header, &[0x83, 0x09]))?;

        assert_eq!(img.frame().pixels, vec![9; 4]);
        Ok(())
    }

    #[test]
    fn row_rle_offsets_start_at_file_start() -> Result<()> {
        let header = ImgHeader {
            width: 2,
            height: 1,
            compression: 0x1108,
            ..Default::default()
        };
        #[rustfmt::skip]
        let body = [
            0x10, 0x00, 0x00, 0x80,
            0xFE, 0xFF, 0x05,
        ];
        let img = ImgFile::from_bytes("MAP100I0.IMG", &img_bytes(header, &body))?;

        assert_eq!(img.frame().pixels, vec![5, 5]);
        Ok(())
    }

    #[test]
    fn unknown_compression() {
        let header = ImgHeader {
            width: 1,
            height: 1,
            compression: 0x0007,
            ..Default::default()
        };
        let result = ImgFile::from_bytes("ODD.IMG", &img_bytes(header, &[0]));
        assert!(matches!(result, Err(Error::UnknownCompression(7))));
    }

    #[test]
    fn headerless_by_length() -> Result<()> {
        assert_eq!(headerless_size(720), Some(Size::new(9, 80)));
        assert_eq!(headerless_size(721), None);

        let img = ImgFile::from_bytes("NOTE.IMG", &vec![3; 990])?;
        assert_eq!(img.header, None);
        assert_eq!(img.size(0)?, Size::new(45, 22));
        Ok(())
    }

    #[test]
    fn title_image_carries_a_palette() -> Result<()> {
        let mut data = vec![1u8; 64000];
        data.extend((0..768).map(|i| (i / 3) as u8));

        let img = ImgFile::from_bytes("TITLE.IMG", &data)?;
        let palette = img.palette.as_ref().unwrap();

        assert_eq!(img.size(0)?, Size::new(320, 200));
        assert_eq!(palette.color(10), [10, 10, 10]);
        Ok(())
    }

    #[test]
    fn named_palette_files_with_headers() -> Result<()> {
        let header = ImgHeader {
            width: 1,
            height: 1,
            ..Default::default()
        };
        let mut body = vec![0x42];
        body.extend(vec![0u8; 768]);

        let img = ImgFile::from_bytes("pick02i0.img", &img_bytes(header, &body))?;
        assert!(img.palette.is_some());
        assert_eq!(img.frame().pixels, vec![0x42]);
        Ok(())
    }

    #[test]
    fn img_extension_is_required() {
        let result = ImgFile::open("TITLE.CIF");
        assert!(result.unwrap_err().is_invalid_filename());
    }
}
