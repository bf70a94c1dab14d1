//! Texture archives (`TEXTURE.NNN`)
//!
//! A texture archive holds many records, each one image or a short animation.
//!
//! | Offset (bytes) | Field        | Description                                       |
//! |----------------|--------------|---------------------------------------------------|
//! | 0x0000         | Record Count | 2 bytes                                           |
//! | 0x0002         | Name         | 24 bytes: null padded archive description         |
//! | 0x001A         | Directory    | 20 bytes per record, see [`TextureDirectoryEntry`] |
//!
//! Each directory entry points at a 28 byte [`TextureRecordHeader`]. Pixel data starts
//! `data_offset` bytes after that header's position. A single frame record is stored as rows
//! 256 bytes apart, as row RLE or as classic RLE. A record with several frames starts with a
//! table of `u32` frame offsets, each frame delta encoded.
//!
//! Archives `000` and `001` hold no pixels: every record is a 32x32 swatch of palette index
//! equal to the record number.

use std::{fs, path::Path};

use binrw::{BinRead, BinWrite};
use df_bsa::RecordView;
use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    compression::{copy_rows, decode_classic_rle, decode_delta, decode_row_rle},
    error::{Error, Result},
    img::Compression,
    types::{Frame, ImageSource, Size},
};

/// Archive indices with no decodable layout
pub const UNSUPPORTED_ARCHIVES: [u16; 3] = [215, 217, 436];

/// Archive indices holding solid colour swatches
pub const SOLID_COLOR_ARCHIVES: [u16; 2] = [0, 1];

/// Side of a solid colour swatch
pub const SOLID_COLOR_SIZE: usize = 32;

/// Distance between rows of an uncompressed texture
pub const TEXTURE_ROW_STRIDE: usize = 256;

const NAME_WIDTH: usize = 24;

/// Record count and archive name ahead of the directory
pub const HEADER_SIZE: usize = 2 + NAME_WIDTH;

/// Archive index of a `TEXTURE.NNN` file name
pub fn archive_index(name: &str) -> Option<u16> {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, digits) = file.split_once('.')?;

    if !stem.eq_ignore_ascii_case("TEXTURE")
        || digits.len() != 3
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// Check a texture file name, rejecting malformed names and unsupported archives
pub fn validate_name(name: &str) -> Result<u16> {
    match archive_index(name) {
        Some(index) if !UNSUPPORTED_ARCHIVES.contains(&index) => Ok(index),
        _ => Err(Error::invalid_filename(name)),
    }
}

/// Directory entry (20 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct TextureDirectoryEntry {
    pub type1: u16,
    pub offset: i32,
    pub type2: u16,
    pub reserved: u32,
    pub null: u64,
}

impl TextureDirectoryEntry {
    pub const SIZE: usize = 20;
}

/// Record header (28 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct TextureRecordHeader {
    pub x_offset: i16,
    pub y_offset: i16,
    pub width: i16,
    pub height: i16,
    pub compression: u16,
    pub record_size: u32,
    pub data_offset: u32,
    pub is_normal: u16,
    pub frame_count: u16,
    pub reserved: i16,
    pub x_scale: i16,
    pub y_scale: i16,
}

impl TextureRecordHeader {
    pub const SIZE: usize = 28;
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TextureRecord {
    /// Position of the record header within the file
    pub offset: usize,
    pub header: TextureRecordHeader,
    pub size: Size,
}

/// A texture archive held in memory, decoded one frame at a time
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TextureFile {
    pub archive: u16,
    pub name: String,
    record_count: usize,
    records: Vec<TextureRecord>,
    #[cfg_attr(feature = "serde", serde(skip))]
    data: Vec<u8>,
}

impl TextureFile {
    /// Open a texture archive. The name is checked before the file is touched.
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        validate_name(&file_name)?;

        Self::from_bytes(&file_name, fs::read(path)?)
    }

    #[instrument(skip(data), fields(len = data.len()), err)]
    pub fn from_bytes(file_name: &str, data: Vec<u8>) -> Result<Self> {
        let archive = validate_name(file_name)?;

        let mut view = RecordView::new(&data);
        let count = view.read_i16()?;
        if count < 0 {
            return Err(Error::mismatch(format!("negative record count {count}")));
        }
        let record_count = count as usize;
        let name = view.read_fixed_string(NAME_WIDTH)?;

        let records = if SOLID_COLOR_ARCHIVES.contains(&archive) {
            Vec::new()
        } else {
            let mut records = Vec::with_capacity(record_count);
            for _ in 0..record_count {
                let entry = view.read_binrw::<TextureDirectoryEntry>()?;
                records.push(read_record_header(&data, entry.offset)?);
            }
            records
        };
        debug!(archive, records = record_count, %name, "opened texture archive");

        Ok(Self {
            archive,
            name,
            record_count,
            records,
            data,
        })
    }

    pub fn is_solid_color(&self) -> bool {
        SOLID_COLOR_ARCHIVES.contains(&self.archive)
    }

    /// Header of a stored record; solid colour archives have none
    pub fn record(&self, record: usize) -> Result<&TextureRecord> {
        self.records
            .get(record)
            .ok_or_else(|| Error::record_not_found(record))
    }

    fn check_record(&self, record: usize) -> Result<()> {
        if record >= self.record_count {
            return Err(Error::record_not_found(record));
        }
        Ok(())
    }

    fn decode_frame(&self, record: &TextureRecord, index: usize, frame: usize) -> Result<Frame> {
        let Size { width, height } = record.size;
        let frame_count = record.header.frame_count.max(1) as usize;
        if frame >= frame_count {
            return Err(Error::FrameNotFound {
                record: index,
                frame,
                count: frame_count,
            });
        }

        let mut view = RecordView::new(&self.data);
        let data_start = record.offset + record.header.data_offset as usize;
        view.seek(data_start)?;

        let pixels = if frame_count > 1 {
            view.skip(frame * 4)?;
            let offset = view.read_u32()? as usize;
            view.seek(data_start + offset)?;
            decode_delta(&mut view, width, height)?
        } else {
            match Compression::try_from(record.header.compression)? {
                Compression::Uncompressed => {
                    copy_rows(&mut view, width, height, TEXTURE_ROW_STRIDE)?
                }
                Compression::RowRle | Compression::RowRleImage => {
                    decode_row_rle(&mut view, record.offset, width, height)?
                }
                Compression::ClassicRle => decode_classic_rle(&mut view, width * height)?,
            }
        };

        Frame::indexed(width, height, pixels)
    }
}

fn read_record_header(data: &[u8], offset: i32) -> Result<TextureRecord> {
    let offset = usize::try_from(offset)
        .map_err(|_| Error::mismatch(format!("negative record offset {offset}")))?;

    let mut view = RecordView::new(data);
    view.seek(offset)?;
    let header = view.read_binrw::<TextureRecordHeader>()?;

    if header.width < 0 || header.height < 0 {
        return Err(Error::mismatch(format!(
            "negative texture size {}x{}",
            header.width, header.height
        )));
    }

    Ok(TextureRecord {
        offset,
        header,
        size: Size::new(header.width as usize, header.height as usize),
    })
}

impl ImageSource for TextureFile {
    fn record_count(&self) -> usize {
        self.record_count
    }

    fn frame_count(&self, record: usize) -> Result<usize> {
        self.check_record(record)?;
        if self.is_solid_color() {
            return Ok(1);
        }
        Ok(self.record(record)?.header.frame_count.max(1) as usize)
    }

    fn size(&self, record: usize) -> Result<Size> {
        self.check_record(record)?;
        if self.is_solid_color() {
            return Ok(Size::new(SOLID_COLOR_SIZE, SOLID_COLOR_SIZE));
        }
        Ok(self.record(record)?.size)
    }

    fn get_frame(&self, record: usize, frame: usize) -> Result<Frame> {
        self.check_record(record)?;

        if self.is_solid_color() {
            if frame != 0 {
                return Err(Error::FrameNotFound {
                    record,
                    frame,
                    count: 1,
                });
            }
            // the swatch colour is the record's palette index
            let index = u8::try_from(record).map_err(|_| {
                Error::mismatch(format!("solid colour record {record} has no palette index"))
            })?;
            return Ok(Frame::solid(SOLID_COLOR_SIZE, SOLID_COLOR_SIZE, index));
        }

        self.decode_frame(self.record(record)?, record, frame)
    }
}
