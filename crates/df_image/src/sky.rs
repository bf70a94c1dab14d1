//! Full screen sky animations (`SKYNN.DAT`)
//!
//! | Section     | Size                | Description                             |
//! |-------------|---------------------|-----------------------------------------|
//! | Palettes    | 32 x 776 bytes      | one `.COL` style palette per time step  |
//! | Colour maps | 32 x 16384 bytes    | shading tables, one per palette         |
//! | Frames      | 64 x 512 x 220      | uncompressed, east half then west half  |
//!
//! Record 0 is the eastern sky (frames 0 to 31), record 1 the western sky (frames 32 to 63).

use std::{fs, path::Path};

use df_bsa::RecordView;
use tracing::instrument;

use crate::{
    compression::copy_rows,
    error::{Error, Result},
    palette::{Palette, COL_SIZE},
    types::{Frame, ImageSource, Size},
};

pub const SKY_PALETTES: usize = 32;
pub const SKY_COLOR_MAP_SIZE: usize = 16384;
pub const SKY_FRAMES_PER_RECORD: usize = 32;
pub const SKY_RECORDS: usize = 2;
pub const SKY_WIDTH: usize = 512;
pub const SKY_HEIGHT: usize = 220;

const FRAME_SIZE: usize = SKY_WIDTH * SKY_HEIGHT;
const COLOR_MAPS_START: usize = SKY_PALETTES * COL_SIZE;
const FRAMES_START: usize = COLOR_MAPS_START + SKY_PALETTES * SKY_COLOR_MAP_SIZE;

/// Bytes in a complete sky file
pub const SKY_FILE_SIZE: usize = FRAMES_START + SKY_RECORDS * SKY_FRAMES_PER_RECORD * FRAME_SIZE;

/// Sky index of a `SKYNN.DAT` file name
pub fn sky_index(name: &str) -> Option<u8> {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, extension) = file.split_once('.')?;
    let digits = stem.get(3..)?;

    if !stem.get(..3)?.eq_ignore_ascii_case("SKY")
        || !extension.eq_ignore_ascii_case("DAT")
        || digits.len() != 2
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkyFile {
    pub index: u8,
    palettes: Vec<Palette>,
    data: Vec<u8>,
}

impl SkyFile {
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        sky_index(&file_name).ok_or_else(|| Error::invalid_filename(&file_name))?;

        Self::from_bytes(&file_name, fs::read(path)?)
    }

    #[instrument(skip(data), fields(len = data.len()), err)]
    pub fn from_bytes(file_name: &str, data: Vec<u8>) -> Result<Self> {
        let index = sky_index(file_name).ok_or_else(|| Error::invalid_filename(file_name))?;

        if data.len() < SKY_FILE_SIZE {
            return Err(df_bsa::error::Error::UnexpectedEndOfData {
                position: 0,
                needed: SKY_FILE_SIZE,
                available: data.len(),
            }
            .into());
        }

        let palettes = data[..COLOR_MAPS_START]
            .chunks_exact(COL_SIZE)
            .map(Palette::from_col)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            index,
            palettes,
            data,
        })
    }

    fn check_frame(frame: usize) -> Result<()> {
        let count = SKY_RECORDS * SKY_FRAMES_PER_RECORD;
        if frame >= count {
            return Err(Error::FrameNotFound {
                record: frame / SKY_FRAMES_PER_RECORD,
                frame: frame % SKY_FRAMES_PER_RECORD,
                count: SKY_FRAMES_PER_RECORD,
            });
        }
        Ok(())
    }

    /// Palette for an absolute frame number (0 to 63); east and west share palettes
    pub fn palette(&self, frame: usize) -> Result<&Palette> {
        Self::check_frame(frame)?;
        Ok(&self.palettes[frame % SKY_PALETTES])
    }

    /// Colour map for an absolute frame number
    pub fn color_map(&self, frame: usize) -> Result<&[u8]> {
        Self::check_frame(frame)?;
        let start = COLOR_MAPS_START + (frame % SKY_PALETTES) * SKY_COLOR_MAP_SIZE;
        Ok(&self.data[start..start + SKY_COLOR_MAP_SIZE])
    }
}

impl ImageSource for SkyFile {
    fn record_count(&self) -> usize {
        SKY_RECORDS
    }

    fn frame_count(&self, record: usize) -> Result<usize> {
        if record >= SKY_RECORDS {
            return Err(Error::record_not_found(record));
        }
        Ok(SKY_FRAMES_PER_RECORD)
    }

    fn size(&self, record: usize) -> Result<Size> {
        self.frame_count(record)?;
        Ok(Size::new(SKY_WIDTH, SKY_HEIGHT))
    }

    fn get_frame(&self, record: usize, frame: usize) -> Result<Frame> {
        self.frame_count(record)?;
        if frame >= SKY_FRAMES_PER_RECORD {
            return Err(Error::FrameNotFound {
                record,
                frame,
                count: SKY_FRAMES_PER_RECORD,
            });
        }

        let absolute = record * SKY_FRAMES_PER_RECORD + frame;
        let mut view = RecordView::new(&self.data);
        view.seek(FRAMES_START + absolute * FRAME_SIZE)?;

        let pixels = copy_rows(&mut view, SKY_WIDTH, SKY_HEIGHT, SKY_WIDTH)?;
        Frame::indexed(SKY_WIDTH, SKY_HEIGHT, pixels)
    }
}
