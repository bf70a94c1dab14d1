//! This library reads **WOODS.WLD**, the world heightmap.
//!
//! # File Structure
//!
//! | Offset (bytes)         | Field         | Description                                         |
//! |------------------------|---------------|-----------------------------------------------------|
//! | 0x0000                 | Header        | 144 bytes, see [`WldHeader`]                        |
//! | 0x0090                 | Offset Table  | `width * height` u32 values                         |
//! | `terrain_types_offset` | Terrain Types | 256 bytes                                           |
//! | `elevation_offset`     | Elevation     | `width * height` bytes, row major                   |
//!
//! The map is always 1000 by 500 cells. There is no compression.

pub mod error;

use std::{fs, path::Path};

use binrw::{BinRead, BinWrite};
use df_bsa::{require_extension, RecordView};
use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::Serialize;

use error::{Error, Result};

pub const MAP_WIDTH: usize = 1000;
pub const MAP_HEIGHT: usize = 500;
pub const TERRAIN_TYPES_SIZE: usize = 256;

/// File header (144 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct WldHeader {
    /// Size of the offset table in bytes
    pub offset_size: u32,
    pub width: u32,
    pub height: u32,
    pub null1: u32,
    pub terrain_types_offset: u32,
    pub constant1: u32,
    pub constant2: u32,
    pub elevation_offset: u32,
    pub reserved: [u32; 28],
}

impl WldHeader {
    pub const SIZE: usize = 144;

    fn validate(&self) -> Result<()> {
        let (width, height) = (self.width as usize, self.height as usize);
        if (width, height) != (MAP_WIDTH, MAP_HEIGHT) {
            return Err(Error::mismatch(format!(
                "map is {width}x{height}, expected {MAP_WIDTH}x{MAP_HEIGHT}"
            )));
        }

        let expected = width * height * 4;
        if self.offset_size as usize != expected {
            return Err(Error::mismatch(format!(
                "offset table is {} bytes, expected {expected}",
                self.offset_size
            )));
        }
        Ok(())
    }
}

/// A decoded heightmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WoodsFile {
    pub header: WldHeader,
    offsets: Vec<u32>,
    terrain_types: Vec<u8>,
    elevation: Vec<u8>,
}

impl WoodsFile {
    /// Read `WOODS.WLD` from disk; the name must end in `.WLD`
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        require_extension(path, "WLD")?;
        Self::from_bytes(&fs::read(path)?)
    }

    #[instrument(skip_all, fields(len = data.len()), err)]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut view = RecordView::new(data);
        let header = view.read_binrw::<WldHeader>()?;
        header.validate()?;

        let cells = MAP_WIDTH * MAP_HEIGHT;
        let offsets = (0..cells)
            .map(|_| view.read_u32())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        view.seek(header.terrain_types_offset as usize)?;
        let terrain_types = view.read_bytes(TERRAIN_TYPES_SIZE)?.to_vec();

        view.seek(header.elevation_offset as usize)?;
        let elevation = view.read_bytes(cells)?.to_vec();

        debug!(
            terrain_types_offset = header.terrain_types_offset,
            elevation_offset = header.elevation_offset,
            "read heightmap"
        );

        Ok(Self {
            header,
            offsets,
            terrain_types,
            elevation,
        })
    }

    pub const fn width(&self) -> usize {
        MAP_WIDTH
    }

    pub const fn height(&self) -> usize {
        MAP_HEIGHT
    }

    fn cell(&self, x: usize, y: usize) -> Result<usize> {
        if x >= MAP_WIDTH || y >= MAP_HEIGHT {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: MAP_WIDTH,
                height: MAP_HEIGHT,
            });
        }
        Ok(y * MAP_WIDTH + x)
    }

    /// Elevation of one cell
    pub fn height_at(&self, x: usize, y: usize) -> Result<u8> {
        self.cell(x, y).map(|i| self.elevation[i])
    }

    /// Offset table value of one cell
    pub fn offset_at(&self, x: usize, y: usize) -> Result<u32> {
        self.cell(x, y).map(|i| self.offsets[i])
    }

    pub fn terrain_types(&self) -> &[u8] {
        &self.terrain_types
    }

    /// The whole elevation grid, row major
    pub fn elevation(&self) -> &[u8] {
        &self.elevation
    }

    /// A `dim` by `dim` block of elevations starting at `(x, y)`, row major.
    ///
    /// Cells past the edge of the map repeat the nearest edge cell.
    pub fn elevation_window(&self, x: usize, y: usize, dim: usize) -> Vec<u8> {
        let mut window = Vec::with_capacity(dim * dim);
        for row in 0..dim {
            let cy = y.saturating_add(row).min(MAP_HEIGHT - 1);
            for column in 0..dim {
                let cx = x.saturating_add(column).min(MAP_WIDTH - 1);
                window.push(self.elevation[cy * MAP_WIDTH + cx]);
            }
        }
        window
    }
}
