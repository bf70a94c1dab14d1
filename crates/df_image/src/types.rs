use derive_more::derive::Display;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    error::{Error, Result},
    palette::Palette,
};

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PixelFormat {
    /// One palette index per pixel
    Indexed,
    /// Three bytes per pixel
    Rgb,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Indexed => 1,
            PixelFormat::Rgb => 3,
        }
    }
}

/// Dimensions of a frame in pixels
#[derive(Debug, Display, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[display("{width}x{height}")]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub const fn area(&self) -> usize {
        self.width * self.height
    }
}

/// One decoded picture
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    /// Bytes per row of `pixels`
    pub stride: usize,
    pub format: PixelFormat,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Wrap indexed pixels, which must cover exactly `width * height` bytes
    pub fn indexed(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(Error::mismatch(format!(
                "{width}x{height} frame holds {} bytes",
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            stride: width,
            format: PixelFormat::Indexed,
            pixels,
        })
    }

    /// A frame of one palette index
    pub fn solid(width: usize, height: usize, index: u8) -> Self {
        Self {
            width,
            height,
            stride: width,
            format: PixelFormat::Indexed,
            pixels: vec![index; width * height],
        }
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Palette index at a pixel of an indexed frame
    pub fn index_at(&self, x: usize, y: usize) -> Option<u8> {
        if self.format != PixelFormat::Indexed || x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.stride + x).copied()
    }

    /// Expand an indexed frame through a palette. RGB frames are returned unchanged.
    pub fn to_rgb(&self, palette: &Palette) -> Frame {
        if self.format == PixelFormat::Rgb {
            return self.clone();
        }

        let mut pixels = Vec::with_capacity(self.width * self.height * 3);
        // zero width frames have no rows to expand
        if self.stride > 0 {
            for row in self.pixels.chunks(self.stride).take(self.height) {
                for &index in &row[..self.width.min(row.len())] {
                    pixels.extend(palette.color(index));
                }
            }
        }

        Frame {
            width: self.width,
            height: self.height,
            stride: self.width * 3,
            format: PixelFormat::Rgb,
            pixels,
        }
    }
}

/// Frames that belong together, with the placement offsets from their header
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ImageRecord {
    pub x_offset: i16,
    pub y_offset: i16,
    pub frames: Vec<Frame>,
}

impl ImageRecord {
    pub fn single(x_offset: i16, y_offset: i16, frame: Frame) -> Self {
        Self {
            x_offset,
            y_offset,
            frames: vec![frame],
        }
    }

    pub fn size(&self) -> Size {
        self.frames.first().map(Frame::size).unwrap_or_default()
    }

    pub(crate) fn frame(&self, record: usize, frame: usize) -> Result<Frame> {
        self.frames
            .get(frame)
            .cloned()
            .ok_or(Error::FrameNotFound {
                record,
                frame,
                count: self.frames.len(),
            })
    }
}

/// Access shared by every image container
///
/// Records are numbered from zero; each holds one or more frames of the same size.
pub trait ImageSource {
    fn record_count(&self) -> usize;

    fn frame_count(&self, record: usize) -> Result<usize>;

    fn size(&self, record: usize) -> Result<Size>;

    fn get_frame(&self, record: usize, frame: usize) -> Result<Frame>;

    /// Every frame of a record, in order
    fn frames(&self, record: usize) -> Result<Vec<Frame>> {
        (0..self.frame_count(record)?)
            .map(|frame| self.get_frame(record, frame))
            .collect()
    }
}
