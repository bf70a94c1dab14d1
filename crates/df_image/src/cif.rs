//! Multi-image files (`.CIF` and `.RCI`)
//!
//! A `.CIF` is a run of IMG-headed records, one frame each. `WEAPON*.CIF` files hold animations
//! instead: every record is an IMG header, a table of [`WEAPON_FRAME_SLOTS`] frame offsets and
//! delta encoded frames. A `.RCI` has no header at all: it is a single record of equally sized
//! frames whose size is known only from the file name.

use std::{fs, path::Path};

use derive_more::derive::Display;
use df_bsa::RecordView;
use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    compression::decode_delta,
    error::{Error, Result},
    img::{decode_pixels, ImgHeader},
    types::{Frame, ImageRecord, ImageSource, Size},
};

/// Frame sizes of `.RCI` files by file stem: `(stem, width, height)`
pub const RCI_FRAME_SIZES: &[(&str, usize, usize)] = &[
    ("MPOP", 17, 17),
    ("NOTE", 44, 9),
    ("SPOP", 22, 22),
    ("TFAC00I0", 64, 64),
    ("CHLD00I0", 32, 16),
];

/// Frame offset slots after each animated record header
pub const WEAPON_FRAME_SLOTS: usize = 32;

const WEAPON_PREFIX: &str = "WEAPON";

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum CifKind {
    /// Headerless frames of a size fixed by name
    Rci,
    /// IMG-headed records
    Cif,
    /// Animated records
    WeaponCif,
}

/// Frame size of a `.RCI` by its file stem
pub fn rci_frame_size(stem: &str) -> Option<Size> {
    RCI_FRAME_SIZES
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(stem))
        .map(|&(_, width, height)| Size::new(width, height))
}

fn split_name(name: &str) -> (String, String) {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name).to_ascii_uppercase();
    match file.split_once('.') {
        Some((stem, extension)) => (stem.to_owned(), extension.to_owned()),
        None => (file, String::new()),
    }
}

/// A decoded `.CIF` or `.RCI` file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CifRciFile {
    pub name: String,
    pub kind: CifKind,
    pub records: Vec<ImageRecord>,
}

impl CifRciFile {
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::kind_for(&name)?;
        Self::from_bytes(&name, &fs::read(path)?)
    }

    /// Which layout a file name selects
    pub fn kind_for(name: &str) -> Result<CifKind> {
        let (stem, extension) = split_name(name);
        match extension.as_str() {
            "RCI" => Ok(CifKind::Rci),
            "CIF" if stem.starts_with(WEAPON_PREFIX) => Ok(CifKind::WeaponCif),
            "CIF" => Ok(CifKind::Cif),
            _ => Err(Error::invalid_filename(name)),
        }
    }

    #[instrument(skip(data), fields(len = data.len()), err)]
    pub fn from_bytes(name: &str, data: &[u8]) -> Result<Self> {
        let kind = Self::kind_for(name)?;
        let records = match kind {
            CifKind::Rci => {
                let (stem, _) = split_name(name);
                let size = rci_frame_size(&stem).ok_or_else(|| Error::invalid_filename(name))?;
                vec![read_rci(data, size)?]
            }
            CifKind::Cif => read_records(data, read_image_record)?,
            CifKind::WeaponCif => read_records(data, read_weapon_record)?,
        };
        debug!(%kind, records = records.len(), "decoded image file");

        Ok(Self {
            name: name.to_owned(),
            kind,
            records,
        })
    }

    pub fn record(&self, record: usize) -> Result<&ImageRecord> {
        self.records
            .get(record)
            .ok_or_else(|| Error::record_not_found(record))
    }
}

impl ImageSource for CifRciFile {
    fn record_count(&self) -> usize {
        self.records.len()
    }

    fn frame_count(&self, record: usize) -> Result<usize> {
        self.record(record).map(|r| r.frames.len())
    }

    fn size(&self, record: usize) -> Result<Size> {
        self.record(record).map(ImageRecord::size)
    }

    fn get_frame(&self, record: usize, frame: usize) -> Result<Frame> {
        self.record(record)?.frame(record, frame)
    }
}

fn read_rci(data: &[u8], size: Size) -> Result<ImageRecord> {
    let area = size.area();
    if area == 0 || data.len() % area != 0 {
        return Err(Error::mismatch(format!(
            "{} bytes is not a whole number of {size} frames",
            data.len()
        )));
    }

    let frames = data
        .chunks_exact(area)
        .map(|chunk| Frame::indexed(size.width, size.height, chunk.to_vec()))
        .collect::<Result<Vec<_>>>()?;

    Ok(ImageRecord {
        x_offset: 0,
        y_offset: 0,
        frames,
    })
}

/// Read records back to back until the data runs out
fn read_records(
    data: &[u8],
    read: fn(&[u8], usize) -> Result<(ImageRecord, usize)>,
) -> Result<Vec<ImageRecord>> {
    let mut records = Vec::new();
    let mut start = 0;

    while start < data.len() {
        let (record, end) = read(data, start)?;
        records.push(record);
        start = end;
    }

    Ok(records)
}

/// One IMG-headed record; it ends after its pixel data or its declared length, whichever is later
fn read_image_record(data: &[u8], start: usize) -> Result<(ImageRecord, usize)> {
    let mut view = RecordView::new(data);
    view.seek(start)?;

    let header = view.read_binrw::<ImgHeader>()?;
    let declared_end = view.position() + header.pixel_data_length as usize;
    let frame = decode_pixels(&mut view, &header, start)?;

    Ok((
        ImageRecord::single(header.x_offset, header.y_offset, frame),
        view.position().max(declared_end),
    ))
}

/// One animated record; it ends at the furthest byte any of its frames was decoded from
fn read_weapon_record(data: &[u8], start: usize) -> Result<(ImageRecord, usize)> {
    let mut view = RecordView::new(data);
    view.seek(start)?;

    let header = view.read_binrw::<ImgHeader>()?;
    let Size { width, height } = header.size()?;

    let mut offsets = Vec::with_capacity(WEAPON_FRAME_SLOTS);
    for _ in 0..WEAPON_FRAME_SLOTS {
        offsets.push(view.read_u16()? as usize);
    }

    let mut end = view.position();
    let mut frames = Vec::new();
    for offset in offsets.into_iter().take_while(|&offset| offset != 0) {
        let mut frame_view = view.clone();
        frame_view.seek(start + offset)?;

        let pixels = decode_delta(&mut frame_view, width, height)?;
        end = end.max(frame_view.position());
        frames.push(Frame::indexed(width, height, pixels)?);
    }

    Ok((
        ImageRecord {
            x_offset: header.x_offset,
            y_offset: header.y_offset,
            frames,
        },
        end,
    ))
}
