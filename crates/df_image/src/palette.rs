//! 256 colour palettes
//!
//! `.PAL` files are 768 bytes of RGB triplets. `.COL` files carry the same triplets behind an
//! 8 byte header.

use std::{fs, path::Path};

use df_bsa::RecordView;
use tracing::instrument;

use crate::error::{Error, Result};

/// Colours in a palette
pub const PALETTE_COLORS: usize = 256;

/// Size of a bare `.PAL` palette
pub const PAL_SIZE: usize = PALETTE_COLORS * 3;

/// Header in front of the triplets of a `.COL` palette
pub const COL_HEADER_SIZE: usize = 8;

/// Size of a `.COL` palette
pub const COL_SIZE: usize = COL_HEADER_SIZE + PAL_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [[u8; 3]; PALETTE_COLORS],
}

impl Default for Palette {
    /// Grey ramp where index `i` maps to `(i, i, i)`
    fn default() -> Self {
        let mut colors = [[0u8; 3]; PALETTE_COLORS];
        for (i, color) in colors.iter_mut().enumerate() {
            *color = [i as u8; 3];
        }
        Self { colors }
    }
}

impl Palette {
    /// Open a `.PAL` or `.COL` file, chosen by extension
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_uppercase);

        match extension.as_deref() {
            Some("PAL") => Self::from_pal(&fs::read(path)?),
            Some("COL") => Self::from_col(&fs::read(path)?),
            _ => Err(Error::invalid_filename(path.display().to_string())),
        }
    }

    /// Read the first 768 bytes as RGB triplets
    pub fn from_pal(data: &[u8]) -> Result<Self> {
        Self::read(&mut RecordView::new(data))
    }

    /// Skip the `.COL` header, then read RGB triplets
    pub fn from_col(data: &[u8]) -> Result<Self> {
        let mut view = RecordView::new(data);
        view.skip(COL_HEADER_SIZE)?;
        Self::read(&mut view)
    }

    pub(crate) fn read(view: &mut RecordView) -> Result<Self> {
        let mut colors = [[0u8; 3]; PALETTE_COLORS];
        for color in colors.iter_mut() {
            *color = view.read_array::<3>()?;
        }
        Ok(Self { colors })
    }

    pub fn color(&self, index: u8) -> [u8; 3] {
        self.colors[index as usize]
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::palette::{Palette, COL_SIZE, PAL_SIZE};

    fn triplets() -> Vec<u8> {
        (0..PAL_SIZE).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn pal_and_col_agree() {
        let pal = Palette::from_pal(&triplets()).unwrap();

        let mut col = vec![0xAA; 8];
        col.extend(triplets());
        assert_eq!(col.len(), COL_SIZE);
        let col = Palette::from_col(&col).unwrap();

        assert_eq!(pal, col);
        assert_eq!(pal.color(1), [3, 4, 5]);
    }

    #[test]
    fn short_palette() {
        let result = Palette::from_pal(&triplets()[..700]);
        assert!(result.unwrap_err().is_end_of_data());
    }

    #[test]
    fn default_is_grey() {
        assert_eq!(Palette::default().color(200), [200, 200, 200]);
    }

    #[test]
    fn palette_extension_is_required() {
        let result = Palette::open("ART_PAL.BIN");
        assert!(result.unwrap_err().is_invalid_filename());
    }
}
