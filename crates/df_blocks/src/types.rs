//! Types shared by the exterior and dungeon block layouts

use binrw::{BinRead, BinWrite};
use derive_more::derive::Display;
use df_bsa::error::Error as BsaError;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::Result;

/// Block layout kind, selected purely by file name suffix
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum BlockType {
    /// Exterior city or wilderness block
    #[display("RMB")]
    Rmb,

    /// Dungeon block
    #[display("RDB")]
    Rdb,

    /// Opaque record, contents not understood
    #[display("RDI")]
    Rdi,
}

impl BlockType {
    /// Classify a block record name by its extension, ignoring case
    pub fn from_name(name: &str) -> Result<Self> {
        let extension = name.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();

        if extension.eq_ignore_ascii_case("RMB") {
            Ok(BlockType::Rmb)
        } else if extension.eq_ignore_ascii_case("RDB") {
            Ok(BlockType::Rdb)
        } else if extension.eq_ignore_ascii_case("RDI") {
            Ok(BlockType::Rdi)
        } else {
            Err(BsaError::InvalidFilename(name.to_owned()).into())
        }
    }
}

/// Dungeon block classification taken from the first letter of its name
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum RdbBlockLetter {
    Border,
    Wet,
    Quest,
    Mausoleum,
    Normal,
    Unknown,
}

impl RdbBlockLetter {
    pub fn from_name(name: &str) -> Self {
        match name.as_bytes().first().map(u8::to_ascii_uppercase) {
            Some(b'B') => RdbBlockLetter::Border,
            Some(b'W') => RdbBlockLetter::Wet,
            Some(b'S') => RdbBlockLetter::Quest,
            Some(b'M') => RdbBlockLetter::Mausoleum,
            Some(b'N') => RdbBlockLetter::Normal,
            _ => RdbBlockLetter::Unknown,
        }
    }
}

/// Texture archive and record packed into one 16-bit field
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TextureRef {
    pub archive: u16,
    pub record: u16,
}

impl TextureRef {
    pub const fn from_bitfield(bitfield: u16) -> Self {
        Self {
            archive: bitfield >> 7,
            record: bitfield & 0x7f,
        }
    }
}

/// One cell of the 16x16 ground layer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct GroundTile {
    pub bitfield: u8,
    pub texture_record: u8,
    pub is_rotated: bool,
    pub is_flipped: bool,
}

impl From<u8> for GroundTile {
    fn from(bitfield: u8) -> Self {
        Self {
            bitfield,
            texture_record: bitfield & 0x3f,
            is_rotated: bitfield & 0x40 != 0,
            is_flipped: bitfield & 0x80 != 0,
        }
    }
}

/// One cell of the 16x16 scenery layer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Scenery {
    pub bitfield: u8,
    /// `-1` when the cell has no scenery
    pub texture_record: i32,
    pub sub_index: u8,
}

impl Scenery {
    /// Whether the cell holds a scenery sprite
    pub const fn is_present(&self) -> bool {
        self.texture_record >= 0
    }
}

impl From<u8> for Scenery {
    fn from(bitfield: u8) -> Self {
        if bitfield == 0xff {
            return Self {
                bitfield,
                texture_record: -1,
                sub_index: 0,
            };
        }

        Self {
            bitfield,
            texture_record: (bitfield / 4) as i32 - 1,
            sub_index: bitfield & 3,
        }
    }
}

/// World position of a placed object
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Building descriptor (26 bytes), shared by exterior blocks and map locations
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct BuildingData {
    pub name_seed: u16,
    pub reserved1: u64,
    pub reserved2: u64,
    pub faction_id: u16,
    pub sector: i16,
    pub location_id: u16,
    pub building_type: u8,
    pub quality: u8,
}

impl BuildingData {
    pub const SIZE: usize = 26;
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::types::{BlockType, GroundTile, RdbBlockLetter, Scenery, TextureRef};

    #[test]
    fn block_type_from_suffix() {
        assert_eq!(BlockType::from_name("A.RMB").unwrap(), BlockType::Rmb);
        assert_eq!(BlockType::from_name("n0000001.rdb").unwrap(), BlockType::Rdb);
        assert_eq!(BlockType::from_name("B.Rdi").unwrap(), BlockType::Rdi);
        assert!(BlockType::from_name("BLOCKS").is_err());
        assert!(BlockType::from_name("A.RMBX").is_err());
        assert_eq!(BlockType::Rdb.to_string(), "RDB");
    }

    #[test]
    fn rdb_block_letters() {
        assert_eq!(RdbBlockLetter::from_name("B0000001.RDB"), RdbBlockLetter::Border);
        assert_eq!(RdbBlockLetter::from_name("W0000002.RDB"), RdbBlockLetter::Wet);
        assert_eq!(RdbBlockLetter::from_name("S0000003.RDB"), RdbBlockLetter::Quest);
        assert_eq!(RdbBlockLetter::from_name("m0000004.rdb"), RdbBlockLetter::Mausoleum);
        assert_eq!(RdbBlockLetter::from_name("N0000005.RDB"), RdbBlockLetter::Normal);
        assert_eq!(RdbBlockLetter::from_name("L0000006.RDB"), RdbBlockLetter::Unknown);
        assert_eq!(RdbBlockLetter::from_name(""), RdbBlockLetter::Unknown);
    }

    #[test]
    fn texture_bitfield() {
        assert_eq!(
            TextureRef::from_bitfield(0x0D85),
            TextureRef {
                archive: 27,
                record: 5
            }
        );
        assert_eq!(TextureRef::from_bitfield(0x7f).archive, 0);
    }

    #[test]
    fn ground_tile_bitfield_for_every_byte() {
        for bitfield in 0..=255u8 {
            let tile = GroundTile::from(bitfield);
            assert_eq!(tile.texture_record, bitfield & 0x3f);
            assert_eq!(tile.is_rotated, bitfield & 0x40 != 0);
            assert_eq!(tile.is_flipped, bitfield & 0x80 != 0);
        }
    }

    #[test]
    fn scenery_bitfield() {
        let empty = Scenery::from(255);
        assert_eq!(empty.texture_record, -1);
        assert!(!empty.is_present());

        let first = Scenery::from(4);
        assert_eq!((first.texture_record, first.sub_index), (0, 0));

        let third = Scenery::from(15);
        assert_eq!((third.texture_record, third.sub_index), (2, 3));

        assert_eq!(Scenery::from(0).texture_record, -1);
    }
}
