//! Name tables and block file name resolution
//!
//! Exterior grids store each block as three bytes (index, number, character). The block's RMB file
//! name is `prefix + letters + number + ".RMB"`, where the letters depend on the character byte and,
//! for a couple of cities, on a per-location exception rule.

use crate::error::{Error, Result};

/// Built-in region names, by region index
pub const REGION_NAMES: [&str; 62] = [
    "Alik'r Desert",
    "Dragontail Mountains",
    "Glenpoint Foothills",
    "Daggerfall Bluffs",
    "Yeorth Burrowland",
    "Dwynnen",
    "Ravennian Forest",
    "Devilrock",
    "Malekna Forest",
    "Isle of Balfiera",
    "Bantha",
    "Dak'fron",
    "Islands in the Western Iliac Bay",
    "Tamarilyn Point",
    "Lainlyn Cliffs",
    "Bjoulsae River",
    "Wrothgarian Mountains",
    "Daggerfall",
    "Glenpoint",
    "Betony",
    "Sentinel",
    "Anticlere",
    "Lainlyn",
    "Wayrest",
    "Gen Tem High Rock village",
    "Gen Rai Hammerfell village",
    "Orsinium Area",
    "Skeffington Wood",
    "Hammerfell bay coast",
    "Hammerfell sea coast",
    "High Rock bay coast",
    "High Rock sea coast",
    "Northmoor",
    "Menevia",
    "Alcaire",
    "Koegria",
    "Bhoriane",
    "Kambria",
    "Phrygias",
    "Urvaius",
    "Ykalon",
    "Daenia",
    "Shalgora",
    "Abibon-Gora",
    "Kairou",
    "Pothago",
    "Myrkwasa",
    "Ayasofya",
    "Tigonus",
    "Kozanset",
    "Satakalaam",
    "Totambu",
    "Mournoth",
    "Ephesus",
    "Santaki",
    "Antiphyllos",
    "Bergama",
    "Gavaudon",
    "Tulune",
    "Glenumbra Moors",
    "Ilessan Hills",
    "Cybiades",
];

/// Block file prefixes, by block index
pub const RMB_PREFIXES: [&str; 45] = [
    "TVRN", "GENR", "RESI", "WEAP", "ARMR", "ALCH", "BANK", "BOOK", "CLOT", "FURN", "GEMS", "LIBR",
    "PAWN", "TEMP", "TEMP", "PALA", "FARM", "DUNG", "CAST", "MANR", "SHRI", "RUIN", "SHCK", "GRVE",
    "FILL", "KRAV", "KDRA", "KOWL", "KMOO", "KCAN", "KFLA", "KHOR", "KROS", "KWHE", "KSCA", "KHAW",
    "MAGE", "THIE", "DARK", "FIGH", "CUST", "WALL", "MARK", "SHIP", "WITC",
];

/// Block letter pairs, by letter index
pub const RMB_LETTERS: [&str; 12] = [
    "AA", "BA", "AL", "BL", "AM", "BM", "AS", "BS", "GA", "GL", "GM", "GS",
];

/// Temple block numbers, by the low three bits of the character byte
pub const TEMPLE_NUMBERS: [&str; 8] = ["A0", "B0", "C0", "D0", "E0", "F0", "G0", "H0"];

/// Dungeon block letters, by letter index
pub const RDB_LETTERS: [&str; 6] = ["N", "W", "L", "S", "B", "M"];

const CUSTOM_PREFIX: &str = "CUST";

/// How the letter index of a non-temple block is derived from the character byte
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockLetterRule {
    /// `q - 1` when `q > 0`
    Default,
    /// Custom blocks use letter 0, everything else follows [`BlockLetterRule::Default`]
    Wayrest,
    /// Custom blocks use letter 8, everything else keeps `q`
    Sentinel,
}

impl BlockLetterRule {
    /// Letter index for a block with the given prefix and character byte
    pub fn letter_index(self, prefix: &str, character: u8) -> usize {
        let q = (character >> 4) as usize;
        let step_down = if q > 0 { q - 1 } else { q };

        match self {
            BlockLetterRule::Default => step_down,
            BlockLetterRule::Wayrest if prefix == CUSTOM_PREFIX => 0,
            BlockLetterRule::Wayrest => step_down,
            BlockLetterRule::Sentinel if prefix == CUSTOM_PREFIX => 8,
            BlockLetterRule::Sentinel => q,
        }
    }
}

/// Locations whose blocks do not follow [`BlockLetterRule::Default`]
pub const BLOCK_LETTER_EXCEPTIONS: &[(&str, BlockLetterRule)] = &[
    ("Wayrest", BlockLetterRule::Wayrest),
    ("Sentinel", BlockLetterRule::Sentinel),
];

/// Letter rule applying to a location
pub fn letter_rule(location_name: &str) -> BlockLetterRule {
    BLOCK_LETTER_EXCEPTIONS
        .iter()
        .find(|(name, _)| *name == location_name)
        .map(|(_, rule)| *rule)
        .unwrap_or(BlockLetterRule::Default)
}

/// Region name for an index, if it is in the built-in table
pub fn region_name(index: usize) -> Option<&'static str> {
    REGION_NAMES.get(index).copied()
}

/// Region index for a name, ignoring case
pub fn region_index(name: &str) -> Option<usize> {
    REGION_NAMES
        .iter()
        .position(|region| region.eq_ignore_ascii_case(name))
}

/// RMB file name of one exterior grid cell
pub fn exterior_block_name(
    location_name: &str,
    block_index: u8,
    block_number: u8,
    block_character: u8,
) -> Result<String> {
    let prefix = RMB_PREFIXES
        .get(block_index as usize)
        .ok_or_else(|| Error::mismatch(format!("unknown block index {block_index}")))?;

    let (letters, number) = if matches!(block_index, 13 | 14) {
        let letters = if block_character > 7 { "GA" } else { "AA" };
        (letters, TEMPLE_NUMBERS[(block_character & 7) as usize].to_owned())
    } else {
        let q = letter_rule(location_name).letter_index(prefix, block_character);
        let letters = RMB_LETTERS.get(q).ok_or_else(|| {
            Error::mismatch(format!("block character {block_character:#04x} has no letters"))
        })?;
        (*letters, format!("{block_number:02}"))
    };

    Ok(format!("{prefix}{letters}{number}.RMB"))
}

/// RDB file name of a dungeon block
pub fn dungeon_block_name(letter_index: usize, block_number: u16) -> Result<String> {
    let letter = RDB_LETTERS
        .get(letter_index)
        .ok_or_else(|| Error::mismatch(format!("unknown dungeon block letter {letter_index}")))?;

    Ok(format!("{letter}{block_number:07}.RDB"))
}
