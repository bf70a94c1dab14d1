//! Base types for structure of BSA file.

use binrw::{BinRead, BinWrite};

use crate::error::Error;

/// Size in bytes of the [`BsaHeader`]
pub const HEADER_SIZE: u64 = 6;

/// Width of the name field in a name keyed directory entry
pub const NAME_LENGTH: usize = 12;

/// BSA file header
///
/// Holds the number of records and the kind of directory stored at the end of the file.
/// All data is stored in little endian format
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct BsaHeader {
    /// The number of records stored in the file
    pub records: i16,

    /// Raw directory type tag, see [`DirectoryType`]
    pub directory_type: u16,

    /// Unused, always zero in shipped archives
    pub reserved: u16,
}

/// Identifies how records are keyed in the directory
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DirectoryType {
    /// Records are keyed by a 12 character name
    NameRecord,

    /// Records are keyed by a 32-bit number
    NumberRecord,
}

impl DirectoryType {
    /// Size in bytes of a single directory entry
    pub const fn entry_size(self) -> u64 {
        match self {
            DirectoryType::NameRecord => 18,
            DirectoryType::NumberRecord => 8,
        }
    }

    /// Raw header tag
    pub const fn tag(self) -> u16 {
        match self {
            DirectoryType::NameRecord => 0x0100,
            DirectoryType::NumberRecord => 0x0200,
        }
    }
}

impl TryFrom<u16> for DirectoryType {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0100 => Ok(DirectoryType::NameRecord),
            0x0200 => Ok(DirectoryType::NumberRecord),
            other => Err(Error::InvalidDirectoryType(other)),
        }
    }
}

/// Name keyed directory entry (18 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct BsaNameEntry {
    /// Null padded record name
    pub name: [u8; NAME_LENGTH],

    /// Unused by readers, some tools store a compression flag here
    pub flags: u16,

    /// The size of the record data
    pub size: u32,
}

impl BsaNameEntry {
    /// Build an entry from a name, truncating it to the field width
    pub fn new(name: &str, size: u32) -> Self {
        let mut raw = [0u8; NAME_LENGTH];
        name.bytes()
            .take(NAME_LENGTH)
            .enumerate()
            .for_each(|(i, b)| raw[i] = b);

        Self {
            name: raw,
            flags: 0,
            size,
        }
    }

    /// Name up to the first null
    pub fn name(&self) -> String {
        self.name
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }
}

/// Number keyed directory entry (8 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct BsaNumberEntry {
    /// Numeric record id
    pub id: u32,

    /// The size of the record data
    pub size: u32,
}

/// Structure representing a BSA directory entry once offsets are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsaEntry {
    /// Position in the directory
    pub index: usize,
    /// Name of the record, the decimal id for number keyed archives
    pub name: Box<str>,
    /// Numeric id, only present in number keyed archives
    pub id: Option<u32>,
    /// Flags field of name keyed entries
    pub flags: u16,
    /// Size of the record in bytes
    pub size: u64,
    /// Absolute offset of the record data from the start of the file
    pub offset: u64,
}
