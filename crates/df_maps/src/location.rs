//! Location detail records
//!
//! A location is spread over two archive records of its region. The building detail record starts
//! with a `u32` offset per location (relative to the end of that table) and holds each location's
//! common element, building list and exterior grid. The dungeon detail record starts with a `u32`
//! count and a table of `{ offset, is_dungeon, exterior_location_id }` entries; a location only has
//! a dungeon when one of those entries points back at it.

use binrw::{BinRead, BinWrite};
use df_blocks::BuildingData;
use df_bsa::RecordView;
use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    error::{Error, Result},
    names::{dungeon_block_name, exterior_block_name},
    region::{LocationSummary, Region},
};

/// Cells in an exterior block grid
pub const EXTERIOR_GRID_CELLS: usize = 64;

fn latin1(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

/// Door entry of a location element (6 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct LocationDoor {
    pub building_data_index: u16,
    pub null: u8,
    pub mask: u8,
    pub reserved1: u8,
    pub reserved2: u8,
}

/// Fixed part of a location element (112 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct LocationRecordHeader {
    pub always_one1: u32,
    pub null1: u16,
    pub null2: u8,
    pub x: i32,
    pub null3: u32,
    pub y: i32,
    pub is_exterior: u16,
    pub null4: u16,
    pub reserved1: u32,
    pub reserved2: u32,
    pub always_one2: u16,
    pub location_id: u16,
    pub null5: u32,
    pub is_interior: u16,
    pub exterior_location_id: u32,
    pub null6: [u8; 26],
    pub name: [u8; 32],
    pub reserved3: [u8; 9],
}

impl LocationRecordHeader {
    pub fn name(&self) -> String {
        latin1(&self.name)
    }
}

/// Door list and header shared by exterior and dungeon details
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LocationRecordElement {
    pub doors: Vec<LocationDoor>,
    pub header: LocationRecordHeader,
}

impl LocationRecordElement {
    pub fn read(view: &mut RecordView) -> Result<Self> {
        let door_count = view.read_u32()? as usize;
        let doors = (0..door_count)
            .map(|_| view.read_binrw::<LocationDoor>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            doors,
            header: view.read_binrw()?,
        })
    }
}

#[derive(BinRead, Debug)]
#[br(little)]
struct ExteriorTail {
    another_name: [u8; 32],
    map_id: i32,
    location_id: u32,
    width: u8,
    height: u8,
    _reserved2: [u8; 7],
    block_index: [u8; EXTERIOR_GRID_CELLS],
    block_number: [u8; EXTERIOR_GRID_CELLS],
    block_character: [u8; EXTERIOR_GRID_CELLS],
    _reserved3: [u8; 34],
    _null1: u64,
    _null2: u8,
    _reserved4: [u32; 22],
    _null3: [u8; 40],
    _reserved5: u32,
}

/// Buildings and block grid of a location
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Exterior {
    pub buildings: Vec<BuildingData>,
    pub another_name: String,
    pub map_id: i32,
    pub location_id: u32,
    pub width: u8,
    pub height: u8,
    pub block_index: Vec<u8>,
    pub block_number: Vec<u8>,
    pub block_character: Vec<u8>,
}

impl Exterior {
    pub fn read(view: &mut RecordView) -> Result<Self> {
        let building_count = view.read_u16()? as usize;
        view.skip(5)?;
        let buildings = (0..building_count)
            .map(|_| view.read_binrw::<BuildingData>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let tail: ExteriorTail = view.read_binrw()?;

        Ok(Self {
            buildings,
            another_name: latin1(&tail.another_name),
            map_id: tail.map_id,
            location_id: tail.location_id,
            width: tail.width,
            height: tail.height,
            block_index: tail.block_index.to_vec(),
            block_number: tail.block_number.to_vec(),
            block_character: tail.block_character.to_vec(),
        })
    }

    /// Number of occupied grid cells
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RMB file names of the grid, row by row
    pub fn block_names(&self, location_name: &str) -> Result<Vec<String>> {
        let cells = self.cell_count();
        if cells > EXTERIOR_GRID_CELLS {
            return Err(Error::mismatch(format!(
                "{}x{} exterior grid exceeds {EXTERIOR_GRID_CELLS} cells",
                self.width, self.height
            )));
        }

        (0..cells)
            .map(|i| {
                exterior_block_name(
                    location_name,
                    self.block_index[i],
                    self.block_number[i],
                    self.block_character[i],
                )
            })
            .collect()
    }
}

/// Dungeon grid entry (4 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct DungeonBlock {
    pub x: i8,
    pub z: i8,
    pub bitfield: u16,
}

impl DungeonBlock {
    pub const fn block_number(&self) -> u16 {
        self.bitfield & 0x3ff
    }

    pub const fn is_starting_block(&self) -> bool {
        self.bitfield & 0x400 != 0
    }

    pub const fn block_letter_index(&self) -> usize {
        (self.bitfield >> 11) as usize
    }

    /// RDB file name of this block
    pub fn block_name(&self) -> Result<String> {
        dungeon_block_name(self.block_letter_index(), self.block_number())
    }
}

/// Dungeon detail of a location
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Dungeon {
    pub element: LocationRecordElement,
    pub blocks: Vec<DungeonBlock>,
}

impl Dungeon {
    pub fn read(view: &mut RecordView) -> Result<Self> {
        let element = LocationRecordElement::read(view)?;
        view.skip(2 + 4 + 4)?;
        let block_count = view.read_u16()? as usize;
        view.skip(5)?;

        let blocks = (0..block_count)
            .map(|_| view.read_binrw::<DungeonBlock>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { element, blocks })
    }

    /// RDB file names of every block, in grid order
    pub fn block_names(&self) -> Result<Vec<String>> {
        self.blocks.iter().map(DungeonBlock::block_name).collect()
    }

    pub fn starting_block(&self) -> Option<&DungeonBlock> {
        self.blocks.iter().find(|b| b.is_starting_block())
    }
}

/// Entry of the dungeon detail offset table (8 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct DungeonOffset {
    pub offset: u32,
    pub is_dungeon: u16,
    pub exterior_location_id: u16,
}

/// A fully decoded location
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Location {
    pub region: usize,
    pub index: usize,
    pub name: String,
    pub summary: LocationSummary,
    pub element: LocationRecordElement,
    pub exterior: Exterior,
    pub dungeon: Option<Dungeon>,
}

impl Location {
    /// Decode location `index` of `region` from its building and dungeon detail records
    #[instrument(skip(region, buildings, dungeons), fields(region = region.index), err)]
    pub fn decode(
        region: &Region,
        index: usize,
        buildings: &[u8],
        dungeons: &[u8],
    ) -> Result<Self> {
        let count = region.location_count();
        let summary = *region.summary(index).ok_or_else(|| Error::LocationNotFound {
            region: region.index,
            location: index.to_string(),
        })?;

        let mut view = RecordView::new(buildings);
        view.seek(index * 4)?;
        let offset = view.read_u32()? as usize;
        view.seek(count * 4 + offset)?;

        let element = LocationRecordElement::read(&mut view)?;
        let exterior = Exterior::read(&mut view)?;
        let dungeon = find_dungeon(dungeons, element.header.location_id)?;

        debug!(
            index,
            buildings = exterior.buildings.len(),
            has_dungeon = dungeon.is_some(),
            "decoded location"
        );

        Ok(Self {
            region: region.index,
            index,
            name: element.header.name(),
            summary,
            element,
            exterior,
            dungeon,
        })
    }

    pub fn has_dungeon(&self) -> bool {
        self.dungeon.is_some()
    }

    /// RMB file names of the exterior grid
    pub fn exterior_block_names(&self) -> Result<Vec<String>> {
        self.exterior.block_names(&self.name)
    }
}

fn find_dungeon(dungeons: &[u8], location_id: u16) -> Result<Option<Dungeon>> {
    if dungeons.is_empty() {
        return Ok(None);
    }

    let mut view = RecordView::new(dungeons);
    let count = view.read_u32()? as usize;
    let table = (0..count)
        .map(|_| view.read_binrw::<DungeonOffset>())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let Some(entry) = table
        .iter()
        .find(|e| e.exterior_location_id == location_id)
    else {
        return Ok(None);
    };

    view.seek(4 + count * 8 + entry.offset as usize)?;
    Dungeon::read(&mut view).map(Some)
}
