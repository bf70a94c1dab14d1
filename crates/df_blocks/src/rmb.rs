//! Exterior (RMB) block layouts
//!
//! An RMB record starts with a 6776 byte fixed header followed by a variable number of
//! sub-records and the block's loose models and flats.
//!
//! | Field                | Size           | Description                                     |
//! |----------------------|----------------|-------------------------------------------------|
//! | Counts               | 3              | sub-records, misc models, misc flats            |
//! | Block positions      | 32 x 20        | placement of each sub-record                    |
//! | Building data        | 32 x 26        | see [`BuildingData`]                            |
//! | Section 2            | 32 x 4         | unused                                          |
//! | Sub-record sizes     | 32 x 4         | declared byte size of each sub-record           |
//! | Ground               | 8 + 256 + 256  | header, 16x16 tiles, 16x16 scenery              |
//! | Automap              | 4096           | 64x64 bytes                                     |
//! | Names                | 13 + 32 x 13   | block file name and 32 alternates               |
//!
//! Every sub-record is stepped over using its declared size, not the number of bytes its
//! content actually takes.

use binrw::{BinRead, BinWrite};
use df_bsa::RecordView;
use tracing::{instrument, warn};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    error::{Error, Result},
    types::{BuildingData, GroundTile, Position, Scenery, TextureRef},
};

/// Size of the fixed RMB header
pub const RMB_HEADER_SIZE: usize = 6776;

/// Number of sub-record slots in the fixed header
pub const RMB_SLOTS: usize = 32;

/// Width and height of the ground and scenery layers
pub const GROUND_DIMENSION: usize = 16;

/// Width and height of the automap
pub const AUTOMAP_DIMENSION: usize = 64;

const NAME_WIDTH: usize = 13;

/// Placement of a sub-record inside the block (20 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct BlockPosition {
    pub reserved1: u32,
    pub reserved2: u32,
    pub x: i32,
    pub z: i32,
    pub y_rotation: i32,
}

/// Ground and scenery layers
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct GroundData {
    pub header: [u8; 8],
    /// 16x16 tiles, row major
    pub tiles: Vec<GroundTile>,
    /// 16x16 scenery cells, row major
    pub scenery: Vec<Scenery>,
}

impl GroundData {
    pub fn tile(&self, x: usize, y: usize) -> Option<&GroundTile> {
        (x < GROUND_DIMENSION)
            .then(|| self.tiles.get(y * GROUND_DIMENSION + x))
            .flatten()
    }

    pub fn scenery_at(&self, x: usize, y: usize) -> Option<&Scenery> {
        (x < GROUND_DIMENSION)
            .then(|| self.scenery.get(y * GROUND_DIMENSION + x))
            .flatten()
    }
}

/// Counts at the start of every block section (17 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct SectionHeader {
    pub model_count: u8,
    pub flat_count: u8,
    pub section3_count: u8,
    pub people_count: u8,
    pub door_count: u8,
    pub reserved: [i16; 6],
}

/// Placed 3D model (65 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct ModelRecord {
    pub model_id: u16,
    pub object_type: u8,
    pub reserved1: u32,
    pub reserved2: u32,
    pub reserved3: u32,
    pub null1: u64,
    pub x1: i32,
    pub y1: i32,
    pub z1: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub null2: u32,
    pub y_rotation: i16,
    pub reserved4: u16,
    pub null3: u32,
    pub reserved5: u32,
    pub null4: u16,
}

impl ModelRecord {
    pub const SIZE: usize = 65;

    /// Model id as used by the model archive
    pub const fn model_id_num(&self) -> u32 {
        self.model_id as u32 * 100 + self.object_type as u32
    }

    pub const fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

/// Placed billboard (17 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct FlatRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub texture_bitfield: u16,
    pub faction_id: i16,
    pub flags: u8,
}

impl FlatRecord {
    pub const SIZE: usize = 17;

    pub const fn texture(&self) -> TextureRef {
        TextureRef::from_bitfield(self.texture_bitfield)
    }
}

/// Unidentified section 3 entry (15 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct Section3Record {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub reserved1: u8,
    pub reserved2: u16,
}

impl Section3Record {
    pub const SIZE: usize = 15;
}

/// Placed person (17 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct PeopleRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub texture_bitfield: u16,
    pub faction_id: i16,
    pub flags: u8,
}

impl PeopleRecord {
    pub const SIZE: usize = 17;

    pub const fn texture(&self) -> TextureRef {
        TextureRef::from_bitfield(self.texture_bitfield)
    }
}

/// Door placement (19 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct DoorRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub reserved1: u16,
    pub y_rotation: i16,
    pub reserved2: u16,
    pub null1: u8,
}

impl DoorRecord {
    pub const SIZE: usize = 19;
}

/// Objects placed by one half of a sub-record
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RmbBlockSection {
    pub header: SectionHeader,
    pub models: Vec<ModelRecord>,
    pub flats: Vec<FlatRecord>,
    pub section3: Vec<Section3Record>,
    pub people: Vec<PeopleRecord>,
    pub doors: Vec<DoorRecord>,
}

impl RmbBlockSection {
    /// Bytes this section occupies once decoded
    pub fn encoded_len(&self) -> usize {
        17 + self.models.len() * ModelRecord::SIZE
            + self.flats.len() * FlatRecord::SIZE
            + self.section3.len() * Section3Record::SIZE
            + self.people.len() * PeopleRecord::SIZE
            + self.doors.len() * DoorRecord::SIZE
    }

    fn read(view: &mut RecordView) -> Result<Self> {
        let header: SectionHeader = view.read_binrw()?;

        Ok(Self {
            header,
            models: read_list(view, header.model_count as usize)?,
            flats: read_list(view, header.flat_count as usize)?,
            section3: read_list(view, header.section3_count as usize)?,
            people: read_list(view, header.people_count as usize)?,
            doors: read_list(view, header.door_count as usize)?,
        })
    }
}

/// A building or other sub-layout of the block, outside and inside
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RmbSubRecord {
    pub exterior: RmbBlockSection,
    pub interior: RmbBlockSection,
    /// Size stored in the fixed header
    pub declared_size: usize,
    /// Bytes the two sections actually took
    pub consumed: usize,
}

/// Decoded exterior block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RmbBlock {
    /// Name of the archive record
    pub name: String,
    /// Whether the record held the whole fixed header
    pub header_complete: bool,
    /// Name stored inside the record
    pub block_name: String,
    pub alternate_names: Vec<String>,
    pub positions: Vec<BlockPosition>,
    pub buildings: Vec<BuildingData>,
    pub section2: Vec<u32>,
    pub declared_sizes: Vec<i32>,
    pub ground: GroundData,
    /// 64x64 automap, row major
    pub automap: Vec<u8>,
    pub sub_records: Vec<RmbSubRecord>,
    pub misc_models: Vec<ModelRecord>,
    pub misc_flats: Vec<FlatRecord>,
}

fn read_list<T>(view: &mut RecordView, count: usize) -> Result<Vec<T>>
where
    T: for<'b> BinRead<Args<'b> = ()>,
{
    (0..count)
        .map(|_| view.read_binrw().map_err(Error::from))
        .collect()
}

/// Reads the fixed header group by group. Once a group does not fit in the record, it and
/// every group after it are absent.
struct HeaderPrefix<'v, 'a> {
    view: &'v mut RecordView<'a>,
    complete: bool,
}

impl<'a> HeaderPrefix<'_, 'a> {
    fn group<T: Default>(
        &mut self,
        size: usize,
        read: impl FnOnce(&mut RecordView<'a>) -> Result<T>,
    ) -> Result<T> {
        if self.complete && self.view.remaining() >= size {
            return read(&mut *self.view);
        }
        self.complete = false;
        Ok(T::default())
    }
}

impl RmbBlock {
    /// Decode an exterior block starting at the view's cursor.
    ///
    /// A record shorter than the fixed header keeps the groups it holds in full. Everything
    /// after the first missing group is absent, and no sub-records or loose objects are read.
    #[instrument(skip(view), fields(len = view.len()), err)]
    pub fn decode(view: &mut RecordView, name: &str) -> Result<Self> {
        let available = view.remaining();
        let mut header = HeaderPrefix {
            view: &mut *view,
            complete: true,
        };

        let counts: [u8; 3] = header.group(3, |v| Ok(v.read_array()?))?;
        let positions = header.group(RMB_SLOTS * 20, |v| {
            read_list::<BlockPosition>(v, RMB_SLOTS)
        })?;
        let buildings = header.group(RMB_SLOTS * 26, |v| {
            read_list::<BuildingData>(v, RMB_SLOTS)
        })?;
        let section2 = header.group(RMB_SLOTS * 4, |v| {
            Ok((0..RMB_SLOTS)
                .map(|_| v.read_u32())
                .collect::<std::result::Result<Vec<_>, _>>()?)
        })?;
        let declared_sizes = header.group(RMB_SLOTS * 4, |v| {
            Ok((0..RMB_SLOTS)
                .map(|_| v.read_i32())
                .collect::<std::result::Result<Vec<_>, _>>()?)
        })?;
        let ground = header.group(8 + 2 * GROUND_DIMENSION * GROUND_DIMENSION, |v| {
            Ok(GroundData {
                header: v.read_array()?,
                tiles: v
                    .read_bytes(GROUND_DIMENSION * GROUND_DIMENSION)?
                    .iter()
                    .copied()
                    .map(GroundTile::from)
                    .collect(),
                scenery: v
                    .read_bytes(GROUND_DIMENSION * GROUND_DIMENSION)?
                    .iter()
                    .copied()
                    .map(Scenery::from)
                    .collect(),
            })
        })?;
        let automap = header.group(AUTOMAP_DIMENSION * AUTOMAP_DIMENSION, |v| {
            Ok(v.read_bytes(AUTOMAP_DIMENSION * AUTOMAP_DIMENSION)?.to_vec())
        })?;
        let (block_name, alternate_names) =
            header.group(NAME_WIDTH * (RMB_SLOTS + 1), |v| {
                let block_name = v.read_fixed_string(NAME_WIDTH)?;
                let alternate_names = (0..RMB_SLOTS)
                    .map(|_| v.read_fixed_string(NAME_WIDTH))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok((block_name, alternate_names))
            })?;

        let header_complete = header.complete;
        let [sub_record_count, misc_model_count, misc_flat_count] = if header_complete {
            counts.map(usize::from)
        } else {
            warn!(
                available,
                needed = RMB_HEADER_SIZE,
                "record is shorter than the fixed header"
            );
            [0; 3]
        };

        if sub_record_count > RMB_SLOTS {
            return Err(Error::mismatch(format!(
                "{sub_record_count} sub-records but only {RMB_SLOTS} slots"
            )));
        }

        let mut sub_records = Vec::with_capacity(sub_record_count);
        for (slot, &declared) in declared_sizes.iter().take(sub_record_count).enumerate() {
            let declared_size = usize::try_from(declared).map_err(|_| {
                Error::mismatch(format!("sub-record {slot} declares size {declared}"))
            })?;

            let start = view.position();
            let exterior = RmbBlockSection::read(view)?;
            let interior = RmbBlockSection::read(view)?;
            let consumed = view.position() - start;

            if consumed != declared_size {
                warn!(
                    slot,
                    declared_size, consumed, "sub-record size differs from declared size"
                );
            }
            view.seek(start + declared_size)?;

            sub_records.push(RmbSubRecord {
                exterior,
                interior,
                declared_size,
                consumed,
            });
        }

        let misc_models = read_list(view, misc_model_count)?;
        let misc_flats = read_list(view, misc_flat_count)?;

        Ok(Self {
            name: name.to_owned(),
            header_complete,
            block_name,
            alternate_names,
            positions,
            buildings,
            section2,
            declared_sizes,
            ground,
            automap,
            sub_records,
            misc_models,
            misc_flats,
        })
    }

    /// Every model in the block, sub-records first
    pub fn models(&self) -> impl Iterator<Item = &ModelRecord> {
        self.sub_records
            .iter()
            .flat_map(|s| s.exterior.models.iter().chain(s.interior.models.iter()))
            .chain(self.misc_models.iter())
    }

    /// Buildings that actually have a sub-record
    pub fn used_buildings(&self) -> &[BuildingData] {
        &self.buildings[..self.sub_records.len().min(self.buildings.len())]
    }
}
