//! This library decodes the block layouts stored in **BLOCKS.BSA**.
//!
//! Three kinds of record live in a block archive. The kind is chosen by the record's name, never by
//! its contents:
//!
//! | Suffix | Kind      | Decoded as                                              |
//! |--------|-----------|---------------------------------------------------------|
//! | `.RMB` | Exterior  | [`rmb::RmbBlock`]: ground, automap, buildings, objects  |
//! | `.RDB` | Dungeon   | [`rdb::RdbBlock`]: model table and linked object lists  |
//! | `.RDI` | Opaque    | [`block::RdiBlock`]: 512 raw bytes                      |
//!
//! [`BlocksArchive`] wraps the container and keeps decoded blocks in a
//! [`df_bsa::RecordCache`]. With auto discard on (the default) only the most recently loaded block
//! stays resident.
//!
//! Several values in block records are packed bitfields:
//!
//! - texture references: `archive = bits >> 7`, `record = bits & 0x7f`
//! - ground tiles: `record = bits & 0x3f`, rotated at bit 6, flipped at bit 7
//! - scenery: `255` is empty, otherwise `record = bits / 4 - 1` and `sub_index = bits & 3`

pub mod block;
pub mod error;
pub mod rdb;
pub mod read;
pub mod rmb;
pub mod types;

pub use block::{decode_block, Block};
pub use read::BlocksArchive;
pub use types::{BlockType, BuildingData, RdbBlockLetter};
