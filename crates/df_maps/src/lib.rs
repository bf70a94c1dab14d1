//! This library decodes the regions and locations stored in **MAPS.BSA**.
//!
//! ## Archive Layout
//!
//! Every region occupies four consecutive archive records:
//!
//! | Record   | Contents                                                        |
//! |----------|-----------------------------------------------------------------|
//! | `4r`     | building detail: offset table, then one element per location    |
//! | `4r + 1` | dungeon detail: offset table keyed by exterior location id      |
//! | `4r + 2` | location summaries, 15 bytes each                               |
//! | `4r + 3` | location names: `u32` count, then 32 byte names                 |
//!
//! ## Summaries
//!
//! | Offset (bytes) | Field     | Description                                                |
//! |----------------|-----------|------------------------------------------------------------|
//! | 0x0000         | Id        | 4 bytes: location id                                       |
//! | 0x0004         | Flags     | 1 byte                                                     |
//! | 0x0005         | Bitfield  | 4 bytes: longitude in the low 17 bits, type code above     |
//! | 0x0009         | Latitude  | 2 bytes                                                    |
//! | 0x000B         | Reserved  | 4 bytes                                                    |
//!
//! Exterior block grids are turned into RMB file names by [`names::exterior_block_name`], which
//! carries the per-city letter exceptions in [`names::BLOCK_LETTER_EXCEPTIONS`].

pub mod error;
pub mod location;
pub mod names;
pub mod read;
pub mod region;

pub use location::Location;
pub use read::MapsArchive;
pub use region::{LocationType, Region};
