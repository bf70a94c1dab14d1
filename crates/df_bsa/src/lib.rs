//! This library handles reading **BSA** archives and the records packed inside them.
//!
//! # BSA Archive Format Documentation
//!
//! A BSA file is a flat container of byte records. It has no compression and no checksums: records
//! are stored back to back after a tiny header and described by a directory at the very end of the
//! file. The same container carries block layouts, region maps, sounds and many other assets.
//!
//! ## File Structure
//!
//! | Offset (bytes)        | Field           | Description                                           |
//! |-----------------------|-----------------|-------------------------------------------------------|
//! | 0x0000                | Record Count    | 2 bytes: signed number of records                     |
//! | 0x0002                | Directory Type  | 2 bytes: `0x0100` name keyed, `0x0200` number keyed   |
//! | 0x0004                | Reserved        | 2 bytes: unused                                       |
//! | 0x0006                | Record Data     | Records stored contiguously in directory order        |
//! | file len - directory  | Directory       | One fixed size entry per record                       |
//!
//! ### Directory
//!
//! The directory size is `count * entry_size` and it always ends at the end of the file.
//!
//! Name keyed entries (18 bytes):
//!
//! | Offset (bytes) | Field | Description                                  |
//! |----------------|-------|----------------------------------------------|
//! | 0x0000         | Name  | 12 bytes: null padded record name            |
//! | 0x000C         | Flags | 2 bytes: unused by readers                   |
//! | 0x000E         | Size  | 4 bytes: size of the record data             |
//!
//! Number keyed entries (8 bytes):
//!
//! | Offset (bytes) | Field | Description                                  |
//! |----------------|-------|----------------------------------------------|
//! | 0x0000         | Id    | 4 bytes: numeric record id                   |
//! | 0x0004         | Size  | 4 bytes: size of the record data             |
//!
//! Record offsets are not stored. They are the running sum of the sizes before them, starting
//! directly after the header.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.bsa`
//! - **Endianness**: Little-endian for all multi-byte integers
//!
//! Besides the container itself this crate provides [`RecordView`], the bounded cursor every record
//! decoder reads through, and [`RecordCache`], the lazily populated store decoded records live in.

pub mod cache;
pub mod error;
pub mod read;
pub mod types;
pub mod view;

pub use cache::{CacheOptions, RecordCache};
pub use read::{require_extension, BsaArchive, BsaOptions};
pub use view::RecordView;
