//! This library decodes the raster image containers of the game data.
//!
//! Four containers share one frame model and one set of compression schemes:
//!
//! | Container      | Type                    | Records                                          |
//! |----------------|-------------------------|--------------------------------------------------|
//! | `.IMG`         | [`img::ImgFile`]        | one image, optionally with an embedded palette   |
//! | `.CIF`, `.RCI` | [`cif::CifRciFile`]     | many images, or animations for `WEAPON*.CIF`     |
//! | `TEXTURE.NNN`  | [`texture::TextureFile`] | many images or animations, decoded on request   |
//! | `SKYNN.DAT`    | [`sky::SkyFile`]        | two 32 frame full screen animations              |
//!
//! All of them implement [`ImageSource`], so frames can be requested by record and frame number
//! without knowing the container:
//!
//! ```no_run
//! use df_image::{ImageSource, Palette, TextureFile};
//!
//! fn first_frames(path: &str) -> df_image::error::Result<()> {
//!     let textures = TextureFile::open(path)?;
//!     let palette = Palette::open("ART_PAL.COL")?;
//!
//!     for record in 0..textures.record_count() {
//!         let rgb = textures.get_frame(record, 0)?.to_rgb(&palette);
//!         println!("{record}: {}x{}", rgb.width, rgb.height);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! Decoded indexed frames always hold exactly `width * height` bytes.

pub mod cif;
pub mod compression;
pub mod error;
pub mod img;
pub mod palette;
pub mod sky;
pub mod texture;
pub mod types;

pub use cif::CifRciFile;
pub use img::ImgFile;
pub use palette::Palette;
pub use sky::SkyFile;
pub use texture::TextureFile;
pub use types::{Frame, ImageRecord, ImageSource, PixelFormat, Size};
