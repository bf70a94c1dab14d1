use std::path::PathBuf;

use clap::Args;
use df_image::{
    sky::sky_index, texture::archive_index, CifRciFile, ImageSource, ImgFile, SkyFile,
    TextureFile,
};
use miette::{miette, Context, Result};

#[derive(clap::Subcommand)]
pub enum ImageCommands {
    /// Print the records, frame counts and sizes of an image file
    Info(InfoArgs),
}

impl ImageCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            ImageCommands::Info(info) => info.handle(),
        }
    }
}

#[derive(Args)]
pub struct InfoArgs {
    /// An IMG, CIF, RCI, TEXTURE.NNN or SKYNN.DAT file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

fn describe(source: &impl ImageSource) -> Result<()> {
    println!("{} records", source.record_count());
    for r in 0..source.record_count() {
        println!(
            "{r:>4}  {:>9}  {:>3} frames",
            source.size(r)?.to_string(),
            source.frame_count(r)?
        );
    }
    Ok(())
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_uppercase())
            .unwrap_or_default();
        let context = || format!("path: {}", self.file.display());

        if archive_index(&name).is_some() {
            let textures = TextureFile::open(&self.file).with_context(context)?;
            println!("texture archive {} \"{}\"", textures.archive, textures.name);
            return describe(&textures);
        }
        if sky_index(&name).is_some() {
            let sky = SkyFile::open(&self.file).with_context(context)?;
            println!("sky {:02}", sky.index);
            return describe(&sky);
        }

        match name.rsplit_once('.').map(|(_, extension)| extension) {
            Some("IMG") => {
                let img = ImgFile::open(&self.file).with_context(context)?;
                match img.header {
                    Some(header) => println!(
                        "image at ({}, {}), compression {:#06x}",
                        header.x_offset, header.y_offset, header.compression
                    ),
                    None => println!("headerless image"),
                }
                if img.palette.is_some() {
                    println!("embedded palette");
                }
                describe(&img)
            }
            Some("CIF" | "RCI") => {
                let file = CifRciFile::open(&self.file).with_context(context)?;
                println!("{} file", file.kind);
                describe(&file)
            }
            _ => Err(miette!("{} is not a known image file", self.file.display())),
        }
    }
}
