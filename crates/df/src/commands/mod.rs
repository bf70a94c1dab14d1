pub mod blocks;
pub mod bsa;
pub mod image;
pub mod maps;
pub mod wld;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle BSA archives
    Bsa {
        #[command(subcommand)]
        command: bsa::BsaCommands,
    },
    /// Inspect block layouts in BLOCKS.BSA
    Blocks {
        #[command(subcommand)]
        command: blocks::BlocksCommands,
    },
    /// Inspect regions and locations in MAPS.BSA
    Maps {
        #[command(subcommand)]
        command: maps::MapsCommands,
    },
    /// Inspect image files
    Image {
        #[command(subcommand)]
        command: image::ImageCommands,
    },
    /// Inspect the world heightmap
    Wld {
        #[command(subcommand)]
        command: wld::WldCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Bsa { command } => command.handle(),
            Commands::Blocks { command } => command.handle(),
            Commands::Maps { command } => command.handle(),
            Commands::Image { command } => command.handle(),
            Commands::Wld { command } => command.handle(),
        }
    }
}

pub(crate) fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
