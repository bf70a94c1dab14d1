use std::path::PathBuf;

use clap::Args;
use df_blocks::BlocksArchive;
use miette::{Context, Result};
use tracing::info;

use super::print_json;

#[derive(clap::Subcommand)]
pub enum BlocksCommands {
    /// Decode one block and print it as JSON
    Show(ShowArgs),
}

impl BlocksCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            BlocksCommands::Show(show) => show.handle(),
        }
    }
}

#[derive(Args)]
pub struct ShowArgs {
    /// The BLOCKS.BSA file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Block record name, e.g. TVRNAA01.RMB
    #[arg(short, long)]
    name: String,
}

impl ShowArgs {
    pub fn handle(&self) -> Result<()> {
        let mut blocks = BlocksArchive::open(&self.file)
            .context(format!("path: {}", &self.file.display()))?;

        let block = blocks
            .load_block(&self.name)
            .context(format!("decoding {}", self.name))?;
        info!("decoded {} block {}", block.block_type(), block.name());

        print_json(block)
    }
}
