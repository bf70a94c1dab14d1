use std::path::PathBuf;

use clap::Args;
use df_wld::WoodsFile;
use itertools::{Itertools, MinMaxResult};
use miette::{Context, Result};

use super::print_json;

#[derive(clap::Subcommand)]
pub enum WldCommands {
    /// Print the header and elevation range of a heightmap
    Info(InfoArgs),
}

impl WldCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            WldCommands::Info(info) => info.handle(),
        }
    }
}

#[derive(Args)]
pub struct InfoArgs {
    /// The WOODS.WLD file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let map = WoodsFile::open(&self.file)
            .context(format!("path: {}", &self.file.display()))?;

        print_json(&map.header)?;

        println!("{}x{} cells", map.width(), map.height());
        if let MinMaxResult::MinMax(low, high) = map.elevation().iter().minmax() {
            println!("elevation {low}..={high}");
        }
        Ok(())
    }
}
