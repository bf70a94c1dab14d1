use std::{
    fs::File,
    path::{Path, PathBuf},
};

use clap::Args;
use df_maps::MapsArchive;
use itertools::izip;
use miette::{miette, Context, Result};

use super::print_json;

#[derive(clap::Subcommand)]
pub enum MapsCommands {
    /// List the regions of a map archive
    Regions(RegionsArgs),
    /// List the locations of one region
    Locations(LocationsArgs),
    /// Decode one location and print it as JSON
    Location(LocationArgs),
}

impl MapsCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            MapsCommands::Regions(regions) => regions.handle(),
            MapsCommands::Locations(locations) => locations.handle(),
            MapsCommands::Location(location) => location.handle(),
        }
    }
}

fn open(path: &Path) -> Result<MapsArchive<File>> {
    MapsArchive::open(path).context(format!("path: {}", path.display()))
}

/// Resolve a region given either by index or by name
pub fn resolve_region(maps: &MapsArchive<File>, region: &str) -> Result<usize> {
    let index = match region.parse::<usize>() {
        Ok(index) if index < maps.region_count() => Some(index),
        Ok(_) => None,
        Err(_) => maps.region_index(region),
    };
    index.ok_or_else(|| miette!("no region {region} among {}", maps.region_count()))
}

#[derive(Args)]
pub struct RegionsArgs {
    /// The MAPS.BSA file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl RegionsArgs {
    pub fn handle(&self) -> Result<()> {
        let mut maps = open(&self.file)?;

        for r in 0..maps.region_count() {
            let region = maps.load_region(r)?;
            println!("{r:>3}  {:<32}  {:>4}", region.name, region.location_count());
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct LocationsArgs {
    /// The MAPS.BSA file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Region index or name
    #[arg(short, long)]
    region: String,
}

impl LocationsArgs {
    pub fn handle(&self) -> Result<()> {
        let mut maps = open(&self.file)?;
        let r = resolve_region(&maps, &self.region)?;
        let region = maps.load_region(r)?;

        for (i, name, summary) in izip!(0.., &region.location_names, &region.summaries) {
            println!("{i:>4}  {name:<32}  {}", summary.location_type());
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct LocationArgs {
    /// The MAPS.BSA file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Region index or name
    #[arg(short, long)]
    region: String,

    /// Location name, matched exactly
    #[arg(short, long)]
    name: String,
}

impl LocationArgs {
    pub fn handle(&self) -> Result<()> {
        let mut maps = open(&self.file)?;
        let r = resolve_region(&maps, &self.region)?;

        let location = maps
            .location_by_name(r, &self.name)
            .context(format!("decoding {}", self.name))?;
        print_json(&location)
    }
}
