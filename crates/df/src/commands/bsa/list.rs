use std::path::PathBuf;

use clap::Args;
use df_bsa::{types::DirectoryType, BsaArchive, BsaOptions};
use miette::{Context, Result};

#[derive(Args)]
pub struct ListArgs {
    /// An input BSA file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let bsa = BsaArchive::open(&self.file, BsaOptions::default())
            .context(format!("path: {}", &self.file.display()))?;

        let keyed = match bsa.directory_type() {
            DirectoryType::NameRecord => "name",
            DirectoryType::NumberRecord => "number",
        };
        println!(
            "{} records, {keyed} keyed, {} bytes of data",
            bsa.len(),
            bsa.records_size()
        );
        for (i, entry) in bsa.entries().iter().enumerate() {
            println!(
                "{i:>6}  {:<12}  {:>10}  {:>10}",
                entry.name, entry.size, entry.offset
            );
        }
        Ok(())
    }
}
