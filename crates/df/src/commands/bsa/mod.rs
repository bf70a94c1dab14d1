pub mod extract;
pub mod list;

#[derive(clap::Subcommand)]
pub enum BsaCommands {
    /// List the records of a BSA file
    List(list::ListArgs),
    /// Extract a BSA file into a directory
    Extract(extract::ExtractArgs),
}

impl BsaCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            BsaCommands::List(list) => list.handle(),
            BsaCommands::Extract(extract) => extract.handle(),
        }
    }
}
