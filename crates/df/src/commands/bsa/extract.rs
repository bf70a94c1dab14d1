use std::{fs::File, path::PathBuf};

use clap::Args;
use df_bsa::{BsaArchive, BsaOptions};
use miette::{Context, IntoDiagnostic, Result};
use tracing::info;

#[derive(Args)]
pub struct ExtractArgs {
    /// An input BSA file
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    pub directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let mut bsa = BsaArchive::open(&self.file, BsaOptions::default())
            .context(format!("path: {}", &self.file.display()))?;

        std::fs::create_dir_all(&self.directory)
            .into_diagnostic()
            .context(format!("creating {}", &self.directory.display()))?;

        for i in 0..bsa.len() {
            let mut record = bsa.by_index(i)?;

            let p = self.directory.join(record.name());
            info!("writing {}", p.display());

            let mut out = if !self.overwrite {
                File::create_new(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", &p.display()))?
            } else {
                File::create(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", &p.display()))?
            };

            std::io::copy(&mut record, &mut out).into_diagnostic()?;
        }
        Ok(())
    }
}
