use crate::nextclade;
use clap::Args as ClapArgs;
use color_eyre::eyre::{Report, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Run Nextclade and keep its table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ClapArgs)]
pub struct NextreadArgs {
    #[clap(flatten)]
    pub nextclade: nextclade::Args,

    /// Output table (.csv or .tsv).
    #[clap(short = 'o', long, default_value = "nextclade.tsv")]
    pub output: PathBuf,
}

impl NextreadArgs {
    pub fn run(&self) -> Result<(), Report> {
        let output = nextclade::run(&self.nextclade)?;
        info!("Nextclade analyzed {} sequences.", output.table.rows.len());
        output.table.write(&self.output, None)?;
        info!("Saved: {:?}", self.output);
        Ok(())
    }
}
