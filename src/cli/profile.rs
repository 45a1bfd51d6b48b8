use crate::aggregate::ProcessArgs;
use crate::key::KeyArgs;
use crate::layout::StructArgs;
use crate::render::Aes;
use crate::wrangle::Input;
use crate::Vargram;
use clap::Args as ClapArgs;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

// ----------------------------------------------------------------------------
// Profile Args
// ----------------------------------------------------------------------------

/// Arguments of the profile command.
///
/// Everything except `--config` and `--write-config` can be saved to and read
/// from a JSON file.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ClapArgs)]
#[serde(default)]
pub struct ProfileArgs {
    #[clap(flatten)]
    #[serde(flatten)]
    pub input: Input,

    #[clap(flatten)]
    #[serde(flatten)]
    pub process: ProcessArgs,

    /// Key lineage table, optionally with a heatmap label and hex color.
    ///
    /// Repeat to add more keys.
    #[clap(long = "key", value_name = "PATH[:LABEL[:COLOR]]")]
    pub keys: Vec<KeyArgs>,

    /// Group column of every key table.
    #[clap(long)]
    #[serde(skip)]
    pub key_group: Option<String>,

    /// X column of every key table.
    #[clap(long)]
    #[serde(skip)]
    pub key_x: Option<String>,

    #[clap(flatten)]
    #[serde(flatten)]
    pub structure: StructArgs,

    /// Aesthetics JSON file.
    #[clap(long, value_name = "JSON", value_parser = read_aes)]
    pub aes: Option<Aes>,

    /// TrueType font for figure text.
    #[clap(long)]
    #[serde(skip)]
    pub font: Option<PathBuf>,

    /// Output files: a figure (.png) or the profile table (.csv, .tsv).
    #[clap(short = 'o', long, default_value = "vargram.png")]
    pub output: Vec<PathBuf>,

    /// Read the arguments from a JSON file instead.
    #[clap(long, value_name = "JSON")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Write the arguments to a JSON file.
    #[clap(long, value_name = "JSON")]
    #[serde(skip)]
    pub write_config: Option<PathBuf>,
}

impl Default for ProfileArgs {
    fn default() -> Self {
        ProfileArgs {
            input: Input::default(),
            process: ProcessArgs::default(),
            keys: Vec::new(),
            key_group: None,
            key_x: None,
            structure: StructArgs::default(),
            aes: None,
            font: None,
            output: vec![PathBuf::from("vargram.png")],
            config: None,
            write_config: None,
        }
    }
}

impl ProfileArgs {
    /// Read [`ProfileArgs`] from a JSON file.
    ///
    /// ```rust
    /// use vargram::cli::profile::ProfileArgs;
    ///
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("profile.json");
    /// std::fs::write(&path, r#"{"data": "nextclade.tsv", "ytype": "counts", "struct": "S/N"}"#)?;
    ///
    /// let args = ProfileArgs::read(&path)?;
    /// assert_eq!(args.input.data.as_deref(), Some(std::path::Path::new("nextclade.tsv")));
    /// assert_eq!(args.structure.structure.as_deref(), Some("S/N"));
    /// assert_eq!(args.output[0].to_str(), Some("vargram.png"));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P) -> Result<ProfileArgs, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let input = std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read profile arguments: {path:?}."))?;
        let args = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to deserialize profile arguments: {input}"))?;
        Ok(args)
    }

    /// Write [`ProfileArgs`] to a JSON file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let output = serde_json::to_string_pretty(self)
            .wrap_err(format!("Failed to serialize profile arguments: {self:?}"))?;
        std::fs::write(path, output).wrap_err(format!("Failed to write profile arguments: {path:?}"))?;
        Ok(())
    }

    /// Swap in the `--config` file, then apply the key column and font options.
    pub fn resolve(self) -> Result<ProfileArgs, Report> {
        let mut args = match self.config.clone() {
            Some(path) => {
                info!("Reading profile arguments: {path:?}");
                ProfileArgs { write_config: self.write_config, ..ProfileArgs::read(&path)? }
            }
            None => self,
        };

        for key in args.keys.iter_mut() {
            if let Some(group) = &args.key_group {
                key.group = group.clone();
            }
            if let Some(x) = &args.key_x {
                key.x = x.clone();
            }
        }
        if let Some(font) = args.font.take() {
            let aes = args.aes.get_or_insert_with(Aes::default);
            aes.font = Some(font);
        }
        args.key_group = None;
        args.key_x = None;
        args.config = None;

        Ok(args)
    }

    /// Build the profile and save every output.
    pub fn run(self) -> Result<(), Report> {
        let args = self.resolve()?;
        debug!("Profile arguments: {args:?}");

        if let Some(path) = &args.write_config {
            args.write(path)?;
            info!("Saved: {path:?}");
        }
        if args.output.is_empty() {
            return Err(eyre!("No output files were requested."));
        }

        let mut vg = Vargram::new(&args.input)?;
        vg.profile(args.process.clone());
        for key in &args.keys {
            vg.key(key.clone());
        }
        vg.structure(args.structure.clone());
        if let Some(aes) = &args.aes {
            vg.aes(aes.clone());
        }
        for output in &args.output {
            vg.save(output)?;
        }

        Ok(())
    }
}

/// Parse an aesthetics JSON file from the command line.
fn read_aes(path: &str) -> Result<Aes, Report> {
    let input = std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read aesthetics: {path:?}."))?;
    let aes = serde_json::from_str(&input).wrap_err_with(|| format!("Failed to deserialize aesthetics: {input}"))?;
    Ok(aes)
}
