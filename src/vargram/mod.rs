//! Build a mutation profile from a sequence of calls.
//!
//! Calls are recorded as they are made and replayed when a terminal call (`stat`,
//! `save`, `show`) needs output: key lineages are gathered first, then the data is
//! processed, then the structure and aesthetics are applied.
//!
//! ```rust,no_run
//! use vargram::aggregate::ProcessArgs;
//! use vargram::key::KeyArgs;
//! use vargram::wrangle::Input;
//! use vargram::Vargram;
//!
//! let input = Input { data: Some("nextclade.tsv".into()), ..Default::default() };
//! let mut vg = Vargram::new(&input)?;
//! vg.profile(ProcessArgs::default()).key(KeyArgs::new("BA.2.tsv"));
//! vg.save("profile.png")?;
//! vg.save("profile.csv")?;
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```


use crate::aggregate::{self, ProcessArgs, ProfileData};
use crate::annotation::Annotation;
use crate::key::{Key, KeyArgs, KeyTable};
use crate::layout::{self, StructArgs, Structure};
use crate::render::{self, Aes};
use crate::wrangle::{self, Format, Input, Wrangled};
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info};
use std::path::{Path, PathBuf};
use vargram_table::Table;

// ----------------------------------------------------------------------------
// Calls
// ----------------------------------------------------------------------------

/// A recorded call that shapes the figure.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Profile(ProcessArgs),
    Key(KeyArgs),
    Struct(StructArgs),
    Aes(Aes),
}

/// State produced by replaying the calls.
#[derive(Clone, Debug, PartialEq)]
pub struct Generated {
    pub profile: ProfileData,
    pub structure: Structure,
    /// Completed aesthetics.
    pub aes: Aes,
}

// ----------------------------------------------------------------------------
// Vargram
// ----------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Vargram {
    data: Table,
    format: Option<Format>,
    annotation: Option<Annotation>,
    calls: Vec<Call>,
    generated: Option<Generated>,
}

impl Vargram {
    /// Read the input data, running Nextclade when sequences are given.
    pub fn new(input: &Input) -> Result<Self, Report> {
        Ok(Vargram::from_wrangled(wrangle::wrangle(input)?))
    }

    pub fn from_wrangled(wrangled: Wrangled) -> Self {
        Vargram {
            data: wrangled.data,
            format: wrangled.format,
            annotation: wrangled.annotation,
            calls: Vec::new(),
            generated: None,
        }
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    fn record(&mut self, call: Call) -> &mut Self {
        debug!("Recorded call: {call:?}");
        self.generated = None;
        self.calls.push(call);
        self
    }

    /// Plot a mutation profile. The most recent profile call is the one drawn.
    pub fn profile(&mut self, args: ProcessArgs) -> &mut Self {
        self.record(Call::Profile(args))
    }

    /// Same as [`Vargram::profile`].
    pub fn bar(&mut self, args: ProcessArgs) -> &mut Self {
        self.profile(args)
    }

    /// Add a key lineage.
    pub fn key(&mut self, args: KeyArgs) -> &mut Self {
        self.record(Call::Key(args))
    }

    /// Arrange groups into rows.
    pub fn structure(&mut self, args: StructArgs) -> &mut Self {
        self.record(Call::Struct(args))
    }

    /// Set aesthetics. The most recent call replaces earlier ones.
    pub fn aes(&mut self, aes: Aes) -> &mut Self {
        self.record(Call::Aes(aes))
    }

    /// Replay the calls, or reuse the state of an earlier terminal call.
    pub fn generate(&mut self) -> Result<&Generated, Report> {
        if self.generated.is_none() {
            self.generated = Some(self.replay()?);
        }
        self.generated.as_ref().ok_or_else(|| eyre!("Failed to generate the mutation profile."))
    }

    fn replay(&self) -> Result<Generated, Report> {
        let args = self
            .calls
            .iter()
            .rev()
            .find_map(|call| match call {
                Call::Profile(args) => Some(args),
                _ => None,
            })
            .ok_or_else(|| eyre!("No mutation profile was requested."))
            .suggestion("Call profile before stat, save or show.")?;

        // keys are read once, in the order they were added
        let keys = self
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Key(args) => Some(args),
                _ => None,
            })
            .enumerate()
            .map(|(i, args)| Key::read(args, i + 1))
            .collect::<Result<Vec<_>, _>>()?;
        let keys = if keys.is_empty() { None } else { Some(KeyTable::gather(&keys, &args.group, &args.x)?) };

        let profile = aggregate::process(&self.data, self.format, args, keys.as_ref())?;

        let struct_args = self.calls.iter().rev().find_map(|call| match call {
            Call::Struct(args) => Some(args.clone()),
            _ => None,
        });
        let structure = layout::resolve(&profile, &struct_args.unwrap_or_default(), self.annotation.as_ref())?;
        debug!("Figure rows: {}", structure.iter().map(|row| row.join(",")).join(" / "));

        let aes = self.calls.iter().rev().find_map(|call| match call {
            Call::Aes(aes) => Some(aes.clone()),
            _ => None,
        });
        let key_colors = keys.map(|k| k.colors).unwrap_or_default();
        let aes = aes.unwrap_or_default().complete(&profile, &key_colors)?;

        Ok(Generated { profile, structure, aes })
    }

    /// The processed profile table.
    pub fn stat(&mut self) -> Result<Table, Report> {
        Ok(self.generate()?.profile.to_table())
    }

    /// Write the profile table (`.csv`, `.tsv`) or the figure (`.png`).
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Report> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase());
        match extension.as_deref() {
            Some("csv") => self.stat()?.write(&path, Some(','))?,
            Some("tsv") => self.stat()?.write(&path, Some('\t'))?,
            Some("png") => {
                let generated = self.generate()?;
                render::plot(&generated.profile, &generated.structure, &generated.aes, path)?;
            }
            _ => {
                return Err(eyre!("Unsupported output file: {path:?}").suggestion("Save to a .csv, .tsv or .png file."))
            }
        }
        info!("Saved: {path:?}");
        Ok(())
    }

    /// Draw the figure to a temporary PNG that is kept, and return its path.
    pub fn show(&mut self) -> Result<PathBuf, Report> {
        self.generate()?;
        let (_, path) = tempfile::Builder::new().prefix("vargram_").suffix(".png").tempfile()?.keep()?;
        self.save(&path)?;
        Ok(path)
    }
}
