//! `vargram` plots mutation profiles of batches of sequences, against key lineages.
//!
//! ## Why vargram?
//!
//! 1. `vargram` _summarizes_ mutations across batches.
//!
//!    Sequences are analyzed with [Nextclade](https://github.com/nextstrain/nextclade), or read
//!    from a saved analysis table. Observations are counted per gene and mutation, then
//!    normalized by batch so batches of different sizes can be compared side by side.
//!
//! 1. `vargram` _compares_ samples against key lineages.
//!
//!    Each key lineage (ex. a designated SARS-CoV-2 lineage) is a table of its defining
//!    mutations. Keys are drawn as heatmap rows under the bars, so novel and shared
//!    mutations stand out.
//!
//! 1. `vargram` _lays out_ one panel per gene.
//!
//!    Panels are packed into rows so that wide genes get room and small genes share a row,
//!    or follow the order of the genome annotation.
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
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```

pub mod aggregate;
pub mod annotation;
pub mod cli;
pub mod grid;
pub mod key;
pub mod layout;
pub mod mutation;
pub mod nextclade;
pub mod render;
pub mod vargram;
pub mod wrangle;

#[doc(inline)]
pub use crate::cli::{Cli, Verbosity};
#[doc(inline)]
pub use crate::vargram::Vargram;
#[doc(inline)]
pub use vargram_table::Table;
