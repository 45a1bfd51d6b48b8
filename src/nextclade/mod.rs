//! Run the external [Nextclade](https://github.com/nextstrain/nextclade) CLI and read its analysis table.

#[cfg(test)]
mod tests;

use crate::annotation::Annotation;
use clap::Args as ClapArgs;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use indicatif::{style::ProgressStyle, ProgressBar};
use itertools::Itertools;
use log::{debug, info};
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use vargram_table::Table;

/// Oldest Nextclade release with the v3 CLI (`--input-dataset`, `--output-tsv`).
pub const MINIMUM_VERSION: &str = "3.0.0";

/// Annotation file name inside a downloaded Nextclade dataset.
pub const DATASET_ANNOTATION: &str = "genome_annotation.gff3";

const SEQUENCE_EXTENSIONS: &[&str] = &["fa", "fasta"];
const ANNOTATION_EXTENSIONS: &[&str] = &["gff", "gff3"];

// ----------------------------------------------------------------------------
// Args
// ----------------------------------------------------------------------------

/// Sequence input for a Nextclade analysis.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ClapArgs)]
#[serde(default)]
pub struct Args {
    /// FASTA file of sequences, or a directory of FASTA files (one batch per file).
    #[clap(long)]
    pub seq: Option<PathBuf>,

    /// Reference FASTA file, or the name (or shortcut) of a Nextclade dataset.
    #[clap(long = "ref")]
    #[serde(rename = "ref")]
    pub reference: Option<String>,

    /// Genome annotation (GFF3). Required when the reference is a FASTA file.
    #[clap(long)]
    pub gene: Option<PathBuf>,

    /// Nextclade executable.
    #[clap(long, default_value_t = Args::default().nextclade)]
    pub nextclade: String,
}

impl Default for Args {
    fn default() -> Self {
        Args { seq: None, reference: None, gene: None, nextclade: "nextclade".to_string() }
    }
}

/// Validated Nextclade input.
#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    pub seq: PathBuf,
    pub reference: Reference,
    pub nextclade: String,
}

/// Where the reference comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum Reference {
    /// A Nextclade dataset name, downloaded at run time.
    Dataset(String),
    /// Local reference FASTA with its genome annotation.
    Local { fasta: PathBuf, annotation: PathBuf },
}

/// Concatenated Nextclade analysis of all batches.
#[derive(Clone, Debug, Default)]
pub struct Output {
    /// Nextclade TSV rows with a leading `batch` column.
    pub table: Table,
    /// Genome annotation of the reference, if one was available.
    pub annotation: Option<Annotation>,
}

// ----------------------------------------------------------------------------
// Validation
// ----------------------------------------------------------------------------

/// Check that a file has one of the expected (case-insensitive) extensions.
///
/// ```rust
/// use std::path::Path;
/// use vargram::nextclade::check_file_extension;
///
/// assert!(check_file_extension(Path::new("sequences.FASTA"), &["fa", "fasta"], "sequence").is_ok());
/// assert!(check_file_extension(Path::new("sequences.txt"), &["fa", "fasta"], "sequence").is_err());
/// ```
pub fn check_file_extension(path: &Path, valid: &[&str], file_type: &str) -> Result<(), Report> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_lowercase();
    if valid.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(eyre!("Unsupported {file_type} file format: {ext:?}")
            .suggestion(format!("Expected one of: {}", valid.join(", "))))
    }
}

/// Validate user input, resolving the reference to a dataset or local files.
///
/// Dataset names are checked against the names and shortcuts Nextclade knows.
pub fn check_input(args: &Args) -> Result<Input, Report> {
    let (seq, reference) = match (&args.seq, &args.reference) {
        (Some(seq), Some(reference)) => (seq, reference),
        (Some(_), None) => return Err(eyre!("Path of reference sequence is not provided.")),
        (None, Some(_)) => return Err(eyre!("Path of sequences is not provided.")),
        (None, None) => return Err(eyre!("Sequences and a reference must be provided.")),
    };

    if !seq.exists() {
        return Err(eyre!("Sequences do not exist: {seq:?}"));
    }
    if seq.is_file() {
        check_file_extension(seq, SEQUENCE_EXTENSIONS, "sequence")?;
    }

    let reference_path = Path::new(reference);
    let reference = if reference_path.is_file() {
        let annotation = args
            .gene
            .clone()
            .ok_or_else(|| eyre!("Genome annotation is not provided."))
            .suggestion("A local reference FASTA needs its annotation with --gene.")?;
        check_file_extension(reference_path, SEQUENCE_EXTENSIONS, "reference")?;
        check_file_extension(&annotation, ANNOTATION_EXTENSIONS, "gene annotation")?;
        Reference::Local { fasta: reference_path.to_path_buf(), annotation }
    } else {
        if let Some(gene) = &args.gene {
            check_file_extension(gene, ANNOTATION_EXTENSIONS, "gene annotation")?;
        }
        let known = dataset_names(&args.nextclade)?;
        if !known.contains(reference) {
            return Err(eyre!("Nextclade reference name not recognized: {reference:?}")
                .suggestion(format!("Valid names and shortcuts: {}", known.join(", "))));
        }
        Reference::Dataset(reference.clone())
    };

    Ok(Input { seq: seq.clone(), reference, nextclade: args.nextclade.clone() })
}

/// Extract dataset shortcuts from `nextclade dataset list` output.
///
/// ```rust
/// use vargram::nextclade::parse_shortcuts;
///
/// let text = r#"nextstrain/sars-cov-2/wuhan-hu-1/orfs (shortcuts: "sars-cov-2", "nextstrain/sars-cov-2")"#;
/// assert_eq!(parse_shortcuts(text)?, ["sars-cov-2", "nextstrain/sars-cov-2"]);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn parse_shortcuts(text: &str) -> Result<Vec<String>, Report> {
    let parentheses = Regex::new(r"\(shortcuts:(.*?)\)")?;
    let quotes = Regex::new(r#""(.*?)""#)?;
    let shortcuts = parentheses
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .flat_map(|m| quotes.captures_iter(m.as_str()).filter_map(|c| c.get(1)).map(|q| q.as_str().to_string()).collect_vec())
        .collect();
    Ok(shortcuts)
}

/// Dataset names and shortcuts known to the Nextclade executable.
pub fn dataset_names(executable: &str) -> Result<Vec<String>, Report> {
    let names = run_command(executable, &["dataset", "list", "--only-names"])?;
    let full = run_command(executable, &["dataset", "list"])?;
    let mut known = names.split_whitespace().map(String::from).collect_vec();
    known.extend(parse_shortcuts(&full)?);
    Ok(known)
}

/// Check that the Nextclade executable is at least [`MINIMUM_VERSION`].
pub fn check_version(executable: &str) -> Result<Version, Report> {
    let output = run_command(executable, &["--version"])?;
    // ex. "nextclade 3.8.2"
    let text = output.split_whitespace().last().unwrap_or_default();
    let version = Version::parse(text)
        .wrap_err_with(|| format!("Failed to parse Nextclade version: {output:?}"))?;
    let minimum = Version::parse(MINIMUM_VERSION)?;
    if version < minimum {
        return Err(eyre!("Nextclade version {version} is not supported.")
            .suggestion(format!("Please install Nextclade >= {minimum}.")));
    }
    debug!("Using Nextclade version {version}.");
    Ok(version)
}

// ----------------------------------------------------------------------------
// Batches
// ----------------------------------------------------------------------------

/// Batch names and FASTA paths. A directory gives one batch per file, named by the file stem.
pub fn get_batches(seq: &Path) -> Result<Vec<(String, PathBuf)>, Report> {
    let paths = if seq.is_dir() {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(seq).wrap_err_with(|| format!("Failed to read directory: {seq:?}"))? {
            let path = entry?.path();
            let hidden = path.file_name().and_then(|n| n.to_str()).map(|n| n.starts_with('.')).unwrap_or(true);
            if hidden || !path.is_file() {
                continue;
            }
            check_file_extension(&path, SEQUENCE_EXTENSIONS, "sequence")?;
            paths.push(path);
        }
        paths.sort();
        paths
    } else {
        vec![seq.to_path_buf()]
    };

    if paths.is_empty() {
        return Err(eyre!("No FASTA files were found: {seq:?}"));
    }

    paths
        .into_iter()
        .map(|path| {
            let batch = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(String::from)
                .ok_or_else(|| eyre!("Failed to get batch name from: {path:?}"))?;
            Ok((batch, path))
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Run
// ----------------------------------------------------------------------------

fn run_command<S: AsRef<str>>(executable: &str, args: &[S]) -> Result<String, Report> {
    let args = args.iter().map(|a| a.as_ref()).collect_vec();
    debug!("Running: {executable} {}", args.join(" "));
    let output = Command::new(executable).args(&args).output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => eyre!("Could not find Nextclade executable: {executable:?}")
            .suggestion("Install Nextclade or set its location with --nextclade."),
        _ => eyre!("Could not run {executable} {}: {e}", args.join(" ")),
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(eyre!(
            "Nextclade failed ({}): {executable} {}\n{}",
            output.status,
            args.join(" "),
            stderr.trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Analyze every batch with Nextclade.
///
/// Temporary directories are removed when this returns, on success or failure.
pub fn run(args: &Args) -> Result<Output, Report> {
    let input = check_input(args)?;
    check_version(&input.nextclade)?;
    let batches = get_batches(&input.seq)?;

    let analysis_dir = tempfile::Builder::new().prefix("vargram_analysis").tempdir()?;
    let reference_dir = tempfile::Builder::new().prefix("vargram_reference").tempdir()?;

    // reference arguments shared by every batch
    let (reference_args, annotation) = match &input.reference {
        Reference::Dataset(name) => {
            info!("Downloading Nextclade dataset: {name}");
            let output_dir = reference_dir.path().display().to_string();
            run_command(&input.nextclade, &["dataset", "get", "--name", name.as_str(), "--output-dir", output_dir.as_str()])?;
            let gff = reference_dir.path().join(DATASET_ANNOTATION);
            let annotation = match (&args.gene, gff.exists()) {
                (Some(gene), _) => Some(Annotation::read(gene)?),
                (None, true) => Some(Annotation::read(&gff)?),
                (None, false) => None,
            };
            (vec!["--input-dataset".to_string(), output_dir], annotation)
        }
        Reference::Local { fasta, annotation } => {
            let reference_args = vec![
                "--input-ref".to_string(),
                fasta.display().to_string(),
                "--input-annotation".to_string(),
                annotation.display().to_string(),
            ];
            (reference_args, Some(Annotation::read(annotation)?))
        }
    };

    let progress_bar_style = ProgressStyle::with_template("{bar:40} {pos}/{len} batches | Elapsed: {elapsed_precise}")
        .wrap_err("Failed to create progress bar from template.")?;
    let progress_bar = ProgressBar::new(batches.len() as u64);
    progress_bar.set_style(progress_bar_style);

    let mut table = Table::new();
    for (batch, fasta) in &batches {
        info!("Running Nextclade on batch: {batch}");
        let output_tsv = analysis_dir.path().join(format!("{batch}.tsv"));
        let mut run_args = vec!["run".to_string()];
        run_args.extend(reference_args.iter().cloned());
        run_args.extend(["--output-tsv".to_string(), output_tsv.display().to_string(), fasta.display().to_string()]);
        run_command(&input.nextclade, &run_args)?;

        let mut batch_table = Table::read(&output_tsv, Some('\t'))?;
        let batch_column = vec![batch.clone(); batch_table.rows.len()];
        batch_table.insert_column(0, "batch", batch_column)?;

        if table.headers.is_empty() {
            table.headers = batch_table.headers;
        } else if table.headers != batch_table.headers {
            return Err(eyre!("Nextclade output columns differ between batches: {batch}"));
        }
        table.rows.extend(batch_table.rows);
        progress_bar.inc(1);
    }
    progress_bar.finish();

    if table.is_empty() {
        return Err(eyre!("Nextclade analysis output is empty."));
    }
    table.sort_by_columns(&["batch", "seqName"])?;

    Ok(Output { table, annotation })
}
