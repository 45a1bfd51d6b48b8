//! Read and reshape input data into one observation per row.

#[cfg(test)]
mod tests;

use crate::annotation::Annotation;
use crate::mutation::Mutation;
use crate::nextclade;
use clap::{Args as ClapArgs, ValueEnum};
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum::{Display, EnumIter};
use vargram_table::Table;

/// Nextclade analysis columns holding amino-acid mutations.
pub const NEXTCLADE_MUTATION_COLUMNS: &[&str] = &["aaSubstitutions", "aaDeletions", "aaInsertions"];
/// Nextclade sequence name column.
pub const NEXTCLADE_SEQNAME: &str = "seqName";
/// Batch name used when a Nextclade table has no `batch` column.
pub const DEFAULT_BATCH: &str = "my_batch";

// ----------------------------------------------------------------------------
// Format
// ----------------------------------------------------------------------------

/// Input data format.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[clap(rename_all = "snake_case")]
pub enum Format {
    /// FASTA sequences analyzed with Nextclade.
    NextcladeFasta,
    /// A saved Nextclade analysis table (CSV uses `;`).
    NextcladeDelimited,
    /// A saved vargram profile table.
    Vargram,
    /// Any CSV or TSV of observations.
    Delimited,
}

impl Format {
    /// Formats whose x values are Nextclade mutation names.
    pub fn has_positions(&self) -> bool {
        matches!(self, Format::NextcladeFasta | Format::NextcladeDelimited)
    }
}

// ----------------------------------------------------------------------------
// Input
// ----------------------------------------------------------------------------

/// Data input arguments.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ClapArgs)]
#[serde(default)]
pub struct Input {
    #[clap(flatten)]
    pub nextclade: nextclade::Args,

    /// Delimited data file (.csv or .tsv).
    #[clap(long, conflicts_with = "seq")]
    pub data: Option<PathBuf>,

    /// Input format. Defaults to nextclade_fasta with --seq, otherwise nextclade_delimited.
    #[clap(long, value_enum)]
    pub format: Option<Format>,

    /// Metadata file (.csv or .tsv) to outer join with the data.
    #[clap(long, requires = "join")]
    pub meta: Option<PathBuf>,

    /// Column(s) to join data and metadata on.
    ///
    /// With two names, the second (metadata) column is renamed to the first.
    #[clap(long, value_delimiter = ',', num_args = 1..=2)]
    pub join: Vec<String>,
}

/// Observations ready for aggregation.
#[derive(Clone, Debug, Default)]
pub struct Wrangled {
    pub data: Table,
    pub format: Option<Format>,
    pub annotation: Option<Annotation>,
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Read a CSV or TSV. Nextclade writes its CSV with `;`.
pub fn read_table<P>(path: &P, nextclade_file: bool) -> Result<Table, Report>
where
    P: AsRef<Path> + Debug,
{
    let ext = path.as_ref().extension().and_then(|e| e.to_str()).unwrap_or_default().to_lowercase();
    let delim = match ext.as_str() {
        "csv" if nextclade_file => ';',
        "csv" => ',',
        "tsv" => '\t',
        _ => {
            return Err(eyre!("Unrecognized file path: {path:?}").suggestion("Expecting a .csv or .tsv file."))
        }
    };
    Table::read(path, Some(delim))
}

/// Explode Nextclade mutation columns to one row per mutation.
///
/// Output columns are `batch`, `seqName`, `gene`, `position`, `mutation`, `type`, sorted (stable) by position.
///
/// ```rust
/// use vargram_table::Table;
/// use vargram::wrangle::process_nextclade;
///
/// let mut table = Table::with_headers(["batch", "seqName", "aaSubstitutions", "aaDeletions", "aaInsertions"]);
/// table.add_row(["b1", "seq1", "S:N501Y,S:D614G", "S:Y144-", ""])?;
///
/// let observed = process_nextclade(&table)?;
/// assert_eq!(observed.headers, ["batch", "seqName", "gene", "position", "mutation", "type"]);
/// assert_eq!(observed.rows, [
///     ["b1", "seq1", "S", "144", "Y144-", "del"],
///     ["b1", "seq1", "S", "501", "N501Y", "sub"],
///     ["b1", "seq1", "S", "614", "D614G", "sub"],
/// ]);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn process_nextclade(table: &Table) -> Result<Table, Report> {
    let batch_i = table.get_header_index("batch")?;
    let seqname_i = table.get_header_index(NEXTCLADE_SEQNAME)?;
    let mutation_i: Vec<usize> =
        NEXTCLADE_MUTATION_COLUMNS.iter().map(|h| table.get_header_index(h)).collect::<Result<_, _>>()?;

    let mut observations = Vec::new();
    for row in &table.rows {
        let notations = mutation_i
            .iter()
            .map(|i| row[*i].as_str())
            .flat_map(|column| column.split(','))
            .map(str::trim)
            .filter(|m| !m.is_empty());
        for notation in notations {
            let mutation = Mutation::from_str(notation)
                .wrap_err_with(|| format!("Failed to parse mutation of sequence {:?}", row[seqname_i]))?;
            observations.push((row[batch_i].clone(), row[seqname_i].clone(), mutation));
        }
    }
    observations.sort_by_key(|(_, _, mutation)| mutation.position);

    let mut processed = Table::with_headers(["batch", NEXTCLADE_SEQNAME, "gene", "position", "mutation", "type"]);
    for (batch, seqname, mutation) in observations {
        let row = [batch, seqname, mutation.gene, mutation.position.to_string(), mutation.name, mutation.kind.to_string()];
        processed.add_row(row)?;
    }
    Ok(processed)
}

/// Outer join metadata onto the data.
///
/// One join name joins on that column (on `seqName` for Nextclade formats, renaming the
/// metadata column). Two names rename metadata column `join[1]` to `join[0]` first.
pub fn join_metadata(data: &Table, metadata: &Table, join: &[String], format: Format) -> Result<Table, Report> {
    let mut metadata = metadata.clone();
    let on = match join {
        [name] if format.has_positions() => {
            metadata.rename_header(name, NEXTCLADE_SEQNAME)?;
            NEXTCLADE_SEQNAME.to_string()
        }
        [name] => name.clone(),
        [left, right] => {
            metadata.rename_header(right, left)?;
            left.clone()
        }
        _ => {
            return Err(eyre!("Missing 'join' argument: {join:?}")
                .suggestion("Provide one or two column names to (outer) merge data and metadata on."))
        }
    };
    debug!("Joining metadata on column: {on}");
    data.outer_join(&metadata, &[&on], &[&on])
}

/// Wrangle user input into observations.
pub fn wrangle(input: &Input) -> Result<Wrangled, Report> {
    let format = match (input.format, &input.nextclade.seq, &input.data) {
        (Some(format), _, _) => format,
        (None, Some(_), _) => Format::NextcladeFasta,
        (None, None, Some(_)) => Format::NextcladeDelimited,
        (None, None, None) => {
            return Err(eyre!("Missing data.")
                .suggestion("Either provide FASTA files with --seq and --ref or a table with --data."))
        }
    };
    info!("Reading input data as format: {format}");

    let data_path = || input.data.as_ref().ok_or_else(|| eyre!("Format {format} requires --data."));

    let mut annotation = None;
    let mut data = match format {
        Format::NextcladeFasta => {
            let output = nextclade::run(&input.nextclade)?;
            annotation = output.annotation;
            process_nextclade(&output.table)?
        }
        Format::NextcladeDelimited => {
            let mut table = read_table(data_path()?, true)?;
            if !table.has_header("batch") {
                let batch = vec![DEFAULT_BATCH; table.rows.len()];
                table.insert_column(0, "batch", batch)?;
            }
            table.sort_by_columns(&["batch", NEXTCLADE_SEQNAME])?;
            process_nextclade(&table)?
        }
        Format::Vargram | Format::Delimited => read_table(data_path()?, false)?,
    };

    if annotation.is_none() {
        if let Some(gene) = &input.nextclade.gene {
            annotation = Some(Annotation::read(gene)?);
        }
    }

    if let Some(meta) = &input.meta {
        let metadata = read_table(meta, false)?;
        data = join_metadata(&data, &metadata, &input.join, format)?;
    }

    if data.is_empty() {
        return Err(eyre!("Wrangled data is empty."));
    }
    debug!("Wrangled {} rows with columns: {}", data.rows.len(), data.headers.iter().join(", "));

    Ok(Wrangled { data, format: Some(format), annotation })
}
