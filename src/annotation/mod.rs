//! Genome [`Annotation`] from GFF3 files, used to order groups by their genomic start.


use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use itertools::Itertools;
use log::{debug, warn};
use std::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Attribute keys Nextclade searches, in order, for a CDS name.
pub const CDS_NAME_KEYS: &[&str] = &[
    "Gene",
    "gene",
    "gene_name",
    "locus_tag",
    "Name",
    "name",
    "Alias",
    "alias",
    "standard_name",
    "old-name",
    "product",
    "gene_synonym",
    "gb-synonym",
    "acronym",
    "gb-acronym",
    "protein_id",
    "ID",
];

// ----------------------------------------------------------------------------
// Feature
// ----------------------------------------------------------------------------

/// One GFF3 feature line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    pub seqid: String,
    /// Feature type (column 3), ex. `gene` or `CDS`.
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub attributes: Vec<(String, String)>,
}

impl Feature {
    /// Returns true if any CDS name attribute equals `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|(key, value)| value == name && CDS_NAME_KEYS.contains(&key.as_str()))
    }
}

/// Parse the `key=value;key=value` attribute column.
///
/// ```rust
/// use vargram::annotation::parse_attributes;
///
/// let attributes = parse_attributes("ID=cds-1; gene=S;Note");
/// assert_eq!(attributes, [("ID".to_string(), "cds-1".to_string()), ("gene".to_string(), "S".to_string())]);
/// ```
pub fn parse_attributes(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|attribute| attribute.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

// ----------------------------------------------------------------------------
// Annotation
// ----------------------------------------------------------------------------

/// Genome annotation features.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotation {
    pub features: Vec<Feature>,
}

impl Annotation {
    pub fn new() -> Self {
        Annotation { features: Vec::new() }
    }

    /// Read a GFF3 file.
    pub fn read<P>(path: &P) -> Result<Annotation, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let file = File::open(path).wrap_err_with(|| format!("Failed to read genome annotation: {path:?}"))?;
        Annotation::from_reader(file).wrap_err_with(|| format!("Failed to parse genome annotation: {path:?}"))
    }

    /// Parse GFF3 text. Comment lines (`#`) are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Annotation, Report> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut annotation = Annotation::new();
        for (line_i, record) in reader.records().enumerate() {
            let record = record?;
            // blank or truncated lines, ex. a trailing FASTA section
            if record.len() < 9 {
                debug!("Skipping GFF record {line_i} with {} columns.", record.len());
                continue;
            }
            let parse_coord = |i: usize| {
                record[i]
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| eyre!("Invalid coordinate {:?} in GFF record {line_i}: {e}", &record[i]))
            };
            annotation.features.push(Feature {
                seqid: record[0].to_string(),
                kind: record[2].to_string(),
                start: parse_coord(3)?,
                end: parse_coord(4)?,
                attributes: parse_attributes(&record[8]),
            });
        }
        Ok(annotation)
    }

    /// Minimum start coordinate of the `gene` and `CDS` features matching `name`.
    pub fn start_of(&self, name: &str) -> Option<usize> {
        self.features
            .iter()
            .filter(|f| f.kind == "gene" || f.kind == "CDS")
            .filter(|f| f.matches(name))
            .map(|f| f.start)
            .min()
    }

    /// Order group names by their genomic start.
    ///
    /// Groups with no matching feature keep their input order after the matched groups.
    pub fn order<S: AsRef<str>>(&self, groups: &[S]) -> Vec<String> {
        let (matched, unmatched): (Vec<_>, Vec<_>) =
            groups.iter().map(|g| (g.as_ref(), self.start_of(g.as_ref()))).partition(|(_, s)| s.is_some());

        if !unmatched.is_empty() {
            let names = unmatched.iter().map(|(g, _)| g).join(", ");
            warn!("Groups not found in the genome annotation: {names}");
        }

        matched
            .into_iter()
            .sorted_by_key(|(_, start)| *start)
            .chain(unmatched)
            .map(|(g, _)| g.to_string())
            .collect()
    }
}
