//! Parse amino-acid [`Mutation`] notation, such as `ORF1b:G662S`.

#[cfg(test)]
mod tests;

use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

// ----------------------------------------------------------------------------
// Mutation Type
// ----------------------------------------------------------------------------

/// The kind of amino-acid change.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize)]
pub enum MutationType {
    #[default]
    #[serde(rename = "sub")]
    #[strum(serialize = "sub")]
    Substitution,
    #[serde(rename = "del")]
    #[strum(serialize = "del")]
    Deletion,
    #[serde(rename = "in")]
    #[strum(serialize = "in")]
    Insertion,
}

/// Returns the [`MutationType`] of a gene-stripped mutation name.
///
/// A `-` marks a deletion and a remaining `:` marks an insertion.
///
/// ```rust
/// use vargram::mutation::{get_mutation_type, MutationType};
///
/// assert_eq!(get_mutation_type("G662S"), MutationType::Substitution);
/// assert_eq!(get_mutation_type("Y144-"), MutationType::Deletion);
/// assert_eq!(get_mutation_type("214:EPE"), MutationType::Insertion);
/// ```
pub fn get_mutation_type(name: &str) -> MutationType {
    if name.contains('-') {
        MutationType::Deletion
    } else if name.contains(':') {
        MutationType::Insertion
    } else {
        MutationType::Substitution
    }
}

// ----------------------------------------------------------------------------
// Notation Parts
// ----------------------------------------------------------------------------

/// Returns the gene name, the text before the first `:`.
///
/// ```rust
/// use vargram::mutation::parse_gene;
///
/// assert_eq!(parse_gene("ORF1b:G662S")?, "ORF1b");
/// assert_eq!(parse_gene("S:214:EPE")?, "S");
/// assert!(parse_gene("G662S").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn parse_gene(notation: &str) -> Result<&str, Report> {
    match notation.split_once(':') {
        Some((gene, _)) if !gene.is_empty() => Ok(gene),
        _ => Err(eyre!("Failed to parse gene from mutation: {notation:?}")
            .suggestion("Mutations are expected in the form <gene>:<change>, ex. ORF1b:G662S")),
    }
}

/// Removes the leading `gene:` prefix. Notation without a gene is returned as is.
///
/// ```rust
/// use vargram::mutation::strip_gene;
///
/// assert_eq!(strip_gene("ORF1b:G662S"), "G662S");
/// assert_eq!(strip_gene("S:214:EPE"), "214:EPE");
/// assert_eq!(strip_gene("G662S"), "G662S");
/// ```
pub fn strip_gene(notation: &str) -> &str {
    match notation.split_once(':') {
        Some((gene, name)) if !gene.is_empty() => name,
        _ => notation,
    }
}

/// Returns the first run of digits in a gene-stripped mutation name.
///
/// ```rust
/// use vargram::mutation::position_of;
///
/// assert_eq!(position_of("Y144-")?, 144);
/// assert_eq!(position_of("214:EPE")?, 214);
/// assert!(position_of("EPE").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn position_of(name: &str) -> Result<usize, Report> {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Err(eyre!("Failed to parse position from mutation: {name:?}"));
    }
    digits.parse().map_err(|e| eyre!("Invalid position in mutation {name:?}: {e}"))
}

/// Returns the position, the first run of digits after the first `:`.
///
/// ```rust
/// use vargram::mutation::parse_position;
///
/// assert_eq!(parse_position("ORF1b:G662S")?, 662);
/// assert!(parse_position("G662S").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn parse_position(notation: &str) -> Result<usize, Report> {
    match notation.split_once(':') {
        Some((_, name)) => position_of(name),
        None => Err(eyre!("Failed to parse position from mutation: {notation:?}")),
    }
}

// ----------------------------------------------------------------------------
// Mutation
// ----------------------------------------------------------------------------

/// A single amino-acid change on a gene.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Mutation {
    pub gene: String,
    pub position: usize,
    /// Gene-stripped name, ex. `G662S`.
    pub name: String,
    pub kind: MutationType,
}

impl FromStr for Mutation {
    type Err = Report;

    /// Parse a [`Mutation`] from Nextclade notation.
    ///
    /// ```rust
    /// use vargram::mutation::{Mutation, MutationType};
    /// use std::str::FromStr;
    ///
    /// let mutation = Mutation::from_str("S:Y144-")?;
    /// assert_eq!(mutation.gene, "S");
    /// assert_eq!(mutation.position, 144);
    /// assert_eq!(mutation.name, "Y144-");
    /// assert_eq!(mutation.kind, MutationType::Deletion);
    /// assert_eq!(mutation.to_string(), "S:Y144-");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_str(notation: &str) -> Result<Self, Self::Err> {
        let gene = parse_gene(notation)?.to_string();
        let position = parse_position(notation)?;
        let name = strip_gene(notation).to_string();
        let kind = get_mutation_type(&name);
        Ok(Mutation { gene, position, name, kind })
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.gene, self.name)
    }
}
