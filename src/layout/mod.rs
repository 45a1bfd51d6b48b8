//! Pack groups into figure rows.
//!
//! A structure is a list of rows, each row a list of group names. The width of a
//! group is its number of unique x values.

#[cfg(test)]
mod tests;

use crate::aggregate::{GroupCount, ProfileData};
use crate::annotation::Annotation;
use clap::Args as ClapArgs;
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Initial row capacity, in bars.
pub const MAX_PER_ROW: usize = 40;

/// Rows of group names.
pub type Structure = Vec<Vec<String>>;

// ----------------------------------------------------------------------------
// Arguments
// ----------------------------------------------------------------------------

/// How groups are arranged into figure rows.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ClapArgs)]
#[serde(default)]
pub struct StructArgs {
    /// Figure rows, such as "S, ORF1a / ORF1b". Rows split on '/', groups on ','.
    #[clap(long = "struct")]
    #[serde(rename = "struct")]
    pub structure: Option<String>,

    /// Order groups by their start in the genome annotation.
    #[clap(long)]
    pub order: bool,

    /// Put all groups in one row.
    #[clap(long)]
    pub flat: bool,

    /// Initial row capacity, in bars.
    #[clap(long, default_value_t = StructArgs::default().max_per_row)]
    pub max_per_row: usize,
}

impl Default for StructArgs {
    fn default() -> Self {
        StructArgs { structure: None, order: false, flat: false, max_per_row: MAX_PER_ROW }
    }
}

impl StructArgs {
    /// Use explicit rows of groups.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        let structure = rows.iter().map(|row| row.iter().map(|g| g.as_ref()).join(",")).join("/");
        StructArgs { structure: Some(structure), ..Default::default() }
    }
}

/// Decide the figure rows for `data`.
///
/// A given structure wins. Otherwise groups are ordered by the annotation (with `order`),
/// put in one row (with `flat`), or packed greedily.
pub fn resolve(data: &ProfileData, args: &StructArgs, annotation: Option<&Annotation>) -> Result<Structure, Report> {
    let groups = data.groups();
    if let Some(text) = &args.structure {
        let structure = parse_struct(text);
        validate_struct(&structure, &groups)?;
        return Ok(structure);
    }

    let counts = data.group_counts();
    match (args.order, annotation) {
        (true, Some(annotation)) => {
            let order = annotation.order(&groups);
            if args.flat {
                return Ok(vec![order]);
            }
            return Ok(build_ordered_struct(&counts, &order, args.max_per_row));
        }
        (true, None) => warn!("Cannot order groups without a genome annotation."),
        _ => (),
    }

    if args.flat {
        let groups = counts.iter().map(|c| c.group.as_str()).collect_vec();
        return Ok(build_flat(&groups));
    }
    Ok(build_struct(&counts, args.max_per_row))
}

/// Greedy packing of groups into rows.
///
/// `counts` are expected largest first. While groups remain: a group at least as wide as the
/// row capacity raises the capacity to its width and takes a row of its own. Otherwise, the
/// first remaining group starts a row and every later group that still fits joins it.
///
/// ```rust
/// use vargram::aggregate::GroupCount;
/// use vargram::layout::build_struct;
///
/// let counts = [("S", 30), ("ORF1a", 12), ("N", 10), ("E", 2)]
///     .map(|(group, count)| GroupCount { group: group.to_string(), count });
/// assert_eq!(build_struct(&counts, 40), [vec!["S", "N"], vec!["ORF1a", "E"]]);
/// ```
pub fn build_struct(counts: &[GroupCount], max_per_row: usize) -> Structure {
    let mut max_per_row = max_per_row;
    let mut remaining = counts.iter().collect_vec();
    let mut structure = Vec::new();

    while let Some(largest) = remaining.iter().map(|c| c.count).max() {
        if largest >= max_per_row {
            max_per_row = largest;
            // first group with the largest count
            let largest_i = remaining.iter().position(|c| c.count == largest).unwrap_or(0);
            let group = remaining.remove(largest_i);
            structure.push(vec![group.group.clone()]);
            continue;
        }

        let mut row_sum = 0;
        let mut row = Vec::new();
        remaining.retain(|c| {
            if row.is_empty() || row_sum + c.count <= max_per_row {
                row_sum += c.count;
                row.push(c.group.clone());
                false
            } else {
                true
            }
        });
        structure.push(row);
    }

    debug!("Built structure with capacity {max_per_row}: {structure:?}");
    structure
}

/// Next-fit packing that keeps groups in the given (genomic) order.
///
/// The row capacity is the larger of `max_per_row` and the widest group. Groups in `order`
/// without a count are skipped. Groups with a count missing from `order` follow at the end.
///
/// ```rust
/// use vargram::aggregate::GroupCount;
/// use vargram::layout::build_ordered_struct;
///
/// let counts = [("S", 30), ("ORF1a", 12), ("N", 10), ("E", 2)]
///     .map(|(group, count)| GroupCount { group: group.to_string(), count });
/// let order = ["ORF1a", "S", "E", "N"].map(String::from);
/// assert_eq!(build_ordered_struct(&counts, &order, 40), [vec!["ORF1a"], vec!["S", "E"], vec!["N"]]);
/// ```
pub fn build_ordered_struct(counts: &[GroupCount], order: &[String], max_per_row: usize) -> Structure {
    let lookup: HashMap<&str, usize> = counts.iter().map(|c| (c.group.as_str(), c.count)).collect();
    let capacity = counts.iter().map(|c| c.count).max().unwrap_or(0).max(max_per_row);

    let ordered = order
        .iter()
        .map(String::as_str)
        .chain(counts.iter().map(|c| c.group.as_str()))
        .filter(|g| lookup.contains_key(g))
        .unique()
        .collect_vec();

    let mut structure: Structure = Vec::new();
    let mut row_sum = 0;
    for group in ordered {
        let count = lookup[group];
        match structure.last_mut() {
            Some(row) if row_sum + count <= capacity => {
                row.push(group.to_string());
                row_sum += count;
            }
            _ => {
                structure.push(vec![group.to_string()]);
                row_sum = count;
            }
        }
    }
    structure
}

/// All groups in one row.
pub fn build_flat(groups: &[&str]) -> Structure {
    vec![groups.iter().map(|g| g.to_string()).collect()]
}

/// Parse a structure string: rows split on `/`, groups on `,`, whitespace ignored.
///
/// ```rust
/// use vargram::layout::parse_struct;
///
/// assert_eq!(parse_struct("S, ORF1a / ORF1b"), [vec!["S", "ORF1a"], vec!["ORF1b"]]);
/// ```
pub fn parse_struct(text: &str) -> Structure {
    text.split('/')
        .map(|row| {
            let row: String = row.chars().filter(|c| !c.is_whitespace()).collect();
            row.split(',').filter(|g| !g.is_empty()).map(String::from).collect_vec()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// Check a user structure against the groups in the data.
pub fn validate_struct(structure: &Structure, groups: &[&str]) -> Result<(), Report> {
    if structure.iter().all(|row| row.is_empty()) {
        return Err(eyre!("Structure has no groups."));
    }
    let unknown = structure.iter().flatten().filter(|g| !groups.contains(&g.as_str())).collect_vec();
    if !unknown.is_empty() {
        return Err(eyre!("Structure has groups not found in the data: {}", unknown.iter().join(", "))
            .suggestion(format!("Available groups: {}", groups.join(", "))));
    }
    if let Some(duplicate) = structure.iter().flatten().duplicates().next() {
        return Err(eyre!("Group {duplicate} appears more than once in the structure."));
    }
    Ok(())
}
