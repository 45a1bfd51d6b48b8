//! Pivot observations into per-group, per-stack counts or weights.


use crate::key::KeyTable;
use crate::mutation::{get_mutation_type, position_of, MutationType};
use crate::wrangle::Format;
use clap::{Args as ClapArgs, ValueEnum};
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};
use vargram_table::Table;

// ----------------------------------------------------------------------------
// Arguments
// ----------------------------------------------------------------------------

/// How stack values are reported.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, EnumString, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum YType {
    /// Raw (thresholded) counts.
    Counts,
    /// Percent of each stack's total, to two decimals.
    Weights,
}

/// Aggregation arguments.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ClapArgs)]
#[serde(default)]
pub struct ProcessArgs {
    /// Column with the bar categories.
    #[clap(long, default_value_t = ProcessArgs::default().x)]
    pub x: String,

    /// Column that splits bars into panels.
    #[clap(long, default_value_t = ProcessArgs::default().group)]
    pub group: String,

    /// Column whose values become the stacked bar segments.
    #[clap(long, default_value_t = ProcessArgs::default().stack)]
    pub stack: String,

    /// Numeric column to sum. Without it, observations are counted.
    #[clap(long)]
    pub y: Option<String>,

    /// Stack values below this become 0.
    #[clap(long, default_value_t = ProcessArgs::default().threshold)]
    pub threshold: f64,

    /// Report counts or weights. Defaults to weights with more than one stack.
    #[clap(long, value_enum)]
    pub ytype: Option<YType>,
}

impl Default for ProcessArgs {
    fn default() -> Self {
        ProcessArgs {
            x: "mutation".to_string(),
            group: "gene".to_string(),
            stack: "batch".to_string(),
            y: None,
            threshold: 50.,
            ytype: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Profile Data
// ----------------------------------------------------------------------------

/// One bar: a (group, x) pair with its stack values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileRow {
    pub group: String,
    pub x: String,
    /// Set for Nextclade formats.
    pub position: Option<usize>,
    pub kind: Option<MutationType>,
    /// One value per stack.
    pub values: Vec<f64>,
    pub sum: f64,
    /// One 0/1 value per key lineage.
    pub keys: Vec<f64>,
}

/// Number of unique x per group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupCount {
    pub group: String,
    pub count: usize,
}

/// Aggregated data ready for plotting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileData {
    /// Column names of the group and x.
    pub group: String,
    pub x: String,
    pub stacks: Vec<String>,
    pub keys: Vec<String>,
    pub ytype: Option<YType>,
    pub rows: Vec<ProfileRow>,
}

/// Round to `decimals` places, ties to even.
///
/// ```rust
/// use vargram::aggregate::round_half_even;
///
/// assert_eq!(round_half_even(12.125, 2), 12.12);
/// assert_eq!(round_half_even(1.5, 0), 2.0);
/// assert_eq!(round_half_even(2.5, 0), 2.0);
/// assert_eq!(round_half_even(33.3333, 2), 33.33);
/// ```
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Format a value as an integer when it is whole.
///
/// ```rust
/// use vargram::aggregate::format_value;
///
/// assert_eq!(format_value(4.0), "4");
/// assert_eq!(format_value(33.33), "33.33");
/// ```
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn parse_value(value: &str, column: &str) -> Result<f64, Report> {
    match value.trim() {
        "" => Ok(0.0),
        v => f64::from_str(v).wrap_err_with(|| format!("Non-numeric value {v:?} in column {column:?}")),
    }
}

/// Pivot observations to one row per (group, x) with one value per stack.
///
/// Values are observation counts, or sums of the `y` column. Missing combinations are 0.
/// Observations with an empty group, x or stack are dropped.
/// Rows and stacks are sorted.
pub fn pivot(data: &Table, args: &ProcessArgs) -> Result<(Vec<String>, Vec<ProfileRow>), Report> {
    let required = [&args.group, &args.x, &args.stack];
    if let Some(missing) = required.iter().find(|h| !data.has_header(h)) {
        return Err(eyre!("Expected column not detected: {missing:?}")
            .suggestion("Set the x, group and stack columns to match the data."));
    }
    let group_i = data.get_header_index(&args.group)?;
    let x_i = data.get_header_index(&args.x)?;
    let stack_i = data.get_header_index(&args.stack)?;
    let y_i = args.y.as_ref().map(|y| data.get_header_index(y)).transpose()?;

    let observations =
        data.rows.iter().filter(|row| !row[group_i].is_empty() && !row[x_i].is_empty() && !row[stack_i].is_empty());
    let stacks: BTreeSet<&str> = observations.clone().map(|row| row[stack_i].as_str()).collect();
    let stack_index: HashMap<&str, usize> = stacks.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let mut pivoted: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for row in observations {
        let value = match (y_i, &args.y) {
            (Some(i), Some(y)) => parse_value(&row[i], y)?,
            _ => 1.0,
        };
        let values = pivoted.entry((row[group_i].as_str(), row[x_i].as_str())).or_insert_with(|| vec![0.0; stacks.len()]);
        values[stack_index[row[stack_i].as_str()]] += value;
    }

    let rows = pivoted
        .into_iter()
        .map(|((group, x), values)| ProfileRow {
            group: group.to_string(),
            x: x.to_string(),
            values,
            ..Default::default()
        })
        .collect();
    Ok((stacks.into_iter().map(String::from).collect(), rows))
}

/// Set every stack value below `threshold` to 0.
pub fn apply_threshold(rows: &mut [ProfileRow], threshold: f64) {
    rows.iter_mut().flat_map(|r| r.values.iter_mut()).filter(|v| **v < threshold).for_each(|v| *v = 0.0);
}

/// Convert each stack to percentages of its column total, rounded half to even.
pub fn to_weights(rows: &mut [ProfileRow], stacks: &[String]) {
    for (stack_i, stack) in stacks.iter().enumerate() {
        let total: f64 = rows.iter().map(|r| r.values[stack_i]).sum();
        if total == 0.0 {
            warn!("Stack {stack} has no values above the threshold.");
            continue;
        }
        // scale to hundredths before rounding so exact ties stay exact
        rows.iter_mut().for_each(|r| r.values[stack_i] = (r.values[stack_i] * 10_000.0 / total).round_ties_even() / 100.0);
    }
}

/// Aggregate observations into [`ProfileData`].
pub fn process(
    data: &Table,
    format: Option<Format>,
    args: &ProcessArgs,
    keys: Option<&KeyTable>,
) -> Result<ProfileData, Report> {
    // a saved profile is plotted as is
    if format == Some(Format::Vargram) {
        let key_labels = keys.map(|k| k.labels.clone()).unwrap_or_default();
        return ProfileData::from_table(data, args, &key_labels);
    }

    let (stacks, mut rows) = pivot(data, args)?;
    debug!("Pivoted {} rows across stacks: {}", rows.len(), stacks.join(", "));
    apply_threshold(&mut rows, args.threshold);

    let ytype = match args.ytype {
        Some(ytype) => ytype,
        None if stacks.len() > 1 => YType::Weights,
        None => YType::Counts,
    };
    if ytype == YType::Weights {
        to_weights(&mut rows, &stacks);
    }

    rows.iter_mut().for_each(|r| {
        let sum: f64 = r.values.iter().sum();
        r.sum = match ytype {
            YType::Weights => round_half_even(sum, 2),
            YType::Counts => sum,
        };
    });
    rows.retain(|r| r.sum > 0.0);

    let mut profile = ProfileData {
        group: args.group.clone(),
        x: args.x.clone(),
        stacks,
        keys: Vec::new(),
        ytype: Some(ytype),
        rows,
    };

    if let Some(keys) = keys.filter(|k| !k.is_empty()) {
        profile.merge_keys(keys)?;
    }

    if profile.rows.is_empty() {
        return Err(eyre!("Plot data has no rows.").suggestion("Lowering threshold might help."));
    }

    match format {
        Some(format) if format.has_positions() => profile.add_positions()?,
        _ => profile.rows.sort_by(|a, b| (&a.group, &a.x).cmp(&(&b.group, &b.x))),
    }

    info!("Processed {} bars in {} groups.", profile.rows.len(), profile.groups().len());
    Ok(profile)
}

impl ProfileData {
    /// Outer merge key lineage columns on (group, x). Missing values become 0.
    pub fn merge_keys(&mut self, keys: &KeyTable) -> Result<(), Report> {
        let group_i = keys.table.get_header_index(&self.group)?;
        let x_i = keys.table.get_header_index(&self.x)?;
        let label_i: Vec<usize> =
            keys.labels.iter().map(|l| keys.table.get_header_index(l)).collect::<Result<_, _>>()?;

        let mut key_rows: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
        for row in &keys.table.rows {
            let values = label_i.iter().map(|i| parse_value(&row[*i], &keys.table.headers[*i])).collect::<Result<_, _>>()?;
            key_rows.insert((row[group_i].clone(), row[x_i].clone()), values);
        }

        let nstacks = self.stacks.len();
        for row in self.rows.iter_mut() {
            row.keys = key_rows
                .remove(&(row.group.clone(), row.x.clone()))
                .unwrap_or_else(|| vec![0.0; label_i.len()]);
        }
        // key mutations that were not observed
        self.rows.extend(key_rows.into_iter().map(|((group, x), keys)| ProfileRow {
            group,
            x,
            values: vec![0.0; nstacks],
            keys,
            ..Default::default()
        }));
        self.keys = keys.labels.clone();
        Ok(())
    }

    /// Derive position and mutation type from x, then sort by (group, position).
    pub fn add_positions(&mut self) -> Result<(), Report> {
        for row in self.rows.iter_mut() {
            row.position = Some(position_of(&row.x)?);
            row.kind = Some(get_mutation_type(&row.x));
        }
        self.rows.sort_by(|a, b| (&a.group, a.position).cmp(&(&b.group, b.position)));
        Ok(())
    }

    /// Unique groups in row order.
    pub fn groups(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.group.as_str()).unique().collect()
    }

    /// Rows of one group, in row order.
    pub fn rows_of<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a ProfileRow> + 'a {
        self.rows.iter().filter(move |r| r.group == group)
    }

    /// Number of unique x per group, sorted by count descending (ties keep group order).
    ///
    /// ```rust
    /// use vargram::aggregate::{GroupCount, ProfileData, ProfileRow};
    ///
    /// let row = |group: &str, x: &str| ProfileRow { group: group.into(), x: x.into(), ..Default::default() };
    /// let data = ProfileData {
    ///     rows: vec![row("E", "T9I"), row("N", "P13L"), row("N", "R203K"), row("S", "D614G")],
    ///     ..Default::default()
    /// };
    /// let counts = data.group_counts();
    /// assert_eq!(counts[0], GroupCount { group: "N".into(), count: 2 });
    /// assert_eq!(counts[1].group, "E");
    /// assert_eq!(counts[2].group, "S");
    /// ```
    pub fn group_counts(&self) -> Vec<GroupCount> {
        self.groups()
            .into_iter()
            .map(|group| GroupCount {
                group: group.to_string(),
                count: self.rows_of(group).map(|r| r.x.as_str()).unique().count(),
            })
            .sorted_by(|a, b| b.count.cmp(&a.count))
            .collect()
    }

    /// Highest stacked bar of a group.
    pub fn max_sum(&self, group: &str) -> f64 {
        self.rows_of(group).map(|r| r.sum).fold(0.0, f64::max)
    }

    /// Export as a table: group, x, [position, type], stacks, sum, keys.
    pub fn to_table(&self) -> Table {
        let has_positions = self.rows.iter().any(|r| r.position.is_some());
        let mut headers = vec![self.group.clone(), self.x.clone()];
        if has_positions {
            headers.extend(["position".to_string(), "type".to_string()]);
        }
        headers.extend(self.stacks.iter().cloned());
        headers.push("sum".to_string());
        headers.extend(self.keys.iter().cloned());

        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut row = vec![r.group.clone(), r.x.clone()];
                if has_positions {
                    row.push(r.position.map(|p| p.to_string()).unwrap_or_default());
                    row.push(r.kind.map(|k| k.to_string()).unwrap_or_default());
                }
                row.extend(r.values.iter().map(|v| format_value(*v)));
                row.push(format_value(r.sum));
                row.extend(r.keys.iter().map(|v| format_value(*v)));
                row
            })
            .collect();

        Table { headers, rows, path: None }
    }

    /// Parse a table written by [`ProfileData::to_table`].
    ///
    /// Columns between x (or `type`) and `sum` are stacks. Key columns are the given labels.
    pub fn from_table(table: &Table, args: &ProcessArgs, key_labels: &[String]) -> Result<ProfileData, Report> {
        let group_i = table.get_header_index(&args.group)?;
        let x_i = table.get_header_index(&args.x)?;
        let sum_i = table.get_header_index("sum").suggestion("A vargram profile table needs a sum column.")?;
        let position_i = table.get_header_index("position").ok();
        let type_i = table.get_header_index("type").ok();
        let first_stack = [Some(x_i), position_i, type_i].into_iter().flatten().max().unwrap_or(x_i) + 1;
        if first_stack > sum_i {
            return Err(eyre!("Stack columns must come before the sum column."));
        }
        let stack_i = (first_stack..sum_i).collect_vec();
        let key_i: Vec<usize> = key_labels.iter().map(|l| table.get_header_index(l)).collect::<Result<_, _>>()?;

        let mut rows = Vec::new();
        for row in &table.rows {
            let position = match position_i {
                Some(i) => Some(row[i].parse::<usize>().wrap_err_with(|| format!("Invalid position: {:?}", row[i]))?),
                None => None,
            };
            let kind = match type_i {
                Some(i) => Some(MutationType::from_str(&row[i]).map_err(|_| eyre!("Invalid mutation type: {:?}", row[i]))?),
                None => None,
            };
            rows.push(ProfileRow {
                group: row[group_i].clone(),
                x: row[x_i].clone(),
                position,
                kind,
                values: stack_i.iter().map(|i| parse_value(&row[*i], &table.headers[*i])).collect::<Result<_, _>>()?,
                sum: parse_value(&row[sum_i], "sum")?,
                keys: key_i.iter().map(|i| parse_value(&row[*i], &table.headers[*i])).collect::<Result<_, _>>()?,
            });
        }
        if rows.is_empty() {
            return Err(eyre!("Profile table has no rows: {:?}", table.path));
        }

        Ok(ProfileData {
            group: args.group.clone(),
            x: args.x.clone(),
            stacks: stack_i.iter().map(|i| table.headers[*i].clone()).collect(),
            keys: key_labels.to_vec(),
            ytype: args.ytype,
            rows,
        })
    }
}
