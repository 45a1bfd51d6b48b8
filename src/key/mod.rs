//! Key lineages: reference mutation sets drawn as a heatmap under the profile.


use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use vargram_table::Table;

/// Heatmap color when none is given.
pub const DEFAULT_KEY_COLOR: &str = "#5E5E5E";

// ----------------------------------------------------------------------------
// Key Args
// ----------------------------------------------------------------------------

/// Where to read a key lineage from, and how to show it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct KeyArgs {
    /// CSV or TSV file.
    pub path: PathBuf,
    /// Heatmap row label. Defaults to the file stem.
    pub label: Option<String>,
    /// Heatmap hex color.
    pub color: Option<String>,
    /// Group column in the key file.
    #[serde(default = "KeyArgs::default_group")]
    pub group: String,
    /// X column in the key file.
    #[serde(default = "KeyArgs::default_x")]
    pub x: String,
}

impl KeyArgs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        KeyArgs { path: path.into(), label: None, color: None, group: Self::default_group(), x: Self::default_x() }
    }

    fn default_group() -> String {
        "gene".to_string()
    }

    fn default_x() -> String {
        "mutation".to_string()
    }
}

impl FromStr for KeyArgs {
    type Err = Report;

    /// Parse `PATH[:LABEL[:COLOR]]` from the command line.
    ///
    /// ```rust
    /// use vargram::key::KeyArgs;
    /// use std::str::FromStr;
    ///
    /// let args = KeyArgs::from_str("keys/BA.2.tsv:BA.2:#E377C2")?;
    /// assert_eq!(args.path.to_str(), Some("keys/BA.2.tsv"));
    /// assert_eq!(args.label.as_deref(), Some("BA.2"));
    /// assert_eq!(args.color.as_deref(), Some("#E377C2"));
    /// assert_eq!(args.group, "gene");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = text.splitn(3, ':');
        let path = parts.next().filter(|p| !p.is_empty()).ok_or_else(|| eyre!("Key path is empty: {text:?}"))?;
        let mut args = KeyArgs::new(path);
        args.label = parts.next().filter(|s| !s.is_empty()).map(String::from);
        args.color = parts.next().filter(|s| !s.is_empty()).map(String::from);
        Ok(args)
    }
}

// ----------------------------------------------------------------------------
// Key
// ----------------------------------------------------------------------------

/// One key lineage.
#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    pub label: String,
    pub color: String,
    /// Unique (group, x) pairs, in file order.
    pub pairs: Vec<(String, String)>,
}

impl Key {
    /// Read the `n`-th key (1-based) from its file, keeping only the group and x columns.
    pub fn read(args: &KeyArgs, n: usize) -> Result<Key, Report> {
        let table = Table::read_comma_or_tab(&args.path)
            .wrap_err_with(|| format!("Failed to read key lineage: {:?}", args.path))?;
        let group_i = table
            .get_header_index(&args.group)
            .suggestion("Set the key group column to match the key file.")?;
        let x_i = table.get_header_index(&args.x).suggestion("Set the key x column to match the key file.")?;

        let pairs = table.rows.iter().map(|row| (row[group_i].clone(), row[x_i].clone())).unique().collect_vec();

        let label = match &args.label {
            Some(label) => label.clone(),
            None => args
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(String::from)
                .unwrap_or_else(|| format!("key_{n}")),
        };
        let color = args.color.clone().unwrap_or_else(|| DEFAULT_KEY_COLOR.to_string());
        debug!("Read key lineage {label} with {} mutations.", pairs.len());

        Ok(Key { label, color, pairs })
    }

    /// Table of the key pairs with a column of 1s under the key label.
    fn to_table(&self, group: &str, x: &str) -> Result<Table, Report> {
        let mut table = Table::with_headers([group, x, self.label.as_str()]);
        for (group, x) in &self.pairs {
            table.add_row([group.as_str(), x.as_str(), "1"])?;
        }
        Ok(table)
    }
}

// ----------------------------------------------------------------------------
// Key Table
// ----------------------------------------------------------------------------

/// All key lineages merged on (group, x), with one 0/1 column per key label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyTable {
    pub labels: Vec<String>,
    pub colors: Vec<String>,
    pub table: Table,
}

impl KeyTable {
    /// Outer merge keys into one master table.
    ///
    /// ```rust
    /// use vargram::key::{Key, KeyTable};
    ///
    /// let ba1 = Key { label: "BA.1".into(), color: "#5E5E5E".into(), pairs: vec![("S".into(), "G339D".into())] };
    /// let ba2 = Key { label: "BA.2".into(), color: "#E377C2".into(), pairs: vec![("S".into(), "T376A".into())] };
    /// let keys = KeyTable::gather(&[ba1, ba2], "gene", "mutation")?;
    /// assert_eq!(keys.table.headers, ["gene", "mutation", "BA.1", "BA.2"]);
    /// assert_eq!(keys.table.rows, [["S", "G339D", "1", "0"], ["S", "T376A", "0", "1"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn gather(keys: &[Key], group: &str, x: &str) -> Result<KeyTable, Report> {
        let labels = keys.iter().map(|k| k.label.clone()).collect_vec();
        if let Some(label) = labels.iter().duplicates().next() {
            return Err(eyre!("Duplicate key label: {label}").suggestion("Give each key a unique label."));
        }
        if labels.iter().any(|l| l == group || l == x) {
            return Err(eyre!("Key labels must differ from the group ({group}) and x ({x}) columns."));
        }

        let mut table = Table::with_headers([group, x]);
        for key in keys {
            table = table.outer_join(&key.to_table(group, x)?, &[group, x], &[group, x])?;
        }
        // keys missing a pair get 0
        table.rows.iter_mut().flat_map(|row| row.iter_mut().skip(2)).filter(|v| v.is_empty()).for_each(|v| *v = "0".to_string());

        let colors = keys.iter().map(|k| k.color.clone()).collect_vec();
        Ok(KeyTable { labels, colors, table })
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
