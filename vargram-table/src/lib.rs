//! Create and manipulate a row-based [`Table`] of strings.

#[cfg(test)]
mod tests;

use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Get delimiter based on file extension.
///
/// ## Arguments
///
/// - `path` - File path.
///
/// ## Examples
///
/// - `.tsv` => `\t`
/// - `.txt` => `\t`
/// - `.csv` => `,`
///
/// Note that `.txt` is assumed to be tab-delimited!
///
/// ```rust
/// use vargram_table::get_delimiter;
///
/// assert_eq!(get_delimiter(&"file.tsv")?, '\t');
/// assert_eq!(get_delimiter(&"file.csv")?, ',');
/// assert_eq!(get_delimiter(&"file.txt")?, '\t');
/// assert!(get_delimiter(&"file").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn get_delimiter<P>(path: &P) -> Result<char, Report>
where
    P: AsRef<Path> + Debug,
{
    let ext = path
        .as_ref()
        .extension()
        .wrap_err_with(|| format!("Failed to get file extension: {path:?}"))?
        .to_str()
        .wrap_err_with(|| format!("Failed to convert file extension to str: {path:?}"))?;
    // convert extension to the expected delimiter
    match ext.to_lowercase().as_str() {
        "tsv" | "txt" => Ok('\t'),
        "csv" => Ok(','),
        _ext => {
            Err(eyre!("Unknown file extension: {_ext:?}").suggestion("Options: tsv, csv, or txt"))
        }
    }
}

/// A row-based [`Table`] of string data.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table {
    /// Names of the table columns.
    pub headers: Vec<String>,
    /// Rows of table values.
    pub rows: Vec<Vec<String>>,
    /// Optional file path for where the table was read from.
    pub path: Option<PathBuf>,
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_markdown())
    }
}

impl Table {
    /// Returns a new [`Table`] with empty headers and rows.
    pub fn new() -> Self {
        Table { headers: Vec::new(), rows: Vec::new(), path: None }
    }

    /// Returns a new [`Table`] with the given headers and no rows.
    ///
    /// ```
    /// use vargram_table::Table;
    ///
    /// let table = Table::with_headers(["gene", "mutation"]);
    /// assert_eq!(table.headers, ["gene", "mutation"]);
    /// assert!(table.rows.is_empty());
    /// ```
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table { headers: headers.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a new row to the table.
    ///
    /// ## Arguments
    ///
    /// * `row` - An iterable object of new values to add as a row.
    ///
    /// ## Examples
    ///
    /// ```
    /// use vargram_table::Table;
    ///
    /// let mut table = Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    /// table.add_row(["D", "E", "F"])?;
    /// assert!(table.add_row(["G"]).is_err());
    /// assert_eq!(table.rows, [["A", "B", "C"], ["D", "E", "F"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_row<I, S>(&mut self, row: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row = row.into_iter().map(Into::into).collect_vec();
        let (new, ex) = (row.len(), self.headers.len());
        if ex != new {
            return Err(eyre!("New row size ({new}) does not match the table headers ({ex})."));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Adds a new column to the end of the [`Table`].
    ///
    /// ```
    /// use vargram_table::Table;
    ///
    /// let mut table = Table::with_headers(["1"]);
    /// table.add_row(["A"])?;
    /// table.add_column("2", ["B"])?;
    /// assert_eq!(table.get_column("2")?, ["B"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_column<I, S>(&mut self, header: &str, column: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.headers.len();
        self.insert_column(index, header, column)
    }

    /// Inserts a new column at a column index (0-based).
    pub fn insert_column<I, S>(&mut self, index: usize, header: &str, column: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column = column.into_iter().map(Into::into).collect_vec();
        let (new, ex) = (column.len(), self.rows.len());
        if ex != new {
            return Err(eyre!("New column size ({new}) does not match existing table ({ex})."));
        }
        if index > self.headers.len() {
            return Err(eyre!("Column index ({index}) is out of bounds for {header:?}."));
        }
        if self.headers.iter().any(|h| h == header) {
            return Err(eyre!("Column '{header}' already exists in table: {:?}.", self.path));
        }
        self.headers.insert(index, header.to_string());
        self.rows.iter_mut().zip(column).for_each(|(row, value)| row.insert(index, value));
        Ok(())
    }

    /// Returns the column index (0-based) of the header in the [`Table`].
    ///
    /// ```
    /// use vargram_table::Table;
    ///
    /// let table = Table::with_headers(["1", "2", "3"]);
    /// assert_eq!(table.get_header_index("3")?, 2);
    /// assert!(table.get_header_index("4").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_header_index(&self, header: &str) -> Result<usize, Report> {
        self.headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| eyre!("Column '{header}' was not found in table: {:?}.", self.path))
            .suggestion(format!("Available columns: {}", self.headers.join(", ")))
    }

    /// Returns true if the table has a column named `header`.
    pub fn has_header(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }

    /// Returns the table value under a header and row index (0-based).
    pub fn get(&self, header: &str, row: usize) -> Result<&str, Report> {
        let header_i = self.get_header_index(header)?;
        let row = self.get_row(row)?;
        Ok(&row[header_i])
    }

    /// Returns a row of table values from a row index (0-based).
    pub fn get_row(&self, i: usize) -> Result<&[String], Report> {
        self.rows.get(i).map(Vec::as_slice).ok_or_else(|| eyre!("Row ({i}) does not exist in the table."))
    }

    /// Returns all values under a header.
    pub fn get_column(&self, header: &str) -> Result<Vec<&str>, Report> {
        let header_i = self.get_header_index(header)?;
        Ok(self.rows.iter().map(|row| row[header_i].as_str()).collect())
    }

    /// Renames a column header.
    pub fn rename_header(&mut self, old: &str, new: &str) -> Result<(), Report> {
        if old == new {
            return Ok(());
        }
        let header_i = self.get_header_index(old)?;
        if self.has_header(new) {
            return Err(eyre!("Cannot rename '{old}', column '{new}' already exists."));
        }
        self.headers[header_i] = new.to_string();
        Ok(())
    }

    /// Returns a new [`Table`] with only the selected columns, in the order given.
    ///
    /// ```
    /// use vargram_table::Table;
    ///
    /// let mut table = Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    /// let table = table.select(&["3", "1"])?;
    /// assert_eq!(table.headers, ["3", "1"]);
    /// assert_eq!(table.rows, [["C", "A"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn select(&self, headers: &[&str]) -> Result<Table, Report> {
        let indices: Vec<usize> =
            headers.iter().map(|h| self.get_header_index(h)).collect::<Result<_, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|i| row[*i].clone()).collect_vec())
            .collect_vec();
        let headers = headers.iter().map(|h| h.to_string()).collect_vec();
        Ok(Table { headers, rows, path: self.path.clone() })
    }

    /// Returns a new [`Table`] with only the rows whose value under `header` satisfies `predicate`.
    pub fn filter<F>(&self, header: &str, predicate: F) -> Result<Table, Report>
    where
        F: Fn(&str) -> bool,
    {
        let header_i = self.get_header_index(header)?;
        let rows = self.rows.iter().filter(|row| predicate(&row[header_i])).cloned().collect_vec();
        Ok(Table { headers: self.headers.clone(), rows, path: self.path.clone() })
    }

    /// Sorts rows (stable) by the string values under the given headers.
    pub fn sort_by_columns(&mut self, headers: &[&str]) -> Result<(), Report> {
        let indices: Vec<usize> =
            headers.iter().map(|h| self.get_header_index(h)).collect::<Result<_, _>>()?;
        self.rows.sort_by(|a, b| {
            indices.iter().map(|i| a[*i].cmp(&b[*i])).find(|o| o.is_ne()).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(())
    }

    /// Full outer join of two tables.
    ///
    /// The result has the left headers followed by the right headers that
    /// are not join keys. Right headers that collide with a left header get
    /// a `_y` suffix. Unmatched rows on either side are kept, with empty
    /// strings for the missing values.
    ///
    /// ## Examples
    ///
    /// ```
    /// use vargram_table::Table;
    ///
    /// let mut left = Table::with_headers(["gene", "mutation", "batch_1"]);
    /// left.add_row(["S", "D614G", "10"])?;
    /// left.add_row(["N", "R203K", "5"])?;
    ///
    /// let mut right = Table::with_headers(["gene", "mutation", "BA.2"]);
    /// right.add_row(["S", "D614G", "1"])?;
    /// right.add_row(["E", "T9I", "1"])?;
    ///
    /// let joined = left.outer_join(&right, &["gene", "mutation"], &["gene", "mutation"])?;
    /// assert_eq!(joined.headers, ["gene", "mutation", "batch_1", "BA.2"]);
    /// assert_eq!(joined.rows, [
    ///     ["S", "D614G", "10", "1"],
    ///     ["N", "R203K", "5",  ""],
    ///     ["E", "T9I",   "",   "1"],
    /// ]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn outer_join(&self, other: &Table, left_on: &[&str], right_on: &[&str]) -> Result<Table, Report> {
        if left_on.len() != right_on.len() || left_on.is_empty() {
            return Err(eyre!(
                "Join columns must be non-empty and of equal length: {left_on:?} vs {right_on:?}"
            ));
        }
        let left_i: Vec<usize> =
            left_on.iter().map(|h| self.get_header_index(h)).collect::<Result<_, _>>()?;
        let right_i: Vec<usize> =
            right_on.iter().map(|h| other.get_header_index(h)).collect::<Result<_, _>>()?;
        let right_extra = (0..other.headers.len()).filter(|i| !right_i.contains(i)).collect_vec();

        let mut headers = self.headers.clone();
        for i in &right_extra {
            let header = &other.headers[*i];
            match headers.contains(header) {
                true => headers.push(format!("{header}_y")),
                false => headers.push(header.clone()),
            }
        }

        // right row indices, grouped by join key
        let mut lookup: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
        for (row_i, row) in other.rows.iter().enumerate() {
            let key = right_i.iter().map(|i| row[*i].as_str()).collect_vec();
            lookup.entry(key).or_default().push(row_i);
        }

        let mut matched = vec![false; other.rows.len()];
        let mut rows = Vec::new();
        for row in &self.rows {
            let key = left_i.iter().map(|i| row[*i].as_str()).collect_vec();
            match lookup.get(&key) {
                Some(right_rows) => {
                    for right_row_i in right_rows {
                        matched[*right_row_i] = true;
                        let right_row = &other.rows[*right_row_i];
                        let mut new_row = row.clone();
                        new_row.extend(right_extra.iter().map(|i| right_row[*i].clone()));
                        rows.push(new_row);
                    }
                }
                None => {
                    let mut new_row = row.clone();
                    new_row.extend(right_extra.iter().map(|_| String::new()));
                    rows.push(new_row);
                }
            }
        }

        // right rows with no partner on the left
        for (right_row, _) in other.rows.iter().zip(matched).filter(|(_, m)| !m) {
            let mut new_row = vec![String::new(); self.headers.len()];
            left_i.iter().zip(&right_i).for_each(|(l, r)| new_row[*l] = right_row[*r].clone());
            new_row.extend(right_extra.iter().map(|i| right_row[*i].clone()));
            rows.push(new_row);
        }

        Ok(Table { headers, rows, path: None })
    }

    /// Read a delimited file into a [`Table`].
    ///
    /// ## Arguments
    ///
    /// * `path` - File path.
    /// * `delim` - Optional delimiter. Otherwise, will be identified based on path suffix (.tsv or .csv).
    ///
    /// ## Examples
    ///
    /// ```
    /// use std::io::Write;
    /// use vargram_table::Table;
    ///
    /// let mut file = tempfile::Builder::new().suffix(".tsv").tempfile()?;
    /// writeln!(file, "1\t2\t3\nA\tB\tC")?;
    /// let table = Table::read(&file.path(), None)?;
    /// assert_eq!(table.headers, ["1", "2", "3"]);
    /// assert_eq!(table.rows, [["A", "B", "C"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P, delim: Option<char>) -> Result<Table, Report>
    where
        P: AsRef<Path> + Debug,
    {
        // if not provided, lookup delimiter from file extension
        let delim = match delim {
            Some(c) => c,
            None => get_delimiter(path)?,
        };
        let file = File::open(path).wrap_err_with(|| eyre!("Failed to read file: {path:?}"))?;
        let mut table =
            Table::from_reader(file, delim).wrap_err_with(|| eyre!("Failed to parse table: {path:?}"))?;
        table.path = Some(path.as_ref().to_path_buf());
        Ok(table)
    }

    /// Read a file that is either comma or tab delimited, sniffed from the header line.
    pub fn read_comma_or_tab<P>(path: &P) -> Result<Table, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let file = File::open(path).wrap_err_with(|| eyre!("Failed to read file: {path:?}"))?;
        let mut header_line = String::new();
        BufReader::new(file)
            .read_line(&mut header_line)
            .wrap_err_with(|| eyre!("Failed to read header line: {path:?}"))?;
        let delim = if header_line.contains('\t') { '\t' } else { ',' };
        Table::read(path, Some(delim))
    }

    /// Parse delimited text from any reader into a [`Table`]. The first record is the header.
    pub fn from_reader<R: Read>(reader: R, delim: char) -> Result<Table, Report> {
        let delim = u8::try_from(delim)
            .map_err(|_| eyre!("Delimiter must be a single byte character: {delim:?}"))?;
        let mut reader = csv::ReaderBuilder::new().delimiter(delim).from_reader(reader);

        let mut table = Table::new();
        table.headers = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        for record in reader.records() {
            let record = record?;
            table.rows.push(record.iter().map(String::from).collect());
        }

        Ok(table)
    }

    /// Write [`Table`] to a file [`Path`].
    ///
    /// ```
    /// use vargram_table::Table;
    ///
    /// let mut table = Table::with_headers(["1", "2"]);
    /// table.add_row(["A", "B,C"])?;
    ///
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("table.csv");
    /// table.write(&path, None)?;
    /// assert_eq!(std::fs::read_to_string(&path)?, "1,2\nA,\"B,C\"\n");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn write<P>(&self, path: &P, delim: Option<char>) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let delim = match delim {
            Some(c) => c,
            None => get_delimiter(path)?,
        };
        let delim = u8::try_from(delim)
            .map_err(|_| eyre!("Delimiter must be a single byte character: {delim:?}"))?;

        let file = File::create(path).wrap_err_with(|| eyre!("Unable to create file: {path:?}"))?;
        let mut writer = csv::WriterBuilder::new().delimiter(delim).from_writer(file);
        writer
            .write_record(&self.headers)
            .wrap_err_with(|| eyre!("Unable to write table headers: {path:?}"))?;
        self.rows.iter().try_for_each(|row| {
            writer.write_record(row).wrap_err_with(|| eyre!("Unable to write table row: {row:?}"))
        })?;
        writer.flush().wrap_err_with(|| eyre!("Unable to write file: {path:?}"))?;

        Ok(())
    }

    /// Convert table to markdown format.
    ///
    /// ```
    /// use vargram_table::Table;
    ///
    /// let mut table = Table::with_headers(["1", "2"]);
    /// table.add_row(["A", "BB"])?;
    /// assert_eq!(table.to_markdown(), "| 1 | 2  |\n|---|----|\n| A | BB |\n");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn to_markdown(&self) -> String {
        // widest cell per column, header included
        let col_widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(col_i, header)| {
                self.rows.iter().map(|row| row[col_i].chars().count()).chain([header.chars().count()]).max().unwrap_or(0)
            })
            .collect_vec();

        let format_line = |cells: &[String]| {
            let line = cells
                .iter()
                .zip(&col_widths)
                .map(|(cell, width)| format!(" {cell:<width$} "))
                .join("|");
            format!("|{line}|\n")
        };

        let mut markdown = format_line(&self.headers);
        let frame = col_widths.iter().map(|w| "-".repeat(w + 2)).join("|");
        markdown.push_str(&format!("|{frame}|\n"));
        self.rows.iter().for_each(|row| markdown.push_str(&format_line(row)));

        markdown
    }
}
