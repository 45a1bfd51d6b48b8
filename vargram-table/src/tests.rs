use crate::{get_delimiter, Table};
use color_eyre::eyre::{Report, Result};
use indoc::indoc;

fn observations() -> Result<Table, Report> {
    let mut table = Table::with_headers(["batch", "gene", "mutation"]);
    table.add_row(["b2", "S", "D614G"])?;
    table.add_row(["b1", "S", "D614G"])?;
    table.add_row(["b1", "N", "R203K"])?;
    table.add_row(["b1", "S", "N501Y"])?;
    Ok(table)
}

#[test]
fn delimiter_uppercase_extension() -> Result<(), Report> {
    assert_eq!(get_delimiter(&"data/nextclade.TSV")?, '\t');
    assert_eq!(get_delimiter(&"data/nextclade.CSV")?, ',');
    assert!(get_delimiter(&"data/nextclade.json").is_err());
    Ok(())
}

#[test]
fn read_quoted_csv() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nextclade.csv");
    let text = indoc! {r#"
        seqName,aaSubstitutions
        seq1,"S:D614G,N:R203K"
        seq2,
    "#};
    std::fs::write(&path, text)?;

    let table = Table::read(&path, None)?;
    assert_eq!(table.headers, ["seqName", "aaSubstitutions"]);
    assert_eq!(table.rows, [vec!["seq1", "S:D614G,N:R203K"], vec!["seq2", ""]]);
    assert_eq!(table.path, Some(path));
    Ok(())
}

#[test]
fn read_ragged_rows_fails() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ragged.tsv");
    std::fs::write(&path, "a\tb\n1\t2\t3\n")?;
    assert!(Table::read(&path, None).is_err());
    Ok(())
}

#[test]
fn read_comma_or_tab_sniffs_delimiter() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;

    // tab-delimited content despite the .csv extension
    let path = dir.path().join("key.csv");
    std::fs::write(&path, "gene\tmutation\nS\tD614G\n")?;
    let table = Table::read_comma_or_tab(&path)?;
    assert_eq!(table.headers, ["gene", "mutation"]);
    assert_eq!(table.rows, [["S", "D614G"]]);

    let path = dir.path().join("key.txt");
    std::fs::write(&path, "gene,mutation\nS,D614G\n")?;
    let table = Table::read_comma_or_tab(&path)?;
    assert_eq!(table.rows, [["S", "D614G"]]);
    Ok(())
}

#[test]
fn write_then_read_tsv() -> Result<(), Report> {
    let table = observations()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("observations.tsv");
    table.write(&path, None)?;

    let expected = indoc! {"
        batch\tgene\tmutation
        b2\tS\tD614G
        b1\tS\tD614G
        b1\tN\tR203K
        b1\tS\tN501Y
    "};
    assert_eq!(std::fs::read_to_string(&path)?, expected);

    let observed = Table::read(&path, None)?;
    assert_eq!(observed.rows, table.rows);
    Ok(())
}

#[test]
fn column_operations() -> Result<(), Report> {
    let mut table = observations()?;

    assert_eq!(table.get("mutation", 2)?, "R203K");
    assert!(table.get("mutation", 10).is_err());
    assert_eq!(table.get_column("gene")?, ["S", "S", "N", "S"]);

    table.insert_column(0, "seqName", ["s1", "s2", "s3", "s4"])?;
    assert_eq!(table.headers, ["seqName", "batch", "gene", "mutation"]);
    assert!(table.insert_column(0, "seqName", ["", "", "", ""]).is_err());
    assert!(table.add_column("short", ["x"]).is_err());

    table.rename_header("gene", "group")?;
    assert!(table.has_header("group"));
    assert!(table.rename_header("group", "batch").is_err());
    Ok(())
}

#[test]
fn filter_and_sort() -> Result<(), Report> {
    let mut table = observations()?.filter("gene", |gene| gene == "S")?;
    assert_eq!(table.rows.len(), 3);

    table.sort_by_columns(&["batch", "mutation"])?;
    let observed = table.select(&["batch", "mutation"])?;
    assert_eq!(observed.rows, [["b1", "D614G"], ["b1", "N501Y"], ["b2", "D614G"]]);
    Ok(())
}

#[test]
fn sort_is_stable() -> Result<(), Report> {
    let mut table = observations()?;
    table.sort_by_columns(&["gene"])?;
    let observed = table.get_column("batch")?;
    assert_eq!(observed, ["b1", "b2", "b1", "b1"]);
    Ok(())
}

#[test]
fn outer_join_renamed_keys() -> Result<(), Report> {
    let left = observations()?;
    let mut right = Table::with_headers(["sample", "batch", "date"]);
    right.add_row(["b1", "x", "2023-01-01"])?;
    right.add_row(["b3", "y", "2023-02-01"])?;

    let joined = left.outer_join(&right, &["batch"], &["sample"])?;
    assert_eq!(joined.headers, ["batch", "gene", "mutation", "batch_y", "date"]);
    assert_eq!(joined.rows.len(), 5);
    assert_eq!(joined.rows[0], ["b2", "S", "D614G", "", ""]);
    assert_eq!(joined.rows[1], ["b1", "S", "D614G", "x", "2023-01-01"]);
    assert_eq!(joined.rows[4], ["b3", "", "", "y", "2023-02-01"]);
    Ok(())
}

#[test]
fn outer_join_invalid_keys() -> Result<(), Report> {
    let left = observations()?;
    assert!(left.outer_join(&left, &["gene"], &[]).is_err());
    assert!(left.outer_join(&left, &["missing"], &["gene"]).is_err());
    Ok(())
}

#[test]
fn display_markdown() -> Result<(), Report> {
    let mut table = Table::with_headers(["gene", "count"]);
    table.add_row(["ORF1a", "3"])?;
    let expected = indoc! {"
        | gene  | count |
        |-------|-------|
        | ORF1a | 3     |
    "};
    assert_eq!(table.to_string(), expected);
    Ok(())
}
