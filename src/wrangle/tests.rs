use crate::wrangle::*;
use color_eyre::eyre::{Report, Result};
use indoc::indoc;
use vargram_table::Table;

const NEXTCLADE_CSV: &str = indoc! {"
    index;seqName;clade;aaSubstitutions;aaDeletions;aaInsertions
    0;seq2;21J;S:D614G,ORF1b:P314L;;
    1;seq1;21K;S:D614G;S:Y144-;S:214:EPE
    2;seq3;recombinant;;;
"};

#[test]
fn nextclade_delimited_default_batch() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nextclade.csv");
    std::fs::write(&path, NEXTCLADE_CSV)?;

    let input = Input { data: Some(path), ..Default::default() };
    let wrangled = wrangle(&input)?;
    assert_eq!(wrangled.format, Some(Format::NextcladeDelimited));
    assert!(wrangled.annotation.is_none());

    let observed = wrangled.data.select(&["batch", "seqName", "gene", "position", "mutation", "type"])?;
    assert_eq!(
        observed.rows,
        [
            ["my_batch", "seq1", "S", "144", "Y144-", "del"],
            ["my_batch", "seq1", "S", "214", "214:EPE", "in"],
            ["my_batch", "seq2", "ORF1b", "314", "P314L", "sub"],
            ["my_batch", "seq1", "S", "614", "D614G", "sub"],
            ["my_batch", "seq2", "S", "614", "D614G", "sub"],
        ]
    );
    Ok(())
}

#[test]
fn nextclade_missing_columns() -> Result<(), Report> {
    let mut table = Table::with_headers(["batch", "seqName", "aaSubstitutions"]);
    table.add_row(["b1", "seq1", "S:D614G"])?;
    assert!(process_nextclade(&table).is_err());
    Ok(())
}

#[test]
fn nextclade_bad_mutation() -> Result<(), Report> {
    let mut table = Table::with_headers(["batch", "seqName", "aaSubstitutions", "aaDeletions", "aaInsertions"]);
    table.add_row(["b1", "seq1", "D614G", "", ""])?;
    assert!(process_nextclade(&table).is_err());
    Ok(())
}

#[test]
fn delimited_requires_data() -> Result<(), Report> {
    assert!(wrangle(&Input::default()).is_err());
    let input = Input { format: Some(Format::Delimited), ..Default::default() };
    assert!(wrangle(&input).is_err());
    Ok(())
}

#[test]
fn delimited_file_extension() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("observations.json");
    std::fs::write(&path, "{}")?;
    let input = Input { data: Some(path), format: Some(Format::Delimited), ..Default::default() };
    assert!(wrangle(&input).is_err());
    Ok(())
}

#[test]
fn metadata_single_join_nextclade() -> Result<(), Report> {
    let mut data = Table::with_headers(["batch", "seqName", "mutation"]);
    data.add_row(["b1", "seq1", "D614G"])?;
    data.add_row(["b1", "seq2", "N501Y"])?;

    let mut metadata = Table::with_headers(["strain", "country"]);
    metadata.add_row(["seq2", "Canada"])?;

    let join = vec!["strain".to_string()];
    let joined = join_metadata(&data, &metadata, &join, Format::NextcladeFasta)?;
    assert_eq!(joined.headers, ["batch", "seqName", "mutation", "country"]);
    assert_eq!(joined.rows[0], ["b1", "seq1", "D614G", ""]);
    assert_eq!(joined.rows[1], ["b1", "seq2", "N501Y", "Canada"]);
    Ok(())
}

#[test]
fn metadata_two_name_join() -> Result<(), Report> {
    let mut data = Table::with_headers(["sample", "gene", "mutation"]);
    data.add_row(["s1", "S", "D614G"])?;

    let mut metadata = Table::with_headers(["id", "week"]);
    metadata.add_row(["s1", "12"])?;
    metadata.add_row(["s9", "13"])?;

    let join = vec!["sample".to_string(), "id".to_string()];
    let joined = join_metadata(&data, &metadata, &join, Format::Delimited)?;
    assert_eq!(joined.headers, ["sample", "gene", "mutation", "week"]);
    assert_eq!(joined.rows, [["s1", "S", "D614G", "12"], ["s9", "", "", "13"]]);

    assert!(join_metadata(&data, &metadata, &[], Format::Delimited).is_err());
    Ok(())
}

#[test]
fn wrangle_with_metadata_file() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let data_path = dir.path().join("observations.tsv");
    std::fs::write(&data_path, "sample\tgene\tmutation\ns1\tS\tD614G\n")?;
    let meta_path = dir.path().join("metadata.csv");
    std::fs::write(&meta_path, "sample,lineage\ns1,BA.2\n")?;

    let input = Input {
        data: Some(data_path),
        format: Some(Format::Delimited),
        meta: Some(meta_path),
        join: vec!["sample".to_string()],
        ..Default::default()
    };
    let wrangled = wrangle(&input)?;
    assert_eq!(wrangled.data.headers, ["sample", "gene", "mutation", "lineage"]);
    assert_eq!(wrangled.data.rows, [["s1", "S", "D614G", "BA.2"]]);
    Ok(())
}

#[test]
fn format_names() {
    assert_eq!(Format::NextcladeFasta.to_string(), "nextclade_fasta");
    assert!(Format::NextcladeDelimited.has_positions());
    assert!(!Format::Vargram.has_positions());
}
