use crate::aggregate::{GroupCount, ProfileData, ProfileRow};
use crate::annotation::Annotation;
use crate::layout::*;
use color_eyre::eyre::{Report, Result};
use indoc::indoc;

fn counts(items: &[(&str, usize)]) -> Vec<GroupCount> {
    items.iter().map(|(group, count)| GroupCount { group: group.to_string(), count: *count }).collect()
}

#[test]
fn wide_group_raises_capacity() {
    let counts = counts(&[("ORF1a", 55), ("S", 41), ("N", 10), ("E", 4), ("M", 2)]);
    let structure = build_struct(&counts, MAX_PER_ROW);
    // capacity becomes 55 after ORF1a, so S, N and E share a row
    assert_eq!(structure, [vec!["ORF1a"], vec!["S", "N", "E"], vec!["M"]]);
}

#[test]
fn small_groups_fill_one_row() {
    let counts = counts(&[("S", 5), ("N", 3), ("E", 1)]);
    assert_eq!(build_struct(&counts, MAX_PER_ROW), [vec!["S", "N", "E"]]);
    assert!(build_struct(&[], MAX_PER_ROW).is_empty());
}

#[test]
fn ordered_rows_follow_order() {
    let counts = counts(&[("S", 25), ("ORF1a", 20), ("N", 10), ("E", 5)]);
    let order = ["ORF1a", "ORF1b", "E", "S"].map(String::from);
    let structure = build_ordered_struct(&counts, &order, 30);
    assert_eq!(structure, [vec!["ORF1a", "E"], vec!["S"], vec!["N"]]);
}

#[test]
fn ordered_capacity_fits_widest() {
    let counts = counts(&[("S", 50), ("E", 5)]);
    let order = ["E", "S"].map(String::from);
    assert_eq!(build_ordered_struct(&counts, &order, 40), [vec!["E"], vec!["S"]]);
}

#[test]
fn flat_structure() {
    assert_eq!(build_flat(&["S", "N"]), [vec!["S", "N"]]);
}

#[test]
fn parse_struct_ignores_whitespace() {
    assert_eq!(parse_struct(" S ,N/ORF1a, ORF1b /"), [vec!["S", "N"], vec!["ORF1a", "ORF1b"]]);
    assert!(parse_struct(" / ").is_empty());
}

#[test]
fn validate_user_struct() -> Result<(), Report> {
    let groups = ["S", "N", "E"];
    validate_struct(&parse_struct("S,N/E"), &groups)?;
    assert!(validate_struct(&parse_struct("S,ORF9b"), &groups).is_err());
    assert!(validate_struct(&parse_struct("S/S"), &groups).is_err());
    assert!(validate_struct(&Vec::new(), &groups).is_err());
    Ok(())
}

fn profile(bars: &[(&str, &str)]) -> ProfileData {
    let rows = bars
        .iter()
        .map(|(group, x)| ProfileRow { group: group.to_string(), x: x.to_string(), sum: 1., ..Default::default() })
        .collect();
    ProfileData { rows, ..Default::default() }
}

#[test]
fn resolve_structure() -> Result<(), Report> {
    let data = profile(&[("E", "T9I"), ("N", "P13L"), ("N", "R203K"), ("S", "D614G"), ("S", "N501Y"), ("S", "T478K")]);
    let annotation = Annotation::from_reader(
        indoc! {"
            MN908947\t.\tgene\t21563\t25384\t.\t+\t.\tgene=S
            MN908947\t.\tgene\t26245\t26472\t.\t+\t.\tgene=E
            MN908947\t.\tgene\t28274\t29533\t.\t+\t.\tgene=N
        "}
        .as_bytes(),
    )?;

    let greedy = resolve(&data, &StructArgs { max_per_row: 4, ..Default::default() }, None)?;
    assert_eq!(greedy, [vec!["S", "E"], vec!["N"]]);

    let flat = StructArgs { flat: true, ..Default::default() };
    assert_eq!(resolve(&data, &flat, None)?, [vec!["S", "N", "E"]]);

    let ordered = StructArgs { order: true, max_per_row: 4, ..Default::default() };
    assert_eq!(resolve(&data, &ordered, Some(&annotation))?, [vec!["S", "E"], vec!["N"]]);
    let ordered_flat = StructArgs { order: true, flat: true, ..Default::default() };
    assert_eq!(resolve(&data, &ordered_flat, Some(&annotation))?, [vec!["S", "E", "N"]]);

    let given = StructArgs::from_rows(&[vec!["N"], vec!["S", "E"]]);
    assert_eq!(given.structure.as_deref(), Some("N/S,E"));
    assert_eq!(resolve(&data, &given, None)?, [vec!["N"], vec!["S", "E"]]);

    let unknown = StructArgs::from_rows(&[vec!["ORF1a"]]);
    assert!(resolve(&data, &unknown, None).is_err());
    Ok(())
}
