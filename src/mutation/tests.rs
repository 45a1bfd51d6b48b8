use crate::mutation::*;
use color_eyre::eyre::{Report, Result};
use std::str::FromStr;

#[test]
fn substitution() -> Result<(), Report> {
    let mutation = Mutation::from_str("ORF1b:G662S")?;
    let expected = Mutation {
        gene: "ORF1b".to_string(),
        position: 662,
        name: "G662S".to_string(),
        kind: MutationType::Substitution,
    };
    assert_eq!(mutation, expected);
    Ok(())
}

#[test]
fn insertion_keeps_inner_colon() -> Result<(), Report> {
    let mutation = Mutation::from_str("ORF1a:3677:KSF")?;
    assert_eq!(mutation.gene, "ORF1a");
    assert_eq!(mutation.position, 3677);
    assert_eq!(mutation.name, "3677:KSF");
    assert_eq!(mutation.kind, MutationType::Insertion);
    assert_eq!(mutation.to_string(), "ORF1a:3677:KSF");
    Ok(())
}

#[test]
fn missing_gene_or_position() {
    assert!(Mutation::from_str("D614G").is_err());
    assert!(Mutation::from_str(":D614G").is_err());
    assert!(Mutation::from_str("S:DG").is_err());
    assert!(Mutation::from_str("").is_err());
}

#[test]
fn mutation_type_names() -> Result<(), Report> {
    assert_eq!(MutationType::from_str("del")?, MutationType::Deletion);
    assert_eq!(MutationType::Insertion.to_string(), "in");
    assert!(MutationType::from_str("deletion").is_err());
    Ok(())
}
