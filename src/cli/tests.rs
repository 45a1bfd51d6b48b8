use crate::aggregate::YType;
use crate::cli::profile::ProfileArgs;
use crate::cli::*;
use crate::wrangle::Format;
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result};
use indoc::indoc;
use std::path::PathBuf;
use vargram_table::Table;

fn profile_args(input: &[&str]) -> Result<ProfileArgs, Report> {
    let input = ["vargram", "profile"].iter().chain(input);
    match Cli::try_parse_from(input)?.command {
        Command::Profile(args) => Ok(args),
        command => Err(eyre!("Unexpected command: {command:?}")),
    }
}

#[test]
fn profile_defaults() -> Result<(), Report> {
    let args = profile_args(&["--data", "nextclade.tsv"])?;
    assert_eq!(args.output, [PathBuf::from("vargram.png")]);
    assert_eq!(args.process.x, "mutation");
    assert_eq!(args.process.threshold, 50.);
    assert_eq!(args.structure.max_per_row, 40);
    assert!(args.keys.is_empty());
    assert_eq!(args, ProfileArgs { input: args.input.clone(), ..Default::default() });
    Ok(())
}

#[test]
fn verbosity_is_global() -> Result<(), Report> {
    let cli = Cli::try_parse_from(["vargram", "profile", "--data", "data.tsv", "-v", "debug"])?;
    assert_eq!(cli.verbosity, Verbosity::Debug);
    assert_eq!(cli.verbosity.to_string(), "debug");
    Ok(())
}

#[test]
fn key_columns_apply_to_every_key() -> Result<(), Report> {
    let args = profile_args(&[
        "--data",
        "data.tsv",
        "--key",
        "BA.1.tsv",
        "--key",
        "BA.2.tsv:Omicron:#E377C2",
        "--key-group",
        "protein",
    ])?;
    let args = args.resolve()?;
    assert_eq!(args.keys.len(), 2);
    assert!(args.keys.iter().all(|key| key.group == "protein" && key.x == "mutation"));
    assert_eq!(args.keys[1].label.as_deref(), Some("Omicron"));
    Ok(())
}

#[test]
fn font_sets_aes() -> Result<(), Report> {
    let args = profile_args(&["--data", "data.tsv", "--font", "DejaVuSans.ttf"])?.resolve()?;
    let aes = args.aes.ok_or_else(|| eyre!("Font should create aesthetics."))?;
    assert_eq!(aes.font, Some(PathBuf::from("DejaVuSans.ttf")));
    Ok(())
}

#[test]
fn aes_from_file() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("aes.json");
    std::fs::write(&path, r#"{"ylabel": "Sequences", "stack_title": "Week"}"#)?;

    let args = profile_args(&["--data", "data.tsv", "--aes", path.to_str().unwrap_or_default()])?;
    let aes = args.aes.ok_or_else(|| eyre!("Aesthetics should be parsed."))?;
    assert_eq!(aes.ylabel, "Sequences");
    assert_eq!(aes.stack_title, "Week");
    assert_eq!(aes.group_title, "Gene");

    assert!(profile_args(&["--data", "data.tsv", "--aes", "missing.json"]).is_err());
    Ok(())
}

#[test]
fn config_round_trip() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("profile.json");

    let args = profile_args(&["--data", "data.tsv", "--ytype", "counts", "--struct", "S/N", "--key", "BA.2.tsv"])?;
    args.write(&config)?;

    let read = ProfileArgs::read(&config)?;
    assert_eq!(read.process.ytype, Some(YType::Counts));
    assert_eq!(read.structure.structure.as_deref(), Some("S/N"));
    assert_eq!(read, args);

    // the config replaces the command line arguments
    let args = profile_args(&["--config", config.to_str().unwrap_or_default(), "--flat"])?.resolve()?;
    assert_eq!(args, read);
    Ok(())
}

#[test]
fn profile_run_saves_outputs() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("observations.tsv");
    std::fs::write(
        &data,
        indoc! {"
            batch\tgene\tmutation
            week_1\tS\tD614G
            week_1\tN\tR203K
            week_2\tS\tD614G
        "},
    )?;
    let table = dir.path().join("profile.csv");
    let config = dir.path().join("profile.json");

    let args = ProfileArgs {
        output: vec![table.clone()],
        write_config: Some(config.clone()),
        ..profile_args(&["--data", data.to_str().unwrap_or_default(), "--format", "delimited", "--threshold", "0"])?
    };
    assert_eq!(args.input.format, Some(Format::Delimited));
    args.run()?;

    let table = Table::read(&table, None)?;
    assert_eq!(table.headers, ["gene", "mutation", "week_1", "week_2", "sum"]);
    assert_eq!(table.rows.len(), 2);
    assert!(config.exists());
    Ok(())
}

#[test]
fn nextread_defaults() -> Result<(), Report> {
    let cli = Cli::try_parse_from(["vargram", "nextread", "--seq", "sequences.fasta", "--ref", "sars-cov-2"])?;
    let Command::Nextread(args) = cli.command else {
        return Err(eyre!("Expected the nextread command."));
    };
    assert_eq!(args.output, PathBuf::from("nextclade.tsv"));
    assert_eq!(args.nextclade.reference.as_deref(), Some("sars-cov-2"));
    assert_eq!(args.nextclade.nextclade, "nextclade");
    Ok(())
}
