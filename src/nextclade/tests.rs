use crate::nextclade::*;
use color_eyre::eyre::{Report, Result};
use indoc::indoc;
use std::path::{Path, PathBuf};

/// Stand-in for the nextclade CLI that answers the commands we issue.
#[cfg(unix)]
const STUB: &str = indoc! {r#"
    #!/bin/sh
    case "$1" in
      --version)
        echo "nextclade VERSION"
        ;;
      dataset)
        if [ "$2" = "list" ] && [ "$3" = "--only-names" ]; then
          echo "nextstrain/sars-cov-2/wuhan-hu-1/orfs"
        elif [ "$2" = "list" ]; then
          echo 'nextstrain/sars-cov-2/wuhan-hu-1/orfs (shortcuts: "sars-cov-2", "nextstrain/sars-cov-2")'
        elif [ "$2" = "get" ]; then
          printf 'chr\t.\tCDS\t21563\t25384\t.\t+\t0\tgene=S\n' > "$6/genome_annotation.gff3"
        fi
        ;;
      run)
        while [ $# -gt 0 ]; do
          if [ "$1" = "--output-tsv" ]; then out="$2"; fi
          shift
        done
        printf 'index\tseqName\taaSubstitutions\taaDeletions\taaInsertions\n' > "$out"
        printf '0\tseq2\tS:D614G\t\t\n' >> "$out"
        printf '1\tseq1\tS:N501Y,N:R203K\tS:Y144-\t\n' >> "$out"
        ;;
    esac
"#};

#[cfg(unix)]
fn write_stub(dir: &Path, version: &str) -> Result<String, Report> {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("nextclade");
    std::fs::write(&path, STUB.replace("VERSION", version))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path.display().to_string())
}

fn write_batches(dir: &Path) -> Result<PathBuf, Report> {
    let seq_dir = dir.join("sequences");
    std::fs::create_dir(&seq_dir)?;
    std::fs::write(seq_dir.join("week_2.fasta"), ">seq1\nACGT\n")?;
    std::fs::write(seq_dir.join("week_1.fa"), ">seq1\nACGT\n")?;
    std::fs::write(seq_dir.join(".DS_Store"), "")?;
    Ok(seq_dir)
}

#[test]
fn batches_from_directory() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let seq_dir = write_batches(dir.path())?;
    let batches = get_batches(&seq_dir)?;
    let names: Vec<&str> = batches.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["week_1", "week_2"]);

    let single = get_batches(&seq_dir.join("week_2.fasta"))?;
    assert_eq!(single, [("week_2".to_string(), seq_dir.join("week_2.fasta"))]);
    Ok(())
}

#[test]
fn batches_reject_other_files() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let seq_dir = write_batches(dir.path())?;
    std::fs::write(seq_dir.join("notes.txt"), "")?;
    assert!(get_batches(&seq_dir).is_err());

    let empty = dir.path().join("empty");
    std::fs::create_dir(&empty)?;
    assert!(get_batches(&empty).is_err());
    Ok(())
}

#[test]
fn input_requires_seq_and_ref() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let seq = dir.path().join("sequences.fasta");
    std::fs::write(&seq, ">seq1\nACGT\n")?;

    let args = Args { seq: Some(seq.clone()), ..Default::default() };
    assert!(check_input(&args).is_err());
    let args = Args { reference: Some("sars-cov-2".to_string()), ..Default::default() };
    assert!(check_input(&args).is_err());
    Ok(())
}

#[test]
fn input_local_reference() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let seq = dir.path().join("sequences.fasta");
    let reference = dir.path().join("reference.fa");
    let gene = dir.path().join("genes.gff3");
    let bad_gene = dir.path().join("genes.gtf");
    for path in [&seq, &reference, &gene, &bad_gene] {
        std::fs::write(path, "")?;
    }

    let mut args = Args {
        seq: Some(seq.clone()),
        reference: Some(reference.display().to_string()),
        ..Default::default()
    };
    // a reference file needs an annotation
    assert!(check_input(&args).is_err());

    args.gene = Some(bad_gene);
    assert!(check_input(&args).is_err());

    args.gene = Some(gene.clone());
    let input = check_input(&args)?;
    assert_eq!(input.seq, seq);
    assert_eq!(input.reference, Reference::Local { fasta: reference, annotation: gene });
    Ok(())
}

#[test]
fn missing_executable() -> Result<(), Report> {
    assert!(check_version("vargram-test-missing-nextclade").is_err());
    Ok(())
}

#[cfg(unix)]
#[test]
fn dataset_shortcuts_are_known() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let executable = write_stub(dir.path(), "3.1.0")?;
    let known = dataset_names(&executable)?;
    assert_eq!(
        known,
        ["nextstrain/sars-cov-2/wuhan-hu-1/orfs", "sars-cov-2", "nextstrain/sars-cov-2"]
    );

    let seq = write_batches(dir.path())?;
    let args = Args {
        seq: Some(seq),
        reference: Some("flu".to_string()),
        gene: None,
        nextclade: executable,
    };
    assert!(check_input(&args).is_err());
    Ok(())
}

#[cfg(unix)]
#[test]
fn version_too_old() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let executable = write_stub(dir.path(), "2.14.0")?;
    assert!(check_version(&executable).is_err());

    let executable = write_stub(dir.path(), "3.0.0")?;
    assert_eq!(check_version(&executable)?, semver::Version::new(3, 0, 0));
    Ok(())
}

#[cfg(unix)]
#[test]
fn run_dataset_batches() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let executable = write_stub(dir.path(), "3.1.0")?;
    let seq = write_batches(dir.path())?;
    let args = Args {
        seq: Some(seq),
        reference: Some("sars-cov-2".to_string()),
        gene: None,
        nextclade: executable,
    };

    let output = run(&args)?;
    let table = output.table;
    assert_eq!(table.headers[0..3], ["batch", "index", "seqName"]);
    let observed = table.select(&["batch", "seqName", "aaDeletions"])?;
    assert_eq!(
        observed.rows,
        [
            ["week_1", "seq1", "S:Y144-"],
            ["week_1", "seq2", ""],
            ["week_2", "seq1", "S:Y144-"],
            ["week_2", "seq2", ""],
        ]
    );

    let annotation = output.annotation.ok_or_else(|| color_eyre::eyre::eyre!("missing annotation"))?;
    assert_eq!(annotation.start_of("S"), Some(21563));
    Ok(())
}
