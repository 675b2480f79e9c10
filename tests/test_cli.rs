use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

const FASTA: &str = "tests/testdata/fasta/allergens.fasta";
const FOREST_MODEL: &str = "tests/testdata/models/forest_kk.json";

fn abs(path: &str) -> String {
    format!("{}/{}", env!("CARGO_MANIFEST_DIR"), path)
}

#[test]
fn test_cli_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("algpred")?;
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Prediction of allergenic and non-allergenic"))
        .stdout(predicate::str::contains("--length"))
        .stdout(predicate::str::contains("A relative --input still resolves against the current directory"));

    Ok(())
}

#[test]
fn test_cli_rejects_unknown_job() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("algpred")?;
    cmd.args(["--input", &abs(FASTA), "--job", "fold"]);
    cmd.assert().failure().stderr(predicate::str::contains("invalid value"));

    Ok(())
}

#[test]
fn test_cli_predict() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("algpred")?;
    cmd.args([
        "-i",
        &abs(FASTA),
        "-j",
        "pred",
        "-m",
        &abs(FOREST_MODEL),
        "-w",
        temp_dir.path().to_str().unwrap(),
    ]);
    cmd.assert().success();

    let output = std::fs::read_to_string(temp_dir.path().join("final_predictions.csv"))?;
    assert!(output.starts_with("Sequence_ID,Probability,Status\n"));
    assert_eq!(output.lines().count(), 5);
    assert!(temp_dir.path().join("allergens_clean.fasta").exists());
    assert!(temp_dir.path().join("allergens_clean_DPC.csv").exists());

    let audit = std::fs::read_to_string(temp_dir.path().join("stand_error.log"))?;
    assert!(audit.contains("bad_record: 1, 2"));

    Ok(())
}

#[test]
fn test_cli_scan_and_design() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let model = abs(FOREST_MODEL);
    let work = temp_dir.path().to_str().unwrap().to_string();

    let mut cmd = Command::cargo_bin("algpred")?;
    cmd.args(["-i", &abs(FASTA), "-j", "scan", "-l", "5", "-s", "2", "-m", &model, "-w", &work]);
    cmd.args(["-o", "scan.csv", "--threads", "2"]);
    cmd.assert().success();
    let scan = std::fs::read_to_string(temp_dir.path().join("scan.csv"))?;
    assert!(scan.starts_with("ParentSeq,Start,End,Peptide,Score,Prediction\n"));
    assert!(temp_dir.path().join("scan_windows.fasta").exists());

    let mut cmd = Command::cargo_bin("algpred")?;
    cmd.args(["-i", &abs(FASTA), "-j", "des", "-m", &model, "-w", &work]);
    cmd.args(["-o", "design.csv", "--no-intermediates"]);
    cmd.assert().success();
    let design = std::fs::read_to_string(temp_dir.path().join("design.csv"))?;
    assert!(design.starts_with("SeqID,MutantID,Sequence,Score,Prediction\n"));
    assert!(!temp_dir.path().join("allergens_clean_mutants.fasta").exists());

    Ok(())
}

#[test]
fn test_cli_scan_requires_length() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("algpred")?;
    cmd.args([
        "-i",
        &abs(FASTA),
        "-j",
        "scan",
        "-m",
        &abs(FOREST_MODEL),
        "-w",
        temp_dir.path().to_str().unwrap(),
    ]);
    cmd.assert().failure();
    assert!(!temp_dir.path().join("final_predictions.csv").exists());

    Ok(())
}

#[test]
fn test_cli_missing_model() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("algpred")?;
    cmd.args(["-i", &abs(FASTA), "-j", "pred", "-w", temp_dir.path().to_str().unwrap()]);
    cmd.assert().failure();
    assert!(!temp_dir.path().join("final_predictions.csv").exists());

    Ok(())
}
