//! Command-line tests for the `nfex` binary.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use calamine::{Reader, Xlsx};
use predicates::prelude::*;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../nfe-core/tests/fixtures")
}

fn nfex(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nfex").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

fn sheet_rows(path: &Path) -> usize {
    let bytes = std::fs::read(path).unwrap();
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
    workbook.worksheet_range("Itens").unwrap().height()
}

#[test]
fn test_process_directory_writes_both_exports() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    nfex(&dir.path().join("config.json"))
        .arg("process")
        .arg(fixtures_dir())
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 4 XML files"))
        .stdout(predicate::str::contains("Processing finished. 4 items found."))
        .stdout(predicate::str::contains("sem_infnfe.xml: required element not found"))
        .stdout(predicate::str::contains("truncado.xml: XML parse error"));

    // header + 4 items, header + 3 items (corn is filtered out)
    assert_eq!(sheet_rows(&out.join("itens_nfe_completo.xlsx")), 5);
    assert_eq!(sheet_rows(&out.join("itens_nfe_filtrado_NCM.xlsx")), 4);
}

#[test]
fn test_no_matching_prefix_skips_filtered_export() {
    let dir = tempfile::tempdir().unwrap();

    nfex(&dir.path().join("config.json"))
        .arg("process")
        .arg(fixtures_dir().join("nfe_quimicos.xml"))
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--allowed")
        .arg("99")
        .assert()
        .success()
        .stdout(predicate::str::contains("No data to export."));

    assert!(dir.path().join("itens_nfe_completo.xlsx").exists());
    assert!(!dir.path().join("itens_nfe_filtrado_NCM.xlsx").exists());
}

#[test]
fn test_csv_output_keeps_leading_zeros() {
    let dir = tempfile::tempdir().unwrap();

    nfex(&dir.path().join("config.json"))
        .arg("process")
        .arg(fixtures_dir().join("nfe_quimicos.xml"))
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--format")
        .arg("csv")
        .arg("--no-filter")
        .assert()
        .success();

    let csv = std::fs::read_to_string(dir.path().join("itens_nfe_completo.csv")).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains(",000123,07891234567895,"));
    assert!(!dir.path().join("itens_nfe_filtrado_NCM.csv").exists());
}

#[test]
fn test_no_inputs_found_fails() {
    let dir = tempfile::tempdir().unwrap();

    nfex(&dir.path().join("config.json"))
        .arg("process")
        .arg(dir.path().join("*.xml").display().to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No XML files found"));
}

#[test]
fn test_ncm_set_show_and_check() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");

    nfex(&config)
        .args(["ncm", "set", "29, 39,,"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 2 allowed prefixes"));

    nfex(&config)
        .args(["ncm", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("29, 39"));

    nfex(&config)
        .args(["ncm", "check", "29051100", "1005"])
        .assert()
        .success()
        .stdout(predicate::str::contains("29051100 allowed (prefix 29)"))
        .stdout(predicate::str::contains("1005 not allowed"));

    nfex(&config)
        .args(["ncm", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 53 allowed prefixes"));
}

#[test]
fn test_ncm_import_replaces_list() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    let list = dir.path().join("ncm.txt");
    std::fs::write(&list, "3901\n7318,\n\n94\n").unwrap();

    nfex(&config)
        .args(["ncm", "import"])
        .arg(&list)
        .assert()
        .success();

    nfex(&config)
        .args(["config", "get", "filter.allowed_prefixes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"3901\""))
        .stdout(predicate::str::contains("\"7318\""))
        .stdout(predicate::str::contains("\"94\""))
        .stdout(predicate::str::contains("\"29\"").not());
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");

    nfex(&config)
        .args(["config", "set", "export.sheet_name", "Produtos"])
        .assert()
        .success();

    nfex(&config)
        .args(["config", "get", "export.sheet_name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Produtos\""));

    nfex(&config)
        .args(["config", "set", "export.unknown", "1"])
        .assert()
        .failure();
}
