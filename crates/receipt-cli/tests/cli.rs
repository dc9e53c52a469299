use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ROWS: &str = "name units columns\n\
                    \"Управление МКД / Содержание\" руб 0,2\n\
                    Отопление руб 0,-1\n\
                    Газ руб 0\n";

const JULY: &str = "left\ttop\ttext\n\
                    0\t10\tПериод\n\
                    20\t10\tИюль\n\
                    40\t10\t2024\n\
                    0\t20\tУправление\n\
                    20\t20\tМКД\n\
                    60\t20\t12,50\n\
                    80\t20\t3,00\n\
                    100\t20\t15,50\n\
                    0\t30\tОтопление\n\
                    60\t30\t7.25\n";

const JULY_CSV: &str = "\"Управление МКД / Содержание\" 12,50 15,50\nОтопление 7,25 \nГаз ?\n";

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("schema.json"),
        r#"{"title": "Квартплата", "columns_names": ["Начислено", "Тариф", "Итого"], "rows_schema_csv_filename": "rows.csv"}"#,
    )
    .unwrap();
    fs::write(dir.path().join("rows.csv"), ROWS).unwrap();
    dir
}

fn receipt(dir: &Path, name: &str, month: &str, base: &str) -> PathBuf {
    let path = dir.join(name);
    let content = JULY.replace("Июль", month).replace("12,50", base);
    fs::write(&path, content).unwrap();
    path
}

fn receipt_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("receipt").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .arg("--schema")
        .arg(dir.path().join("schema.json"));
    cmd
}

#[test]
fn test_process_writes_export() {
    let dir = setup();
    let input = receipt(dir.path(), "july.tsv", "Июль", "12,50");
    let output = dir.path().join("out.csv");

    receipt_cmd(&dir)
        .arg("process")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).unwrap(), JULY_CSV);
}

#[test]
fn test_process_default_output_is_period_file() {
    let dir = setup();
    let input = receipt(dir.path(), "july.tsv", "Июль", "12,50");

    receipt_cmd(&dir).arg("process").arg(&input).assert().success();

    assert_eq!(
        fs::read_to_string(dir.path().join("2024-07.csv")).unwrap(),
        JULY_CSV
    );
}

#[test]
fn test_process_to_stdout() {
    let dir = setup();
    let input = receipt(dir.path(), "july.tsv", "Июль", "12,50");

    receipt_cmd(&dir)
        .arg("process")
        .arg(&input)
        .args(["-o", "-"])
        .assert()
        .success()
        .stdout(JULY_CSV);
}

#[test]
fn test_process_lines() {
    let dir = setup();
    let input = receipt(dir.path(), "july.tsv", "Июль", "12,50");

    receipt_cmd(&dir)
        .arg("process")
        .arg(&input)
        .args(["-o", "-", "-f", "lines"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Period: 2024-07"))
        .stdout(predicate::str::contains("\"Управление МКД\" [12,50 3,00 15,50]"));
}

#[test]
fn test_process_json() {
    let dir = setup();
    let input = receipt(dir.path(), "july.tsv", "Июль", "12,50");

    receipt_cmd(&dir)
        .arg("process")
        .arg(&input)
        .args(["-o", "-", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"period\": \"2024-07\""))
        .stdout(predicate::str::contains("\"title\": \"Квартплата\""))
        .stdout(predicate::str::contains("\"name\": \"Газ\""))
        .stdout(predicate::str::contains("\"15,50\""));
}

#[test]
fn test_process_with_rows_only_schema() {
    let dir = setup();
    let input = receipt(dir.path(), "july.tsv", "Июль", "12,50");

    Command::cargo_bin("receipt")
        .unwrap()
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .arg("--schema")
        .arg(dir.path().join("rows.csv"))
        .arg("process")
        .arg(&input)
        .args(["-o", "-"])
        .assert()
        .success()
        .stdout(JULY_CSV);
}

#[test]
fn test_log_file_takes_warnings() {
    let dir = setup();
    let input = dir.path().join("undated.tsv");
    fs::write(&input, "left\ttop\ttext\n0\t10\tГаз\n40\t10\t5\n").unwrap();
    let log = dir.path().join("receipt.log");

    receipt_cmd(&dir)
        .arg("--log")
        .arg(&log)
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Period was not found").not());

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("Period was not found"));
    assert!(content.contains("WARN"));
    assert!(!content.contains('\u{1b}'));
}

#[test]
fn test_process_without_period() {
    let dir = setup();
    let input = dir.path().join("undated.tsv");
    fs::write(&input, "left\ttop\ttext\n0\t10\tГаз\n40\t10\t5\n").unwrap();

    receipt_cmd(&dir)
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Period was not found"));

    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv")).unwrap(),
        "\"Управление МКД / Содержание\" ? ?\nОтопление ? ?\nГаз 5\n"
    );
}

#[test]
fn test_process_missing_input() {
    let dir = setup();

    receipt_cmd(&dir)
        .arg("process")
        .arg(dir.path().join("missing.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_import_and_year() {
    let dir = setup();
    receipt(dir.path(), "a.tsv", "Июль", "12,50");
    receipt(dir.path(), "b.tsv", "Август", "13,00");
    fs::write(dir.path().join("notes.txt"), "").unwrap();

    receipt_cmd(&dir)
        .arg("import")
        .arg(dir.path().join("*").display().to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    let store = dir.path().join(".data");
    assert_eq!(
        fs::read_to_string(store.join("2024-07.csv")).unwrap(),
        JULY_CSV
    );
    assert!(store.join("2024-08.csv").exists());

    receipt_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024: Июль, Август"));

    receipt_cmd(&dir)
        .args(["year", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "name,2024-07.1,2024-07.2,2024-08.1,2024-08.2\n",
        ))
        .stdout(predicate::str::contains(
            "Управление МКД / Содержание,\"12,50\",\"15,50\",\"13,00\",\"15,50\"\n",
        ))
        .stdout(predicate::str::contains("Газ,?,,?,\n"));

    receipt_cmd(&dir)
        .arg("year")
        .assert()
        .success()
        .stdout(predicate::str::contains("Июль"))
        .stdout(predicate::str::contains("Август"));
}

#[test]
fn test_import_skips_undated() {
    let dir = setup();
    fs::write(
        dir.path().join("undated.tsv"),
        "left\ttop\ttext\n0\t10\tГаз\n40\t10\t5\n",
    )
    .unwrap();

    receipt_cmd(&dir)
        .arg("import")
        .arg(dir.path().join("*.tsv").display().to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped files"));

    receipt_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No periods archived"));
}

#[test]
fn test_year_without_data() {
    let dir = setup();

    receipt_cmd(&dir)
        .args(["year", "2023"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No months archived for 2023"));
}

#[test]
fn test_schema_check() {
    let dir = setup();

    receipt_cmd(&dir)
        .args(["schema", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 rows, 3 columns"));
}

#[test]
fn test_schema_check_reports_bad_row() {
    let dir = setup();
    fs::write(
        dir.path().join("rows.csv"),
        "name units columns\nГаз руб 0,x\n",
    )
    .unwrap();

    receipt_cmd(&dir)
        .args(["schema", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rows.csv"));
}

#[test]
fn test_config_init_and_show() {
    let dir = setup();
    let config = dir.path().join("receipt.json");

    receipt_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    receipt_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"program\": \"pdftotext\""));

    receipt_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
