//! Integration tests for the loopfold CLI

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PRINTER: &str = "import java.util.List;

class Printer {
    void print(List<String> ls) {
        for (String l : ls) {
            if (l == null) continue;
            System.out.println(l);
        }
    }
}
";

const PRINTER_CONVERTED: &str = "import java.util.List;

class Printer {
    void print(List<String> ls) {
        ls.stream().filter(l -> !(l == null)).forEachOrdered(l -> System.out.println(l));
    }
}
";

const REMOVER: &str = "import java.util.List;

class Remover {
    void prune(List<String> list) {
        for (String s : list) {
            if (s.isEmpty()) list.remove(s);
        }
    }
}
";

const SUMMER: &str = "class Summer {
    int sum(int[] values) {
        int sum = 0;
        for (int v : values) {
            sum += v;
        }
        return sum;
    }
}
";

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn lf() -> Command {
    let mut cmd = Command::cargo_bin("lf").unwrap();
    cmd.env_remove("LOOPFOLD_KEEP_PARAM_NAMES")
        .env_remove("LOOPFOLD_NO_COMMENTS");
    cmd
}

#[test]
fn test_cli_help() {
    lf().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("loopfold"));
}

#[test]
fn test_cli_version() {
    lf().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_convert_prints_result() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Printer.java", PRINTER);

    lf().arg("convert")
        .arg(&path)
        .assert()
        .success()
        .stdout(PRINTER_CONVERTED);

    assert_eq!(fs::read_to_string(&path).unwrap(), PRINTER);
}

#[test]
fn test_convert_write_rewrites_in_place() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Printer.java", PRINTER);

    lf().args(["convert", "--write"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 1 loop(s) in 1 of 1 file(s)"));

    assert_eq!(fs::read_to_string(&path).unwrap(), PRINTER_CONVERTED);
}

#[test]
fn test_convert_leaves_unsafe_loop_alone() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Remover.java", REMOVER);

    lf().args(["convert", "--write"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 0 loop(s) in 0 of 1 file(s)"));

    assert_eq!(fs::read_to_string(&path).unwrap(), REMOVER);
}

#[test]
fn test_disable_flag_switches_off_reduce() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Summer.java", SUMMER);

    lf().args(["convert", "--disable", "reduce"])
        .arg(&path)
        .assert()
        .success()
        .stdout(SUMMER);

    lf().arg("convert")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "sum = Arrays.stream(values).reduce(sum, Integer::sum);",
        ))
        .stdout(predicate::str::contains("import java.util.Arrays;"));
}

#[test]
fn test_config_file_disables_reduce() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Summer.java", SUMMER);
    let config = write(
        dir.path(),
        "loopfold.toml",
        "[conversion.features]\nreduce = false\n",
    );

    lf().arg("--config")
        .arg(&config)
        .arg("convert")
        .arg(&path)
        .assert()
        .success()
        .stdout(SUMMER);
}

#[test]
fn test_check_reports_reason_codes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Printer.java", PRINTER);
    write(dir.path(), "Remover.java", REMOVER);

    lf().arg("check")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("info[convertible]"))
        .stdout(predicate::str::contains("info[IteratedCollectionMutated]"))
        .stdout(predicate::str::contains("2 loop(s): 1 convertible, 1 rejected, 0 disabled"));
}

#[test]
fn test_check_json() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Remover.java", REMOVER);

    let output = lf().args(["check", "--json"]).arg(&path).output().unwrap();
    assert!(output.status.success());
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let outcome = &reports[0]["loops"][0];
    assert_eq!(outcome["verdict"], "rejected");
    assert_eq!(outcome["reason"], "IteratedCollectionMutated");
    assert_eq!(outcome["kind"], "element-for-each");
    assert_eq!(outcome["line"], 5);
}

#[test]
fn test_syntax_error_fails() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Broken.java", "class Broken { void f( { }\n");

    lf().arg("convert")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn test_missing_path_fails() {
    lf().args(["check", "/nonexistent/loopfold/src"])
        .assert()
        .failure();
}
