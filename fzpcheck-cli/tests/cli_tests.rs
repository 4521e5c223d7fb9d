//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Build command for the fzpcheck binary (finds it in target/debug when run via cargo test).
fn fzpcheck_cli() -> Command {
    cargo_bin_cmd!("fzpcheck")
}

/// Path to fzpcheck library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fzpcheck")
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_cli_help() {
    let mut cmd = fzpcheck_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Available FZP checks:"))
        .stdout(predicate::str::contains("Available SVG checks:"))
        .stdout(predicate::str::contains("connector_visibility:\n"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version() {
    let mut cmd = fzpcheck_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_requires_path() {
    fzpcheck_cli().assert().failure().code(2);
}

#[test]
fn test_cli_clean_part_is_silent() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("valid_xml.fzp"));
    cmd.assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn test_cli_verbose_clean_part() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("valid_xml.fzp")).arg("-v");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Checking 1 FZP files"))
        .stdout(predicate::str::contains("Running check: missing_tags"))
        .stdout(predicate::str::contains("Running SVG check: ids on"))
        .stdout(predicate::str::contains("Total errors: 0"));
}

#[test]
fn test_cli_exit_code_is_error_count() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("hybrid_connectors.fzp"));
    cmd.assert()
        .code(7)
        .stdout(predicate::str::contains("Invisible connector 'connector9pin' in layer 'copper1'"))
        .stdout(predicate::str::contains("Total errors: 7"));
}

#[test]
fn test_cli_invalid_xml() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("invalid_xml.fzp"));
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Invalid XML"));
}

#[test]
fn test_cli_directory_mode() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core")).arg("--verbose");
    cmd.assert()
        .code(17)
        .stdout(predicate::str::contains("Checking 8 FZP files"))
        .stdout(predicate::str::contains("Total errors: 17"));
}

#[test]
fn test_cli_selected_checks() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("svg_issues.fzp"))
        .arg("-c")
        .arg("font_size")
        .arg("viewbox");
    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("Invalid font-size"))
        .stdout(predicate::str::contains("Duplicate id").not());
}

#[test]
fn test_cli_unknown_check_rejected() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("valid_xml.fzp"))
        .arg("-c")
        .arg("bogus");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("bogus"));
}

#[test]
fn test_cli_empty_check_list() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("valid_xml.fzp")).arg("-c");
    cmd.assert()
        .code(255)
        .stdout(predicate::str::contains("No valid check types specified."))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_svg_search() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir())
        .arg("--svg")
        .arg("svg/core/breadboard/hybrid_connectors_bb.svg")
        .arg("-v");
    cmd.assert()
        .code(7)
        .stdout(predicate::str::contains("Checking 1 FZP files"))
        .stdout(predicate::str::contains("old_hybrid_connectors").not());
}

#[test]
fn test_cli_svg_search_obsolete() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir())
        .arg("-s")
        .arg("svg/obsolete/breadboard/hybrid_connectors_bb.svg")
        .arg("-v");
    cmd.assert()
        .code(7)
        .stdout(predicate::str::contains("Checking 2 FZP files"))
        .stdout(predicate::str::contains("old_hybrid_connectors.fzp: 0"));
}

#[test]
fn test_cli_batch_text_list() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("parts.txt");
    fs::write(&list, "core/valid_xml.fzp\ncore/thin_stroke.fzp\n").unwrap();

    let mut cmd = fzpcheck_cli();
    cmd.arg(fixtures_dir()).arg("-f").arg(&list);
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("thin_stroke.fzp: 2"));
}

#[test]
fn test_cli_batch_json_list() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("parts.json");
    fs::write(&list, r#"["core/invalid_xml.fzp", "hybrid_connectors_bb.svg", "notes.md"]"#).unwrap();

    let mut cmd = fzpcheck_cli();
    cmd.arg(fixtures_dir()).arg("--file").arg(&list).arg("-v");
    cmd.assert()
        .code(8)
        .stdout(predicate::str::contains("Checking 2 FZP files"));
}

#[test]
fn test_cli_bad_json_list() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("parts.json");
    fs::write(&list, "{ not json").unwrap();

    let mut cmd = fzpcheck_cli();
    cmd.arg(fixtures_dir()).arg("-f").arg(&list);
    cmd.assert()
        .code(255)
        .stdout(predicate::str::contains("Invalid file list"));
}

#[test]
fn test_cli_min_stroke_width() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("thin_stroke.fzp"))
        .arg("--min-stroke-width")
        .arg("0.5");
    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("must be greater than 0.5"));
}

#[test]
fn test_cli_template_marker() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("pcb_only.fzp"))
        .arg("--template-marker")
        .arg("placeholder");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("pcb_only_breadboard_template.svg"));
}

#[test]
fn test_cli_svg_dir() {
    let mut cmd = fzpcheck_cli();

    cmd.arg(fixtures_dir().join("core").join("valid_xml.fzp"))
        .arg("--svg-dir")
        .arg("graphics");
    cmd.assert()
        .code(4)
        .stdout(predicate::str::contains("not found."));
}
