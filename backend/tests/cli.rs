//! End-to-end checks of the `usage-sheets` binary.

use serde_json::Value;
use std::fs;
use std::process::Command;

fn run(args: &[&str]) -> (Value, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_usage-sheets"))
        .args(args)
        .output()
        .expect("binary runs");
    assert!(output.status.success(), "exit status {:?}", output.status);

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    let json = serde_json::from_str(&stdout).expect("stdout is pure JSON");
    (json, String::from_utf8_lossy(&output.stderr).into_owned())
}

#[test]
fn test_usage_stdout_is_json_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.csv");
    fs::write(&path, "Library Usage 2025\nMonths,IEEE,JSTOR\nJan,\"1,200\",30\nTotal,1200,30\n").unwrap();

    let (json, stderr) = run(&["usage", path.to_str().unwrap(), "--summary"]);

    assert_eq!(json["table"]["series"], serde_json::json!(["IEEE", "JSTOR"]));
    assert_eq!(json["table"]["records"][0]["IEEE"], 1200.0);
    assert!(stderr.contains("Header found at row 1"));
}

#[test]
fn test_ledger_stdout_is_json_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("march.csv");
    fs::write(
        &path,
        "Bill\nNewspaper,No. of Days,Total Price\nDainik Jagran,31,155\n",
    )
    .unwrap();

    let (json, _) = run(&["ledger", path.to_str().unwrap(), "--period", "March 2025"]);

    assert_eq!(json["period"]["period"], "March 2025");
    assert_eq!(json["period"]["totalPrice"], 155.0);
}
