use std::process::Command;

use serde_json::Value;

fn run(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_planner"))
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("PLANNER_PRICES")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_json(args: &[&str]) -> Value {
    let (stdout, stderr, success) = run(args);
    assert!(success, "planner {args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

#[test]
fn project_with_defaults() {
    let json = run_json(&["project"]);

    let years = json["years"].as_array().unwrap();
    assert_eq!(years.len(), 26);
    assert_eq!(years[0]["year"], 0);
    assert_eq!(years[0]["investmentBalance"], 1000.0);
    assert_eq!(years[0]["cashBalance"], 5000.0);
    assert_eq!(json["investedAmount"], 1000.0);
}

#[test]
fn project_savings_plan_and_unknown_rows_warn() {
    let (stdout, stderr, success) = run(&["project", "--input", "tests/fixtures/savings_plan.json"]);

    assert!(success);
    assert!(stderr.contains("pension"));

    let json: Value = serde_json::from_str(&stdout).unwrap();
    let years = json["years"].as_array().unwrap();
    assert_eq!(years.len(), 3);
    assert_eq!(years[0]["netInvestments"], 1200.0);
    assert_eq!(years[1]["investmentBalance"], 11200.0);
    assert_eq!(years[2]["investmentBalance"], 12400.0);
    assert_eq!(years[2]["netInvestments"], 0.0);
    assert_eq!(json["investedAmount"], 12400.0);
}

#[test]
fn stats_reads_quoted_price_file() {
    let json = run_json(&["stats", "--prices", "tests/fixtures/prices.csv"]);

    assert_eq!(json["sampleCount"], 39);
    assert!(json["meanDailyReturn"].as_f64().unwrap() > 0.0);
    assert!(json["stdDevDailyReturn"].as_f64().unwrap() > 0.0);
}

#[test]
fn seeded_simulation_is_reproducible() {
    let args = [
        "simulate",
        "--prices",
        "tests/fixtures/prices.csv",
        "--input",
        "tests/fixtures/salary_plan.json",
        "--seed",
        "42",
    ];
    let first = run_json(&args);
    let second = run_json(&args);
    assert_eq!(first, second);

    assert_eq!(first["horizonYears"], 3);
    assert_eq!(first["simulations"], 40);

    let result = &first["result"];
    let finals = result["finalValues"].as_array().unwrap();
    assert_eq!(finals.len(), 40);
    let finals: Vec<f64> = finals.iter().map(|v| v.as_f64().unwrap()).collect();
    assert!(finals.windows(2).all(|w| w[0] <= w[1]));

    let paths = result["paths"].as_array().unwrap();
    assert_eq!(paths.len(), 40);
    // initial value plus every 21st day of 756
    assert_eq!(paths[0].as_array().unwrap().len(), 37);
    assert!(result["percentile5"].as_f64().unwrap() <= result["percentile95"].as_f64().unwrap());
}

#[test]
fn simulation_flag_overrides_payload_count() {
    let json = run_json(&[
        "simulate",
        "--prices",
        "tests/fixtures/prices.csv",
        "--simulations",
        "5",
        "--seed",
        "1",
    ]);
    assert_eq!(json["simulations"], 5);
    assert_eq!(json["horizonYears"], 1);
    assert_eq!(json["result"]["finalValues"].as_array().unwrap().len(), 5);
}

#[test]
fn missing_price_file_fails() {
    let (stdout, stderr, success) = run(&["stats", "--prices", "tests/fixtures/missing.csv"]);

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("missing.csv"));
}
