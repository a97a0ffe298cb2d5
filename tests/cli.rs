use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

use csv_pareto::concentration::ConcentrationResult;
use csv_pareto::schema::DatasetSchema;

mod common;
use common::TestWorkspace;

fn sample_csv(workspace: &TestWorkspace) -> std::path::PathBuf {
    workspace.write(
        "sales.csv",
        concat!(
            "Customer,Revenue (USD),Signed Date\n",
            "A,\"$1,000\",2023-01-15\n",
            "B,\"$800\",2023-02-20\n",
            "C,\"$600\",2023-03-10\n",
            "A,\"$400\",2023-04-05\n",
        ),
    )
}

#[test]
fn normalize_writes_schema_and_dataset() {
    let workspace = TestWorkspace::new();
    let csv_path = sample_csv(&workspace);
    let schema_path = workspace.path().join("schema.json");
    let output_path = workspace.path().join("normalized.csv");

    Command::cargo_bin("csv-pareto")
        .expect("binary exists")
        .args([
            "normalize",
            "-i",
            csv_path.to_str().unwrap(),
            "-s",
            schema_path.to_str().unwrap(),
            "-o",
            output_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let schema = DatasetSchema::load(&schema_path).expect("parse schema");
    assert_eq!(schema.metadata.column_count, 3);
    assert_eq!(schema.metadata.row_count, 4);
    assert!(schema.column("revenue_usd").is_some());
    let time = schema.time.expect("time fields attached");
    assert_eq!(time.period_grain, "date");

    let normalized = fs::read_to_string(&output_path).expect("read normalized");
    assert!(normalized.starts_with("customer,revenue_usd,signed_date\n"));
    assert!(normalized.contains("A,1000,2023-01-15"));
}

#[test]
fn analyze_reports_concentration_per_period() {
    let workspace = TestWorkspace::new();
    let csv_path = sample_csv(&workspace);
    let output_path = workspace.path().join("analysis.json");

    Command::cargo_bin("csv-pareto")
        .expect("binary exists")
        .args([
            "analyze",
            "-i",
            csv_path.to_str().unwrap(),
            "-g",
            "customer",
            "-v",
            "revenue_usd",
            "-t",
            "50,10,20,10",
            "-o",
            output_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output_path).expect("read analysis");
    let result: ConcentrationResult = serde_json::from_str(&contents).expect("parse analysis");

    // Thresholds validated at the boundary: deduplicated and sorted.
    assert_eq!(result.parameters.thresholds, vec![10, 20, 50]);
    assert_eq!(result.parameters.analysis_type, "multi_period");

    let total = &result.data.periods["TOTAL"];
    assert_eq!(total.total_entities, 3);
    assert!((total.total_value - 2800.0).abs() < 1e-9);
    // A leads with 1400 of 2800 (50%), so top_50 is exactly A.
    let top_50 = &total.concentration[&50];
    assert_eq!(top_50.count, 1);
    assert_eq!(top_50.sample_entities, vec!["A".to_string()]);
}

#[test]
fn analyze_without_time_columns_is_single_period() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("plain.csv", "entity,revenue\nA,100\nB,80\n");
    let output_path = workspace.path().join("analysis.json");

    Command::cargo_bin("csv-pareto")
        .expect("binary exists")
        .args([
            "analyze",
            "-i",
            csv_path.to_str().unwrap(),
            "-g",
            "entity",
            "-v",
            "revenue",
            "-o",
            output_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output_path).expect("read analysis");
    let result: ConcentrationResult = serde_json::from_str(&contents).expect("parse analysis");
    assert_eq!(result.parameters.analysis_type, "single_period");
    assert_eq!(result.parameters.thresholds, vec![10, 20, 50]);
}

#[test]
fn analyze_rejects_unknown_columns() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("plain.csv", "entity,revenue\nA,100\n");

    Command::cargo_bin("csv-pareto")
        .expect("binary exists")
        .args([
            "analyze",
            "-i",
            csv_path.to_str().unwrap(),
            "-g",
            "nonexistent",
            "-v",
            "revenue",
        ])
        .assert()
        .failure()
        .stderr(contains("nonexistent"));
}

#[test]
fn analyze_rejects_out_of_range_thresholds() {
    let workspace = TestWorkspace::new();
    let csv_path = workspace.write("plain.csv", "entity,revenue\nA,100\n");

    Command::cargo_bin("csv-pareto")
        .expect("binary exists")
        .args([
            "analyze",
            "-i",
            csv_path.to_str().unwrap(),
            "-g",
            "entity",
            "-v",
            "revenue",
            "-t",
            "0,50",
        ])
        .assert()
        .failure()
        .stderr(contains("outside 1..=100"));
}
