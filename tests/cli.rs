mod common;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

use common::{SCENARIO_CSV, TestWorkspace};

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("ticket-insights").expect("binary exists");
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn summary_reports_verdict_tiles_and_dominant_type() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("tickets.csv", SCENARIO_CSV);
    bin()
        .args(["summary", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Total de Tickets"))
        .stdout(contains("NÃO IDEAL"))
        .stdout(contains("Liveness concentra 66.7% dos tickets filtrados (2 de 3)."));
}

#[test]
fn summary_json_exposes_metrics() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("tickets.csv", SCENARIO_CSV);
    let output = bin()
        .args(["summary", "-i", input.to_str().unwrap(), "--analysis", "ideal", "--json"])
        .output()
        .expect("run summary");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["total"], 2);
    assert_eq!(value["insight"]["kind"], "dominant");
}

#[test]
fn filter_writes_matching_rows_with_normalized_verdicts() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("tickets.csv", SCENARIO_CSV);
    let output = workspace.path().join("liveness.csv");
    bin()
        .args([
            "filter",
            "-i",
            input.to_str().unwrap(),
            "--type",
            "Liveness",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();
    let written = fs::read_to_string(&output).expect("read output");
    assert_eq!(
        written,
        "Ticket,Tipo,Análise,Data\nT1,Liveness,IDEAL,2024-03-01\nT2,Liveness,NÃO IDEAL,2024-03-02\n"
    );
}

#[test]
fn filter_by_date_range_and_ticket_to_stdout() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("tickets.csv", SCENARIO_CSV);
    bin()
        .args(["filter", "-i", input.to_str().unwrap(), "--from", "2024-03-02"])
        .assert()
        .success()
        .stdout(contains("T2,Liveness"))
        .stdout(contains("T3,Outros"))
        .stdout(contains("T1,").not());

    bin()
        .args(["filter", "-i", input.to_str().unwrap(), "-t", "t3", "--table"])
        .assert()
        .success()
        .stdout(contains("T3").and(contains("Outros")))
        .stdout(contains("T1").not());
}

#[test]
fn empty_type_flag_selects_nothing() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("tickets.csv", SCENARIO_CSV);
    bin()
        .args(["summary", "-i", input.to_str().unwrap(), "--type"])
        .assert()
        .success()
        .stdout(contains("Nenhum ticket encontrado para os filtros atuais."));
}

#[test]
fn search_ranks_analysis_values() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("tickets.csv", SCENARIO_CSV);
    let output = bin()
        .args([
            "search",
            "-i",
            input.to_str().unwrap(),
            "-q",
            "ideal",
            "--field",
            "analysis",
        ])
        .output()
        .expect("run search");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8");
    let lines = stdout.lines().collect::<Vec<_>>();
    assert!(lines[2].contains("IDEAL") && lines[2].ends_with("100.0"));
    assert!(lines[3].contains("NÃO IDEAL"));
}

#[test]
fn search_rejects_blank_query() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("tickets.csv", SCENARIO_CSV);
    bin()
        .args(["search", "-i", input.to_str().unwrap(), "-q", "  "])
        .assert()
        .failure()
        .stderr(contains("query"));
}

#[test]
fn options_cascade_from_analysis() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("tickets.csv", SCENARIO_CSV);
    bin()
        .args(["options", "-i", input.to_str().unwrap(), "-a", "não ideal"])
        .assert()
        .success()
        .stdout(contains("Análise: IDEAL, NÃO IDEAL"))
        .stdout(contains("Tipo: Liveness\n"));
}

#[test]
fn missing_required_column_is_reported() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("partial.csv", "Ticket,Tipo\nT1,Liveness\n");
    bin()
        .args(["summary", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Missing required column(s): Análise"));
}

#[test]
fn config_renames_columns() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "renamed.csv",
        "id;category;verdict\nA1;Selfie;ideal\nA2;Selfie;não ideal\n",
    );
    let config = workspace.write(
        "insights.yml",
        "columns:\n  ticket: id\n  kind: category\n  analysis: verdict\n",
    );
    bin()
        .args([
            "summary",
            "-i",
            input.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "--delimiter",
            ";",
        ])
        .assert()
        .success()
        .stdout(contains("Selfie concentra 100.0% dos tickets filtrados (2 de 2)."));
}
