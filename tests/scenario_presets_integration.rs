use std::process::Command;

#[derive(Debug)]
struct Kpis {
    autonomy_pct: f64,
    self_consumption_pct: f64,
    cycles: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_results() {
    let office = run_and_parse_kpis(&["--scenario", "scenarios/office.toml"]);
    let retail = run_and_parse_kpis(&["--scenario", "scenarios/retail_large_pv.toml"]);
    let warehouse = run_and_parse_kpis(&["--scenario", "scenarios/warehouse_no_battery.toml"]);

    assert!(
        (35.0..=55.0).contains(&office.autonomy_pct),
        "office autonomy out of range: {:.1}",
        office.autonomy_pct
    );
    assert!(
        (office.autonomy_pct - retail.autonomy_pct).abs() > 1.0,
        "expected office and retail autonomy to differ: office={:.1}, retail={:.1}",
        office.autonomy_pct,
        retail.autonomy_pct
    );
    assert!(
        retail.self_consumption_pct < office.self_consumption_pct,
        "oversized array should export more: retail={:.1}, office={:.1}",
        retail.self_consumption_pct,
        office.self_consumption_pct
    );
    assert_eq!(warehouse.cycles, 0.0, "warehouse has no battery");
}

#[test]
fn presets_run_offline_via_cli() {
    for preset in ["office", "retail", "production", "warehouse_no_battery"] {
        let kpis = run_and_parse_kpis(&["--preset", preset, "--offline"]);
        assert!(
            (0.0..=100.0).contains(&kpis.autonomy_pct),
            "preset {preset} autonomy out of range: {kpis:?}"
        );
    }
}

#[test]
fn unknown_preset_exits_with_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_pv-quote-sim"))
        .args(["--preset", "hospital", "--offline"])
        .output()
        .expect("pv-quote-sim process should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "stderr: {stderr}");
}

#[test]
fn json_output_and_csv_exports() {
    let dir = tempfile::tempdir().expect("temp dir");
    let hourly = dir.path().join("hourly.csv");
    let monthly = dir.path().join("monthly.csv");

    let output = Command::new(env!("CARGO_BIN_EXE_pv-quote-sim"))
        .args(["--scenario", "scenarios/office.toml", "--json"])
        .arg("--hourly-out")
        .arg(&hourly)
        .arg("--monthly-out")
        .arg(&monthly)
        .output()
        .expect("pv-quote-sim process should run");
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert!(json["autonomy_degree_percent"].is_f64());
    assert_eq!(json["monthly_summary"].as_array().map(Vec::len), Some(12));

    let hourly_lines = std::fs::read_to_string(&hourly).expect("hourly csv written");
    assert_eq!(hourly_lines.lines().count(), 8761);
    let monthly_lines = std::fs::read_to_string(&monthly).expect("monthly csv written");
    assert_eq!(monthly_lines.lines().count(), 13);
}

fn run_and_parse_kpis(args: &[&str]) -> Kpis {
    let output = Command::new(env!("CARGO_BIN_EXE_pv-quote-sim"))
        .args(args)
        .output()
        .expect("pv-quote-sim process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    parse_kpis(&stdout)
}

fn parse_kpis(stdout: &str) -> Kpis {
    Kpis {
        autonomy_pct: parse_metric(stdout, "Autonomy:", "%"),
        self_consumption_pct: parse_metric(stdout, "Self-consumption rate:", "%"),
        cycles: parse_metric(stdout, "Battery:", "cycles"),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing KPI line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid KPI format for line `{line}`"));

    let numeric = raw.split(unit).next().unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from KPI line `{line}`"))
}
