use std::process::Command;

fn fleet_tco(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_fleet-tco"))
        .args(args)
        .env("RUST_LOG", "warn")
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run fleet-tco binary")
}

fn stdout(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn request_files_compare_via_cli() {
    for file in [
        "scenarios/demo.toml",
        "scenarios/northern_large.toml",
        "scenarios/california.toml",
    ] {
        let out = fleet_tco(&["--input", file, "compare"]);
        assert!(
            out.status.success(),
            "{file} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        let text = stdout(&out);
        assert!(text.contains("Scenario Comparison"), "{file}: {text}");
        assert!(text.contains("Mobile Charging"), "{file}: {text}");
    }
}

#[test]
fn calculate_json_is_parseable() {
    let out = fleet_tco(&["--preset", "demo", "--scenario", "EAAS", "--json", "calculate"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json output");
    assert_eq!(json["scenario_type"], "EAAS");
    assert_eq!(json["total_buses"], 25);
}

#[test]
fn compare_exports_csv() {
    let path = std::env::temp_dir().join(format!("fleet_tco_cli_{}.csv", std::process::id()));
    let path_str = path.to_string_lossy().into_owned();
    let out = fleet_tco(&["--preset", "california", "compare", "--csv-out", &path_str]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let csv = std::fs::read_to_string(&path).expect("csv written");
    assert_eq!(csv.lines().count(), 5);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn stress_and_registry_commands_run() {
    let out = fleet_tco(&["--preset", "demo", "stress"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).contains("Risk level"));

    let out = fleet_tco(&["registry", "--check", "diesel_price_per_gallon=3.75"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn errors_exit_with_status_one() {
    let out = fleet_tco(&["--preset", "nonexistent", "calculate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown preset"));

    let out = fleet_tco(&["--preset", "demo", "stress", "--id", "SOLAR_FLARE"]);
    assert!(!out.status.success());
}
