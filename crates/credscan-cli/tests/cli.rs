use assert_cmd::Command;
use predicates::str::contains;
use std::fs::write;

const SCRUBBED_ENV: &[&str] = &[
    "CREDSCAN_PROVIDER",
    "CREDSCAN_API_KEY",
    "OPENAI_API_KEY",
    "CREDSCAN_ENDPOINT",
    "CREDSCAN_MODEL",
    "CREDSCAN_TIMEOUT_SECS",
    "GOOGLE_API_KEY",
    "WHOIS_API_KEY",
    "CREDSCAN_PLACES_ENDPOINT",
    "CREDSCAN_WHOIS_ENDPOINT",
    "PORT",
];

fn credscan(provider: Option<&str>) -> Command {
    let mut cmd = Command::cargo_bin("credscan-cli").unwrap();
    for key in SCRUBBED_ENV {
        cmd.env_remove(key);
    }
    if let Some(provider) = provider {
        cmd.env("CREDSCAN_PROVIDER", provider);
    }
    cmd
}

#[test]
fn analyze_with_noop_provider_prints_report() {
    credscan(Some("noop"))
        .args(["analyze", "--business-name", "Acme", "--domain", "https://www.acme.com"])
        .assert()
        .success()
        .stdout(contains("Credibility Score: 0/100"))
        .stdout(contains("Legitimacy: Scam"));
}

#[test]
fn analyze_json_output_uses_wire_fields() {
    let output = credscan(Some("noop"))
        .args(["analyze", "--business-name", "Acme", "--domain", "acme.com", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["result"]["score"], 0);
    assert_eq!(value["result"]["legitimacy"], "Scam");
    assert_eq!(value["cached"], false);
}

#[test]
fn analyze_rejects_invalid_email() {
    credscan(Some("noop"))
        .args([
            "analyze",
            "--business-name",
            "Acme",
            "--domain",
            "acme.com",
            "--email",
            "not-an-email",
        ])
        .assert()
        .failure()
        .stderr(contains("valid email address"));
}

#[test]
fn missing_api_key_is_reported() {
    credscan(None)
        .args(["analyze", "--business-name", "Acme", "--domain", "acme.com"])
        .assert()
        .failure()
        .stderr(contains("CREDSCAN_API_KEY"));
}

#[test]
fn session_serves_repeat_domain_from_cache_and_throttles_others() {
    let input = concat!(
        r#"{"businessName":"Acme","domain":"acme.com"}"#,
        "\n",
        r#"{"businessName":"Acme","domain":"www.acme.com"}"#,
        "\n",
        r#"{"businessName":"Globex","domain":"globex.com"}"#,
        "\n",
    );
    let output = credscan(Some("noop"))
        .args(["session", "--json"])
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["cached"], false);
    assert_eq!(lines[1]["cached"], true);
    assert!(lines[2]["error"].as_str().unwrap().contains("please wait"));
    assert!(lines[2]["retryAfterSecs"].as_u64().unwrap() <= 30);
}

#[test]
fn session_reports_bad_lines_and_continues() {
    credscan(Some("noop"))
        .arg("session")
        .write_stdin("{oops\n{\"businessName\":\"Acme\",\"domain\":\"acme.com\"}\n")
        .assert()
        .success()
        .stdout(contains("invalid request"))
        .stdout(contains("Credibility Score: 0/100"));
}

#[test]
fn health_check_with_noop_provider() {
    credscan(Some("noop"))
        .arg("health")
        .assert()
        .success()
        .stdout(contains("Checking provider noop"))
        .stdout(contains("ok"));
}

#[test]
fn config_file_selects_provider() {
    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write(
        file.path(),
        "llm = { provider = \"noop\", model = \"config-model\" }\n\n[cache]\ncooldown = \"5s\"\n",
    )
    .unwrap();

    credscan(None)
        .args([
            "--config",
            file.path().to_str().unwrap(),
            "analyze",
            "--business-name",
            "Acme",
            "--domain",
            "acme.com",
        ])
        .assert()
        .success()
        .stdout(contains("Credibility Score"));
}

#[test]
fn zero_sweep_interval_is_a_config_error() {
    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write(
        file.path(),
        "[llm]\nprovider = \"noop\"\n\n[cache]\nsweep_interval = \"0s\"\n",
    )
    .unwrap();

    credscan(None)
        .args(["--config", file.path().to_str().unwrap(), "session"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(contains("cache.sweep_interval"));
}
