use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn shopdoc_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("shopdoc"));
    for key in ["VERCEL", "AWS_LAMBDA_FUNCTION_NAME", "NETLIFY", "SHOPDOC_EPHEMERAL"] {
        cmd.env_remove(key);
    }
    cmd
}

/// Config file keeping every path inside `dir`
fn write_config(dir: &Path) -> String {
    let config = serde_json::json!({
        "storageRoot": dir.join("storage"),
        "baseUrl": "https://docs.example",
        "fontsDirectory": dir.join("fonts"),
        "logosDirectory": dir.join("logos"),
        "publicDirectory": dir.join("public"),
        "appRoot": dir,
    });
    let path = dir.join("shopdoc.json");
    fs::write(&path, serde_json::to_vec_pretty(&config).unwrap()).unwrap();
    path.to_str().unwrap().to_string()
}

fn write_estimate(dir: &Path) -> String {
    let record = serde_json::json!({
        "estimateNumber": "EST 12",
        "estimateDate": "2024-05-01T10:00:00Z",
        "validityDays": 7,
        "customer": { "name": "Asha Rao" },
        "items": [
            { "description": "Battery replacement", "quantity": 1, "unitPrice": 1800, "amount": 1800 }
        ],
        "subtotal": 1800,
        "totalAmount": 1800,
        "company": { "name": "FixIt Mobiles" }
    });
    let path = dir.join("estimate.json");
    fs::write(&path, serde_json::to_vec(&record).unwrap()).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_help() {
    shopdoc_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Repair-shop document renderer"));
}

#[test]
fn test_words() {
    shopdoc_cmd()
        .args(["words", "12345678"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "One Crore Twenty Three Lakh Forty Five Thousand Six Hundred Seventy Eight Rupees Only",
        ));
}

#[test]
fn test_render_to_explicit_output() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let input = write_estimate(temp_dir.path());
    let output = temp_dir.path().join("estimate.pdf");

    shopdoc_cmd()
        .args(["-c", &config, "render", "estimate", "-i", &input, "--format", "thermal-2", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rendered 1 page(s)"));

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
}

#[test]
fn test_render_to_storage_prints_locator() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let input = write_estimate(temp_dir.path());

    shopdoc_cmd()
        .args(["-c", &config, "render", "estimate", "-i", &input])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"https://docs\.example/uploads/estimates/estimate_EST-12_A4_STANDARD_\d+\.pdf",
        )
        .unwrap());

    let stored: Vec<_> = fs::read_dir(temp_dir.path().join("storage/uploads/estimates"))
        .unwrap()
        .collect();
    assert_eq!(stored.len(), 1);
    assert!(temp_dir.path().join("storage/uploads/invoices").is_dir());
}

#[test]
fn test_render_unknown_format_falls_back_to_a4() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let input = write_estimate(temp_dir.path());

    shopdoc_cmd()
        .args(["-c", &config, "render", "estimate", "-i", &input, "--format", "letter"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"https://docs\.example/uploads/estimates/estimate_EST-12_A4_STANDARD_\d+\.pdf",
        )
        .unwrap());
}

#[test]
fn test_render_reports_bad_record() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let input = temp_dir.path().join("broken.json");
    fs::write(&input, "{ not json").unwrap();

    shopdoc_cmd()
        .args(["-c", &config, "render", "invoice", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid record"));
}

#[test]
fn test_trace_logo_lists_candidates() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let logos = temp_dir.path().join("logos");
    fs::create_dir_all(&logos).unwrap();
    fs::write(logos.join("brand.png"), "text pretending to be a png").unwrap();

    shopdoc_cmd()
        .args(["-c", &config, "trace-logo", "/uploads/logos/brand.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("brand.png"))
        .stdout(predicate::str::contains("No usable logo found"));
}
