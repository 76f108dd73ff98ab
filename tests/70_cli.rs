mod common;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Command;

use common::*;

fn write_temp(name: &str, content: &str) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("bulk-edit-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn bulk_edit(args: &[&str]) -> Result<std::process::Output> {
    Command::new(env!("CARGO_BIN_EXE_bulk-edit"))
        .args(args)
        .output()
        .context("failed to run bulk-edit")
}

#[test]
fn test_apply_yaml_rules_to_bare_records() -> Result<()> {
    let rules = write_temp(
        "rules.yaml",
        r#"
bulkOperationRules:
  - bulkOperationId: 0b5c3a52-7d0e-4c1e-9a4f-2f1d3e5b6c7d
    ruleDetails:
      option: PERMANENT_LOCATION
      actions:
        - type: REPLACE_WITH
          updated: Annex
"#,
    )?;
    let records = write_temp(
        "records.json",
        &json!([{ "id": "i-1", "barcode": "bc-i-1", "holdingsRecordId": "h-1" }]).to_string(),
    )?;
    let catalog = write_temp("catalog.json", &serde_json::to_string(&fixture())?)?;
    let output_path = std::env::temp_dir().join(format!("bulk-edit-{}-updated.json", std::process::id()));

    let output = bulk_edit(&[
        "--json",
        "apply",
        "item",
        "--rules",
        rules.to_str().unwrap_or_default(),
        "--records",
        records.to_str().unwrap_or_default(),
        "--catalog",
        catalog.to_str().unwrap_or_default(),
        "--tenant",
        COLLEGE,
        "--output",
        output_path.to_str().unwrap_or_default(),
    ])?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let body: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["changed"], 1);

    let updated: Value = serde_json::from_str(&std::fs::read_to_string(&output_path)?)?;
    assert_eq!(updated[0]["permanentLocation"]["id"], "loc-b");
    Ok(())
}

#[test]
fn test_check_fails_on_unsupported_rules() -> Result<()> {
    let rules = write_temp(
        "unsupported.json",
        &json!({
            "bulkOperationRules": [{
                "bulkOperationId": "0b5c3a52-7d0e-4c1e-9a4f-2f1d3e5b6c7e",
                "ruleDetails": { "option": "EMAIL_ADDRESS", "actions": [{ "type": "CLEAR_FIELD" }] }
            }]
        })
        .to_string(),
    )?;

    let output = bulk_edit(&["check", "user", "--rules", rules.to_str().unwrap_or_default()])?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("EMAIL_ADDRESS CLEAR_FIELD"));
    Ok(())
}

#[test]
fn test_options_lists_user_options() -> Result<()> {
    let output = bulk_edit(&["options", "user"])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PATRON_GROUP"));
    assert!(stdout.contains("EXPIRATION_DATE"));
    Ok(())
}
