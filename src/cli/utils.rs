use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::processor::BatchReport;

/// Read a JSON or YAML document, chosen by file extension
pub fn load_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).with_context(|| format!("invalid YAML in {}", path.display()))
        }
        _ => serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display())),
    }
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });
            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output a batch report: the full report as JSON, or one line per record as text
pub fn output_report(output_format: &OutputFormat, report: &BatchReport) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            output_success(
                output_format,
                &format!("Processed {} {} records", report.total, report.entity_type),
                Some(serde_json::to_value(report)?),
            )?;
        }
        OutputFormat::Text => {
            for item in &report.items {
                let status = if item.has_errors() {
                    "failed"
                } else if item.changed {
                    "changed"
                } else {
                    "unchanged"
                };
                println!("{} [{}] {}", item.identifier, item.tenant_id, status);
                for error in &item.errors {
                    println!("  {:?}: {}", error.severity, error.message);
                }
            }
            println!(
                "✓ {} records: {} changed, {} without changes, {} failed",
                report.total, report.changed, report.no_change, report.failed
            );
        }
    }
    Ok(())
}
