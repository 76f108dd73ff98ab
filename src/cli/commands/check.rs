use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::utils::{load_document, output_error, output_success};
use crate::cli::OutputFormat;
use crate::processor::ProcessorRegistry;
use crate::rules::RuleCollection;
use crate::types::EntityType;

#[derive(Args)]
pub struct CheckArgs {
    #[arg(help = "Entity type (instance, holdings, item, user)")]
    pub entity: EntityType,
    #[arg(long, help = "Rules file (JSON or YAML)")]
    pub rules: PathBuf,
}

pub async fn handle(args: CheckArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let rules: RuleCollection = load_document(&args.rules)?;
    let registry = ProcessorRegistry::standard()?;
    let unsupported = registry.check_rules(args.entity, &rules)?;

    if unsupported.is_empty() {
        return output_success(
            &output_format,
            &format!("All {} rules are supported for {}", rules.len(), args.entity),
            Some(json!({ "supported": true, "unsupported": [] })),
        );
    }

    let pairs: Vec<String> = unsupported.iter().map(|c| format!("{} {}", c.option, c.action)).collect();
    output_error(
        &output_format,
        &format!("Unsupported rule combinations for {}: {}", args.entity, pairs.join(", ")),
        Some("UNSUPPORTED_COMBINATION"),
    )?;
    anyhow::bail!("{} unsupported rule combinations", unsupported.len())
}
