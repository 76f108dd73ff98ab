use clap::Args;
use serde_json::json;

use crate::api::options::group_by_option;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::processor::ProcessorRegistry;
use crate::types::EntityType;

#[derive(Args)]
pub struct OptionsArgs {
    #[arg(help = "Entity type (instance, holdings, item, user)")]
    pub entity: EntityType,
}

pub async fn handle(args: OptionsArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let registry = ProcessorRegistry::standard()?;
    let grouped = group_by_option(&registry.options(args.entity)?);

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            &format!("{} supports {} options", args.entity, grouped.len()),
            Some(json!({ "entityType": args.entity, "options": grouped })),
        ),
        OutputFormat::Text => {
            println!("{} options:", args.entity);
            for group in &grouped {
                let actions: Vec<&str> = group.actions.iter().map(|a| a.as_str()).collect();
                println!("  {:<40} {}", group.option.as_str(), actions.join(", "));
            }
            Ok(())
        }
    }
}
