pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "bulk-edit")]
#[command(about = "Apply bulk edit rules to catalog records from files")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List the option and action combinations an entity type supports")]
    Options(commands::options::OptionsArgs),

    #[command(about = "Check a rules file for unsupported combinations")]
    Check(commands::check::CheckArgs),

    #[command(about = "Apply a rules file to a records file")]
    Apply(commands::apply::ApplyArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Options(args) => commands::options::handle(args, output_format).await,
        Commands::Check(args) => commands::check::handle(args, output_format).await,
        Commands::Apply(args) => commands::apply::handle(args, output_format).await,
    }
}
