mod commands;
mod output;

use clap::{Parser, Subcommand};
use color_eyre::Result;

use commands::order::OrderArgs;
use commands::validate::ValidateArgs;

/// Config tooling for gantry pipelines
#[derive(Parser, Debug)]
#[command(name = "gantry", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a pipeline configuration file
    Validate(ValidateArgs),
    /// Print the deterministic execution order of each pipeline
    Order(OrderArgs),
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Order(args) => commands::order::execute(args),
    }
}
