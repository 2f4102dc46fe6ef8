use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cloud_cost_gateway::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config_path = args.config_path();

    // The server configures tracing from its own config
    if !matches!(args.get_command(), cli::Commands::Start) {
        init_tracing();
    }

    match args.get_command() {
        cli::Commands::Start => {
            commands::start::execute(&config_path).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&config_path)?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&config_path)?,
            cli::ConfigCommands::Validate => commands::config::validate(&config_path)?,
        },
        cli::Commands::Quote(quote_args) => {
            commands::quote::execute(&config_path, quote_args).await?;
        }
        cli::Commands::Version => {
            println!("Cloud Cost Gateway v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
