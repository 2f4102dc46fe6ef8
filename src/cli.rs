use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cloud-cost", version, about = "Cloud cost comparison gateway")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server (default)
    Start,

    /// Test configuration file validity
    Test,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Resolve pricing once and print rates (and a comparison when usage is given)
    Quote(QuoteArgs),

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display current configuration (with secrets masked)
    Show,

    /// Validate configuration file
    Validate,
}

#[derive(Args, Debug, Clone, Default)]
pub struct QuoteArgs {
    /// Region in any provider's naming (e.g. us-east-1, eastus, us-central1)
    #[arg(short, long)]
    pub region: Option<String>,

    /// Instance type in any provider's naming (e.g. m5.large, "D2s v3", e2-standard-2)
    #[arg(short, long)]
    pub instance_type: Option<String>,

    /// Only quote one provider (aws, azure, gcp)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Compute hours for a cost comparison
    #[arg(long)]
    pub compute_hours: Option<f64>,

    /// Stored GB-months for a cost comparison
    #[arg(long)]
    pub storage_gb: Option<f64>,

    /// Transferred GB for a cost comparison
    #[arg(long)]
    pub data_gb: Option<f64>,

    /// Ignore cached pricing
    #[arg(long)]
    pub fresh: bool,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }

    pub fn config_path(&self) -> String {
        self.config.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_start() {
        let cli = Cli {
            config: PathBuf::from("config.toml"),
            command: None,
        };

        assert!(matches!(cli.get_command(), Commands::Start));
    }

    #[test]
    fn test_cli_parsing_global_config() {
        let cli = Cli::try_parse_from(["cloud-cost", "test", "--config", "prod.toml"]).unwrap();

        assert!(matches!(cli.get_command(), Commands::Test));
        assert_eq!(cli.config_path(), "prod.toml");
    }

    #[test]
    fn test_cli_parsing_config_show() {
        let cli = Cli::try_parse_from(["cloud-cost", "config", "show"]).unwrap();

        match cli.get_command() {
            Commands::Config { action } => assert!(matches!(action, ConfigCommands::Show)),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_cli_parsing_quote() {
        let cli = Cli::try_parse_from([
            "cloud-cost",
            "quote",
            "--region",
            "eu-west-1",
            "--instance-type",
            "m5.large",
            "--compute-hours",
            "730",
            "--storage-gb",
            "100",
            "--data-gb",
            "20",
            "--fresh",
        ])
        .unwrap();

        match cli.get_command() {
            Commands::Quote(args) => {
                assert_eq!(args.region.as_deref(), Some("eu-west-1"));
                assert_eq!(args.instance_type.as_deref(), Some("m5.large"));
                assert_eq!(args.compute_hours, Some(730.0));
                assert_eq!(args.data_gb, Some(20.0));
                assert!(args.fresh);
                assert!(args.provider.is_none());
            }
            _ => panic!("Expected Quote command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["cloud-cost", "stop"]).is_err());
    }
}
