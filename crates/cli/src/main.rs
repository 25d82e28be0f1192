//! DeskPilot CLI — the main entry point.
//!
//! Commands:
//! - `replay` — Run the agent loop against a scripted model and a dry-run desktop
//! - `vocab`  — Show how provider actions map onto canonical actions
//! - `config` — Show, validate or locate the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "deskpilot",
    about = "DeskPilot — computer-use agent loop for remote desktops",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted model run and print every event as a JSON line
    Replay {
        /// JSON file with the list of scripted model responses
        #[arg(short, long)]
        script: PathBuf,

        /// Instruction that opens the conversation
        #[arg(short, long, default_value = "Complete the task shown on screen.")]
        instruction: String,

        /// Override the configured action vocabulary
        #[arg(long, env = "DESKPILOT_VOCABULARY")]
        vocabulary: Option<String>,

        /// Read configuration from this file instead of ~/.deskpilot/config.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the action mapping tables
    Vocab {
        /// Only show this vocabulary
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Load and validate the configuration
    Validate,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            script,
            instruction,
            vocabulary,
            config,
        } => {
            commands::replay::run(commands::replay::ReplayArgs {
                script,
                instruction,
                vocabulary,
                config,
            })
            .await?
        }
        Commands::Vocab { name } => commands::vocab::run(name.as_deref())?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}
