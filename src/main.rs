use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use steamcast::config::{Config, Profile};

mod cli;

#[derive(Parser)]
#[command(
    name = "steamcast",
    version,
    about = "Relays Steam app news to a Discord channel, translated",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configuration
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed on the configured interval until Ctrl-C
    Run,

    /// Run a single poll cycle
    Once,

    /// Fetch, translate and post the latest news for a game
    News {
        /// Game name to look up on Steam
        game: String,

        /// Requester identity used for the cooldown
        #[arg(long, default_value = "cli")]
        requester: String,
    },

    /// Inspect or clear the seen-article ledger
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum LedgerAction {
    /// List recorded article ids
    Show,

    /// Forget every recorded id
    Reset {
        /// Confirm the reset
        #[arg(long, default_value = "false")]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate and print the configuration without secrets
    Check,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.apply_profile(Profile::from_env()?);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let config = load_config(args.config.as_ref()).context("Failed to load configuration")?;

    let log_format = args.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(&config.logging.level, log_format, args.verbose)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "steamcast starting");

    match args.command {
        Commands::Run => cli::run(config).await?,
        Commands::Once => cli::once(config).await?,
        Commands::News { game, requester } => {
            tracing::info!(game = %game, requester = %requester, "Starting news command");
            cli::news(config, game, requester).await?;
        }
        Commands::Ledger { action } => match action {
            LedgerAction::Show => cli::ledger_show(&config)?,
            LedgerAction::Reset { yes } => cli::ledger_reset(&config, yes)?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Check => cli::config_check(&config)?,
        },
    }

    Ok(())
}

fn setup_tracing(level: &str, format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("steamcast=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("steamcast={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
